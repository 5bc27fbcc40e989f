use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::clock::Clock;
use crate::mailer::{render_reminder, Transport, TransportError};
use crate::scheduler::record::{NotificationRecord, NotificationStatus};
use crate::scheduler::storage::{NotificationStore, StoreError};

pub const DEFAULT_DISPATCH_INTERVAL: Duration = Duration::from_secs(60);

/// Outcome counts for one dispatcher tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub due: usize,
    pub sent: usize,
    pub failed: usize,
    /// Records whose status could not be written; they stay pending.
    pub update_errors: usize,
}

/// Delivers due notifications.
pub struct Dispatcher {
    store: Arc<dyn NotificationStore>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    send_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(
        store: Arc<dyn NotificationStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        send_timeout: Option<Duration>,
    ) -> Self {
        Self {
            store,
            transport,
            clock,
            send_timeout,
        }
    }

    /// Attempt every pending notification that is due now.
    ///
    /// Only a failed query aborts the tick. Each record is delivered and
    /// updated on its own, so a bad record never holds up the rest.
    pub async fn tick(&self) -> Result<TickReport, StoreError> {
        let now = self.clock.now();
        let due = self.store.query(NotificationStatus::Pending, now)?;
        let mut report = TickReport {
            due: due.len(),
            ..TickReport::default()
        };

        for record in due {
            let (status, last_error) = match self.deliver(&record).await {
                Ok(()) => (NotificationStatus::Sent, None),
                Err(e) => (NotificationStatus::Error, Some(e.to_string())),
            };

            match self
                .store
                .update_status(record.id, status, last_error.as_deref())
            {
                Ok(()) if status == NotificationStatus::Sent => {
                    report.sent += 1;
                    log::info!("notification {} sent to {}", record.id, record.email);
                }
                Ok(()) => {
                    report.failed += 1;
                    log::warn!(
                        "notification {} to {} failed: {}",
                        record.id,
                        record.email,
                        last_error.as_deref().unwrap_or_default()
                    );
                }
                Err(e) => {
                    report.update_errors += 1;
                    log::error!(
                        "could not mark notification {} as {}: {}",
                        record.id,
                        status,
                        e
                    );
                }
            }
        }

        Ok(report)
    }

    async fn deliver(&self, record: &NotificationRecord) -> Result<(), String> {
        let message = render_reminder(record).map_err(|e| TransportError::from(e).to_string())?;
        let transport = self.transport.clone();
        let timeout = self.send_timeout;

        // own task so a panicking transport only fails this record
        let send = tokio::spawn(async move {
            let send = transport.send(&message.to, &message.subject, &message.body);
            match timeout {
                Some(limit) => tokio::time::timeout(limit, send)
                    .await
                    .unwrap_or_else(|_| Err(TransportError::Timeout(limit))),
                None => send.await,
            }
        });

        match send.await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(e) => Err(format!("transport panicked: {}", e)),
        }
    }

    /// Run [`Dispatcher::tick`] now and then every `period` until stopped.
    pub fn spawn(self: Arc<Self>, period: Duration) -> DispatcherHandle {
        let (stop_tx, stop_rx) = oneshot::channel();
        let join = tokio::spawn(run_dispatch_loop(self, period, stop_rx));
        DispatcherHandle { stop_tx, join }
    }
}

/// Stop signal and join handle for a spawned dispatcher loop.
#[derive(Debug)]
pub struct DispatcherHandle {
    stop_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl DispatcherHandle {
    /// Signal the loop and wait for it to exit. A tick in progress runs to
    /// completion first.
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        if let Err(e) = self.join.await {
            log::error!("dispatcher task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

async fn run_dispatch_loop(
    dispatcher: Arc<Dispatcher>,
    period: Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    log::info!("notification dispatcher started, period {:?}", period);

    loop {
        let worker = dispatcher.clone();
        match tokio::spawn(async move { worker.tick().await }).await {
            Ok(Ok(report)) if report.due > 0 => log::info!(
                "dispatch tick: {} due, {} sent, {} failed, {} not updated",
                report.due,
                report.sent,
                report.failed,
                report.update_errors
            ),
            Ok(Ok(_)) => log::debug!("dispatch tick: nothing due"),
            Ok(Err(e)) => log::error!("dispatch tick aborted: {}", e),
            Err(e) => log::error!("dispatch tick panicked: {}", e),
        }

        let should_stop = tokio::select! {
            biased;
            _ = &mut stop_rx => true,
            _ = sleep(period) => false,
        };
        if should_stop {
            break;
        }
    }

    log::info!("notification dispatcher stopped");
}
