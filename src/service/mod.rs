//! The process-scoped service object tying prediction, tracking, scheduling
//! and dispatch together.

mod report;

pub use report::{local_time, PassFinderReport, PassInfo, ReportQuery};

use std::sync::{Arc, Mutex};

use crate::clock::{Clock, SystemClock};
use crate::config::{Config, ConfigError, TransportConfig};
use crate::error::ServiceError;
use crate::mailer::{CommandTransport, LogTransport, Transport};
use crate::predict::{
    predict_passes, Observer, Propagator, Satellite, SearchOptions, Sgp4Propagator,
    VisibilityThresholds, VisiblePass,
};
use crate::scheduler::{
    Dispatcher, DispatcherHandle, NotificationRecord, NotificationScheduler, NotificationStore,
    ScheduledNotification, SqliteStore, TickReport, UtcOffset,
};
use crate::tracker::{CurrentLocation, LocationTracker, TrajectoryCache, TrajectorySettings};

/// Tunables resolved from [`Config`].
#[derive(Debug, Clone, Copy)]
pub struct ServiceSettings {
    pub search: SearchOptions,
    pub trajectory: TrajectorySettings,
    pub trajectory_ttl: chrono::Duration,
    pub lead_time: chrono::Duration,
    pub dispatch_interval: std::time::Duration,
    pub send_timeout: Option<std::time::Duration>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            trajectory: TrajectorySettings::default(),
            trajectory_ttl: crate::tracker::DEFAULT_TTL,
            lead_time: crate::scheduler::DEFAULT_LEAD_TIME,
            dispatch_interval: crate::scheduler::DEFAULT_DISPATCH_INTERVAL,
            send_timeout: Some(std::time::Duration::from_secs(30)),
        }
    }
}

impl ServiceSettings {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let chrono_duration = |field: &'static str, d: std::time::Duration| {
            chrono::Duration::from_std(d).map_err(|e| ConfigError::Invalid {
                field,
                message: e.to_string(),
            })
        };

        Ok(Self {
            search: SearchOptions {
                window: chrono_duration("predict.search_window", config.predict.search_window)?,
                horizon_deg: config.predict.horizon_deg,
                thresholds: VisibilityThresholds {
                    min_elevation_deg: config.predict.min_elevation_deg,
                    max_sun_altitude_deg: config.predict.max_sun_altitude_deg,
                },
            },
            trajectory: TrajectorySettings {
                horizon: chrono_duration("trajectory.horizon", config.trajectory.horizon)?,
                step: chrono_duration("trajectory.step", config.trajectory.step)?,
            },
            trajectory_ttl: chrono_duration("trajectory.ttl", config.trajectory.ttl)?,
            lead_time: chrono_duration("notifications.lead_time", config.notifications.lead_time)?,
            dispatch_interval: config.notifications.dispatch_interval,
            send_timeout: config.notifications.send_timeout,
        })
    }
}

/// Pass-finder inputs besides the satellite.
#[derive(Debug, Clone, PartialEq)]
pub struct PassFinderQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_minutes: i32,
    pub email: Option<String>,
}

pub struct PassService {
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    store: Arc<dyn NotificationStore>,
    tracker: LocationTracker,
    scheduler: NotificationScheduler,
    dispatcher: Arc<Dispatcher>,
    settings: ServiceSettings,
    worker: Mutex<Option<DispatcherHandle>>,
}

impl PassService {
    pub fn new(
        propagator: Arc<dyn Propagator>,
        store: Arc<dyn NotificationStore>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        settings: ServiceSettings,
    ) -> Self {
        let tracker = LocationTracker::new(
            propagator.clone(),
            clock.clone(),
            TrajectoryCache::new(settings.trajectory_ttl, clock.clone()),
            settings.trajectory,
        );
        let scheduler = NotificationScheduler::new(store.clone(), clock.clone(), settings.lead_time);
        let dispatcher = Arc::new(Dispatcher::new(
            store.clone(),
            transport,
            clock.clone(),
            settings.send_timeout,
        ));

        Self {
            propagator,
            clock,
            store,
            tracker,
            scheduler,
            dispatcher,
            settings,
            worker: Mutex::new(None),
        }
    }

    /// Build the production service: SGP4 propagation, the SQLite store at
    /// `store.path` and the configured transport.
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let settings = ServiceSettings::from_config(config)
            .map_err(|e| ServiceError::InvalidInput(e.to_string()))?;
        let store = SqliteStore::open(&config.store.path)?;
        log::info!("notification store at {}", config.store.path.display());

        let transport: Arc<dyn Transport> = match &config.transport {
            TransportConfig::Log => Arc::new(LogTransport),
            TransportConfig::Command { command, from } => {
                Arc::new(CommandTransport::new(command.clone(), from.clone()))
            }
        };

        Ok(Self::new(
            Arc::new(Sgp4Propagator::default()),
            Arc::new(store),
            transport,
            Arc::new(SystemClock),
            settings,
        ))
    }

    /// Start the background dispatcher. Must be called from within a tokio
    /// runtime; calling it again while running does nothing.
    pub fn init(&self) {
        let mut worker = self.worker.lock().unwrap_or_else(|e| e.into_inner());
        if worker.as_ref().is_some_and(|h| !h.is_finished()) {
            log::warn!("dispatcher already running");
            return;
        }
        *worker = Some(self.dispatcher.clone().spawn(self.settings.dispatch_interval));
    }

    /// Stop the background dispatcher and wait for it to exit.
    pub async fn shutdown(&self) {
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.stop().await;
        }
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .is_some_and(|h| !h.is_finished())
    }

    /// Visible passes over the observer, starting now.
    pub fn find_visible_passes(
        &self,
        satellite: &Satellite,
        latitude: f64,
        longitude: f64,
    ) -> Result<Vec<VisiblePass>, ServiceError> {
        let observer = Observer::new(latitude, longitude)?;
        let passes = predict_passes(
            self.propagator.as_ref(),
            satellite,
            &observer,
            self.clock.now(),
            &self.settings.search,
        )?;
        Ok(passes)
    }

    pub fn current_location(&self, satellite: &Satellite) -> Result<CurrentLocation, ServiceError> {
        Ok(self.tracker.current_location(satellite)?)
    }

    pub fn schedule_notification(
        &self,
        pass: &VisiblePass,
        email: &str,
        latitude: f64,
        longitude: f64,
        timezone_label: &str,
    ) -> Result<ScheduledNotification, ServiceError> {
        self.scheduler
            .schedule(pass, email, latitude, longitude, timezone_label)
    }

    /// Next visible pass rendered for the observer's offset, scheduling a
    /// reminder when an email address is given.
    pub fn find_next_pass(
        &self,
        satellite: &Satellite,
        query: &PassFinderQuery,
    ) -> Result<PassFinderReport, ServiceError> {
        let offset = UtcOffset::from_minutes(query.utc_offset_minutes)?;
        let fixed = offset.fixed_offset();
        let report_query = ReportQuery {
            latitude: query.latitude,
            longitude: query.longitude,
            utc_offset_minutes: offset.minutes(),
            timezone_label: offset.label(),
        };

        let passes = self.find_visible_passes(satellite, query.latitude, query.longitude)?;
        let Some(pass) = passes.first() else {
            return Ok(PassFinderReport {
                message: format!(
                    "No visible passes of {} in the next {} hours.",
                    satellite.name(),
                    self.settings.search.window.num_hours()
                ),
                query: report_query,
                next_pass: None,
                email_scheduled: false,
                notify_at_utc: None,
                notify_at_local: None,
            });
        };

        let info = PassInfo::new(pass, fixed);
        let email = query
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        let scheduled = match email {
            Some(email) => Some(self.schedule_notification(
                pass,
                email,
                query.latitude,
                query.longitude,
                &report_query.timezone_label,
            )?),
            None => None,
        };

        let notify_at_local = scheduled.map(|s| local_time(s.notify_at_utc, fixed));
        let mut message = format!(
            "Next visible pass of {} rises at {} ({}).",
            satellite.name(),
            info.rise_time_local,
            report_query.timezone_label
        );
        if let Some(local) = &notify_at_local {
            message.push_str(&format!(" Reminder email scheduled for {}.", local));
        }

        Ok(PassFinderReport {
            query: report_query,
            next_pass: Some(info),
            email_scheduled: scheduled.is_some(),
            notify_at_utc: scheduled.map(|s| s.notify_at_utc),
            notify_at_local,
            message,
        })
    }

    pub fn notification(&self, id: i64) -> Result<NotificationRecord, ServiceError> {
        Ok(self.store.get(id)?)
    }

    /// Run a single dispatcher tick in the caller's task.
    pub async fn dispatch_once(&self) -> Result<TickReport, ServiceError> {
        Ok(self.dispatcher.tick().await?)
    }
}
