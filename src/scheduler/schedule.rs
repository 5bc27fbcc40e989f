use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::clock::Clock;
use crate::error::ServiceError;
use crate::predict::{Observer, VisiblePass};
use crate::scheduler::record::NewNotification;
use crate::scheduler::storage::NotificationStore;
use crate::scheduler::timezone::UtcOffset;

pub const DEFAULT_LEAD_TIME: Duration = Duration::hours(48);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct ScheduledNotification {
    pub id: i64,
    pub notify_at_utc: DateTime<Utc>,
}

/// Turns a chosen pass into a pending reminder row.
pub struct NotificationScheduler {
    store: Arc<dyn NotificationStore>,
    clock: Arc<dyn Clock>,
    lead_time: Duration,
}

impl NotificationScheduler {
    pub fn new(store: Arc<dyn NotificationStore>, clock: Arc<dyn Clock>, lead_time: Duration) -> Self {
        Self {
            store,
            clock,
            lead_time,
        }
    }

    /// Reminder time for a pass: `lead_time` before rise, never earlier
    /// than `now`.
    pub fn notify_at(&self, pass: &VisiblePass, now: DateTime<Utc>) -> DateTime<Utc> {
        (pass.rise_time() - self.lead_time).max(now)
    }

    /// Persist a pending notification for `pass`. Repeated calls for the
    /// same pass and address create separate rows.
    pub fn schedule(
        &self,
        pass: &VisiblePass,
        email: &str,
        latitude: f64,
        longitude: f64,
        timezone_label: &str,
    ) -> Result<ScheduledNotification, ServiceError> {
        let email = email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ServiceError::InvalidInput(format!(
                "invalid email address '{}'",
                email
            )));
        }
        Observer::new(latitude, longitude)?;
        UtcOffset::from_label(timezone_label)?;

        let now = self.clock.now();
        let notify_at_utc = self.notify_at(pass, now);
        let id = self.store.insert(&NewNotification {
            email: email.to_string(),
            latitude,
            longitude,
            timezone_label: timezone_label.to_string(),
            rise_time_utc: pass.rise_time(),
            culmination_time_utc: pass.culmination_time(),
            set_time_utc: pass.set_time(),
            max_elevation_deg: pass.max_elevation_deg(),
            notify_at_utc,
            created_at_utc: now,
        })?;

        log::info!(
            "scheduled notification {} for {} at {} (rise {})",
            id,
            email,
            notify_at_utc,
            pass.rise_time()
        );
        Ok(ScheduledNotification { id, notify_at_utc })
    }
}
