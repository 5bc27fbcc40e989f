use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::VisiblePass;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ToSchema,
    strum_macros::Display,
    strum_macros::AsRefStr,
    strum_macros::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationStatus {
    Pending,
    Sent,
    Error,
}

impl NotificationStatus {
    /// `Sent` and `Error` are final.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, NotificationStatus::Pending)
    }
}

/// A notification about to be persisted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_label: String,
    pub rise_time_utc: DateTime<Utc>,
    pub culmination_time_utc: DateTime<Utc>,
    pub set_time_utc: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub notify_at_utc: DateTime<Utc>,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct NotificationRecord {
    pub id: i64,
    pub email: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timezone_label: String,
    pub rise_time_utc: DateTime<Utc>,
    pub culmination_time_utc: DateTime<Utc>,
    pub set_time_utc: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub notify_at_utc: DateTime<Utc>,
    pub status: NotificationStatus,
    pub created_at_utc: DateTime<Utc>,
    pub last_error: Option<String>,
}

impl NotificationRecord {
    /// The pass this record was scheduled from.
    pub fn pass(&self) -> VisiblePass {
        VisiblePass::new_unchecked(
            self.rise_time_utc,
            self.culmination_time_utc,
            self.set_time_utc,
            self.max_elevation_deg,
        )
    }
}
