use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::predict::VisiblePass;

const LOCAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Echo of the observer a pass-finder report was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ReportQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub utc_offset_minutes: i32,
    pub timezone_label: String,
}

/// A visible pass rendered for display, in UTC and the observer's offset.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassInfo {
    pub rise_time_utc: DateTime<Utc>,
    pub culmination_time_utc: DateTime<Utc>,
    pub set_time_utc: DateTime<Utc>,
    pub rise_time_local: String,
    pub culmination_time_local: String,
    pub set_time_local: String,
    pub duration_minutes: f64,
    pub max_elevation_deg: f64,
    pub visibility: String,
}

impl PassInfo {
    pub fn new(pass: &VisiblePass, offset: FixedOffset) -> Self {
        Self {
            rise_time_utc: pass.rise_time(),
            culmination_time_utc: pass.culmination_time(),
            set_time_utc: pass.set_time(),
            rise_time_local: local_time(pass.rise_time(), offset),
            culmination_time_local: local_time(pass.culmination_time(), offset),
            set_time_local: local_time(pass.set_time(), offset),
            duration_minutes: pass.duration_minutes(),
            max_elevation_deg: (pass.max_elevation_deg() * 10.0).round() / 10.0,
            visibility: pass.visibility().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PassFinderReport {
    pub query: ReportQuery,
    pub next_pass: Option<PassInfo>,
    pub email_scheduled: bool,
    pub notify_at_utc: Option<DateTime<Utc>>,
    pub notify_at_local: Option<String>,
    pub message: String,
}

pub fn local_time(t: DateTime<Utc>, offset: FixedOffset) -> String {
    t.with_timezone(&offset).format(LOCAL_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn renders_local_times_in_offset() {
        let rise = Utc.with_ymd_and_hms(2026, 3, 3, 0, 15, 0).unwrap();
        let pass = VisiblePass::new_unchecked(
            rise,
            rise + Duration::seconds(200),
            rise + Duration::seconds(400),
            33.333,
        );
        let info = PassInfo::new(&pass, FixedOffset::west_opt(5 * 3600).unwrap());

        assert_eq!(info.rise_time_local, "2026-03-02 19:15:00");
        assert_eq!(info.set_time_local, "2026-03-02 19:21:40");
        assert_eq!(info.duration_minutes, 6.7);
        assert_eq!(info.max_elevation_deg, 33.3);
        assert_eq!(info.visibility, "good");
    }
}
