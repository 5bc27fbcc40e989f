use askama::Template;
use chrono::{DateTime, Utc};

use crate::scheduler::{NotificationRecord, UtcOffset};

/// Stored records carry no satellite name, so one subject covers them all.
pub const REMINDER_SUBJECT: &str = "Upcoming visible satellite pass";

#[derive(Template)]
#[template(path = "reminder.txt")]
struct ReminderTemplate<'a> {
    latitude: String,
    longitude: String,
    timezone_label: &'a str,
    rise_utc: String,
    rise_local: String,
    culmination_utc: String,
    culmination_local: String,
    set_utc: String,
    set_local: String,
    duration_minutes: String,
    max_elevation: String,
    visibility: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReminderMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

pub fn render_reminder(record: &NotificationRecord) -> Result<ReminderMessage, askama::Error> {
    // labels were validated when scheduled; fall back to UTC for old rows
    let offset = UtcOffset::from_label(&record.timezone_label)
        .unwrap_or(UtcOffset::UTC)
        .fixed_offset();
    let local = |t: DateTime<Utc>| t.with_timezone(&offset).format("%Y-%m-%d %H:%M:%S").to_string();
    let utc = |t: DateTime<Utc>| t.format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let pass = record.pass();

    let body = ReminderTemplate {
        latitude: format!("{:.4}", record.latitude),
        longitude: format!("{:.4}", record.longitude),
        timezone_label: &record.timezone_label,
        rise_utc: utc(pass.rise_time()),
        rise_local: local(pass.rise_time()),
        culmination_utc: utc(pass.culmination_time()),
        culmination_local: local(pass.culmination_time()),
        set_utc: utc(pass.set_time()),
        set_local: local(pass.set_time()),
        duration_minutes: format!("{:.1}", pass.duration_minutes()),
        max_elevation: format!("{:.1}", pass.max_elevation_deg()),
        visibility: pass.visibility(),
    }
    .render()?;

    Ok(ReminderMessage {
        to: record.email.clone(),
        subject: REMINDER_SUBJECT.to_string(),
        body,
    })
}
