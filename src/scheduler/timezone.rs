use chrono::{FixedOffset, Offset, Utc};
use std::fmt;

use crate::error::ServiceError;

/// Widest offsets in use: UTC-14:00 through UTC+14:00.
pub const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// A fixed offset from UTC, in whole minutes east of Greenwich.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    minutes: i32,
}

impl UtcOffset {
    pub const UTC: UtcOffset = UtcOffset { minutes: 0 };

    pub fn from_minutes(minutes: i32) -> Result<Self, ServiceError> {
        if !(-MAX_OFFSET_MINUTES..=MAX_OFFSET_MINUTES).contains(&minutes) {
            return Err(ServiceError::InvalidInput(format!(
                "utc offset {} minutes is outside [-{}, {}]",
                minutes, MAX_OFFSET_MINUTES, MAX_OFFSET_MINUTES
            )));
        }
        Ok(Self { minutes })
    }

    /// Parse a `UTC±HH:MM` label.
    pub fn from_label(label: &str) -> Result<Self, ServiceError> {
        let invalid = || ServiceError::InvalidInput(format!("invalid timezone label '{}'", label));

        let rest = label.strip_prefix("UTC").ok_or_else(invalid)?;
        let sign = match rest.chars().next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Err(invalid()),
        };
        let (hh, mm) = rest[1..].split_once(':').ok_or_else(invalid)?;
        let two_digits = |part: &str| part.len() == 2 && part.bytes().all(|b| b.is_ascii_digit());
        if !two_digits(hh) || !two_digits(mm) {
            return Err(invalid());
        }
        let hours: i32 = hh.parse().map_err(|_| invalid())?;
        let minutes: i32 = mm.parse().map_err(|_| invalid())?;
        if minutes >= 60 {
            return Err(invalid());
        }
        Self::from_minutes(sign * (hours * 60 + minutes))
    }

    pub fn minutes(&self) -> i32 {
        self.minutes
    }

    pub fn label(&self) -> String {
        self.to_string()
    }

    pub fn fixed_offset(&self) -> FixedOffset {
        // in range by construction
        FixedOffset::east_opt(self.minutes * 60).unwrap_or_else(|| Utc.fix())
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.minutes < 0 { '-' } else { '+' };
        let abs = self.minutes.abs();
        write!(f, "UTC{}{:02}:{:02}", sign, abs / 60, abs % 60)
    }
}
