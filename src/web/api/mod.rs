pub mod error;
pub mod location;
pub mod notifications;
pub mod passes;

use serde::Deserialize;
use utoipa::ToSchema;

use crate::predict::Satellite;
use error::{ApiError, ApiResult};

/// TLE fields a request may carry. Omitting both lines selects the
/// server's default satellite.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TleFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub line1: Option<String>,
    #[serde(default)]
    pub line2: Option<String>,
}

impl TleFields {
    pub fn resolve(&self, default: &Satellite) -> ApiResult<Satellite> {
        match (&self.line1, &self.line2) {
            (Some(line1), Some(line2)) => {
                let name = self.name.as_deref().unwrap_or_default();
                Ok(Satellite::from_tle(name, line1, line2).map_err(crate::error::ServiceError::from)?)
            }
            (None, None) => Ok(default.clone()),
            _ => Err(ApiError::Validation(
                "line1 and line2 must be given together".into(),
            )),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use chrono::{DateTime, Duration, TimeZone, Utc};

    use crate::clock::ManualClock;
    use crate::mailer::testing::RecordingTransport;
    use crate::predict::fixtures::iss;
    use crate::predict::testing::ScriptedPropagator;
    use crate::predict::{EventKind, RawEvent};
    use crate::scheduler::SqliteStore;
    use crate::service::{PassService, ServiceSettings};
    use crate::web::AppState;

    pub fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    /// App state over a scripted propagator with one visible pass rising
    /// `rise_in` from now.
    pub fn state(rise_in: Duration) -> AppState {
        let rise = now() + rise_in;
        let propagator = ScriptedPropagator::new(vec![
            RawEvent::new(rise, EventKind::Rise),
            RawEvent::new(rise + Duration::seconds(300), EventKind::Culmination),
            RawEvent::new(rise + Duration::seconds(600), EventKind::Set),
        ]);
        let service = PassService::new(
            Arc::new(propagator),
            Arc::new(SqliteStore::open_in_memory().unwrap()),
            Arc::new(RecordingTransport::new()),
            Arc::new(ManualClock::new(now())),
            ServiceSettings::default(),
        );
        AppState::new(Arc::new(service), iss())
    }
}
