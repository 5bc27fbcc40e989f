use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::observer::Observer;
use crate::predict::propagator::Propagator;
use crate::predict::satellite::Satellite;
use crate::predict::types::{RawEvent, SatelliteState, Subpoint};

/// Propagator that replays a fixed event list and reports one fixed state,
/// with the subpoint longitude set to the minute of the query so samples
/// taken at different times are distinguishable.
pub struct ScriptedPropagator {
    pub events: Vec<RawEvent>,
    pub state: SatelliteState,
    pub fail: bool,
    pub state_calls: AtomicUsize,
    pub windows: Mutex<Vec<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl ScriptedPropagator {
    pub fn new(events: Vec<RawEvent>) -> Self {
        Self {
            events,
            state: bright_state(),
            fail: false,
            state_calls: AtomicUsize::new(0),
            windows: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    pub fn with_state(mut self, state: SatelliteState) -> Self {
        self.state = state;
        self
    }

    pub fn state_calls(&self) -> usize {
        self.state_calls.load(Ordering::SeqCst)
    }
}

pub fn bright_state() -> SatelliteState {
    SatelliteState {
        subpoint: Subpoint {
            latitude_deg: 12.5,
            longitude_deg: 0.0,
            altitude_km: 418.0,
        },
        velocity_km_s: [3.0, 4.0, 0.0],
        elevation_deg: Some(45.0),
        sun_altitude_deg: Some(-10.0),
        is_sunlit: true,
    }
}

impl Propagator for ScriptedPropagator {
    fn find_events(
        &self,
        _satellite: &Satellite,
        _observer: &Observer,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        _min_altitude_deg: f64,
    ) -> Result<Vec<RawEvent>, PredictError> {
        if self.fail {
            return Err(PredictError::Propagation("scripted failure".into()));
        }
        self.windows.lock().unwrap().push((start, end));
        Ok(self.events.clone())
    }

    fn state_at(
        &self,
        _satellite: &Satellite,
        observer: Option<&Observer>,
        t: DateTime<Utc>,
    ) -> Result<SatelliteState, PredictError> {
        if self.fail {
            return Err(PredictError::Propagation("scripted failure".into()));
        }
        self.state_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state;
        state.subpoint.longitude_deg = (t.timestamp() / 60 % 360) as f64;
        if observer.is_none() {
            state.elevation_deg = None;
            state.sun_altitude_deg = None;
        }
        Ok(state)
    }
}
