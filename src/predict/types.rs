use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Rise,
    Culmination,
    Set,
}

/// A horizon event reported by the propagator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawEvent {
    pub time: DateTime<Utc>,
    pub kind: EventKind,
}

impl RawEvent {
    pub fn new(time: DateTime<Utc>, kind: EventKind) -> Self {
        Self { time, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct Subpoint {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_km: f64,
}

/// Satellite state at one instant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SatelliteState {
    pub subpoint: Subpoint,
    pub velocity_km_s: [f64; 3],
    /// Elevation above the observer's horizon, when an observer was given.
    pub elevation_deg: Option<f64>,
    /// Sun altitude at the observer, when an observer was given.
    pub sun_altitude_deg: Option<f64>,
    pub is_sunlit: bool,
}

impl SatelliteState {
    pub fn speed_km_h(&self) -> f64 {
        let [x, y, z] = self.velocity_km_s;
        (x * x + y * y + z * z).sqrt() * 3600.0
    }
}

/// Pass under construction inside the sequencer. Fields fill in as events
/// arrive; nothing outside the predict pipeline sees one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassCandidate {
    pub rise_time: Option<DateTime<Utc>>,
    pub culmination_time: Option<DateTime<Utc>>,
    pub set_time: Option<DateTime<Utc>>,
    pub max_elevation_deg: Option<f64>,
    pub sun_altitude_deg: Option<f64>,
    pub is_sunlit: Option<bool>,
}

/// A pass that cleared every visibility threshold.
///
/// Fields are read-only. New passes come from
/// [`crate::predict::classifier::classify`]; the scheduler rebuilds stored
/// ones. Either way `rise_time < culmination_time < set_time` holds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct VisiblePass {
    rise_time: DateTime<Utc>,
    culmination_time: DateTime<Utc>,
    set_time: DateTime<Utc>,
    max_elevation_deg: f64,
}

impl VisiblePass {
    pub(crate) fn new_unchecked(
        rise_time: DateTime<Utc>,
        culmination_time: DateTime<Utc>,
        set_time: DateTime<Utc>,
        max_elevation_deg: f64,
    ) -> Self {
        Self {
            rise_time,
            culmination_time,
            set_time,
            max_elevation_deg,
        }
    }

    pub fn rise_time(&self) -> DateTime<Utc> {
        self.rise_time
    }

    pub fn culmination_time(&self) -> DateTime<Utc> {
        self.culmination_time
    }

    pub fn set_time(&self) -> DateTime<Utc> {
        self.set_time
    }

    pub fn max_elevation_deg(&self) -> f64 {
        self.max_elevation_deg
    }

    pub fn duration_minutes(&self) -> f64 {
        let minutes = (self.set_time - self.rise_time).num_milliseconds() as f64 / 60_000.0;
        (minutes * 10.0).round() / 10.0
    }

    pub fn visibility(&self) -> &'static str {
        if self.max_elevation_deg >= 60.0 {
            "excellent"
        } else if self.max_elevation_deg >= 30.0 {
            "good"
        } else {
            "fair"
        }
    }
}
