use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::events::{find_horizon_events, COARSE_STEP_SECONDS};
use crate::predict::observer::{ecef_to_geodetic, Observer};
use crate::predict::satellite::Satellite;
use crate::predict::sun::{is_sunlit, sun_position_eci_km};
use crate::predict::types::{RawEvent, SatelliteState, Subpoint};

/// Orbit propagation as seen by the pass pipeline.
pub trait Propagator: Send + Sync {
    /// Horizon events for `satellite` over `observer` in `[start, end]`,
    /// ordered by time.
    fn find_events(
        &self,
        satellite: &Satellite,
        observer: &Observer,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_altitude_deg: f64,
    ) -> Result<Vec<RawEvent>, PredictError>;

    /// Satellite state at `t`. Elevation and sun altitude are only filled in
    /// when an observer is given.
    fn state_at(
        &self,
        satellite: &Satellite,
        observer: Option<&Observer>,
        t: DateTime<Utc>,
    ) -> Result<SatelliteState, PredictError>;
}

/// SGP4 propagation with a low-precision solar ephemeris.
#[derive(Debug, Clone)]
pub struct Sgp4Propagator {
    coarse_step: Duration,
}

impl Default for Sgp4Propagator {
    fn default() -> Self {
        Self {
            coarse_step: Duration::seconds(COARSE_STEP_SECONDS),
        }
    }
}

impl Sgp4Propagator {
    pub fn new() -> Self {
        Self::default()
    }

    /// TEME position and velocity (km, km/s) at `t`.
    fn propagate(
        satellite: &Satellite,
        t: DateTime<Utc>,
    ) -> Result<([f64; 3], [f64; 3]), PredictError> {
        let minutes = satellite
            .elements()
            .datetime_to_minutes_since_epoch(&t.naive_utc())
            .map_err(|e| PredictError::Propagation(e.to_string()))?;
        let prediction = satellite.constants().propagate(minutes)?;
        Ok((prediction.position, prediction.velocity))
    }
}

impl Propagator for Sgp4Propagator {
    fn find_events(
        &self,
        satellite: &Satellite,
        observer: &Observer,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_altitude_deg: f64,
    ) -> Result<Vec<RawEvent>, PredictError> {
        let elevation = |t: DateTime<Utc>| -> Result<f64, PredictError> {
            let (position, _) = Self::propagate(satellite, t)?;
            let ecef = teme_to_ecef_position(position, gmst(t));
            Ok(observer.elevation_deg(ecef))
        };
        find_horizon_events(elevation, start, end, self.coarse_step, min_altitude_deg)
    }

    fn state_at(
        &self,
        satellite: &Satellite,
        observer: Option<&Observer>,
        t: DateTime<Utc>,
    ) -> Result<SatelliteState, PredictError> {
        let (position, velocity) = Self::propagate(satellite, t)?;
        let sidereal = gmst(t);
        let sat_ecef = teme_to_ecef_position(position, sidereal);
        let (latitude_deg, longitude_deg, altitude_km) = ecef_to_geodetic(sat_ecef);

        let sun_eci = sun_position_eci_km(t);
        let (elevation_deg, sun_altitude_deg) = match observer {
            Some(obs) => {
                let sun_ecef = teme_to_ecef_position(sun_eci, sidereal);
                (Some(obs.elevation_deg(sat_ecef)), Some(obs.elevation_deg(sun_ecef)))
            }
            None => (None, None),
        };

        Ok(SatelliteState {
            subpoint: Subpoint {
                latitude_deg,
                longitude_deg,
                altitude_km,
            },
            velocity_km_s: velocity,
            elevation_deg,
            sun_altitude_deg,
            is_sunlit: is_sunlit(position, sun_eci),
        })
    }
}

/// Greenwich mean sidereal time in radians.
pub fn gmst(t: DateTime<Utc>) -> f64 {
    sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&t.naive_utc()))
}

pub fn teme_to_ecef_position(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::satellite::fixtures::iss;
    use chrono::TimeZone;

    fn near_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 9, 12, 0, 0).unwrap()
    }

    #[test]
    fn iss_state_is_plausible() {
        let state = Sgp4Propagator::new()
            .state_at(&iss(), None, near_epoch())
            .unwrap();
        assert!(state.subpoint.latitude_deg.abs() <= 52.0);
        assert!((380.0..460.0).contains(&state.subpoint.altitude_km));
        assert!((27_000.0..28_500.0).contains(&state.speed_km_h()));
        assert!(state.elevation_deg.is_none());
        assert!(state.sun_altitude_deg.is_none());
    }

    #[test]
    fn observer_fields_filled_when_observer_given() {
        let observer = Observer::new(40.7128, -74.006).unwrap();
        let state = Sgp4Propagator::new()
            .state_at(&iss(), Some(&observer), near_epoch())
            .unwrap();
        let elevation = state.elevation_deg.unwrap();
        let sun = state.sun_altitude_deg.unwrap();
        assert!((-90.0..=90.0).contains(&elevation));
        // 07:00 local in January: sun near the horizon, not overhead.
        assert!(sun.abs() < 30.0, "sun altitude {}", sun);
    }

    #[test]
    fn sun_is_high_at_local_noon() {
        let observer = Observer::new(0.0, 0.0).unwrap();
        let t = Utc.with_ymd_and_hms(2026, 3, 20, 12, 0, 0).unwrap();
        let state = Sgp4Propagator::new()
            .state_at(&iss(), Some(&observer), t)
            .unwrap();
        assert!(state.sun_altitude_deg.unwrap() > 80.0);
    }

    #[test]
    fn finds_iss_passes_within_a_day() {
        let observer = Observer::new(40.7128, -74.006).unwrap();
        let start = near_epoch();
        let events = Sgp4Propagator::new()
            .find_events(&iss(), &observer, start, start + Duration::days(1), 0.0)
            .unwrap();
        assert!(!events.is_empty());
        assert!(events.windows(2).all(|w| w[0].time < w[1].time));
    }
}
