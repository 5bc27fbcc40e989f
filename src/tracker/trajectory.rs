use chrono::{DateTime, Duration, Utc};

use crate::predict::{PredictError, Propagator, Satellite};
use crate::tracker::TrajectoryPoint;

/// Ground-track sampling window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectorySettings {
    pub horizon: Duration,
    pub step: Duration,
}

impl Default for TrajectorySettings {
    fn default() -> Self {
        Self {
            horizon: Duration::minutes(60),
            step: Duration::minutes(2),
        }
    }
}

impl TrajectorySettings {
    /// `floor(horizon / step) + 1` samples, or a single sample when the step
    /// is not positive.
    pub fn sample_count(&self) -> usize {
        let step = self.step.num_milliseconds();
        if step <= 0 {
            return 1;
        }
        (self.horizon.num_milliseconds().max(0) / step) as usize + 1
    }
}

/// Subpoints at `start + k * step` for `k` in `0..sample_count`.
pub fn build_trajectory(
    propagator: &dyn Propagator,
    satellite: &Satellite,
    start: DateTime<Utc>,
    settings: &TrajectorySettings,
) -> Result<Vec<TrajectoryPoint>, PredictError> {
    (0..settings.sample_count())
        .map(|k| {
            let time = start + settings.step * k as i32;
            let state = propagator.state_at(satellite, None, time)?;
            Ok(TrajectoryPoint {
                time,
                latitude_deg: state.subpoint.latitude_deg,
                longitude_deg: state.subpoint.longitude_deg,
                altitude_km: state.subpoint.altitude_km,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::fixtures::iss;
    use crate::predict::testing::ScriptedPropagator;
    use chrono::TimeZone;

    #[test]
    fn default_window_has_31_samples() {
        assert_eq!(TrajectorySettings::default().sample_count(), 31);
    }

    #[test]
    fn partial_step_is_floored() {
        let settings = TrajectorySettings {
            horizon: Duration::minutes(7),
            step: Duration::minutes(2),
        };
        assert_eq!(settings.sample_count(), 4);
    }

    #[test]
    fn zero_step_yields_single_sample() {
        let settings = TrajectorySettings {
            horizon: Duration::minutes(60),
            step: Duration::zero(),
        };
        assert_eq!(settings.sample_count(), 1);
    }

    #[test]
    fn samples_are_evenly_spaced_from_start() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        let propagator = ScriptedPropagator::new(Vec::new());
        let points =
            build_trajectory(&propagator, &iss(), start, &TrajectorySettings::default()).unwrap();
        assert_eq!(points.len(), 31);
        assert_eq!(points[0].time, start);
        assert_eq!(points[30].time, start + Duration::minutes(60));
        assert!(points.windows(2).all(|w| w[1].time - w[0].time == Duration::minutes(2)));
    }

    #[test]
    fn propagation_failure_aborts_sampling() {
        let start = Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap();
        let propagator = ScriptedPropagator::failing();
        assert!(build_trajectory(&propagator, &iss(), start, &TrajectorySettings::default()).is_err());
    }
}
