use std::sync::Arc;

use crate::clock::Clock;
use crate::predict::{PredictError, Propagator, Satellite};

use super::cache::TrajectoryCache;
use super::trajectory::{build_trajectory, TrajectorySettings};
use super::types::CurrentLocation;

/// Answers "where is it now" queries, with the upcoming ground track served
/// from a [`TrajectoryCache`].
pub struct LocationTracker {
    propagator: Arc<dyn Propagator>,
    clock: Arc<dyn Clock>,
    cache: TrajectoryCache,
    settings: TrajectorySettings,
}

impl LocationTracker {
    pub fn new(
        propagator: Arc<dyn Propagator>,
        clock: Arc<dyn Clock>,
        cache: TrajectoryCache,
        settings: TrajectorySettings,
    ) -> Self {
        Self {
            propagator,
            clock,
            cache,
            settings,
        }
    }

    pub fn current_location(&self, satellite: &Satellite) -> Result<CurrentLocation, PredictError> {
        let now = self.clock.now();
        let state = self.propagator.state_at(satellite, None, now)?;

        let trajectory = self.cache.get_or_compute(&satellite.key(), |computed_at| {
            log::debug!("sampling trajectory for {} at {}", satellite.name(), computed_at);
            build_trajectory(self.propagator.as_ref(), satellite, computed_at, &self.settings)
        })?;

        Ok(CurrentLocation {
            latitude_deg: state.subpoint.latitude_deg,
            longitude_deg: state.subpoint.longitude_deg,
            altitude_km: state.subpoint.altitude_km,
            velocity_kmh: state.speed_km_h(),
            trajectory: trajectory.as_ref().clone(),
        })
    }
}
