use chrono::{DateTime, Duration, Utc};

use crate::predict::classifier::{classify, VisibilityThresholds};
use crate::predict::error::PredictError;
use crate::predict::observer::Observer;
use crate::predict::propagator::Propagator;
use crate::predict::satellite::Satellite;
use crate::predict::sequencer::sequence_passes;
use crate::predict::types::VisiblePass;

/// Knobs for a pass search.
#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    pub window: Duration,
    pub horizon_deg: f64,
    pub thresholds: VisibilityThresholds,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            window: Duration::days(4),
            horizon_deg: 0.0,
            thresholds: VisibilityThresholds::default(),
        }
    }
}

/// Find all visible passes of `satellite` over `observer` between `start`
/// and `start + options.window`.
pub fn predict_passes(
    propagator: &dyn Propagator,
    satellite: &Satellite,
    observer: &Observer,
    start: DateTime<Utc>,
    options: &SearchOptions,
) -> Result<Vec<VisiblePass>, PredictError> {
    let end = start + options.window;
    let events = propagator.find_events(satellite, observer, start, end, options.horizon_deg)?;

    let candidates = sequence_passes(&events, |t| {
        propagator.state_at(satellite, Some(observer), t)
    })?;
    let total = candidates.len();

    let passes: Vec<VisiblePass> = candidates
        .iter()
        .filter_map(|c| classify(c, &options.thresholds))
        .collect();

    log::debug!(
        "{}: {} of {} passes visible from ({:.4}, {:.4})",
        satellite.name(),
        passes.len(),
        total,
        observer.latitude_deg,
        observer.longitude_deg
    );

    Ok(passes)
}
