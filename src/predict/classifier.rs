use crate::predict::types::{PassCandidate, VisiblePass};

/// Thresholds a pass must clear to be worth looking up for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityThresholds {
    pub min_elevation_deg: f64,
    /// Observer must be in at least astronomical twilight.
    pub max_sun_altitude_deg: f64,
}

impl Default for VisibilityThresholds {
    fn default() -> Self {
        Self {
            min_elevation_deg: 10.0,
            max_sun_altitude_deg: -6.0,
        }
    }
}

// Missing fields take values that fail every threshold.
const MISSING_ELEVATION_DEG: f64 = 0.0;
const MISSING_SUN_ALTITUDE_DEG: f64 = 90.0;

/// Turn a closed candidate into a visible pass, or reject it.
pub fn classify(candidate: &PassCandidate, thresholds: &VisibilityThresholds) -> Option<VisiblePass> {
    let elevation = candidate.max_elevation_deg.unwrap_or(MISSING_ELEVATION_DEG);
    let sun_altitude = candidate.sun_altitude_deg.unwrap_or(MISSING_SUN_ALTITUDE_DEG);
    let sunlit = candidate.is_sunlit.unwrap_or(false);

    if elevation < thresholds.min_elevation_deg
        || sun_altitude > thresholds.max_sun_altitude_deg
        || !sunlit
    {
        return None;
    }

    let rise = candidate.rise_time?;
    let culmination = candidate.culmination_time?;
    let set = candidate.set_time?;
    if !(rise < culmination && culmination < set) {
        return None;
    }

    Some(VisiblePass::new_unchecked(
        rise,
        culmination,
        set,
        elevation.clamp(0.0, 90.0),
    ))
}
