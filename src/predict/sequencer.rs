use chrono::{DateTime, Utc};

use crate::predict::error::PredictError;
use crate::predict::types::{EventKind, PassCandidate, RawEvent, SatelliteState};

#[derive(Debug, Clone, Default, PartialEq)]
enum State {
    #[default]
    Idle,
    Rising(PassCandidate),
    Culminated(PassCandidate),
}

/// Assembles rise/culmination/set triples from an ordered event stream.
///
/// Only complete triples leave the sequencer. A rise arriving while a pass is
/// still open throws the open pass away; events that make no sense in the
/// current state are dropped.
#[derive(Debug, Default)]
pub struct PassSequencer {
    state: State,
}

impl PassSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one event. `measure` is called at culmination to read the
    /// satellite's elevation and illumination at that instant.
    pub fn feed<F>(&mut self, event: RawEvent, measure: F) -> Result<Option<PassCandidate>, PredictError>
    where
        F: FnOnce(DateTime<Utc>) -> Result<SatelliteState, PredictError>,
    {
        let state = std::mem::take(&mut self.state);
        let (next, emitted) = match (state, event.kind) {
            (open, EventKind::Rise) => {
                if !matches!(open, State::Idle) {
                    log::debug!("discarding open pass candidate at new rise {}", event.time);
                }
                let candidate = PassCandidate {
                    rise_time: Some(event.time),
                    ..PassCandidate::default()
                };
                (State::Rising(candidate), None)
            }
            (State::Rising(mut candidate), EventKind::Culmination) => {
                let sample = measure(event.time)?;
                candidate.culmination_time = Some(event.time);
                candidate.max_elevation_deg = sample.elevation_deg;
                candidate.sun_altitude_deg = sample.sun_altitude_deg;
                candidate.is_sunlit = Some(sample.is_sunlit);
                (State::Culminated(candidate), None)
            }
            (State::Culminated(mut candidate), EventKind::Set) => {
                candidate.set_time = Some(event.time);
                (State::Idle, Some(candidate))
            }
            (State::Rising(_), EventKind::Set) => {
                log::debug!("set at {} without culmination, dropping pass", event.time);
                (State::Idle, None)
            }
            (state, kind) => {
                log::debug!("ignoring {:?} at {} with no matching open pass", kind, event.time);
                (state, None)
            }
        };
        self.state = next;
        Ok(emitted)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, State::Idle)
    }
}

/// Run a whole event stream through a fresh sequencer.
pub fn sequence_passes<F>(events: &[RawEvent], mut measure: F) -> Result<Vec<PassCandidate>, PredictError>
where
    F: FnMut(DateTime<Utc>) -> Result<SatelliteState, PredictError>,
{
    let mut sequencer = PassSequencer::new();
    let mut candidates = Vec::new();
    for event in events {
        if let Some(candidate) = sequencer.feed(*event, &mut measure)? {
            candidates.push(candidate);
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predict::classifier::{classify, VisibilityThresholds};
    use crate::predict::types::Subpoint;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap()
    }

    fn bright(_: DateTime<Utc>) -> Result<SatelliteState, PredictError> {
        Ok(SatelliteState {
            subpoint: Subpoint {
                latitude_deg: 0.0,
                longitude_deg: 0.0,
                altitude_km: 420.0,
            },
            velocity_km_s: [7.66, 0.0, 0.0],
            elevation_deg: Some(45.0),
            sun_altitude_deg: Some(-10.0),
            is_sunlit: true,
        })
    }

    fn ev(offset_s: i64, kind: EventKind) -> RawEvent {
        RawEvent::new(t0() + Duration::seconds(offset_s), kind)
    }

    #[test]
    fn complete_triple_becomes_visible_pass() {
        let events = [
            ev(0, EventKind::Rise),
            ev(300, EventKind::Culmination),
            ev(600, EventKind::Set),
        ];
        let candidates = sequence_passes(&events, bright).unwrap();
        assert_eq!(candidates.len(), 1);

        let pass = classify(&candidates[0], &VisibilityThresholds::default()).unwrap();
        assert_eq!(pass.rise_time(), t0());
        assert_eq!(pass.culmination_time(), t0() + Duration::seconds(300));
        assert_eq!(pass.set_time(), t0() + Duration::seconds(600));
        assert_eq!(pass.max_elevation_deg(), 45.0);
    }

    #[test]
    fn second_rise_discards_open_candidate() {
        let events = [
            ev(0, EventKind::Rise),
            ev(10, EventKind::Rise),
            ev(300, EventKind::Culmination),
            ev(600, EventKind::Set),
        ];
        let candidates = sequence_passes(&events, bright).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].rise_time, Some(t0() + Duration::seconds(10)));
    }

    #[test]
    fn culmination_without_rise_is_dropped() {
        let events = [ev(300, EventKind::Culmination), ev(600, EventKind::Set)];
        let candidates = sequence_passes(&events, bright).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn set_without_culmination_closes_nothing() {
        let events = [
            ev(0, EventKind::Rise),
            ev(600, EventKind::Set),
            ev(700, EventKind::Culmination),
        ];
        let candidates = sequence_passes(&events, bright).unwrap();
        assert!(candidates.is_empty());
    }

    #[test]
    fn emits_candidates_regardless_of_visibility() {
        let dark = |_: DateTime<Utc>| {
            bright(t0()).map(|s| SatelliteState {
                is_sunlit: false,
                ..s
            })
        };
        let events = [
            ev(0, EventKind::Rise),
            ev(300, EventKind::Culmination),
            ev(600, EventKind::Set),
        ];
        let candidates = sequence_passes(&events, dark).unwrap();
        assert_eq!(candidates.len(), 1);
        assert!(classify(&candidates[0], &VisibilityThresholds::default()).is_none());
    }

    #[test]
    fn measure_only_called_at_culmination() {
        let mut sequencer = PassSequencer::new();
        let out = sequencer
            .feed(ev(0, EventKind::Rise), |_| panic!("not at rise"))
            .unwrap();
        assert!(out.is_none());
        assert!(!sequencer.is_idle());
    }

    #[test]
    fn measure_error_propagates() {
        let mut sequencer = PassSequencer::new();
        sequencer.feed(ev(0, EventKind::Rise), bright).unwrap();
        let err = sequencer
            .feed(ev(300, EventKind::Culmination), |_| {
                Err(PredictError::Propagation("decayed".into()))
            })
            .unwrap_err();
        assert!(matches!(err, PredictError::Propagation(_)));
    }

    #[test]
    fn consecutive_passes_are_all_emitted() {
        let events = [
            ev(0, EventKind::Rise),
            ev(300, EventKind::Culmination),
            ev(600, EventKind::Set),
            ev(6000, EventKind::Rise),
            ev(6300, EventKind::Culmination),
            ev(6600, EventKind::Set),
        ];
        let candidates = sequence_passes(&events, bright).unwrap();
        assert_eq!(candidates.len(), 2);
    }
}
