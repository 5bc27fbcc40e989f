use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::clock::Clock;
use crate::tracker::TrajectoryPoint;

pub const DEFAULT_TTL: Duration = Duration::minutes(30);

#[derive(Debug, Clone)]
struct Entry {
    computed_at: DateTime<Utc>,
    points: Arc<Vec<TrajectoryPoint>>,
}

/// Trajectories keyed by satellite, each valid for `ttl` after it was
/// computed.
///
/// The lock only guards lookup and replacement. Two callers arriving after
/// expiry may both recompute; the last writer wins.
pub struct TrajectoryCache {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    slots: Mutex<HashMap<String, Entry>>,
}

impl TrajectoryCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached points for `key` if still fresh, otherwise `compute(now)`
    /// stored under `key`. Storing a new entry evicts every stale one.
    pub fn get_or_compute<F, E>(&self, key: &str, compute: F) -> Result<Arc<Vec<TrajectoryPoint>>, E>
    where
        F: FnOnce(DateTime<Utc>) -> Result<Vec<TrajectoryPoint>, E>,
    {
        let now = self.clock.now();
        if let Some(entry) = self.lookup(key) {
            if now - entry.computed_at < self.ttl {
                return Ok(entry.points);
            }
        }

        let points = Arc::new(compute(now)?);
        let ttl = self.ttl;
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.retain(|_, entry| now - entry.computed_at < ttl);
        slots.insert(
            key.to_string(),
            Entry {
                computed_at: now,
                points: points.clone(),
            },
        );
        Ok(points)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lookup(&self, key: &str) -> Option<Entry> {
        let slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::TimeZone;
    use std::convert::Infallible;

    fn point(time: DateTime<Utc>) -> TrajectoryPoint {
        TrajectoryPoint {
            time,
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_km: 420.0,
        }
    }

    fn setup() -> (Arc<ManualClock>, TrajectoryCache) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2026, 3, 1, 19, 0, 0).unwrap(),
        ));
        let cache = TrajectoryCache::new(DEFAULT_TTL, clock.clone());
        (clock, cache)
    }

    #[test]
    fn fresh_entry_is_returned_without_recompute() {
        let (clock, cache) = setup();
        let first = cache
            .get_or_compute("iss", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        clock.advance(Duration::minutes(29));
        let second = cache
            .get_or_compute("iss", |_| -> Result<_, Infallible> { panic!("recomputed") })
            .unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn stale_entry_is_recomputed_at_ttl() {
        let (clock, cache) = setup();
        let first = cache
            .get_or_compute("iss", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        clock.advance(DEFAULT_TTL);
        let second = cache
            .get_or_compute("iss", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        assert_ne!(first[0].time, second[0].time);
        assert_eq!(second[0].time, clock.now());
    }

    #[test]
    fn satellites_have_separate_slots() {
        let (_clock, cache) = setup();
        cache
            .get_or_compute("iss", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        let mut computed = false;
        cache
            .get_or_compute("hubble", |now| {
                computed = true;
                Ok::<_, Infallible>(vec![point(now)])
            })
            .unwrap();
        assert!(computed);
    }

    #[test]
    fn stale_slots_are_evicted_on_insert() {
        let (clock, cache) = setup();
        for i in 0..100 {
            cache
                .get_or_compute(&format!("sat-{i}"), |now| Ok::<_, Infallible>(vec![point(now)]))
                .unwrap();
            clock.advance(Duration::hours(1));
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn fresh_slots_survive_eviction() {
        let (clock, cache) = setup();
        cache
            .get_or_compute("iss", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        clock.advance(Duration::minutes(10));
        cache
            .get_or_compute("hubble", |now| Ok::<_, Infallible>(vec![point(now)]))
            .unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_compute_keeps_previous_entry_out() {
        let (_clock, cache) = setup();
        let result = cache.get_or_compute("iss", |_| Err::<Vec<TrajectoryPoint>, _>("down"));
        assert_eq!(result.unwrap_err(), "down");
        let mut computed = false;
        cache
            .get_or_compute("iss", |now| {
                computed = true;
                Ok::<_, Infallible>(vec![point(now)])
            })
            .unwrap();
        assert!(computed);
    }
}
