use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::types::{EventKind, RawEvent};

pub const COARSE_STEP_SECONDS: i64 = 60; // 1 minute for initial scan
const FINE_STEP_MILLIS: i64 = 1000; // 1 second for refinement

/// Scan `elevation` over `[start, end]` and report horizon events in time
/// order.
///
/// Rise and set are refined by bisection on the `horizon_deg` crossing;
/// culmination by ternary search around the highest coarse sample. A pass
/// already in progress at `start` produces no rise, and one still in
/// progress at `end` produces no set.
pub fn find_horizon_events<F>(
    mut elevation: F,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    step: Duration,
    horizon_deg: f64,
) -> Result<Vec<RawEvent>, PredictError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let mut events = Vec::new();
    if end <= start || step <= Duration::zero() {
        return Ok(events);
    }

    let mut cursor = start;
    let first = elevation(cursor)?;
    let mut prev_visible = first >= horizon_deg;
    let mut pass_start = if prev_visible { Some(start) } else { None };
    let (mut max_el_time, mut max_el) = (start, first);

    loop {
        let next = (cursor + step).min(end);
        let el = elevation(next)?;
        let visible = el >= horizon_deg;

        if visible && !prev_visible {
            let rise = refine_crossing(&mut elevation, cursor, next, horizon_deg, true)?;
            events.push(RawEvent::new(rise, EventKind::Rise));
            pass_start = Some(rise);
            max_el_time = next;
            max_el = el;
        } else if visible && el > max_el {
            max_el_time = next;
            max_el = el;
        } else if !visible && prev_visible {
            let set = refine_crossing(&mut elevation, cursor, next, horizon_deg, false)?;
            let lower = pass_start.unwrap_or(start);
            if max_el_time > start {
                let peak = refine_peak(&mut elevation, lower, set, max_el_time, step)?;
                events.push(RawEvent::new(peak, EventKind::Culmination));
            }
            events.push(RawEvent::new(set, EventKind::Set));
            pass_start = None;
        }

        prev_visible = visible;
        cursor = next;
        if cursor >= end {
            break;
        }
    }

    // Pass in progress at end of window: report the peak if it's behind us.
    if let Some(lower) = pass_start {
        if max_el_time > lower && max_el_time < end {
            let peak = refine_peak(&mut elevation, lower, end, max_el_time, step)?;
            events.push(RawEvent::new(peak, EventKind::Culmination));
        }
    }

    Ok(events)
}

/// Binary search to find exact horizon crossing time
fn refine_crossing<F>(
    elevation: &mut F,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    horizon_deg: f64,
    rising: bool,
) -> Result<DateTime<Utc>, PredictError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let mut low = before;
    let mut high = after;

    while (high - low).num_milliseconds() > FINE_STEP_MILLIS {
        let mid = low + (high - low) / 2;
        let above = elevation(mid)? >= horizon_deg;
        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    Ok(if rising { high } else { low })
}

/// Ternary search for the elevation maximum near a coarse peak sample,
/// kept strictly inside `(lower, upper)`.
fn refine_peak<F>(
    elevation: &mut F,
    lower: DateTime<Utc>,
    upper: DateTime<Utc>,
    around: DateTime<Utc>,
    step: Duration,
) -> Result<DateTime<Utc>, PredictError>
where
    F: FnMut(DateTime<Utc>) -> Result<f64, PredictError>,
{
    let margin = Duration::milliseconds(FINE_STEP_MILLIS);
    let mut low = (around - step).max(lower + margin);
    let mut high = (around + step).min(upper - margin);
    if high <= low {
        return Ok(around.clamp(lower, upper));
    }

    while (high - low).num_milliseconds() > FINE_STEP_MILLIS {
        let third = (high - low) / 3;
        let m1 = low + third;
        let m2 = high - third;
        if elevation(m1)? < elevation(m2)? {
            low = m1;
        } else {
            high = m2;
        }
    }

    Ok(low + (high - low) / 2)
}
