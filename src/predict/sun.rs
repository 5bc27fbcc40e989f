//! Low-precision solar ephemeris and Earth-shadow geometry.
//!
//! Sun direction follows the Astronomical Almanac's low-precision formulae
//! (about 0.01° over 1950-2050), expressed in the same mean-equator inertial
//! frame SGP4 reports positions in. The shadow test treats Earth's shadow as
//! a cylinder of one equatorial radius.

use chrono::{DateTime, Utc};

use crate::predict::observer::EARTH_EQUATORIAL_RADIUS_KM;

const AU_KM: f64 = 149_597_870.7;
const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const J2000_JD: f64 = 2_451_545.0;

pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let seconds = t.timestamp() as f64 + f64::from(t.timestamp_subsec_nanos()) * 1e-9;
    UNIX_EPOCH_JD + seconds / 86_400.0
}

/// Geocentric inertial position of the sun in km.
pub fn sun_position_eci_km(t: DateTime<Utc>) -> [f64; 3] {
    let n = julian_date(t) - J2000_JD;
    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();
    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();
    let distance_au =
        1.000_14 - 0.016_71 * mean_anomaly.cos() - 0.000_14 * (2.0 * mean_anomaly).cos();

    let r = distance_au * AU_KM;
    [
        r * ecliptic_longitude.cos(),
        r * obliquity.cos() * ecliptic_longitude.sin(),
        r * obliquity.sin() * ecliptic_longitude.sin(),
    ]
}

/// Whether a satellite at `sat_eci_km` is outside Earth's shadow.
pub fn is_sunlit(sat_eci_km: [f64; 3], sun_eci_km: [f64; 3]) -> bool {
    let sun_norm = norm(sun_eci_km);
    if sun_norm == 0.0 {
        return false;
    }
    let s = [
        sun_eci_km[0] / sun_norm,
        sun_eci_km[1] / sun_norm,
        sun_eci_km[2] / sun_norm,
    ];
    let along = sat_eci_km[0] * s[0] + sat_eci_km[1] * s[1] + sat_eci_km[2] * s[2];
    if along >= 0.0 {
        return true;
    }
    let perpendicular = [
        sat_eci_km[0] - along * s[0],
        sat_eci_km[1] - along * s[1],
        sat_eci_km[2] - along * s[2],
    ];
    norm(perpendicular) > EARTH_EQUATORIAL_RADIUS_KM
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}
