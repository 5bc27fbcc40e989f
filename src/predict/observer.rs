use crate::predict::error::PredictError;

// WGS-84
pub const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
pub const EARTH_ECCENTRICITY_SQ: f64 = 0.006_694_379_990_14;

/// Geodetic position of someone watching the sky.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Result<Self, PredictError> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(PredictError::InvalidObserver(format!(
                "latitude {} out of range",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(PredictError::InvalidObserver(format!(
                "longitude {} out of range",
                longitude_deg
            )));
        }
        Ok(Self {
            latitude_deg,
            longitude_deg,
            altitude_m: 0.0,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * lat.cos() * lon.cos(),
            (n + alt_km) * lat.cos() * lon.sin(),
            (n * (1.0 - EARTH_ECCENTRICITY_SQ) + alt_km) * sin_lat,
        ]
    }

    /// Elevation in degrees of an ECEF point above this observer's horizon.
    pub fn elevation_deg(&self, target_ecef_km: [f64; 3]) -> f64 {
        let sta = self.position_ecef_km();
        let dr = [
            target_ecef_km[0] - sta[0],
            target_ecef_km[1] - sta[1],
            target_ecef_km[2] - sta[2],
        ];
        let range = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
        if range <= 0.0 {
            return 90.0;
        }
        let (_, _, up) = ecef_to_enu(dr, self.lat_rad(), self.lon_rad());
        (up / range).clamp(-1.0, 1.0).asin().to_degrees()
    }
}

pub fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

/// Geodetic latitude/longitude (deg) and altitude (km) of an ECEF point.
/// Bowring-style fixed-point iteration on latitude.
pub fn ecef_to_geodetic(ecef_km: [f64; 3]) -> (f64, f64, f64) {
    let [x, y, z] = ecef_km;
    let lon = y.atan2(x);
    let p = (x * x + y * y).sqrt();

    let mut lat = z.atan2(p * (1.0 - EARTH_ECCENTRICITY_SQ));
    let mut alt = 0.0;
    for _ in 0..10 {
        let sin_lat = lat.sin();
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * sin_lat * sin_lat).sqrt();
        alt = if lat.cos().abs() > 1e-10 {
            p / lat.cos() - n
        } else {
            z.abs() - n * (1.0 - EARTH_ECCENTRICITY_SQ)
        };
        let next = z.atan2(p * (1.0 - EARTH_ECCENTRICITY_SQ * n / (n + alt)));
        if (next - lat).abs() < 1e-12 {
            lat = next;
            break;
        }
        lat = next;
    }

    (lat.to_degrees(), lon.to_degrees(), alt)
}
