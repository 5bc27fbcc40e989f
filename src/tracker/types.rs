use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, utoipa::ToSchema)]
pub struct TrajectoryPoint {
    pub time: DateTime<Utc>,
    #[serde(rename = "latitude")]
    pub latitude_deg: f64,
    #[serde(rename = "longitude")]
    pub longitude_deg: f64,
    #[serde(rename = "altitude")]
    pub altitude_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CurrentLocation {
    #[serde(rename = "latitude")]
    pub latitude_deg: f64,
    #[serde(rename = "longitude")]
    pub longitude_deg: f64,
    #[serde(rename = "altitude")]
    pub altitude_km: f64,
    pub velocity_kmh: f64,
    pub trajectory: Vec<TrajectoryPoint>,
}
