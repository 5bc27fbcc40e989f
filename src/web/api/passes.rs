use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::predict::VisiblePass;
use crate::service::{PassFinderQuery, PassFinderReport};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::TleFields;
use crate::web::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PassesRequest {
    #[serde(flatten)]
    pub tle: TleFields,
    pub user_lat: f64,
    pub user_lng: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub passes: Vec<VisiblePass>,
}

#[utoipa::path(
    post,
    path = "/api/passes",
    tag = "passes",
    request_body = PassesRequest,
    responses(
        (status = 200, description = "Visible passes in the search window", body = PassesResponse),
        (status = 400, description = "Invalid TLE or observer", body = ErrorResponse),
        (status = 502, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn list_passes(
    State(state): State<AppState>,
    Json(request): Json<PassesRequest>,
) -> ApiResult<Json<PassesResponse>> {
    let satellite = request.tle.resolve(&state.default_satellite)?;
    let passes = state
        .service
        .find_visible_passes(&satellite, request.user_lat, request.user_lng)?;
    Ok(Json(PassesResponse { passes }))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PassFinderRequest {
    #[serde(flatten)]
    pub tle: TleFields,
    pub user_lat: f64,
    pub user_lng: f64,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub email: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/pass-finder",
    tag = "passes",
    request_body = PassFinderRequest,
    responses(
        (status = 200, description = "Next visible pass, with a reminder scheduled when an email is given", body = PassFinderReport),
        (status = 400, description = "Invalid TLE, observer, offset or email", body = ErrorResponse),
        (status = 500, description = "Notification store failure", body = ErrorResponse),
        (status = 502, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn pass_finder(
    State(state): State<AppState>,
    Json(request): Json<PassFinderRequest>,
) -> ApiResult<Json<PassFinderReport>> {
    let satellite = request.tle.resolve(&state.default_satellite)?;
    let report = state.service.find_next_pass(
        &satellite,
        &PassFinderQuery {
            latitude: request.user_lat,
            longitude: request.user_lng,
            utc_offset_minutes: request.utc_offset_minutes,
            email: request.email,
        },
    )?;
    Ok(Json(report))
}
