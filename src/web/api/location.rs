use axum::{extract::State, Json};

use crate::tracker::CurrentLocation;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::api::TleFields;
use crate::web::AppState;

#[utoipa::path(
    post,
    path = "/api/current",
    tag = "tracking",
    request_body = TleFields,
    responses(
        (status = 200, description = "Current subpoint and upcoming ground track", body = CurrentLocation),
        (status = 400, description = "Invalid TLE", body = ErrorResponse),
        (status = 502, description = "Propagation failed", body = ErrorResponse)
    )
)]
pub async fn current_location(
    State(state): State<AppState>,
    Json(request): Json<TleFields>,
) -> ApiResult<Json<CurrentLocation>> {
    let satellite = request.resolve(&state.default_satellite)?;
    let location = state.service.current_location(&satellite)?;
    Ok(Json(location))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::web::api::testing::state;
    use axum::{http::StatusCode, response::IntoResponse};
    use chrono::Duration;

    #[tokio::test]
    async fn returns_location_with_trajectory() {
        let Json(location) = current_location(State(state(Duration::hours(1))), Json(TleFields::default()))
            .await
            .unwrap();
        assert_eq!(location.trajectory.len(), 31);

        let json = serde_json::to_value(&location).unwrap();
        assert!(json.get("latitude").is_some());
        assert!(json.get("velocity_kmh").is_some());
        assert!(json["trajectory"][0].get("altitude").is_some());
    }

    #[tokio::test]
    async fn malformed_tle_is_bad_request() {
        let request = TleFields {
            name: None,
            line1: Some("1 garbage".into()),
            line2: Some("2 garbage".into()),
        };
        let response = current_location(State(state(Duration::hours(1))), Json(request))
            .await
            .unwrap_err()
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
