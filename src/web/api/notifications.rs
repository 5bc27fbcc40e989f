use axum::{
    extract::{Path, State},
    Json,
};

use crate::scheduler::NotificationRecord;
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::AppState;

#[utoipa::path(
    get,
    path = "/api/notifications/{id}",
    tag = "notifications",
    params(
        ("id" = i64, Path, description = "Notification id")
    ),
    responses(
        (status = 200, description = "Stored notification", body = NotificationRecord),
        (status = 404, description = "Notification not found", body = ErrorResponse)
    )
)]
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<NotificationRecord>> {
    Ok(Json(state.service.notification(id)?))
}
