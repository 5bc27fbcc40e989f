use utoipa::OpenApi;

use super::api::error::ErrorResponse;
use super::api::passes::{PassFinderRequest, PassesRequest, PassesResponse};
use super::api::TleFields;

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::location::current_location,
        super::api::passes::list_passes,
        super::api::passes::pass_finder,
        super::api::notifications::get_notification,
    ),
    components(
        schemas(
            TleFields,
            PassesRequest,
            PassesResponse,
            PassFinderRequest,
            ErrorResponse,
            crate::predict::VisiblePass,
            crate::tracker::CurrentLocation,
            crate::tracker::TrajectoryPoint,
            crate::service::PassFinderReport,
            crate::service::PassInfo,
            crate::service::ReportQuery,
            crate::scheduler::NotificationRecord,
            crate::scheduler::NotificationStatus,
        )
    ),
    info(
        title = "Pass-O-Mat API",
        description = "Visible satellite pass prediction and pass reminders",
        version = "0.1.0"
    ),
    tags(
        (name = "tracking", description = "Live satellite position"),
        (name = "passes", description = "Visible pass search"),
        (name = "notifications", description = "Pass reminder status")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/current",
            "/api/passes",
            "/api/pass-finder",
            "/api/notifications/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path}");
        }
    }
}
