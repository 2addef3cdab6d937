//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Events Admin API",
        version = "0.1.0",
        description = "Back office API for creating and curating public events"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api/events", api = domain_events::ApiDoc),
        (path = "/api/admin", api = domain_events::AdminApiDoc)
    ),
    tags(
        (name = "events", description = "Event management backed by MongoDB and a blob store"),
        (name = "admin", description = "Profile of the signed-in administrator")
    )
)]
pub struct ApiDoc;
