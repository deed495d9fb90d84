//! OpenAPI documentation.

use utoipa::OpenApi;

use crate::error;
use crate::handlers;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Picstore API",
        version = "0.1.0",
        description = "Store JPEG, PNG and GIF photos and fetch them back, either as uploaded or as a 300x300 thumbnail."
    ),
    paths(
        handlers::photo_upload::upload_photo,
        handlers::photo_get::get_photo,
        handlers::health::health,
    ),
    components(schemas(
        handlers::photo_upload::UploadResponse,
        handlers::health::HealthResponse,
        error::ErrorResponse,
    )),
    tags(
        (name = "photos", description = "Photo upload and retrieval"),
        (name = "health", description = "Liveness")
    )
)]
pub struct ApiDoc;
