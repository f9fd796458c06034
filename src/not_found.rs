use axum::{
    Json,
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};

use crate::ErrorResponse;

/// The fallback handler for paths that do not match any route.
pub async fn get_404_not_found(uri: Uri) -> Response {
    tracing::debug!("No route for {uri}");

    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(format!("no resource at {}", uri.path()))),
    )
        .into_response()
}
