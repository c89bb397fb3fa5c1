//! Background-removal handler.

use axum::body::Body;
use axum::extract::{Multipart, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Content types accepted for upload.
const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/png", "image/jpeg", "image/jpg"];

/// Removes the background from an uploaded image.
///
/// `POST /remove` with a multipart `file` part. Responds with the cut-out
/// as `image/png` and an `inline` content disposition carrying a generated
/// filename, so browsers render it in place.
pub async fn remove_background(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let field = loop {
        match multipart.next_field().await? {
            Some(field) if field.name() == Some("file") => break field,
            Some(_) => continue,
            None => return Err(ApiError::BadRequest("missing \"file\" part".to_string())),
        }
    };

    let content_type = field.content_type().unwrap_or_default().to_string();
    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(ApiError::BadRequest(
            "Only PNG and JPEG files are supported.".to_string(),
        ));
    }

    let data = field.bytes().await?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("empty upload".to_string()));
    }
    if data.len() > state.max_upload_bytes {
        return Err(ApiError::BadRequest(format!(
            "File too large - limit is {} bytes.",
            state.max_upload_bytes
        )));
    }

    // Inference is CPU-bound; keep it off the reactor threads.
    let remover = state.remover.clone();
    let result = tokio::task::spawn_blocking(move || remover.remove(&data))
        .await
        .map_err(|e| ApiError::Internal(format!("inference task failed: {e}")))??;

    let filename = format!("{}.png", Uuid::new_v4());
    tracing::debug!(bytes = result.len(), %filename, "background removed");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "image/png")
        .header(
            header::CONTENT_DISPOSITION,
            format!("inline; filename=\"{filename}\""),
        )
        .body(Body::from(result))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
