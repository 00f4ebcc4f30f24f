// handler/files.rs
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::{
    dtos::ticketdtos::AttachmentResponseDto,
    error::HttpError,
    middleware::JWTAuthMiddeware,
    service::file_storage::sanitize_file_name,
    AppState,
};

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn files_handler(max_upload_bytes: usize) -> Router {
    Router::new()
        .route(
            "/upload/:ticket_id",
            post(upload_file).layer(DefaultBodyLimit::max(max_upload_bytes + MULTIPART_OVERHEAD)),
        )
        .route("/download/:attachment_id", get(download_file))
}

pub async fn upload_file(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(ticket_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| HttpError::bad_request(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("file").to_string();
        let content_type = field.content_type().map(|c| c.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| HttpError::bad_request(e.to_string()))?;

        upload = Some((file_name, content_type, bytes.to_vec()));
        break;
    }

    let (file_name, content_type, bytes) =
        upload.ok_or_else(|| HttpError::bad_request("Missing multipart field 'file'"))?;

    let attachment = app_state
        .attachment_service
        .upload(&auth.user, ticket_id, file_name, content_type, bytes)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "status": "success",
            "data": AttachmentResponseDto::from_attachment(&attachment)
        })),
    ))
}

pub async fn download_file(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth): Extension<JWTAuthMiddeware>,
    Path(attachment_id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpError> {
    let (attachment, bytes) = app_state
        .attachment_service
        .download(&auth.user, attachment_id)
        .await?;

    let disposition = format!(
        "attachment; filename=\"{}\"",
        sanitize_file_name(&attachment.file_name)
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
