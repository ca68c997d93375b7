use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::Value;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppQuery;
use crate::features::media::dtos::{MediaListQuery, MediaPageDto, MediaUploadDto, MediaUploadForm};
use crate::features::media::media_types::mime_type_for;
use crate::features::media::services::{read_upload_form, MediaService};
use crate::shared::types::{ApiResponse, Meta};

/// List media with optional type and text filters
#[utoipa::path(
    get,
    path = "/api/v1/media",
    params(MediaListQuery),
    responses(
        (status = 200, description = "Media page", body = ApiResponse<MediaPageDto>),
        (status = 400, description = "Invalid search pattern")
    ),
    tag = "media"
)]
pub async fn list_media(
    State(service): State<Arc<MediaService>>,
    AppQuery(query): AppQuery<MediaListQuery>,
) -> Result<Json<ApiResponse<MediaPageDto>>> {
    let page = service.list_media(&query).await?;
    let total = page.total;
    Ok(Json(ApiResponse::success(
        Some(page),
        None,
        Some(Meta { total }),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/media/{id}",
    params(("id" = String, Path, description = "Media id or slug")),
    responses(
        (status = 200, description = "Media with signedUrl", body = ApiResponse<Value>),
        (status = 404, description = "Media not found")
    ),
    tag = "media"
)]
pub async fn get_media(
    State(service): State<Arc<MediaService>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let media = service.get_media(&id).await?;
    Ok(Json(ApiResponse::success(Some(media), None, None)))
}

/// Upload a media file, or record media hosted at `url`
///
/// Videos are stored in the cloud bucket and other files in local storage,
/// falling back to the cloud bucket when local storage fails.
#[utoipa::path(
    post,
    path = "/api/v1/media/upload",
    request_body(content = MediaUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Media stored", body = ApiResponse<MediaUploadDto>),
        (status = 400, description = "Invalid file type, unexpected field or missing file"),
        (status = 413, description = "File size exceeds the limit for its type"),
        (status = 500, description = "Local and cloud storage both failed")
    ),
    tag = "media"
)]
pub async fn upload_media(
    State(service): State<Arc<MediaService>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApiResponse<MediaUploadDto>>)> {
    let form = read_upload_form(multipart).await?;
    let (message, media) = service.upload(form).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(MediaUploadDto { media }),
            Some(message.to_string()),
            None,
        )),
    ))
}

async fn stream_file(
    service: &MediaService,
    media_type: &str,
    filename: &str,
    attachment: bool,
) -> Result<Response> {
    let (file, stream) = service.open_file(filename).await?;

    let content_type = file
        .content_type
        .clone()
        .unwrap_or_else(|| mime_type_for(media_type).to_string());

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, file.length);

    if attachment {
        let basename = filename.rsplit('/').next().unwrap_or(filename);
        builder = builder.header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", urlencoding::encode(basename)),
        );
    }

    builder
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(format!("Failed to build file response: {}", e)))
}

/// Stream a stored file
#[utoipa::path(
    get,
    path = "/uploads/{mediaType}/{filename}",
    params(
        ("mediaType" = String, Path, description = "image, video, audio or file"),
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found")
    ),
    tag = "media"
)]
pub async fn serve_file(
    State(service): State<Arc<MediaService>>,
    Path((media_type, filename)): Path<(String, String)>,
) -> Result<Response> {
    stream_file(&service, &media_type, &filename, false).await
}

/// Stream a stored file as an attachment
#[utoipa::path(
    get,
    path = "/download/{mediaType}/{filename}",
    params(
        ("mediaType" = String, Path, description = "image, video, audio or file"),
        ("filename" = String, Path, description = "Stored file name")
    ),
    responses(
        (status = 200, description = "File content with Content-Disposition"),
        (status = 404, description = "File not found")
    ),
    tag = "media"
)]
pub async fn download_file(
    State(service): State<Arc<MediaService>>,
    Path((media_type, filename)): Path<(String, String)>,
) -> Result<Response> {
    stream_file(&service, &media_type, &filename, true).await
}
