use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::media::media_types::{get_file_size_limit, media_type_of, mime_type_for};
use crate::features::media::services::upload_pipeline::{FileUpload, UploadFields};

const DEFAULT_FILE_FIELD: &str = "file";

/// Parsed multipart upload
#[derive(Debug, Default)]
pub struct UploadForm {
    pub file: Option<FileUpload>,
    pub fields: UploadFields,
    /// Every text field, as sent
    pub text: Map<String, Value>,
}

impl UploadForm {
    pub fn url(&self) -> Option<&str> {
        self.text
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
    }
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::BadRequest(e.body_text())
    }
}

/// Read the form, validating the file part's type and size as it streams in
pub async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut form = UploadForm::default();
    let mut file_part: Option<String> = None;

    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let Some(original_name) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(multipart_error)?;
            form.text.insert(name, Value::String(value));
            continue;
        };

        if file_part.is_some() {
            return Err(AppError::BadRequest(format!("Unexpected field '{}'", name)));
        }

        let media_type = media_type_of(&original_name)
            .ok_or_else(|| AppError::BadRequest("Invalid file type.".to_string()))?;
        let limit = get_file_size_limit(media_type.as_str());

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if (data.len() + chunk.len()) as u64 > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "File size exceeds the limit for {}.",
                    media_type
                )));
            }
            data.extend_from_slice(&chunk);
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .unwrap_or_else(|| mime_type_for(media_type.as_str()).to_string());

        form.file = Some(FileUpload {
            original_name,
            content_type,
            media_type,
            data: Bytes::from(data),
        });
        file_part = Some(name);
    }

    let expected = form
        .text
        .get("fieldName")
        .and_then(Value::as_str)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FILE_FIELD);
    if let Some(part) = file_part.filter(|part| part != expected) {
        return Err(AppError::BadRequest(format!("Unexpected field '{}'", part)));
    }

    let text = |key: &str| {
        form.text
            .get(key)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let file_name = text("fileName");
    let alt_text = text("altText");
    let owner = text("owner");

    let owner = match owner {
        Some(raw) => Some(
            Uuid::parse_str(&raw)
                .map_err(|_| AppError::BadRequest(format!("Invalid owner id '{}'", raw)))?,
        ),
        None => {
            form.text.remove("owner");
            None
        }
    };
    form.fields = UploadFields {
        file_name,
        alt_text,
        owner,
    };

    Ok(form)
}
