//! Primary / fallback media upload
//!
//! Videos go to the cloud bucket, everything else to the local grid store.
//! When storing or recording fails, the file is uploaded to the cloud
//! bucket instead.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::DocumentService;
use crate::features::media::media_types::MediaType;
use crate::features::media::models::MEDIA_SCHEMA;
use crate::modules::storage::{CloudClient, GridStore};

/// A file part received by the upload endpoint
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub original_name: String,
    pub content_type: String,
    pub media_type: MediaType,
    pub data: Bytes,
}

/// Text fields sent with an upload
#[derive(Debug, Clone, Default)]
pub struct UploadFields {
    pub file_name: Option<String>,
    pub alt_text: Option<String>,
    pub owner: Option<Uuid>,
}

/// A place media files are written to
#[async_trait]
pub trait MediaStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Store the file and return the URL recorded for it
    async fn put_object(&self, file: &FileUpload) -> Result<String>;
}

/// Persistence of media records
#[async_trait]
pub trait MediaCatalog: Send + Sync {
    /// Update the record with the same `url`, or create it
    async fn upsert_by_url(&self, record: &Value) -> Result<Uuid>;
}

#[async_trait]
impl MediaStore for GridStore {
    fn name(&self) -> &'static str {
        "local storage"
    }

    async fn put_object(&self, file: &FileUpload) -> Result<String> {
        self.upload(
            &file.original_name,
            Some(&file.content_type),
            json!({ "mediaType": file.media_type }),
            &file.data,
        )
        .await?;
        Ok(format!("/uploads/{}/{}", file.media_type, file.original_name))
    }
}

#[async_trait]
impl MediaStore for CloudClient {
    fn name(&self) -> &'static str {
        "cloud storage"
    }

    async fn put_object(&self, file: &FileUpload) -> Result<String> {
        let key = self.object_key(&file.original_name);
        self.upload(&key, &file.data, &file.content_type).await?;
        Ok(self.public_url(&key))
    }
}

#[async_trait]
impl MediaCatalog for DocumentService {
    async fn upsert_by_url(&self, record: &Value) -> Result<Uuid> {
        self.upsert_by_field(&MEDIA_SCHEMA, "url", record).await
    }
}

/// `{type}-{unix_millis}-{0..9999}`
fn generate_slug(media_type: MediaType) -> String {
    let suffix = Uuid::new_v4().as_u128() % 10_000;
    format!("{}-{}-{}", media_type, Utc::now().timestamp_millis(), suffix)
}

fn media_record(file: &FileUpload, fields: &UploadFields, url: &str) -> Value {
    let file_name = fields
        .file_name
        .as_deref()
        .filter(|n| !n.is_empty())
        .unwrap_or(&file.original_name);

    json!({
        "fileName": file_name,
        "altText": fields.alt_text.as_deref().unwrap_or(""),
        "slug": generate_slug(file.media_type),
        "url": url,
        "owner": fields.owner.map(|o| o.to_string()),
        "mediaType": file.media_type,
    })
}

pub struct UploadPipeline {
    local: Arc<dyn MediaStore>,
    cloud: Arc<dyn MediaStore>,
    catalog: Arc<dyn MediaCatalog>,
}

impl UploadPipeline {
    pub fn new(
        local: Arc<dyn MediaStore>,
        cloud: Arc<dyn MediaStore>,
        catalog: Arc<dyn MediaCatalog>,
    ) -> Self {
        Self {
            local,
            cloud,
            catalog,
        }
    }

    fn primary(&self, media_type: MediaType) -> &Arc<dyn MediaStore> {
        match media_type {
            MediaType::Video => &self.cloud,
            _ => &self.local,
        }
    }

    async fn store_and_record(
        &self,
        store: &Arc<dyn MediaStore>,
        file: &FileUpload,
        fields: &UploadFields,
    ) -> Result<Uuid> {
        let url = store.put_object(file).await?;
        let record = media_record(file, fields, &url);
        let id = self.catalog.upsert_by_url(&record).await?;
        info!(
            media_id = %id,
            store = store.name(),
            file = %file.original_name,
            "Media uploaded"
        );
        Ok(id)
    }

    /// Store the file and its record, returning the media id
    pub async fn process_file_upload(
        &self,
        file: &FileUpload,
        fields: &UploadFields,
    ) -> Result<Uuid> {
        let primary = self.primary(file.media_type);

        match self.store_and_record(primary, file, fields).await {
            Ok(id) => Ok(id),
            Err(primary_error) => {
                warn!(
                    file = %file.original_name,
                    store = primary.name(),
                    "Primary upload failed: {}",
                    primary_error
                );

                self.store_and_record(&self.cloud, file, fields)
                    .await
                    .map_err(|fallback_error| {
                        error!(
                            file = %file.original_name,
                            "Fallback upload failed: {}",
                            fallback_error
                        );
                        AppError::Internal(
                            "Failed to upload media to both local storage and cloud storage."
                                .to_string(),
                        )
                    })
            }
        }
    }

    /// Record media that is already hosted elsewhere
    pub async fn create_or_update_media(&self, record: &Value) -> Result<Uuid> {
        self.catalog.upsert_by_url(record).await
    }
}
