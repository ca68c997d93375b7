use std::sync::Arc;

use axum::body::Bytes;
use futures::future::try_join_all;
use futures::Stream;
use serde_json::Value;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::models::{project, StoredDocument};
use crate::features::documents::query::{page_skip, parse_sort_spec, Condition, Filter, Scalar};
use crate::features::documents::DocumentService;
use crate::features::media::dtos::{MediaListQuery, MediaPageDto};
use crate::features::media::media_types::MediaType;
use crate::features::media::models::MEDIA_SCHEMA;
use crate::features::media::services::upload_form::UploadForm;
use crate::features::media::services::upload_pipeline::UploadPipeline;
use crate::modules::storage::{CloudClient, GridFile, GridStore};
use crate::shared::constants::{DEFAULT_MEDIA_LIST_LIMIT, MAX_PAGE_SIZE};

pub struct MediaService {
    documents: Arc<DocumentService>,
    grid: Arc<GridStore>,
    cloud: Arc<CloudClient>,
    pipeline: UploadPipeline,
}

impl MediaService {
    pub fn new(documents: Arc<DocumentService>, grid: Arc<GridStore>, cloud: Arc<CloudClient>) -> Self {
        let pipeline = UploadPipeline::new(grid.clone(), cloud.clone(), documents.clone());
        Self {
            documents,
            grid,
            cloud,
            pipeline,
        }
    }

    /// Media page sorted by fileName, each item with its `signedUrl`
    pub async fn list_media(&self, query: &MediaListQuery) -> Result<MediaPageDto> {
        let page = query.page.unwrap_or(1).max(1);
        let limit = query
            .limit
            .unwrap_or(DEFAULT_MEDIA_LIST_LIMIT)
            .clamp(1, MAX_PAGE_SIZE);

        let mut filter = Filter::default();
        if let Some(media_type) = query.media_type.as_deref().filter(|t| !t.is_empty()) {
            filter.set(
                "mediaType",
                Condition::Equals(Scalar::Text(media_type.to_string())),
            );
        }
        if let Some(search) = query.search_query.as_deref().filter(|q| !q.is_empty()) {
            let condition = Condition::regex(search);
            filter.any_of = Some(vec![
                ("fileName".to_string(), condition.clone()),
                ("altText".to_string(), condition),
            ]);
        }
        let sort = parse_sort_spec("fileName", &MEDIA_SCHEMA);
        let skip = page_skip(page, limit, 0)?;

        let (docs, total) = tokio::try_join!(
            self.documents
                .find_documents(&MEDIA_SCHEMA, &filter, &sort, skip, Some(limit)),
            self.documents.count(&MEDIA_SCHEMA, &filter),
        )?;

        let items = try_join_all(docs.iter().map(|doc| self.with_signed_url(doc))).await?;

        Ok(MediaPageDto {
            items,
            total,
            page,
            pages: (total + limit - 1) / limit,
        })
    }

    /// Media by id, or by slug when `id` is not a UUID
    pub async fn get_media(&self, id: &str) -> Result<Value> {
        let doc = match Uuid::parse_str(id) {
            Ok(id) => self.documents.get_by_id(&MEDIA_SCHEMA, id).await?,
            Err(_) => self.documents.get_by_slug(&MEDIA_SCHEMA, id).await?,
        };
        self.with_signed_url(&doc).await
    }

    /// Videos get a presigned cloud URL, other media keep their `url`
    async fn with_signed_url(&self, doc: &StoredDocument) -> Result<Value> {
        let mut media = project(
            &MEDIA_SCHEMA,
            doc.id,
            &doc.data,
            doc.created_at,
            doc.updated_at,
        );

        let url = media
            .get("url")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let is_video = media.get("mediaType").and_then(Value::as_str) == Some(MediaType::Video.as_str());

        let signed_url = match self.cloud.extract_key_from_url(&url) {
            Some(key) if is_video => self.cloud.presigned_get(&key).await?,
            _ => url,
        };

        media.insert("signedUrl".to_string(), Value::String(signed_url));
        Ok(Value::Object(media))
    }

    /// Upload a file, or record media by `url` when no file was sent
    ///
    /// Returns the response message and the stored media document.
    pub async fn upload(&self, form: UploadForm) -> Result<(&'static str, Value)> {
        let (message, id) = match (&form.file, form.url()) {
            (Some(file), _) => (
                "File uploaded successfully",
                self.pipeline.process_file_upload(file, &form.fields).await?,
            ),
            (None, Some(_)) => (
                "File data updated successfully",
                self.pipeline
                    .create_or_update_media(&Value::Object(form.text.clone()))
                    .await?,
            ),
            (None, None) => {
                return Err(AppError::BadRequest(
                    "A file or a url is required".to_string(),
                ))
            }
        };

        let media = self.documents.get_by_id(&MEDIA_SCHEMA, id).await?;
        Ok((message, media.to_json(&MEDIA_SCHEMA)))
    }

    /// Newest stored file named `filename` and its content
    pub async fn open_file(
        &self,
        filename: &str,
    ) -> Result<(
        GridFile,
        impl Stream<Item = std::result::Result<Bytes, sqlx::Error>> + Send + 'static,
    )> {
        let file = self
            .grid
            .find_by_name(filename)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;
        let stream = self.grid.open_download_stream(&file);
        Ok((file, stream))
    }
}
