use serde_json::Value;
use utoipa::{Modify, OpenApi};

use crate::features::documents::{dtos as documents_dtos, handlers as documents_handlers};
use crate::features::media::media_types::MediaType;
use crate::features::media::{dtos as media_dtos, handlers as media_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Collections
        documents_handlers::list_documents,
        documents_handlers::get_document,
        documents_handlers::get_by_field,
        documents_handlers::create_document,
        documents_handlers::create_documents,
        documents_handlers::update_document,
        documents_handlers::update_documents,
        documents_handlers::delete_document,
        documents_handlers::delete_documents,
        // Media
        media_handlers::list_media,
        media_handlers::get_media,
        media_handlers::upload_media,
        media_handlers::serve_file,
        media_handlers::download_file,
    ),
    components(
        schemas(
            // Shared
            Meta,
            ApiResponse<Value>,
            // Collections
            documents_dtos::ListItemsDto,
            documents_dtos::BulkUpdateDto,
            documents_dtos::BulkIdsDto,
            documents_dtos::CreatedIdsDto,
            documents_dtos::AffectedCountDto,
            ApiResponse<documents_dtos::ListItemsDto>,
            ApiResponse<documents_dtos::CreatedIdsDto>,
            ApiResponse<documents_dtos::AffectedCountDto>,
            // Media
            MediaType,
            media_dtos::MediaPageDto,
            media_dtos::MediaUploadDto,
            media_dtos::MediaUploadForm,
            ApiResponse<media_dtos::MediaPageDto>,
            ApiResponse<media_dtos::MediaUploadDto>,
        )
    ),
    tags(
        (name = "documents", description = "Generic collections (users, appointments, lectures)"),
        (name = "media", description = "Media library, uploads and file streaming"),
    ),
    info(
        title = "Academy API",
        version = "0.1.0",
        description = "API documentation for Academy",
    )
)]
pub struct ApiDoc;

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_collection_and_media_paths() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/{collection}"));
        assert!(paths.iter().any(|p| p.as_str() == "/api/v1/media/upload"));
        assert!(paths
            .iter()
            .any(|p| p.as_str() == "/download/{mediaType}/{filename}"));
    }

    #[test]
    fn test_swagger_info_modifier() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "Overridden".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert_eq!(doc.info.description.as_deref(), Some("Overridden"));
    }
}
