use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct MediaListQuery {
    /// Exact media type (`image`, `video`, `audio`, `file`)
    pub media_type: Option<String>,
    /// Case-insensitive pattern matched against fileName and altText
    pub search_query: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// Media documents carry an extra `signedUrl`
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaPageDto {
    pub items: Vec<Value>,
    pub total: i64,
    pub page: i64,
    pub pages: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MediaUploadDto {
    pub media: Value,
}

/// Multipart body of `POST /api/v1/media/upload`
#[allow(dead_code)]
#[derive(Debug, ToSchema)]
pub struct MediaUploadForm {
    /// Name of the file part (default `file`)
    #[schema(rename = "fieldName")]
    pub field_name: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub file: Option<Vec<u8>>,
    #[schema(rename = "fileName")]
    pub file_name: Option<String>,
    #[schema(rename = "altText")]
    pub alt_text: Option<String>,
    /// Required when no file is sent
    pub url: Option<String>,
    pub owner: Option<String>,
}
