use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppQuery, QueryPairs};
use crate::features::documents::dtos::{
    AffectedCountDto, BulkIdsDto, BulkUpdateDto, CreatedIdsDto, FieldQuery, ListItemsDto,
};
use crate::features::documents::query::ListParams;
use crate::features::documents::routes::CollectionState;
use crate::shared::constants::MAX_BULK_ITEMS;
use crate::shared::types::{ApiResponse, Meta};

pub(crate) fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid id '{}'", raw)))
}

/// List documents with dynamic filters
///
/// Reserved parameters control paging, keyword search, sorting and the
/// distinct / group-by / random modes. Every other parameter is matched
/// against the collection's fields (`field`, `minField`, `maxField`,
/// `moreField`, `lessField`, `containsField`).
#[utoipa::path(
    get,
    path = "/api/v1/{collection}",
    params(
        ("collection" = String, Path, description = "users, appointments, lectures or media"),
        ("page" = Option<i64>, Query, description = "Page number (default 1)"),
        ("limit" = Option<i64>, Query, description = "Page size (default 24, max 100)"),
        ("offset" = Option<i64>, Query, description = "Extra documents to skip"),
        ("keyword" = Option<String>, Query, description = "Case-insensitive search over text fields"),
        ("language" = Option<String>, Query, description = "Search `field.{language}` where declared"),
        ("sortField" = Option<String>, Query, description = "Field to sort on"),
        ("sortOrder" = Option<String>, Query, description = "`asc` or anything else for descending"),
        ("distinctField" = Option<String>, Query, description = "Return distinct values of this field"),
        ("groupByField" = Option<String>, Query, description = "Group documents by this field"),
        ("random" = Option<bool>, Query, description = "Random sample of `limit` documents")
    ),
    responses(
        (status = 200, description = "Documents", body = ApiResponse<ListItemsDto>),
        (status = 400, description = "Invalid filter value or keyword too long")
    ),
    tag = "documents"
)]
pub async fn list_documents(
    State(state): State<CollectionState>,
    QueryPairs(pairs): QueryPairs,
) -> Result<Json<ApiResponse<ListItemsDto>>> {
    let params = ListParams::from_pairs(pairs)?;
    let page = state.service.list(state.schema, &params).await?;
    let total = page.total;
    Ok(Json(ApiResponse::success(
        Some(page),
        None,
        Some(Meta { total }),
    )))
}

/// Get a document by id, or by slug when the id is not a UUID
#[utoipa::path(
    get,
    path = "/api/v1/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id or slug")
    ),
    responses(
        (status = 200, description = "Document", body = ApiResponse<Value>),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn get_document(
    State(state): State<CollectionState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Value>>> {
    let doc = match Uuid::parse_str(&id) {
        Ok(id) => state.service.get_by_id(state.schema, id).await?,
        Err(_) => state.service.get_by_slug(state.schema, &id).await?,
    };
    Ok(Json(ApiResponse::success(
        Some(doc.to_json(state.schema)),
        None,
        None,
    )))
}

/// Read one field of a document, or find documents by a field value
///
/// When `key` is a document id, `value` names the field to read and the
/// response is `{ field: value }`. Otherwise documents with `key == value`
/// are returned.
#[utoipa::path(
    get,
    path = "/api/v1/{collection}/{key}/{value}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("key" = String, Path, description = "Document id or field name"),
        ("value" = String, Path, description = "Field name or field value"),
        FieldQuery
    ),
    responses(
        (status = 200, description = "Field value or matching documents", body = ApiResponse<Value>),
        (status = 400, description = "Unknown field"),
        (status = 404, description = "No matching document")
    ),
    tag = "documents"
)]
pub async fn get_by_field(
    State(state): State<CollectionState>,
    Path((key, value)): Path<(String, String)>,
    AppQuery(query): AppQuery<FieldQuery>,
) -> Result<Json<ApiResponse<Value>>> {
    let result = match Uuid::parse_str(&key) {
        Ok(id) => {
            state
                .service
                .get_field_by_id(state.schema, id, &value)
                .await?
        }
        Err(_) => {
            state
                .service
                .find_by_field(state.schema, &key, &value, &query)
                .await?
        }
    };
    Ok(Json(ApiResponse::success(Some(result), None, None)))
}

#[utoipa::path(
    post,
    path = "/api/v1/{collection}",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = Value,
    responses(
        (status = 201, description = "Document created", body = ApiResponse<Value>),
        (status = 400, description = "Body could not be cast to the collection's fields")
    ),
    tag = "documents"
)]
pub async fn create_document(
    State(state): State<CollectionState>,
    AppJson(body): AppJson<Value>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>)> {
    let doc = state.service.create(state.schema, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(doc.to_json(state.schema)),
            Some(format!("{} created successfully", state.schema.name)),
            None,
        )),
    ))
}

/// Create several documents in one transaction
#[utoipa::path(
    post,
    path = "/api/v1/{collection}/bulk",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = Vec<Value>,
    responses(
        (status = 201, description = "Documents created", body = ApiResponse<CreatedIdsDto>),
        (status = 400, description = "Empty batch, oversized batch or uncastable body")
    ),
    tag = "documents"
)]
pub async fn create_documents(
    State(state): State<CollectionState>,
    AppJson(bodies): AppJson<Vec<Value>>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedIdsDto>>)> {
    if bodies.is_empty() || bodies.len() > MAX_BULK_ITEMS {
        return Err(AppError::Validation(format!(
            "Between 1 and {} documents are required",
            MAX_BULK_ITEMS
        )));
    }

    let docs = state.service.create_many(state.schema, &bodies).await?;
    let ids = docs.iter().map(|d| d.id).collect();
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(CreatedIdsDto { ids }),
            Some(format!("{} documents created", docs.len())),
            None,
        )),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id")
    ),
    request_body = Value,
    responses(
        (status = 200, description = "Document updated", body = ApiResponse<Value>),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn update_document(
    State(state): State<CollectionState>,
    Path(id): Path<String>,
    AppJson(body): AppJson<Value>,
) -> Result<Json<ApiResponse<Value>>> {
    let id = parse_id(&id)?;
    let doc = state.service.update(state.schema, id, &body).await?;
    Ok(Json(ApiResponse::success(
        Some(doc.to_json(state.schema)),
        Some(format!("{} updated successfully", state.schema.name)),
        None,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/{collection}/bulk",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = BulkUpdateDto,
    responses(
        (status = 200, description = "Number of modified documents", body = ApiResponse<AffectedCountDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "documents"
)]
pub async fn update_documents(
    State(state): State<CollectionState>,
    AppJson(dto): AppJson<BulkUpdateDto>,
) -> Result<Json<ApiResponse<AffectedCountDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let count = state
        .service
        .update_many(state.schema, &dto.ids, &dto.update)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(AffectedCountDto { count }),
        None,
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/{collection}/{id}",
    params(
        ("collection" = String, Path, description = "Collection name"),
        ("id" = String, Path, description = "Document id")
    ),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404, description = "Document not found")
    ),
    tag = "documents"
)]
pub async fn delete_document(
    State(state): State<CollectionState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>> {
    let id = parse_id(&id)?;
    state.service.delete(state.schema, id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some(format!("{} deleted successfully", state.schema.name)),
        None,
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/{collection}/bulk",
    params(("collection" = String, Path, description = "Collection name")),
    request_body = BulkIdsDto,
    responses(
        (status = 200, description = "Number of deleted documents", body = ApiResponse<AffectedCountDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "documents"
)]
pub async fn delete_documents(
    State(state): State<CollectionState>,
    AppJson(dto): AppJson<BulkIdsDto>,
) -> Result<Json<ApiResponse<AffectedCountDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let count = state.service.delete_many(state.schema, &dto.ids).await?;
    Ok(Json(ApiResponse::success(
        Some(AffectedCountDto { count }),
        None,
        None,
    )))
}
