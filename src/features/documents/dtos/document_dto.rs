use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// One page of a list query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ListItemsDto {
    /// Documents, distinct values or `{ _id, items }` groups
    pub items: Vec<Value>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Query of `GET /{key}/{value}`
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FieldQuery {
    /// Return the first match as an object instead of a list
    pub single: Option<String>,
    /// Sort spec (`-createdAt title`) or `rand` for a random sample
    pub sort: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkUpdateDto {
    #[validate(length(min = 1, max = 1000, message = "Between 1 and 1000 ids are required"))]
    pub ids: Vec<Uuid>,
    /// Fields merged into every listed document
    pub update: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkIdsDto {
    #[validate(length(min = 1, max = 1000, message = "Between 1 and 1000 ids are required"))]
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedIdsDto {
    pub ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AffectedCountDto {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_ids_bounds() {
        assert!(BulkIdsDto { ids: Vec::new() }.validate().is_err());
        assert!(BulkIdsDto {
            ids: vec![Uuid::now_v7()]
        }
        .validate()
        .is_ok());
        assert!(BulkIdsDto {
            ids: (0..1001).map(|_| Uuid::now_v7()).collect()
        }
        .validate()
        .is_err());
    }
}
