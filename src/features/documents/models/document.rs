use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::FromRow;
use uuid::Uuid;

use crate::features::documents::schema::{
    format_date, ModelSchema, CREATED_AT_PATH, ID_PATH, UPDATED_AT_PATH,
};

/// Row of the `documents` table
#[derive(Debug, Clone, FromRow)]
pub struct StoredDocument {
    pub id: Uuid,
    pub collection: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredDocument {
    /// Render the document the way clients see it
    ///
    /// `_id` leads, declared top-level keys follow in declaration order,
    /// timestamps close. Undeclared keys are not emitted.
    pub fn to_json(&self, schema: &ModelSchema) -> Value {
        Value::Object(project(
            schema,
            self.id,
            &self.data,
            self.created_at,
            self.updated_at,
        ))
    }
}

pub fn project(
    schema: &ModelSchema,
    id: Uuid,
    data: &Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert(ID_PATH.to_string(), Value::String(id.to_string()));

    if let Some(fields) = data.as_object() {
        for key in schema.top_level_keys() {
            if let Some(value) = fields.get(key) {
                out.insert(key.to_string(), value.clone());
            }
        }
    }

    if schema.timestamps {
        out.insert(
            CREATED_AT_PATH.to_string(),
            Value::String(format_date(&created_at)),
        );
        out.insert(
            UPDATED_AT_PATH.to_string(),
            Value::String(format_date(&updated_at)),
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::schema::tests::TEST_SCHEMA;
    use serde_json::json;

    #[test]
    fn test_projection_orders_keys() {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let doc = StoredDocument {
            id,
            collection: "courses".into(),
            data: json!({
                "details": { "level": "advanced" },
                "legacy": true,
                "price": 10,
                "title": "Rust"
            }),
            created_at: now,
            updated_at: now,
        };

        let rendered = doc.to_json(&TEST_SCHEMA);
        let keys: Vec<&str> = rendered
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();

        assert_eq!(
            keys,
            vec!["_id", "title", "price", "details", "createdAt", "updatedAt"]
        );
        assert_eq!(rendered["_id"], json!(id.to_string()));
        assert!(rendered.get("legacy").is_none());
    }
}
