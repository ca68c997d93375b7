use serde_json::{json, Map, Value};

use crate::features::documents::schema::{FieldType, ModelSchema};

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub path: String,
    pub ty: FieldType,
    pub descending: bool,
}

/// Ordered sort keys; an empty sort still orders by insertion
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sort {
    pub keys: Vec<SortKey>,
}

impl Sort {
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Mongo-style sort document, for logs
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for key in &self.keys {
            doc.insert(key.path.clone(), json!(if key.descending { -1 } else { 1 }));
        }
        Value::Object(doc)
    }
}

/// Sort on `sort_field` when it is sortable; only `asc` sorts ascending
pub fn build_sort(
    sort_field: Option<&str>,
    sort_order: &str,
    sortable_fields: &[&str],
    schema: &ModelSchema,
) -> Sort {
    let keys = sort_field
        .filter(|field| sortable_fields.contains(field))
        .and_then(|field| {
            schema.field_type(field).map(|ty| SortKey {
                path: field.to_string(),
                ty,
                descending: sort_order != "asc",
            })
        })
        .into_iter()
        .collect();

    Sort { keys }
}

/// Parse `"-price title"` / `"price,-title"`; unknown paths are skipped
pub fn parse_sort_spec(spec: &str, schema: &ModelSchema) -> Sort {
    let keys = spec
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .filter_map(|part| {
            let (path, descending) = match part.strip_prefix('-') {
                Some(path) => (path, true),
                None => (part.strip_prefix('+').unwrap_or(part), false),
            };
            schema.field_type(path).map(|ty| SortKey {
                path: path.to_string(),
                ty,
                descending,
            })
        })
        .collect();

    Sort { keys }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::schema::tests::TEST_SCHEMA;

    #[test]
    fn test_build_sort_orders() {
        let sortable = TEST_SCHEMA.sortable_fields();

        let asc = build_sort(Some("price"), "asc", &sortable, &TEST_SCHEMA);
        assert_eq!(asc.to_document(), json!({ "price": 1 }));
        assert_eq!(asc.keys[0].ty, FieldType::Number);

        let desc = build_sort(Some("price"), "ascending", &sortable, &TEST_SCHEMA);
        assert_eq!(desc.to_document(), json!({ "price": -1 }));
    }

    #[test]
    fn test_build_sort_ignores_unsortable() {
        let sortable = TEST_SCHEMA.sortable_fields();
        assert!(build_sort(Some("summary"), "asc", &sortable, &TEST_SCHEMA).is_empty());
        assert!(build_sort(Some("_id"), "asc", &sortable, &TEST_SCHEMA).is_empty());
        assert!(build_sort(None, "asc", &sortable, &TEST_SCHEMA).is_empty());
    }

    #[test]
    fn test_parse_sort_spec() {
        let sort = parse_sort_spec("-price, title  unknown +createdAt", &TEST_SCHEMA);
        assert_eq!(
            sort.to_document(),
            json!({ "price": -1, "title": 1, "createdAt": 1 })
        );
    }
}
