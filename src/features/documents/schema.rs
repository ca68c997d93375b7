//! Model schemas
//!
//! Every collection declares its fields once. The declaration drives strict
//! casting of request bodies, the key order of serialized documents, and the
//! introspection the dynamic query builder relies on.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::DEFAULT_MAX_KEYWORD_LENGTH;

/// Document identifier path
pub const ID_PATH: &str = "_id";
/// Creation timestamp path (schemas with timestamps)
pub const CREATED_AT_PATH: &str = "createdAt";
/// Last update timestamp path (schemas with timestamps)
pub const UPDATED_AT_PATH: &str = "updatedAt";

/// Storage type of a declared path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Decimal,
    Date,
    Boolean,
    ObjectId,
    Array,
    Mixed,
    Binary,
    Code,
    RegExp,
    Null,
}

impl FieldType {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldType::Number | FieldType::Decimal)
    }

    /// Types accepted by `min*` / `max*` range filters
    pub fn is_range_comparable(self) -> bool {
        self.is_numeric() || self == FieldType::Date
    }

    /// Types accepted by `contains*` pattern filters
    pub fn is_pattern_like(self) -> bool {
        matches!(self, FieldType::Code | FieldType::RegExp | FieldType::Binary)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Decimal => "Decimal128",
            FieldType::Date => "Date",
            FieldType::Boolean => "Boolean",
            FieldType::ObjectId => "ObjectId",
            FieldType::Array => "Array",
            FieldType::Mixed => "Mixed",
            FieldType::Binary => "Binary",
            FieldType::Code => "Code",
            FieldType::RegExp => "RegExp",
            FieldType::Null => "Null",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub path: &'static str,
    pub ty: FieldType,
}

impl FieldDef {
    pub const fn new(path: &'static str, ty: FieldType) -> Self {
        Self { path, ty }
    }
}

/// Per-model tuning of the list endpoint
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    /// Fields searched by `keyword` (all non-id paths when `None`)
    pub searchable_fields: Option<&'static [&'static str]>,
    /// Fields accepted by `sortField` (all non-id paths when `None`)
    pub sortable_fields: Option<&'static [&'static str]>,
    /// Removed from both lists above
    pub excluded_fields: &'static [&'static str],
    pub max_keyword_length: usize,
}

impl QueryOptions {
    pub const DEFAULT: QueryOptions = QueryOptions {
        searchable_fields: None,
        sortable_fields: None,
        excluded_fields: &[],
        max_keyword_length: DEFAULT_MAX_KEYWORD_LENGTH,
    };
}

#[derive(Debug)]
pub struct ModelSchema {
    /// Display name used in messages ("Lecture not found")
    pub name: &'static str,
    /// Collection name, also the route segment under `/api/v1`
    pub collection: &'static str,
    pub fields: &'static [FieldDef],
    pub timestamps: bool,
    pub options: QueryOptions,
}

impl ModelSchema {
    /// All queryable paths: `_id`, the declared paths, then timestamps
    pub fn paths(&self) -> Vec<&'static str> {
        let mut paths = Vec::with_capacity(self.fields.len() + 3);
        paths.push(ID_PATH);
        paths.extend(self.fields.iter().map(|f| f.path));
        if self.timestamps {
            paths.push(CREATED_AT_PATH);
            paths.push(UPDATED_AT_PATH);
        }
        paths
    }

    pub fn has_path(&self, path: &str) -> bool {
        self.field_type(path).is_some()
    }

    pub fn field_type(&self, path: &str) -> Option<FieldType> {
        match path {
            ID_PATH => Some(FieldType::ObjectId),
            CREATED_AT_PATH | UPDATED_AT_PATH if self.timestamps => Some(FieldType::Date),
            _ => self.field(path).map(|f| f.ty),
        }
    }

    fn field(&self, path: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// True when `path` is an object holding declared nested paths
    fn is_nested_prefix(&self, path: &str) -> bool {
        self.fields.iter().any(|f| {
            f.path.len() > path.len()
                && f.path.starts_with(path)
                && f.path.as_bytes()[path.len()] == b'.'
        })
    }

    pub fn searchable_fields(&self) -> Vec<&'static str> {
        self.configured_fields(self.options.searchable_fields)
    }

    pub fn sortable_fields(&self) -> Vec<&'static str> {
        self.configured_fields(self.options.sortable_fields)
    }

    fn configured_fields(&self, configured: Option<&'static [&'static str]>) -> Vec<&'static str> {
        let candidates = match configured {
            Some(fields) => fields.to_vec(),
            None => self.paths().into_iter().filter(|p| *p != ID_PATH).collect(),
        };

        candidates
            .into_iter()
            .filter(|f| !self.options.excluded_fields.contains(f))
            .collect()
    }

    /// Top-level document keys in declaration order, one per first segment
    pub fn top_level_keys(&self) -> Vec<&'static str> {
        let mut keys: Vec<&'static str> = Vec::new();
        for field in self.fields {
            let key = field.path.split('.').next().unwrap_or(field.path);
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Cast a JSON body to the declared types
    ///
    /// Undeclared paths are dropped and managed paths (`_id`, timestamps)
    /// are ignored.
    pub fn cast_document(&self, body: &Value) -> Result<Map<String, Value>> {
        let object = body.as_object().ok_or_else(|| {
            AppError::BadRequest(format!("{} body must be a JSON object", self.name))
        })?;

        let mut out = Map::new();
        self.cast_object("", object, &mut out)?;
        Ok(out)
    }

    fn cast_object(
        &self,
        prefix: &str,
        object: &Map<String, Value>,
        out: &mut Map<String, Value>,
    ) -> Result<()> {
        for (key, value) in object {
            if prefix.is_empty() && matches!(key.as_str(), ID_PATH | CREATED_AT_PATH | UPDATED_AT_PATH)
            {
                continue;
            }

            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}.{}", prefix, key)
            };

            if let Some(def) = self.field(&path) {
                out.insert(key.clone(), cast_value(def, value)?);
            } else if self.is_nested_prefix(&path) {
                match value {
                    Value::Object(inner) => {
                        let mut nested = Map::new();
                        self.cast_object(&path, inner, &mut nested)?;
                        out.insert(key.clone(), Value::Object(nested));
                    }
                    Value::Null => {
                        out.insert(key.clone(), Value::Null);
                    }
                    other => return Err(cast_error("Object", other, &path)),
                }
            }
        }
        Ok(())
    }
}

fn cast_error(ty: &str, value: &Value, path: &str) -> AppError {
    AppError::BadRequest(format!(
        "Cast to {} failed for value {} at path \"{}\"",
        ty, value, path
    ))
}

fn cast_value(def: &FieldDef, value: &Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    let fail = || cast_error(def.ty.as_str(), value, def.path);

    match def.ty {
        FieldType::String => match value {
            Value::String(_) => Ok(value.clone()),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            _ => Err(fail()),
        },
        FieldType::Number | FieldType::Decimal => match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(number_value)
                .ok_or_else(fail),
            _ => Err(fail()),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value.clone()),
            Value::String(s) => match s.trim() {
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Ok(Value::Bool(true)),
                Some(0) => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },
            _ => Err(fail()),
        },
        FieldType::Date => {
            let parsed = match value {
                Value::String(s) => parse_date(s),
                Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
                _ => None,
            };
            parsed
                .map(|d| Value::String(format_date(&d)))
                .ok_or_else(fail)
        }
        FieldType::ObjectId => match value {
            Value::String(s) => Uuid::parse_str(s.trim())
                .map(|id| Value::String(id.to_string()))
                .map_err(|_| fail()),
            _ => Err(fail()),
        },
        FieldType::Array => match value {
            Value::Array(_) => Ok(value.clone()),
            other => Ok(Value::Array(vec![other.clone()])),
        },
        FieldType::Mixed
        | FieldType::Binary
        | FieldType::Code
        | FieldType::RegExp
        | FieldType::Null => Ok(value.clone()),
    }
}

/// Integral values stay integers so they serialize back as `5`, not `5.0`
fn number_value(n: f64) -> Option<Value> {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Some(Value::Number(Number::from(n as i64)))
    } else {
        Number::from_f64(n).map(Value::Number)
    }
}

/// Parse the date formats accepted in bodies and filters
///
/// RFC 3339, `YYYY-MM-DDTHH:MM:SS` (UTC), `YYYY-MM-DD` (midnight UTC) or
/// unix milliseconds.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;

    pub static TEST_SCHEMA: ModelSchema = ModelSchema {
        name: "Course",
        collection: "courses",
        fields: &[
            FieldDef::new("title", FieldType::String),
            FieldDef::new("title.en", FieldType::String),
            FieldDef::new("summary", FieldType::String),
            FieldDef::new("price", FieldType::Number),
            FieldDef::new("startsAt", FieldType::Date),
            FieldDef::new("published", FieldType::Boolean),
            FieldDef::new("tags", FieldType::Array),
            FieldDef::new("owner", FieldType::ObjectId),
            FieldDef::new("snippet", FieldType::Code),
            FieldDef::new("archivedAt", FieldType::Null),
            FieldDef::new("lessonCount", FieldType::Number),
            FieldDef::new("details.level", FieldType::String),
            FieldDef::new("details.hours", FieldType::Number),
        ],
        timestamps: true,
        options: QueryOptions {
            excluded_fields: &["summary"],
            max_keyword_length: 10,
            ..QueryOptions::DEFAULT
        },
    };

    #[test]
    fn test_paths_include_id_and_timestamps() {
        let paths = TEST_SCHEMA.paths();
        assert_eq!(paths.first(), Some(&ID_PATH));
        assert!(paths.contains(&"details.level"));
        assert_eq!(&paths[paths.len() - 2..], &[CREATED_AT_PATH, UPDATED_AT_PATH]);
    }

    #[test]
    fn test_field_types() {
        assert_eq!(TEST_SCHEMA.field_type("_id"), Some(FieldType::ObjectId));
        assert_eq!(TEST_SCHEMA.field_type("createdAt"), Some(FieldType::Date));
        assert_eq!(TEST_SCHEMA.field_type("price"), Some(FieldType::Number));
        assert_eq!(TEST_SCHEMA.field_type("details"), None);
        assert_eq!(TEST_SCHEMA.field_type("unknown"), None);
    }

    #[test]
    fn test_searchable_fields_drop_id_and_excluded() {
        let fields = TEST_SCHEMA.searchable_fields();
        assert!(!fields.contains(&"_id"));
        assert!(!fields.contains(&"summary"));
        assert!(fields.contains(&"title"));
        assert!(fields.contains(&"createdAt"));
    }

    #[test]
    fn test_top_level_keys_follow_declaration_order() {
        assert_eq!(
            TEST_SCHEMA.top_level_keys(),
            vec![
                "title",
                "summary",
                "price",
                "startsAt",
                "published",
                "tags",
                "owner",
                "snippet",
                "archivedAt",
                "lessonCount",
                "details"
            ]
        );
    }

    #[test]
    fn test_cast_document_is_strict_and_casts() {
        let owner = Uuid::now_v7();
        let body = json!({
            "_id": "ignored",
            "createdAt": "ignored",
            "title": "Rust",
            "price": "12",
            "published": "true",
            "startsAt": "2024-03-01",
            "tags": "systems",
            "owner": owner.to_string(),
            "extra": "dropped",
            "details": { "level": "beginner", "hours": "3.5", "secret": 1 }
        });

        let cast = TEST_SCHEMA.cast_document(&body).unwrap();

        assert_eq!(
            Value::Object(cast),
            json!({
                "title": "Rust",
                "price": 12,
                "published": true,
                "startsAt": "2024-03-01T00:00:00.000Z",
                "tags": ["systems"],
                "owner": owner.to_string(),
                "details": { "level": "beginner", "hours": 3.5 }
            })
        );
    }

    #[test]
    fn test_cast_document_rejects_bad_values() {
        assert!(TEST_SCHEMA.cast_document(&json!({ "price": "cheap" })).is_err());
        assert!(TEST_SCHEMA.cast_document(&json!({ "published": "maybe" })).is_err());
        assert!(TEST_SCHEMA.cast_document(&json!({ "owner": "not-a-uuid" })).is_err());
        assert!(TEST_SCHEMA.cast_document(&json!({ "details": "flat" })).is_err());
        assert!(TEST_SCHEMA.cast_document(&json!(["not", "an", "object"])).is_err());
    }

    #[test]
    fn test_cast_document_keeps_nulls() {
        let cast = TEST_SCHEMA
            .cast_document(&json!({ "price": null, "details": null }))
            .unwrap();
        assert_eq!(Value::Object(cast), json!({ "price": null, "details": null }));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = DateTime::parse_from_rfc3339("2024-03-01T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_date("2024-03-01T10:30:00Z"), Some(expected));
        assert_eq!(parse_date("2024-03-01T10:30:00"), Some(expected));
        assert_eq!(
            parse_date(&expected.timestamp_millis().to_string()),
            Some(expected)
        );
        assert!(parse_date("2024-03-01").is_some());
        assert!(parse_date("yesterday").is_none());
    }
}
