//! Query-string filters to filter conditions
//!
//! A [`Filter`] is an OR-group produced by keyword search plus an AND-list
//! of per-path conditions. It renders to SQL (see `sql`) and to a
//! Mongo-style document for logs.

use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};

use crate::core::error::{AppError, Result};
use crate::features::documents::schema::{format_date, parse_date, FieldType, ModelSchema};

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Text(String),
    Number(f64),
    Date(DateTime<Utc>),
}

impl Scalar {
    fn to_json(&self) -> Value {
        match self {
            Scalar::Text(s) => Value::String(s.clone()),
            Scalar::Number(n) => json!(n),
            Scalar::Date(d) => json!({ "$date": format_date(d) }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Case-insensitive regular expression
    Regex(String),
    Equals(Scalar),
    BoolEq(bool),
    ArrayContains(String),
    Range {
        gte: Option<Scalar>,
        lte: Option<Scalar>,
    },
    ArraySize(i64),
    /// Array length below the bound
    SizeBelow(i64),
    LessThan(f64),
    NotExists,
}

impl Condition {
    /// Case-insensitive regex condition
    ///
    /// Patterns are POSIX AREs checked by Postgres when the query runs.
    pub fn regex(pattern: &str) -> Self {
        Condition::Regex(pattern.to_string())
    }

    fn to_json(&self) -> Value {
        match self {
            Condition::Regex(pattern) => json!({ "$regex": pattern, "$options": "i" }),
            Condition::Equals(scalar) => scalar.to_json(),
            Condition::BoolEq(b) => Value::Bool(*b),
            Condition::ArrayContains(value) => Value::String(value.clone()),
            Condition::Range { gte, lte } => {
                let mut range = Map::new();
                if let Some(gte) = gte {
                    range.insert("$gte".into(), gte.to_json());
                }
                if let Some(lte) = lte {
                    range.insert("$lte".into(), lte.to_json());
                }
                Value::Object(range)
            }
            Condition::ArraySize(n) => json!({ "$size": n }),
            Condition::SizeBelow(n) => json!({ "$expr": { "$lt": [{ "$size": "$this" }, n] } }),
            Condition::LessThan(n) => json!({ "$lt": n }),
            Condition::NotExists => json!({ "$not": { "$exists": true } }),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    /// Keyword search conditions; `Some(empty)` matches nothing
    pub any_of: Option<Vec<(String, Condition)>>,
    /// One condition per path, in query order
    pub all_of: Vec<(String, Condition)>,
}

impl Filter {
    /// Match documents where `path` equals `value`, cast to the path's type
    pub fn field_equals(schema: &ModelSchema, path: &str, value: &str) -> Result<Self> {
        let condition = match schema.field_type(path) {
            Some(FieldType::Boolean) => Condition::BoolEq(value == "true"),
            Some(FieldType::Array) => Condition::ArrayContains(value.to_string()),
            Some(FieldType::Number | FieldType::Decimal) => {
                Condition::Equals(Scalar::Number(parse_number(path, value)?))
            }
            Some(FieldType::Date) => Condition::Equals(Scalar::Date(parse_date_value(path, value)?)),
            _ => Condition::Equals(Scalar::Text(value.to_string())),
        };
        let mut filter = Filter::default();
        filter.set(path, condition);
        Ok(filter)
    }

    /// Replace the condition on `path`, keeping its original position
    pub fn set(&mut self, path: &str, condition: Condition) {
        match self.all_of.iter_mut().find(|(p, _)| p == path) {
            Some(entry) => entry.1 = condition,
            None => self.all_of.push((path.to_string(), condition)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Condition> {
        self.all_of.iter().find(|(p, _)| p == path).map(|(_, c)| c)
    }

    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(any_of) = &self.any_of {
            let branches = any_of
                .iter()
                .map(|(path, cond)| json!({ path.as_str(): cond.to_json() }))
                .collect();
            doc.insert("$or".into(), Value::Array(branches));
        }
        for (path, cond) in &self.all_of {
            doc.insert(path.clone(), cond.to_json());
        }
        Value::Object(doc)
    }
}

/// Build the list filter from query pairs and the keyword
pub fn build_filters(
    filters: &[(String, String)],
    searchable_fields: &[&str],
    schema: &ModelSchema,
    keyword: Option<&str>,
    language: Option<&str>,
) -> Result<Filter> {
    let mut filter = Filter::default();

    if let Some(keyword) = keyword {
        let max = schema.options.max_keyword_length;
        if keyword.chars().count() > max {
            return Err(AppError::BadRequest(format!(
                "Keyword too long. Maximum length is {} characters.",
                max
            )));
        }
        let pattern = keyword.to_string();

        let branches = searchable_fields
            .iter()
            .filter(|field| schema.field_type(field) == Some(FieldType::String))
            .map(|field| {
                let localized = language
                    .map(|lang| format!("{}.{}", field, lang))
                    .filter(|path| schema.has_path(path));
                let path = localized.unwrap_or_else(|| field.to_string());
                (path, Condition::Regex(pattern.clone()))
            })
            .collect();
        filter.any_of = Some(branches);
    }

    for (key, value) in filters {
        if let Some(ty) = schema.field_type(key) {
            filter.set(key, exact_condition(ty, value)?);
        } else if let Some((field, upper)) = prefixed_field(key, "min", schema)
            .map(|f| (f, false))
            .or_else(|| prefixed_field(key, "max", schema).map(|f| (f, true)))
        {
            let Some(ty) = schema.field_type(&field).filter(|ty| ty.is_range_comparable()) else {
                continue;
            };
            let bound = if ty == FieldType::Date {
                Scalar::Date(parse_date_value(&field, value)?)
            } else {
                Scalar::Number(parse_number(&field, value)?)
            };
            let (mut gte, mut lte) = match filter.get(&field) {
                Some(Condition::Range { gte, lte }) => (gte.clone(), lte.clone()),
                _ => (None, None),
            };
            if upper {
                lte = Some(bound);
            } else {
                gte = Some(bound);
            }
            filter.set(&field, Condition::Range { gte, lte });
        } else if let Some(field) = prefixed_field(key, "more", schema) {
            filter.set(&field, Condition::ArraySize(parse_count(&field, value)?));
        } else if let Some(field) = prefixed_field(key, "less", schema) {
            let condition = if schema.field_type(&field) == Some(FieldType::Array) {
                Condition::SizeBelow(parse_count(&field, value)?)
            } else {
                Condition::LessThan(parse_number(&field, value)?)
            };
            filter.set(&field, condition);
        } else if let Some(field) = prefixed_field(key, "contains", schema) {
            if schema
                .field_type(&field)
                .is_some_and(|ty| ty.is_pattern_like())
            {
                filter.set(&field, Condition::regex(value));
            }
        }
    }

    Ok(filter)
}

/// Condition for a query key naming a schema path exactly
fn exact_condition(ty: FieldType, value: &str) -> Result<Condition> {
    Ok(match ty {
        FieldType::Boolean => Condition::BoolEq(value == "true"),
        FieldType::String => Condition::regex(value),
        FieldType::Null => Condition::NotExists,
        FieldType::Array => Condition::ArrayContains(value.to_string()),
        FieldType::Number | FieldType::Decimal => {
            Condition::Equals(Scalar::Number(parse_number("value", value)?))
        }
        FieldType::Date => Condition::Equals(Scalar::Date(parse_date_value("value", value)?)),
        _ => Condition::Equals(Scalar::Text(value.to_string())),
    })
}

/// `minPrice` -> `price` when `price` is a schema path
fn prefixed_field(key: &str, prefix: &str, schema: &ModelSchema) -> Option<String> {
    let rest = key.strip_prefix(prefix)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    let field: String = first.to_lowercase().chain(chars).collect();
    schema.has_path(&field).then_some(field)
}

fn parse_number(field: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| AppError::BadRequest(format!("Invalid number '{}' for {}", value, field)))
}

fn parse_count(field: &str, value: &str) -> Result<i64> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| AppError::BadRequest(format!("Invalid count '{}' for {}", value, field)))
}

fn parse_date_value(field: &str, value: &str) -> Result<DateTime<Utc>> {
    parse_date(value)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid date '{}' for {}", value, field)))
}
