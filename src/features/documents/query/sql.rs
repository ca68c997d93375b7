//! Postgres rendering of filters and sorts over the `documents` table
//!
//! Declared paths live in the `data` JSONB column and are addressed with a
//! bound `text[]` path. `_id` and the timestamps map to real columns.

use sqlx::{Postgres, QueryBuilder};

use super::filters::{Condition, Filter, Scalar};
use super::sort::Sort;
use crate::features::documents::schema::{FieldType, CREATED_AT_PATH, ID_PATH, UPDATED_AT_PATH};

enum Target {
    Id,
    Column(&'static str),
    Data(Vec<String>),
}

fn target(path: &str) -> Target {
    match path {
        ID_PATH => Target::Id,
        CREATED_AT_PATH => Target::Column("created_at"),
        UPDATED_AT_PATH => Target::Column("updated_at"),
        _ => Target::Data(path.split('.').map(str::to_string).collect()),
    }
}

fn push_path(qb: &mut QueryBuilder<'_, Postgres>, op: &str, segments: &[String]) {
    qb.push("(data ")
        .push(op)
        .push(" ")
        .push_bind(segments.to_vec())
        .push(")");
}

/// JSONB value at `path`, SQL NULL when missing
pub fn push_json(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    match target(path) {
        Target::Id => {
            qb.push("to_jsonb(id::text)");
        }
        Target::Column(column) => {
            qb.push("to_jsonb(").push(column).push(")");
        }
        Target::Data(segments) => push_path(qb, "#>", &segments),
    }
}

fn push_text(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    match target(path) {
        Target::Id => {
            qb.push("id::text");
        }
        Target::Column(column) => {
            qb.push(column).push("::text");
        }
        Target::Data(segments) => push_path(qb, "#>>", &segments),
    }
}

fn push_number(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    match target(path) {
        Target::Data(segments) => {
            qb.push("(CASE WHEN jsonb_typeof");
            push_path(qb, "#>", &segments);
            qb.push(" = 'number' THEN ");
            push_path(qb, "#>>", &segments);
            qb.push("::float8 END)");
        }
        _ => {
            qb.push("NULL::float8");
        }
    }
}

fn push_date(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    match target(path) {
        Target::Column(column) => {
            qb.push(column);
        }
        Target::Data(segments) => {
            push_path(qb, "#>>", &segments);
            qb.push("::timestamptz");
        }
        Target::Id => {
            qb.push("NULL::timestamptz");
        }
    }
}

fn push_array_length(qb: &mut QueryBuilder<'_, Postgres>, path: &str) {
    qb.push("(CASE WHEN jsonb_typeof(");
    push_json(qb, path);
    qb.push(") = 'array' THEN jsonb_array_length(");
    push_json(qb, path);
    qb.push(") END)");
}

fn push_scalar_compare(
    qb: &mut QueryBuilder<'_, Postgres>,
    path: &str,
    op: &str,
    scalar: &Scalar,
) {
    match scalar {
        Scalar::Text(text) => {
            push_text(qb, path);
            qb.push(op).push_bind(text.clone());
        }
        Scalar::Number(n) => {
            push_number(qb, path);
            qb.push(op).push_bind(*n);
        }
        Scalar::Date(date) => {
            push_date(qb, path);
            qb.push(op).push_bind(*date);
        }
    }
}

fn push_condition(qb: &mut QueryBuilder<'_, Postgres>, path: &str, condition: &Condition) {
    match condition {
        Condition::Regex(pattern) => {
            push_text(qb, path);
            qb.push(" ~* ").push_bind(pattern.clone());
        }
        Condition::Equals(scalar) => push_scalar_compare(qb, path, " = ", scalar),
        Condition::BoolEq(value) => {
            push_json(qb, path);
            qb.push(" = ")
                .push_bind(serde_json::Value::Bool(*value));
        }
        Condition::ArrayContains(value) => {
            qb.push("(");
            push_json(qb, path);
            qb.push(" @> jsonb_build_array(")
                .push_bind(value.clone())
                .push("::text) OR ");
            push_text(qb, path);
            qb.push(" = ").push_bind(value.clone()).push(")");
        }
        Condition::Range { gte, lte } => {
            qb.push("(TRUE");
            if let Some(gte) = gte {
                qb.push(" AND ");
                push_scalar_compare(qb, path, " >= ", gte);
            }
            if let Some(lte) = lte {
                qb.push(" AND ");
                push_scalar_compare(qb, path, " <= ", lte);
            }
            qb.push(")");
        }
        Condition::ArraySize(n) => {
            push_array_length(qb, path);
            qb.push(" = ").push_bind(*n);
        }
        Condition::SizeBelow(n) => {
            push_array_length(qb, path);
            qb.push(" < ").push_bind(*n);
        }
        Condition::LessThan(n) => {
            push_number(qb, path);
            qb.push(" < ").push_bind(*n);
        }
        Condition::NotExists => {
            push_json(qb, path);
            qb.push(" IS NULL");
        }
    }
}

/// Append ` AND ...` clauses for every part of the filter
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    if let Some(any_of) = &filter.any_of {
        if any_of.is_empty() {
            qb.push(" AND FALSE");
        } else {
            qb.push(" AND (");
            for (i, (path, condition)) in any_of.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                push_condition(qb, path, condition);
            }
            qb.push(")");
        }
    }

    for (path, condition) in &filter.all_of {
        qb.push(" AND ");
        push_condition(qb, path, condition);
    }
}

/// Append `ORDER BY`, always ending with the insertion-order tie-breaker
pub fn push_order_by(qb: &mut QueryBuilder<'_, Postgres>, sort: &Sort) {
    qb.push(" ORDER BY ");
    for key in &sort.keys {
        match (key.path.as_str(), key.ty) {
            (ID_PATH, _) => {
                qb.push("id");
            }
            (_, FieldType::Number | FieldType::Decimal) => push_number(qb, &key.path),
            (_, FieldType::Date) => push_date(qb, &key.path),
            _ => push_json(qb, &key.path),
        }
        qb.push(if key.descending {
            " DESC NULLS LAST, "
        } else {
            " ASC NULLS FIRST, "
        });
    }
    qb.push("id ASC");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::query::sort::parse_sort_spec;
    use crate::features::documents::schema::tests::TEST_SCHEMA;

    fn render(filter: &Filter) -> String {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM documents WHERE collection = ");
        qb.push_bind("courses");
        push_filter(&mut qb, filter);
        qb.sql().to_string()
    }

    #[test]
    fn test_render_regex_on_nested_path() {
        let mut filter = Filter::default();
        filter.set("details.level", Condition::Regex("beg".into()));
        assert_eq!(
            render(&filter),
            "SELECT id FROM documents WHERE collection = $1 AND (data #>> $2) ~* $3"
        );
    }

    #[test]
    fn test_render_keyword_group() {
        let filter = Filter {
            any_of: Some(vec![
                ("title".into(), Condition::Regex("a".into())),
                ("details.level".into(), Condition::Regex("a".into())),
            ]),
            all_of: Vec::new(),
        };
        assert_eq!(
            render(&filter),
            "SELECT id FROM documents WHERE collection = $1 AND ((data #>> $2) ~* $3 OR (data #>> $4) ~* $5)"
        );
    }

    #[test]
    fn test_render_empty_keyword_group_matches_nothing() {
        let filter = Filter {
            any_of: Some(Vec::new()),
            all_of: Vec::new(),
        };
        assert!(render(&filter).ends_with(" AND FALSE"));
    }

    #[test]
    fn test_render_columns() {
        let mut filter = Filter::default();
        filter.set("_id", Condition::Equals(Scalar::Text("x".into())));
        filter.set(
            "createdAt",
            Condition::Range {
                gte: None,
                lte: Some(Scalar::Date(chrono::Utc::now())),
            },
        );
        assert_eq!(
            render(&filter),
            "SELECT id FROM documents WHERE collection = $1 AND id::text = $2 AND (TRUE AND created_at <= $3)"
        );
    }

    #[test]
    fn test_render_not_exists_and_size() {
        let mut filter = Filter::default();
        filter.set("archivedAt", Condition::NotExists);
        filter.set("tags", Condition::ArraySize(2));
        assert_eq!(
            render(&filter),
            "SELECT id FROM documents WHERE collection = $1 AND (data #> $2) IS NULL AND \
             (CASE WHEN jsonb_typeof((data #> $3)) = 'array' THEN jsonb_array_length((data #> $4)) END) = $5"
        );
    }

    #[test]
    fn test_order_by_appends_tie_breaker() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM documents");
        push_order_by(&mut qb, &Sort::default());
        assert_eq!(qb.sql(), "SELECT id FROM documents ORDER BY id ASC");

        let mut qb = QueryBuilder::<Postgres>::new("SELECT id FROM documents");
        push_order_by(&mut qb, &parse_sort_spec("-createdAt title", &TEST_SCHEMA));
        assert_eq!(
            qb.sql(),
            "SELECT id FROM documents ORDER BY created_at DESC NULLS LAST, (data #> $1) ASC NULLS FIRST, id ASC"
        );
    }
}
