use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::documents::dtos::{FieldQuery, ListItemsDto};
use crate::features::documents::models::{project, StoredDocument};
use crate::features::documents::query::{
    build_filters, build_sort, parse_sort_spec, push_filter, push_json, push_order_by, Filter,
    ListParams, Sort,
};
use crate::features::documents::schema::ModelSchema;
use crate::shared::constants::MAX_PAGE_SIZE;
use crate::shared::types::parse_flag;

const DOCUMENT_COLUMNS: &str = "id, collection, data, created_at, updated_at";

#[derive(Debug, FromRow)]
struct GroupRow {
    key: Option<Value>,
    items: Value,
}

#[derive(Debug, Deserialize)]
struct GroupedDocument {
    id: Uuid,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| match AppError::from_query(e) {
        AppError::Database(e) => {
            tracing::error!("{}: {:?}", context, e);
            AppError::Database(e)
        }
        other => {
            tracing::debug!("{}: {}", context, other);
            other
        }
    }
}

fn not_found(schema: &ModelSchema) -> AppError {
    AppError::NotFound(format!("{} not found", schema.name))
}

/// `SELECT <columns> FROM documents WHERE collection = $1`
fn select(schema: &ModelSchema, columns: &str) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM documents WHERE collection = ",
        columns
    ));
    qb.push_bind(schema.collection);
    qb
}

/// CRUD over every collection of the `documents` table
pub struct DocumentService {
    pool: PgPool,
}

impl DocumentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Filtered, sorted and paginated list (distinct, grouped or random
    /// depending on the parameters)
    pub async fn list(&self, schema: &ModelSchema, params: &ListParams) -> Result<ListItemsDto> {
        let searchable = schema.searchable_fields();
        let sortable = schema.sortable_fields();

        let filter = build_filters(
            &params.filters,
            &searchable,
            schema,
            params.keyword.as_deref(),
            params.language.as_deref(),
        )?;
        let sort = if params.random {
            Sort::default()
        } else {
            build_sort(
                params.sort_field.as_deref(),
                &params.sort_order,
                &sortable,
                schema,
            )
        };

        let skip = params.skip()?;

        let distinct = params
            .distinct_field
            .as_deref()
            .filter(|f| schema.has_path(f));
        let group_by = params
            .group_by_field
            .as_deref()
            .filter(|f| schema.has_path(f));

        tracing::debug!(
            collection = schema.collection,
            filter = %filter.to_document(),
            sort = %sort.to_document(),
            "Listing documents"
        );

        let items = async {
            if let Some(field) = distinct {
                self.distinct_values(schema, field, &filter).await
            } else if let Some(field) = group_by {
                self.group_documents(schema, field, &filter).await
            } else if params.random {
                let docs = self.sample_documents(schema, &filter, params.limit).await?;
                Ok(render(schema, docs))
            } else {
                let docs = self
                    .find_documents(schema, &filter, &sort, skip, Some(params.limit))
                    .await?;
                Ok(render(schema, docs))
            }
        };

        let (items, total) = tokio::try_join!(items, self.count(schema, &filter))?;

        let total = if distinct.is_some() || group_by.is_some() {
            items.len() as i64
        } else {
            total
        };

        Ok(ListItemsDto {
            items,
            total,
            page: params.page,
            limit: params.limit,
            offset: params.offset,
        })
    }

    pub async fn find_documents(
        &self,
        schema: &ModelSchema,
        filter: &Filter,
        sort: &Sort,
        skip: i64,
        limit: Option<i64>,
    ) -> Result<Vec<StoredDocument>> {
        let mut qb = select(schema, DOCUMENT_COLUMNS);
        push_filter(&mut qb, filter);
        push_order_by(&mut qb, sort);
        if let Some(limit) = limit {
            qb.push(" LIMIT ").push_bind(limit);
        }
        if skip > 0 {
            qb.push(" OFFSET ").push_bind(skip);
        }

        qb.build_query_as::<StoredDocument>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to find documents"))
    }

    pub async fn count(&self, schema: &ModelSchema, filter: &Filter) -> Result<i64> {
        let mut qb = select(schema, "COUNT(*)");
        push_filter(&mut qb, filter);

        qb.build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("Failed to count documents"))
    }

    async fn sample_documents(
        &self,
        schema: &ModelSchema,
        filter: &Filter,
        size: i64,
    ) -> Result<Vec<StoredDocument>> {
        let mut qb = select(schema, DOCUMENT_COLUMNS);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY random() LIMIT ").push_bind(size);

        qb.build_query_as::<StoredDocument>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to sample documents"))
    }

    /// Distinct values of `field`; array values contribute their elements
    async fn distinct_values(
        &self,
        schema: &ModelSchema,
        field: &str,
        filter: &Filter,
    ) -> Result<Vec<Value>> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "SELECT DISTINCT elem.value FROM documents CROSS JOIN LATERAL \
             jsonb_array_elements(CASE WHEN jsonb_typeof(",
        );
        push_json(&mut qb, field);
        qb.push(") = 'array' THEN ");
        push_json(&mut qb, field);
        qb.push(" ELSE jsonb_build_array(");
        push_json(&mut qb, field);
        qb.push(") END) AS elem(value) WHERE collection = ")
            .push_bind(schema.collection)
            .push(" AND ");
        push_json(&mut qb, field);
        qb.push(" IS NOT NULL");
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY elem.value");

        qb.build_query_scalar::<Value>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to read distinct values"))
    }

    /// `[{ _id: value, items: [...] }]` per distinct value of `field`
    async fn group_documents(
        &self,
        schema: &ModelSchema,
        field: &str,
        filter: &Filter,
    ) -> Result<Vec<Value>> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        push_json(&mut qb, field);
        qb.push(
            " AS key, jsonb_agg(jsonb_build_object('id', id, 'data', data, \
             'created_at', created_at, 'updated_at', updated_at) ORDER BY id) AS items \
             FROM documents WHERE collection = ",
        )
        .push_bind(schema.collection);
        push_filter(&mut qb, filter);
        qb.push(" GROUP BY 1");

        let rows = qb
            .build_query_as::<GroupRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to group documents"))?;

        rows.into_iter()
            .map(|row| {
                let docs: Vec<GroupedDocument> = serde_json::from_value(row.items)
                    .map_err(|e| AppError::Internal(format!("Malformed group row: {}", e)))?;
                let items: Vec<Value> = docs
                    .iter()
                    .map(|d| Value::Object(project(schema, d.id, &d.data, d.created_at, d.updated_at)))
                    .collect();
                Ok(json!({ "_id": row.key.unwrap_or(Value::Null), "items": items }))
            })
            .collect()
    }

    pub async fn find_by_id(&self, schema: &ModelSchema, id: Uuid) -> Result<Option<StoredDocument>> {
        let mut qb = select(schema, DOCUMENT_COLUMNS);
        qb.push(" AND id = ").push_bind(id);

        qb.build_query_as::<StoredDocument>()
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get document"))
    }

    pub async fn get_by_id(&self, schema: &ModelSchema, id: Uuid) -> Result<StoredDocument> {
        self.find_by_id(schema, id)
            .await?
            .ok_or_else(|| not_found(schema))
    }

    pub async fn get_by_slug(&self, schema: &ModelSchema, slug: &str) -> Result<StoredDocument> {
        if !schema.has_path("slug") {
            return Err(not_found(schema));
        }
        let filter = Filter::field_equals(schema, "slug", slug)?;
        self.find_documents(schema, &filter, &Sort::default(), 0, Some(1))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(schema))
    }

    /// `{ field: value }` of one document
    pub async fn get_field_by_id(
        &self,
        schema: &ModelSchema,
        id: Uuid,
        field: &str,
    ) -> Result<Value> {
        if !schema.has_path(field) {
            return Err(AppError::BadRequest(format!(
                "Field '{}' not found in {}",
                field, schema.name
            )));
        }

        let doc = self.get_by_id(schema, id).await?.to_json(schema);
        let pointer = format!("/{}", field.replace('.', "/"));
        let value = doc.pointer(&pointer).cloned().unwrap_or(Value::Null);

        let mut out = Map::new();
        out.insert(field.to_string(), value);
        Ok(Value::Object(out))
    }

    /// Documents whose `key` equals `value`
    ///
    /// Returns one object when `single` is set, otherwise a list.
    pub async fn find_by_field(
        &self,
        schema: &ModelSchema,
        key: &str,
        value: &str,
        query: &FieldQuery,
    ) -> Result<Value> {
        if !schema.has_path(key) {
            return Err(AppError::BadRequest(format!(
                "Invalid field '{}'. Allowed fields: {}",
                key,
                schema.paths().join(", ")
            )));
        }

        let filter = Filter::field_equals(schema, key, value)?;
        let single = query.single.as_deref().is_some_and(parse_flag);
        let limit = query.limit.filter(|l| *l > 0).map(|l| l.min(MAX_PAGE_SIZE));

        let docs = match query.sort.as_deref() {
            Some("rand") => {
                self.sample_documents(schema, &filter, limit.unwrap_or(1))
                    .await?
            }
            sort => {
                let sort = sort
                    .map(|spec| parse_sort_spec(spec, schema))
                    .unwrap_or_default();
                let limit = if single { Some(1) } else { limit };
                self.find_documents(schema, &filter, &sort, 0, limit).await?
            }
        };

        let mut items = render(schema, docs);
        if items.is_empty() {
            return Err(not_found(schema));
        }

        if single {
            Ok(items.swap_remove(0))
        } else {
            Ok(Value::Array(items))
        }
    }

    pub async fn create(&self, schema: &ModelSchema, body: &Value) -> Result<StoredDocument> {
        let data = schema.cast_document(body)?;
        let now = Utc::now();

        let doc = sqlx::query_as::<_, StoredDocument>(&format!(
            "INSERT INTO documents (id, collection, data, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $4) RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(Uuid::now_v7())
        .bind(schema.collection)
        .bind(Value::Object(data))
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create document"))?;

        tracing::info!(collection = schema.collection, id = %doc.id, "Document created");
        Ok(doc)
    }

    /// Insert all bodies in one transaction
    pub async fn create_many(
        &self,
        schema: &ModelSchema,
        bodies: &[Value],
    ) -> Result<Vec<StoredDocument>> {
        let rows = bodies
            .iter()
            .map(|body| schema.cast_document(body))
            .collect::<Result<Vec<_>>>()?;

        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let mut created = Vec::with_capacity(rows.len());
        for data in rows {
            let doc = sqlx::query_as::<_, StoredDocument>(&format!(
                "INSERT INTO documents (id, collection, data, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $4) RETURNING {}",
                DOCUMENT_COLUMNS
            ))
            .bind(Uuid::now_v7())
            .bind(schema.collection)
            .bind(Value::Object(data))
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_error("Failed to create document"))?;
            created.push(doc);
        }

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        tracing::info!(
            collection = schema.collection,
            count = created.len(),
            "Documents created"
        );
        Ok(created)
    }

    /// Shallow-merge the cast body into the stored document
    pub async fn update(
        &self,
        schema: &ModelSchema,
        id: Uuid,
        body: &Value,
    ) -> Result<StoredDocument> {
        let data = schema.cast_document(body)?;

        sqlx::query_as::<_, StoredDocument>(&format!(
            "UPDATE documents SET data = data || $3, updated_at = now() \
             WHERE collection = $1 AND id = $2 RETURNING {}",
            DOCUMENT_COLUMNS
        ))
        .bind(schema.collection)
        .bind(id)
        .bind(Value::Object(data))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to update document"))?
        .ok_or_else(|| not_found(schema))
    }

    /// Returns the number of modified documents
    pub async fn update_many(&self, schema: &ModelSchema, ids: &[Uuid], body: &Value) -> Result<u64> {
        let data = schema.cast_document(body)?;

        let result = sqlx::query(
            "UPDATE documents SET data = data || $3, updated_at = now() \
             WHERE collection = $1 AND id = ANY($2)",
        )
        .bind(schema.collection)
        .bind(ids)
        .bind(Value::Object(data))
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update documents"))?;

        Ok(result.rows_affected())
    }

    pub async fn delete(&self, schema: &ModelSchema, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(schema.collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete document"))?;

        if result.rows_affected() == 0 {
            return Err(not_found(schema));
        }

        tracing::info!(collection = schema.collection, id = %id, "Document deleted");
        Ok(())
    }

    /// Returns the number of deleted documents
    pub async fn delete_many(&self, schema: &ModelSchema, ids: &[Uuid]) -> Result<u64> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = ANY($2)")
            .bind(schema.collection)
            .bind(ids)
            .execute(&self.pool)
            .await
            .map_err(db_error("Failed to delete documents"))?;

        Ok(result.rows_affected())
    }

    /// Update the document whose `field` equals the body's value, or insert
    /// a new one. Returns the document id.
    pub async fn upsert_by_field(
        &self,
        schema: &ModelSchema,
        field: &str,
        body: &Value,
    ) -> Result<Uuid> {
        let data = schema.cast_document(body)?;
        let key = data
            .get(field)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest(format!("'{}' is required", field)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;

        let existing: Option<Uuid> = sqlx::query_scalar(
            "SELECT id FROM documents WHERE collection = $1 AND data ->> $2 = $3 \
             ORDER BY id LIMIT 1 FOR UPDATE",
        )
        .bind(schema.collection)
        .bind(field)
        .bind(&key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error("Failed to look up document"))?;

        let id = match existing {
            Some(id) => {
                sqlx::query(
                    "UPDATE documents SET data = data || $2, updated_at = now() WHERE id = $1",
                )
                .bind(id)
                .bind(Value::Object(data))
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to update document"))?;
                id
            }
            None => {
                let id = Uuid::now_v7();
                sqlx::query(
                    "INSERT INTO documents (id, collection, data, created_at, updated_at) \
                     VALUES ($1, $2, $3, now(), now())",
                )
                .bind(id)
                .bind(schema.collection)
                .bind(Value::Object(data))
                .execute(&mut *tx)
                .await
                .map_err(db_error("Failed to create document"))?;
                id
            }
        };

        tx.commit()
            .await
            .map_err(db_error("Failed to commit transaction"))?;

        tracing::debug!(collection = schema.collection, %field, %key, id = %id, "Document upserted");
        Ok(id)
    }
}

fn render(schema: &ModelSchema, docs: Vec<StoredDocument>) -> Vec<Value> {
    docs.iter().map(|d| d.to_json(schema)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::documents::models::{APPOINTMENT_SCHEMA, LECTURE_SCHEMA};

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_pairs(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
        .unwrap()
    }

    fn id_of(item: &Value) -> Uuid {
        item["_id"].as_str().unwrap().parse().unwrap()
    }

    async fn seed_lectures(service: &DocumentService) -> Vec<StoredDocument> {
        service
            .create_many(
                &LECTURE_SCHEMA,
                &[
                    json!({ "title": "Rust Basics", "language": "en", "slug": "rust-basics",
                            "lectureType": "video", "published": true }),
                    json!({ "title": "Async Rust", "language": "en", "slug": "async-rust",
                            "lectureType": "video", "published": false }),
                    json!({ "title": "Intro SQL", "language": "fr", "slug": "intro-sql",
                            "lectureType": "text", "published": true }),
                ],
            )
            .await
            .unwrap()
    }

    async fn seed_appointments(service: &DocumentService) -> Vec<StoredDocument> {
        service
            .create_many(
                &APPOINTMENT_SCHEMA,
                &[
                    json!({ "name": "a", "estimatedAttendees": 50 }),
                    json!({ "name": "b", "estimatedAttendees": 10 }),
                    json!({ "name": "c" }),
                    json!({ "name": "d", "estimatedAttendees": 200 }),
                    json!({ "name": "e", "estimatedAttendees": 50 }),
                ],
            )
            .await
            .unwrap()
    }

    /// Names of the two 50-attendee appointments in id order
    fn tied_fifties(seeded: &[StoredDocument]) -> [&'static str; 2] {
        if seeded[0].id < seeded[4].id {
            ["a", "e"]
        } else {
            ["e", "a"]
        }
    }

    fn names(page: &ListItemsDto) -> Vec<&str> {
        page.items
            .iter()
            .map(|item| item["name"].as_str().unwrap())
            .collect()
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_keyword_lists_matches_in_id_order(pool: PgPool) {
        let service = DocumentService::new(pool);
        let seeded = seed_lectures(&service).await;

        let page = service
            .list(&LECTURE_SCHEMA, &params(&[("keyword", "rust")]))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let ids: Vec<Uuid> = page.items.iter().map(id_of).collect();
        let mut expected = vec![seeded[0].id, seeded[1].id];
        expected.sort();
        assert_eq!(ids, expected);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_keyword_rejected_by_postgres_is_bad_request(pool: PgPool) {
        let service = DocumentService::new(pool);
        seed_lectures(&service).await;

        let err = service
            .list(&LECTURE_SCHEMA, &params(&[("keyword", "(?P<x>rust)")]))
            .await
            .unwrap_err();
        match err {
            AppError::BadRequest(message) => assert!(message.starts_with("Invalid search pattern")),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_keyword_with_lookahead_is_accepted(pool: PgPool) {
        let service = DocumentService::new(pool);
        let seeded = seed_lectures(&service).await;

        let page = service
            .list(&LECTURE_SCHEMA, &params(&[("keyword", "rust(?=$)")]))
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(id_of(&page.items[0]), seeded[1].id);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_distinct_values_set_total(pool: PgPool) {
        let service = DocumentService::new(pool);
        seed_lectures(&service).await;

        let page = service
            .list(&LECTURE_SCHEMA, &params(&[("distinctField", "lectureType")]))
            .await
            .unwrap();

        assert_eq!(page.items, vec![json!("text"), json!("video")]);
        assert_eq!(page.total, 2);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_group_by_counts_groups(pool: PgPool) {
        let service = DocumentService::new(pool);
        seed_lectures(&service).await;

        let page = service
            .list(&LECTURE_SCHEMA, &params(&[("groupByField", "language")]))
            .await
            .unwrap();

        assert_eq!(page.total, 2);
        let english = page
            .items
            .iter()
            .find(|group| group["_id"] == json!("en"))
            .unwrap();
        let items = english["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert!(id_of(&items[0]) < id_of(&items[1]));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_random_sample_keeps_full_total(pool: PgPool) {
        let service = DocumentService::new(pool);
        seed_lectures(&service).await;

        let page = service
            .list(&LECTURE_SCHEMA, &params(&[("random", "1"), ("limit", "2")]))
            .await
            .unwrap();

        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 3);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_min_and_max_merge_into_one_range(pool: PgPool) {
        let service = DocumentService::new(pool);
        let seeded = seed_appointments(&service).await;

        let page = service
            .list(
                &APPOINTMENT_SCHEMA,
                &params(&[
                    ("minEstimatedAttendees", "20"),
                    ("maxEstimatedAttendees", "300"),
                    ("sortField", "estimatedAttendees"),
                    ("sortOrder", "asc"),
                ]),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 3);
        let [first, second] = tied_fifties(&seeded);
        assert_eq!(names(&page), vec![first, second, "d"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_numeric_sort_places_missing_values_and_breaks_ties_by_id(pool: PgPool) {
        let service = DocumentService::new(pool);
        let seeded = seed_appointments(&service).await;
        let [first, second] = tied_fifties(&seeded);

        let ascending = service
            .list(
                &APPOINTMENT_SCHEMA,
                &params(&[("sortField", "estimatedAttendees"), ("sortOrder", "asc")]),
            )
            .await
            .unwrap();
        assert_eq!(names(&ascending), vec!["c", "b", first, second, "d"]);

        let descending = service
            .list(
                &APPOINTMENT_SCHEMA,
                &params(&[("sortField", "estimatedAttendees"), ("sortOrder", "desc")]),
            )
            .await
            .unwrap();
        assert_eq!(names(&descending), vec!["d", first, second, "b", "c"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_date_sort_is_chronological(pool: PgPool) {
        let service = DocumentService::new(pool);
        service
            .create_many(
                &APPOINTMENT_SCHEMA,
                &[
                    json!({ "name": "late", "appointmentDate": "2025-03-01" }),
                    json!({ "name": "none" }),
                    json!({ "name": "early", "appointmentDate": "2024-12-31T09:00:00Z" }),
                ],
            )
            .await
            .unwrap();

        let page = service
            .list(
                &APPOINTMENT_SCHEMA,
                &params(&[("sortField", "appointmentDate"), ("sortOrder", "asc")]),
            )
            .await
            .unwrap();
        assert_eq!(names(&page), vec!["none", "early", "late"]);
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_find_by_field_modes(pool: PgPool) {
        let service = DocumentService::new(pool);
        let seeded = seed_lectures(&service).await;

        let sorted = service
            .find_by_field(
                &LECTURE_SCHEMA,
                "lectureType",
                "video",
                &FieldQuery {
                    sort: Some("-title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let titles: Vec<&str> = sorted
            .as_array()
            .unwrap()
            .iter()
            .map(|doc| doc["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["Rust Basics", "Async Rust"]);

        let single = service
            .find_by_field(
                &LECTURE_SCHEMA,
                "lectureType",
                "video",
                &FieldQuery {
                    single: Some("true".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(id_of(&single), seeded[0].id.min(seeded[1].id));

        let sampled = service
            .find_by_field(
                &LECTURE_SCHEMA,
                "lectureType",
                "video",
                &FieldQuery {
                    sort: Some("rand".to_string()),
                    limit: Some(5),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(sampled.as_array().unwrap().len(), 2);

        let missing = service
            .find_by_field(&LECTURE_SCHEMA, "lectureType", "audio", &FieldQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(missing, AppError::NotFound(_)));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn test_upsert_reuses_document_with_same_key(pool: PgPool) {
        let service = DocumentService::new(pool);

        let first = service
            .upsert_by_field(
                &LECTURE_SCHEMA,
                "slug",
                &json!({ "slug": "ownership", "title": "Ownership" }),
            )
            .await
            .unwrap();
        let second = service
            .upsert_by_field(
                &LECTURE_SCHEMA,
                "slug",
                &json!({ "slug": "ownership", "title": "Ownership and Borrowing" }),
            )
            .await
            .unwrap();

        assert_eq!(first, second);
        let doc = service.get_by_slug(&LECTURE_SCHEMA, "ownership").await.unwrap();
        assert_eq!(doc.id, first);
        assert_eq!(doc.data["title"], json!("Ownership and Borrowing"));

        let field = service
            .get_field_by_id(&LECTURE_SCHEMA, first, "title")
            .await
            .unwrap();
        assert_eq!(field, json!({ "title": "Ownership and Borrowing" }));
    }
}
