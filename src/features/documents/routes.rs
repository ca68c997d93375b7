use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{get, post, MethodRouter},
    Router,
};

use crate::features::documents::handlers;
use crate::features::documents::models::generic_collections;
use crate::features::documents::schema::ModelSchema;
use crate::features::documents::services::DocumentService;

/// State of one collection's router
#[derive(Clone)]
pub struct CollectionState {
    pub service: Arc<DocumentService>,
    pub schema: &'static ModelSchema,
}

/// Generic CRUD routes of a collection
///
/// `list` and `show` serve `GET /` and `GET /{id}` so a feature can
/// replace the generic reads while keeping the rest.
pub fn crud_router<S>(list: MethodRouter<S>, show: MethodRouter<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    CollectionState: FromRef<S>,
{
    Router::new()
        .route("/", list.post(handlers::create_document))
        .route(
            "/bulk",
            post(handlers::create_documents)
                .put(handlers::update_documents)
                .patch(handlers::update_documents)
                .delete(handlers::delete_documents),
        )
        .route(
            "/{id}",
            show.put(handlers::update_document)
                .patch(handlers::update_document)
                .delete(handlers::delete_document),
        )
        .route("/{key}/{value}", get(handlers::get_by_field))
}

pub fn collection_router(state: CollectionState) -> Router {
    crud_router(
        get(handlers::list_documents),
        get(handlers::get_document),
    )
    .with_state(state)
}

/// `/api/v1/{users,appointments,lectures}`
pub fn routes(service: Arc<DocumentService>) -> Router {
    generic_collections()
        .into_iter()
        .fold(Router::new(), |router, schema| {
            let state = CollectionState {
                service: service.clone(),
                schema,
            };
            router.nest(
                &format!("/api/v1/{}", schema.collection),
                collection_router(state),
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::lazy_pool;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::json;

    fn server() -> TestServer {
        let service = Arc::new(DocumentService::new(lazy_pool()));
        TestServer::new(routes(service)).unwrap()
    }

    #[tokio::test]
    async fn test_non_numeric_page_is_bad_request() {
        let response = server().get("/api/v1/lectures").add_query_param("page", "two").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], json!(false));
    }

    #[tokio::test]
    async fn test_page_past_range_is_bad_request() {
        let response = server()
            .get("/api/v1/lectures")
            .add_query_param("page", i64::MAX)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(
            body["message"],
            json!(format!("Page {} is out of range", i64::MAX))
        );
    }

    #[tokio::test]
    async fn test_keyword_too_long_is_bad_request() {
        let response = server()
            .get("/api/v1/users")
            .add_query_param("keyword", "k".repeat(101))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(
            body["message"],
            json!("Keyword too long. Maximum length is 100 characters.")
        );
    }

    #[tokio::test]
    async fn test_invalid_range_value_is_bad_request() {
        let response = server()
            .get("/api/v1/appointments")
            .add_query_param("minEstimatedAttendees", "many")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_field_lookup_is_bad_request() {
        let response = server().get("/api/v1/lectures/color/red").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        let message = body["message"].as_str().unwrap();
        assert!(message.starts_with("Invalid field 'color'. Allowed fields: _id, title"));
    }

    #[tokio::test]
    async fn test_field_lookup_bad_limit_uses_envelope() {
        let response = server()
            .get("/api/v1/lectures/lectureType/video?limit=abc")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["success"], json!(false));
        assert!(body["message"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
    }

    #[tokio::test]
    async fn test_unknown_field_of_document_is_bad_request() {
        let id = uuid::Uuid::now_v7();
        let response = server()
            .get(&format!("/api/v1/lectures/{}/color", id))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], json!("Field 'color' not found in Lecture"));
    }

    #[tokio::test]
    async fn test_update_with_invalid_id_is_bad_request() {
        let response = server()
            .put("/api/v1/lectures/not-a-uuid")
            .json(&json!({ "title": "Intro" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_with_uncastable_body_is_bad_request() {
        let response = server()
            .post("/api/v1/appointments")
            .json(&json!({ "appointmentDate": "someday" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_empty_bulk_create_is_rejected() {
        let response = server().post("/api/v1/users/bulk").json(&json!([])).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_bulk_delete_requires_ids() {
        let response = server()
            .delete("/api/v1/users/bulk")
            .json(&json!({ "ids": [] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let response = server()
            .patch("/api/v1/users/bulk")
            .text("{ not json")
            .content_type("application/json")
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}
