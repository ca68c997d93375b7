use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post},
    Router,
};

use crate::features::documents::routes::{crud_router, CollectionState};
use crate::features::documents::DocumentService;
use crate::features::media::handlers;
use crate::features::media::media_types::MAX_UPLOAD_SIZE;
use crate::features::media::models::MEDIA_SCHEMA;
use crate::features::media::services::MediaService;

/// Multipart overhead allowed on top of the largest file
const UPLOAD_FORM_OVERHEAD: u64 = 1024 * 1024;

#[derive(Clone, FromRef)]
pub struct MediaRouterState {
    pub media: Arc<MediaService>,
    pub collection: CollectionState,
}

/// `/api/v1/media` (generic CRUD with media reads) plus file serving
pub fn routes(media: Arc<MediaService>, documents: Arc<DocumentService>) -> Router {
    let state = MediaRouterState {
        media,
        collection: CollectionState {
            service: documents,
            schema: &MEDIA_SCHEMA,
        },
    };

    let upload_limit = usize::try_from(MAX_UPLOAD_SIZE + UPLOAD_FORM_OVERHEAD).unwrap_or(usize::MAX);

    let api = crud_router(get(handlers::list_media), get(handlers::get_media)).route(
        "/upload",
        post(handlers::upload_media).layer(DefaultBodyLimit::max(upload_limit)),
    );

    Router::new()
        .nest("/api/v1/media", api)
        .route("/{media_type}/{filename}", get(handlers::serve_file))
        .route("/uploads/{media_type}/{filename}", get(handlers::serve_file))
        .route("/download/{media_type}/{filename}", get(handlers::download_file))
        .with_state(state)
}
