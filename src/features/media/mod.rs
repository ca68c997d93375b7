//! Media uploads and file serving.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/v1/media/upload` | Multipart upload, or record media by url |
//! | GET | `/api/v1/media` | List media with `signedUrl` |
//! | GET | `/api/v1/media/{id}` | Media with `signedUrl` |
//! | GET | `/{mediaType}/{filename}` | Stream a stored file |
//! | GET | `/uploads/{mediaType}/{filename}` | Stream a stored file |
//! | GET | `/download/{mediaType}/{filename}` | Download a stored file |
//!
//! All other generic document routes apply to `/api/v1/media` unchanged.

pub mod dtos;
pub mod handlers;
pub mod media_types;
pub mod models;
pub mod routes;
pub mod services;

pub use services::MediaService;
