//! Storage module for media files
//!
//! Provides the local chunked grid store and the S3-compatible cloud
//! bucket client.

mod cloud_client;
mod grid_store;

pub use cloud_client::CloudClient;
pub use grid_store::{GridFile, GridStore};
