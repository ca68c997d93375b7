//! Modules layer - infrastructure shared by features
//!
//! Holds the storage backends: the S3-compatible cloud bucket and the
//! chunked file store kept in Postgres.

pub mod storage;
