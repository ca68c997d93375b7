//! S3-compatible cloud bucket client
//!
//! Talks to Google Cloud Storage through its S3 interoperability API (or
//! MinIO in development) with the rust-s3 crate.

use chrono::Utc;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::CloudStorageConfig;
use crate::core::error::AppError;

pub struct CloudClient {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
    endpoint: String,
    public_endpoint: String,
    prefix: String,
    signed_url_expiry_secs: u32,
    path_style: bool,
}

impl CloudClient {
    /// Build the client; no request is sent until the first operation
    pub fn new(config: CloudStorageConfig) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Internal(format!("Failed to create cloud credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Internal(format!("Failed to create cloud bucket: {}", e)))?;

        if config.path_style {
            bucket.set_path_style();
        }

        info!(
            "Cloud storage client initialized for endpoint: {}, bucket: {}, prefix: {}",
            config.endpoint,
            bucket.name(),
            config.prefix
        );

        Ok(Self {
            bucket,
            region,
            credentials,
            endpoint: config.endpoint,
            public_endpoint: config.public_endpoint,
            prefix: config.prefix,
            signed_url_expiry_secs: config.signed_url_expiry_secs,
            path_style: config.path_style,
        })
    }

    /// Create the bucket unless it already exists
    ///
    /// Failures other than "already exists" are logged and ignored; the
    /// credentials may lack permission to create buckets.
    pub async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        let name = self.bucket.name();
        let created = if self.path_style {
            Bucket::create_with_path_style(
                &name,
                self.region.clone(),
                self.credentials.clone(),
                BucketConfiguration::default(),
            )
            .await
        } else {
            Bucket::create(
                &name,
                self.region.clone(),
                self.credentials.clone(),
                BucketConfiguration::default(),
            )
            .await
        };

        match created {
            Ok(_) => info!("Bucket '{}' created successfully", name),
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", name);
                } else {
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        name, e
                    );
                }
            }
        }
        Ok(())
    }

    /// `{prefix}/{unix_millis}-{url-encoded name}`
    pub fn object_key(&self, original_name: &str) -> String {
        format!(
            "{}/{}-{}",
            self.prefix,
            Utc::now().timestamp_millis(),
            urlencoding::encode(original_name)
        )
    }

    pub async fn upload(
        &self,
        key: &str,
        data: &[u8],
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(key, data, content_type)
            .await
            .map_err(|e| AppError::ExternalServiceError(format!("Failed to upload '{}': {}", key, e)))?;

        debug!("Uploaded '{}' to bucket '{}'", key, self.bucket.name());
        Ok(key.to_string())
    }

    /// Time-limited v4-signed GET URL
    pub async fn presigned_get(&self, key: &str) -> Result<String, AppError> {
        self.bucket
            .presign_get(key, self.signed_url_expiry_secs, None)
            .await
            .map_err(|e| {
                AppError::ExternalServiceError(format!(
                    "Failed to generate signed URL for '{}': {}",
                    key, e
                ))
            })
    }

    pub fn public_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.public_endpoint, self.bucket.name(), key)
    }

    /// Object key behind a public or internal URL of this bucket
    pub fn extract_key_from_url(&self, url: &str) -> Option<String> {
        [&self.public_endpoint, &self.endpoint]
            .into_iter()
            .map(|endpoint| format!("{}/{}/", endpoint, self.bucket.name()))
            .find_map(|prefix| url.strip_prefix(prefix.as_str()).map(str::to_string))
            .filter(|key| !key.is_empty())
    }
}
