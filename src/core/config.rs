use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub swagger: SwaggerConfig,
    pub cloud_storage: CloudStorageConfig,
    pub grid_store: GridStoreConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
    pub max_request_body_size: usize,
    pub request_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// S3-compatible cloud bucket used for video uploads and as the upload fallback
#[derive(Debug, Clone)]
pub struct CloudStorageConfig {
    /// S3 API endpoint (Google Cloud Storage interoperability by default)
    pub endpoint: String,
    /// Base URL used when building public object URLs
    pub public_endpoint: String,
    /// HMAC access key
    pub access_key: String,
    /// HMAC secret
    pub secret_key: String,
    /// Bucket name
    pub bucket: String,
    pub region: String,
    /// Key prefix for uploaded media objects (e.g., "media")
    pub prefix: String,
    /// Lifetime of signed read URLs, in seconds
    pub signed_url_expiry_secs: u32,
    /// Use path-style addressing (http://endpoint/bucket/key)
    pub path_style: bool,
}

/// Local chunked object store kept in the primary database
#[derive(Debug, Clone)]
pub struct GridStoreConfig {
    pub bucket_name: String,
    pub chunk_size: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            cloud_storage: CloudStorageConfig::from_env()?,
            grid_store: GridStoreConfig::from_env()?,
        })
    }
}

impl AppConfig {
    const DEFAULT_MAX_REQUEST_BODY_SIZE: usize = 10 * 1024 * 1024; // 10MB
    const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;
    /// Development frontend, always allowed by CORS
    pub const DEV_FRONTEND_ORIGIN: &'static str = "http://localhost:4200";

    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        let cors_allowed_origins =
            Self::parse_origins(&env::var("CORS_ORIGIN").unwrap_or_default());

        let max_request_body_size = env::var("MAX_REQUEST_BODY_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_REQUEST_BODY_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "MAX_REQUEST_BODY_SIZE must be a valid number".to_string())?;

        let request_timeout_secs = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "REQUEST_TIMEOUT_SECS must be a valid number".to_string())?;

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
            max_request_body_size,
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Split a comma-separated origin list and append the dev frontend origin
    fn parse_origins(raw: &str) -> Vec<String> {
        let mut origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if !origins.iter().any(|o| o == Self::DEV_FRONTEND_ORIGIN) {
            origins.push(Self::DEV_FRONTEND_ORIGIN.to_string());
        }
        origins
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Academy API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Collections, queries and media for Academy".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl CloudStorageConfig {
    const DEFAULT_SIGNED_URL_EXPIRY_SECS: u32 = 15 * 60; // 15 minutes

    pub fn from_env() -> Result<Self, String> {
        let access_key = env::var("CLOUD_STORAGE_ACCESS_KEY").ok().filter(|s| !s.is_empty());
        let secret_key = env::var("CLOUD_STORAGE_SECRET_KEY").ok().filter(|s| !s.is_empty());
        let bucket = env::var("BUCKET_NAME").ok().filter(|s| !s.is_empty());

        let (access_key, secret_key, bucket) = match (access_key, secret_key, bucket) {
            (Some(a), Some(s), Some(b)) => (a, s, b),
            _ => {
                return Err("Missing required environment variables: \
                    CLOUD_STORAGE_ACCESS_KEY, CLOUD_STORAGE_SECRET_KEY or BUCKET_NAME"
                    .to_string())
            }
        };

        let endpoint = env::var("CLOUD_STORAGE_ENDPOINT")
            .unwrap_or_else(|_| "https://storage.googleapis.com".to_string());

        // Public endpoint defaults to the main endpoint if not specified
        let public_endpoint =
            env::var("CLOUD_STORAGE_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());

        let region = env::var("CLOUD_STORAGE_REGION").unwrap_or_else(|_| "auto".to_string());

        let prefix = env::var("CLOUD_STORAGE_PREFIX").unwrap_or_else(|_| "media".to_string());

        let signed_url_expiry_secs = env::var("CLOUD_STORAGE_SIGNED_URL_EXPIRY_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_SIGNED_URL_EXPIRY_SECS.to_string())
            .parse::<u32>()
            .map_err(|_| {
                "CLOUD_STORAGE_SIGNED_URL_EXPIRY_SECS must be a valid number".to_string()
            })?;

        let path_style = env::var("CLOUD_STORAGE_PATH_STYLE")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_endpoint: public_endpoint.trim_end_matches('/').to_string(),
            access_key,
            secret_key,
            bucket,
            region,
            prefix,
            signed_url_expiry_secs,
            path_style,
        })
    }
}

impl GridStoreConfig {
    const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

    pub fn from_env() -> Result<Self, String> {
        let bucket_name = env::var("GRID_BUCKET_NAME").unwrap_or_else(|_| "uploads".to_string());

        let chunk_size = env::var("GRID_CHUNK_SIZE")
            .unwrap_or_else(|_| Self::DEFAULT_CHUNK_SIZE.to_string())
            .parse::<usize>()
            .map_err(|_| "GRID_CHUNK_SIZE must be a valid number".to_string())?;

        if chunk_size == 0 {
            return Err("GRID_CHUNK_SIZE must be greater than zero".to_string());
        }

        Ok(Self {
            bucket_name,
            chunk_size,
        })
    }
}

impl Default for GridStoreConfig {
    fn default() -> Self {
        Self {
            bucket_name: "uploads".to_string(),
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origins_appends_dev_frontend() {
        let origins = AppConfig::parse_origins("https://a.example, https://b.example,");
        assert_eq!(
            origins,
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                AppConfig::DEV_FRONTEND_ORIGIN.to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_origins_does_not_duplicate_dev_frontend() {
        let origins = AppConfig::parse_origins("http://localhost:4200");
        assert_eq!(origins, vec![AppConfig::DEV_FRONTEND_ORIGIN.to_string()]);
    }

    #[test]
    fn test_swagger_credentials() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials(), Some("admin:secret".to_string()));
    }
}
