//! Configuration module
//!
//! Process-wide settings are read once at start into an immutable [`Config`]
//! and handed to constructors. Nothing below the setup layer reads the
//! environment.

use std::env;
use std::path::PathBuf;

use crate::constants::{DEFAULT_LOCAL_STORAGE_PATH, DEFAULT_S3_REGION, MAX_UPLOAD_SIZE_MB};
use crate::storage_types::StorageBackend;

const DEFAULT_PORT: u16 = 4000;

/// Console output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

/// Object store settings, present when `STORAGE_BACKEND=s3`.
#[derive(Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible providers (MinIO, DigitalOcean Spaces, etc.)
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub log_format: LogFormat,
    pub storage_backend: StorageBackend,
    pub local_storage_path: PathBuf,
    pub s3: Option<S3Config>,
    pub max_upload_size_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = parse_origins(&env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string()));

        let server_port = env::var("PORT")
            .unwrap_or_else(|_| DEFAULT_PORT.to_string())
            .parse()
            .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?;

        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<StorageBackend>()?;

        let local_storage_path = env::var("LOCAL_STORAGE_PATH")
            .unwrap_or_else(|_| DEFAULT_LOCAL_STORAGE_PATH.to_string())
            .into();

        let s3 = match storage_backend {
            StorageBackend::S3 => Some(S3Config {
                bucket: env::var("S3_BUCKET").map_err(|_| {
                    anyhow::anyhow!("S3_BUCKET must be set when STORAGE_BACKEND=s3")
                })?,
                region: env::var("S3_REGION")
                    .or_else(|_| env::var("AWS_REGION"))
                    .unwrap_or_else(|_| DEFAULT_S3_REGION.to_string()),
                endpoint: env::var("S3_ENDPOINT").ok().filter(|s| !s.is_empty()),
                access_key_id: env::var("AWS_ACCESS_KEY_ID").ok(),
                secret_access_key: env::var("AWS_SECRET_ACCESS_KEY").ok(),
            }),
            StorageBackend::Local => None,
        };

        let max_upload_size_bytes = parse_upload_limit(env::var("MAX_UPLOAD_SIZE_MB").ok())?;

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };

        let config = Config {
            server_port,
            cors_origins,
            environment,
            log_format,
            storage_backend,
            local_storage_path,
            s3,
            max_upload_size_bytes,
        };
        config.validate()?;
        Ok(config)
    }

    /// Local-storage configuration rooted at `path`, without reading the environment.
    pub fn for_local(path: impl Into<PathBuf>) -> Self {
        Config {
            server_port: DEFAULT_PORT,
            cors_origins: vec!["*".to_string()],
            environment: "test".to_string(),
            log_format: LogFormat::Compact,
            storage_backend: StorageBackend::Local,
            local_storage_path: path.into(),
            s3: None,
            max_upload_size_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
        }
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn allows_any_origin(&self) -> bool {
        self.cors_origins.iter().any(|o| o == "*")
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.allows_any_origin() {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than zero"));
        }

        match (self.storage_backend, &self.s3) {
            (StorageBackend::S3, None) => Err(anyhow::anyhow!(
                "S3 storage selected but no S3 settings were loaded"
            )),
            (StorageBackend::S3, Some(s3)) if s3.bucket.trim().is_empty() => {
                Err(anyhow::anyhow!("S3_BUCKET must not be empty"))
            }
            (StorageBackend::S3, Some(s3))
                if s3.access_key_id.is_some() != s3.secret_access_key.is_some() =>
            {
                Err(anyhow::anyhow!(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together"
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Upload limit in bytes from a `MAX_UPLOAD_SIZE_MB` value, defaulting when unset.
fn parse_upload_limit(raw: Option<String>) -> Result<u64, anyhow::Error> {
    let megabytes = match raw {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a valid number"))?,
        None => MAX_UPLOAD_SIZE_MB,
    };
    megabytes
        .checked_mul(1024 * 1024)
        .ok_or_else(|| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large"))
}

/// Split an origin list on commas or semicolons, dropping blanks.
fn parse_origins(raw: &str) -> Vec<String> {
    raw.split([',', ';'])
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3_config() -> Config {
        Config {
            storage_backend: StorageBackend::S3,
            s3: Some(S3Config {
                bucket: "images.example".to_string(),
                region: DEFAULT_S3_REGION.to_string(),
                endpoint: None,
                access_key_id: Some("AKIA".to_string()),
                secret_access_key: Some("secret".to_string()),
            }),
            ..Config::for_local("unused")
        }
    }

    #[test]
    fn test_upload_limit_parsing() {
        assert_eq!(parse_upload_limit(None).unwrap(), 32 * 1024 * 1024);
        assert_eq!(parse_upload_limit(Some(" 5 ".to_string())).unwrap(), 5 * 1024 * 1024);
        assert!(parse_upload_limit(Some("32MB".to_string())).is_err());
        assert!(parse_upload_limit(Some("-1".to_string())).is_err());
        assert!(parse_upload_limit(Some(u64::MAX.to_string())).is_err());
    }

    #[test]
    fn test_parse_origins_accepts_both_separators() {
        assert_eq!(
            parse_origins("https://a.example; https://b.example,https://c.example"),
            vec![
                "https://a.example".to_string(),
                "https://b.example".to_string(),
                "https://c.example".to_string()
            ]
        );
        assert!(parse_origins(" ; ").is_empty());
    }

    #[test]
    fn test_wildcard_cors_rejected_in_production() {
        let mut config = Config::for_local("images");
        assert!(config.validate().is_ok());

        config.environment = "Production".to_string();
        assert!(config.validate().is_err());

        config.cors_origins = vec!["https://app.example".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_s3_requires_paired_credentials() {
        let config = s3_config();
        assert!(config.validate().is_ok());

        let mut config = s3_config();
        if let Some(s3) = config.s3.as_mut() {
            s3.secret_access_key = None;
        }
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_s3_config_debug_redacts_secret() {
        let config = s3_config();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret\""));
        assert!(rendered.contains("<redacted>"));
    }
}
