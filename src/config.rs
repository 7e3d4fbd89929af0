//! Configuration management

use std::path::PathBuf;

use anyhow::{self, Context, Result};

const DEFAULT_IMPORT_DIR: &str = "tmp/import_data";
const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// NATS server URL
    pub nats_url: String,

    /// PostgreSQL connection string
    pub database_url: String,

    /// JWT secret used to validate request tokens
    pub jwt_secret: String,

    /// Directory scanned by `bakemate.import.scan`
    pub import_dir: PathBuf,

    /// Largest decoded upload accepted by `bakemate.import.submit`
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url = database_url_from_env()?;

        let nats_url = std::env::var("NATS_URL")
            .unwrap_or_else(|_| "nats://localhost:4222".to_string());

        let jwt_secret = std::env::var("JWT_SECRET")
            .context("JWT_SECRET must be set (generate one with: openssl rand -base64 48)")?;

        if jwt_secret.len() < 32 {
            anyhow::bail!(
                "JWT_SECRET must be at least 32 bytes (current: {} bytes)",
                jwt_secret.len()
            );
        }

        const KNOWN_DEV_SECRETS: &[&str] = &[
            "dev-secret-change-in-production-min-32-bytes!!",
        ];
        if KNOWN_DEV_SECRETS.contains(&jwt_secret.as_str()) {
            tracing::warn!("JWT_SECRET matches a known default, change it for production!");
        }

        let max_upload_bytes = match std::env::var("MAX_UPLOAD_BYTES") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("MAX_UPLOAD_BYTES is not a number: {}", value))?,
            Err(_) => DEFAULT_MAX_UPLOAD_BYTES,
        };

        Ok(Self {
            nats_url,
            database_url,
            jwt_secret,
            import_dir: import_dir_from_env(),
            max_upload_bytes,
        })
    }
}

/// Database URL only, for CLI commands that do not serve requests
pub fn database_url_from_env() -> Result<String> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    std::env::var("DATABASE_URL").context("DATABASE_URL must be set")
}

/// Directory scanned for `*<Kind>*.csv` files; `.env` is honoured
pub fn import_dir_from_env() -> PathBuf {
    dotenvy::dotenv().ok();

    std::env::var("IMPORT_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_IMPORT_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_import_dir_defaults() {
        std::env::remove_var("IMPORT_DIR");
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", "test-secret-key-for-jwt-at-least-32-bytes-long");

        let config = Config::from_env().unwrap();
        assert_eq!(config.import_dir, PathBuf::from("tmp/import_data"));
        assert_eq!(config.max_upload_bytes, 50 * 1024 * 1024);
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_rejects_short_jwt_secret() {
        std::env::set_var("DATABASE_URL", "postgres://test");
        std::env::set_var("JWT_SECRET", "too-short");

        assert!(Config::from_env().is_err());

        std::env::remove_var("JWT_SECRET");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var race
    fn test_config_import_dir_uses_env() {
        std::env::set_var("IMPORT_DIR", "/srv/bakemate/imports");

        assert_eq!(import_dir_from_env(), PathBuf::from("/srv/bakemate/imports"));

        std::env::remove_var("IMPORT_DIR");
    }

    #[test]
    #[ignore] // requires --test-threads=1 due to env var and cwd race
    fn test_import_dir_reads_dotenv_file() {
        let dir = std::env::temp_dir().join(format!("bakemate-dotenv-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(".env"), "IMPORT_DIR=/srv/bakemate/from-dotenv\n").unwrap();
        let previous = std::env::current_dir().unwrap();
        std::env::remove_var("IMPORT_DIR");
        std::env::set_current_dir(&dir).unwrap();

        let import_dir = import_dir_from_env();

        std::env::set_current_dir(previous).unwrap();
        std::env::remove_var("IMPORT_DIR");
        std::fs::remove_dir_all(&dir).unwrap();
        assert_eq!(import_dir, PathBuf::from("/srv/bakemate/from-dotenv"));
    }
}
