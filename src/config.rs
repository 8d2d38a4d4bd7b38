use std::net::SocketAddr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub catalog_base_url: String,
    pub catalog_rps: u32,
    pub max_concurrent_imports: usize,
    pub recent_window_days: i64,
    pub auth: AuthConfig,
    pub s3: Option<S3Config>,
    pub cloudinary: Option<CloudinaryConfig>,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub firebase_api_key: String,
    pub identity_toolkit_url: String,
    /// Lower-cased.
    pub admin_emails: Vec<String>,
    pub session_ttl_days: i64,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

#[derive(Clone, Debug)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Path-style endpoint for S3-compatible stores, e.g. `http://localhost:9000`.
    pub endpoint: Option<String>,
    pub public_url: Option<String>,
    pub presign_expires_secs: u64,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env_or("HOST", "0.0.0.0");
        let port: u16 = env_or("PORT", "3000").parse().context("PORT")?;

        let database_url = env_or("DATABASE_URL", "sqlite://reelhouse.db?mode=rwc");
        let catalog_base_url = env_or("CATALOG_BASE_URL", "https://phimapi.com");

        let catalog_rps: u32 = env_parsed("CATALOG_RPS").unwrap_or(4);
        let max_concurrent_imports: usize = env_parsed("MAX_CONCURRENT_IMPORTS").unwrap_or(5);
        let recent_window_days: i64 = env_parsed("RECENT_WINDOW_DAYS").unwrap_or(7);

        let admin_emails = env_or("ADMIN_EMAILS", "")
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let auth = AuthConfig {
            firebase_api_key: env_or("FIREBASE_API_KEY", ""),
            identity_toolkit_url: env_or(
                "IDENTITY_TOOLKIT_URL",
                "https://identitytoolkit.googleapis.com/v1",
            ),
            admin_emails,
            session_ttl_days: env_parsed("SESSION_TTL_DAYS").unwrap_or(5),
            cookie_name: env_or("SESSION_COOKIE_NAME", "session"),
            cookie_secure: env_parsed("COOKIE_SECURE").unwrap_or(false),
        };

        let s3 = match (
            env_nonempty("S3_BUCKET"),
            env_nonempty("S3_ACCESS_KEY_ID"),
            env_nonempty("S3_SECRET_ACCESS_KEY"),
        ) {
            (Some(bucket), Some(access_key_id), Some(secret_access_key)) => Some(S3Config {
                bucket,
                region: env_or("S3_REGION", "us-east-1"),
                access_key_id,
                secret_access_key,
                endpoint: env_nonempty("S3_ENDPOINT"),
                public_url: env_nonempty("S3_PUBLIC_URL"),
                presign_expires_secs: env_parsed("S3_PRESIGN_EXPIRES_SECS").unwrap_or(300),
            }),
            _ => None,
        };

        let cloudinary = match (
            env_nonempty("CLOUDINARY_CLOUD_NAME"),
            env_nonempty("CLOUDINARY_API_KEY"),
            env_nonempty("CLOUDINARY_API_SECRET"),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(CloudinaryConfig {
                cloud_name,
                api_key,
                api_secret,
                api_url: env_or("CLOUDINARY_API_URL", "https://api.cloudinary.com/v1_1"),
            }),
            _ => None,
        };

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            catalog_base_url,
            catalog_rps,
            max_concurrent_imports,
            recent_window_days,
            auth,
            s3,
            cloudinary,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
