mod auth;
mod catalog;
mod config;
mod db;
mod entities;
mod error;
mod identity;
mod importer;
mod models;
mod movies;
mod recommend;
mod routes;
mod sessions;
mod slug;
mod taxonomy;
mod uploads;
mod user;
mod vector;

#[cfg(test)]
mod testing;

use std::{sync::Arc, time::Duration};

use sea_orm::DatabaseConnection;
use wreq::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::{
    catalog::CatalogClient,
    config::Config,
    identity::{FirebaseIdentity, IdentityProvider},
    sessions::SessionManager,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub sessions: SessionManager,
    pub identity: Arc<dyn IdentityProvider>,
    pub catalog: Arc<CatalogClient>,
    pub http: wreq::Client,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,reelhouse=debug,sqlx=warn".to_string()),
        )
        .init();

    let config = Arc::new(Config::from_env()?);

    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static("reelhouse/0.1"));
    let http = wreq::Client::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(30))
        .build()?;

    let db = db::connect_and_migrate(&config.database_url).await?;

    let sessions = SessionManager::new(
        db.clone(),
        config.auth.session_ttl_days,
        config.auth.admin_emails.clone(),
    );
    let identity = FirebaseIdentity::new(
        http.clone(),
        config.auth.firebase_api_key.clone(),
        config.auth.identity_toolkit_url.clone(),
    );
    let catalog =
        CatalogClient::new(http.clone(), config.catalog_base_url.clone(), config.catalog_rps);

    if config.s3.is_none() {
        tracing::warn!("S3 not configured - presigned uploads are disabled");
    }
    if config.cloudinary.is_none() {
        tracing::warn!("Cloudinary not configured - image uploads are disabled");
    }

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sessions,
        identity: Arc::new(identity),
        catalog: Arc::new(catalog),
        http,
    });

    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
