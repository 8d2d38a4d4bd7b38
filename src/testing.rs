//! In-process app harness for router tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
    response::Response,
};
use futures::future::BoxFuture;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    AppState,
    catalog::CatalogClient,
    config::{AuthConfig, Config, S3Config},
    db::test_db,
    entities::{episode, movie},
    error::{AppError, AppResult},
    identity::{IdentityProvider, VerifiedIdentity},
    routes,
    sessions::SessionManager,
    slug::slugify,
    taxonomy::types,
};

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Accepts tokens shaped `valid:<uid>:<email>`.
pub struct StubIdentity;

impl IdentityProvider for StubIdentity {
    fn verify<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>> {
        Box::pin(async move {
            let mut parts = id_token.splitn(3, ':');
            match (parts.next(), parts.next(), parts.next()) {
                (Some("valid"), Some(uid), Some(email)) if !uid.is_empty() => {
                    Ok(VerifiedIdentity {
                        uid: uid.to_string(),
                        email: Some(email.to_string()),
                        name: None,
                        avatar: None,
                    })
                },
                _ => Err(AppError::unauthorized("invalid id token")),
            }
        })
    }
}

pub fn test_config() -> Config {
    Config {
        addr: "127.0.0.1:0".parse().unwrap(),
        database_url: "sqlite::memory:".to_string(),
        catalog_base_url: "http://127.0.0.1:9".to_string(),
        catalog_rps: 100,
        max_concurrent_imports: 2,
        recent_window_days: 7,
        auth: AuthConfig {
            firebase_api_key: String::new(),
            identity_toolkit_url: "http://127.0.0.1:9".to_string(),
            admin_emails: vec![ADMIN_EMAIL.to_string()],
            session_ttl_days: 5,
            cookie_name: "session".to_string(),
            cookie_secure: false,
        },
        s3: None,
        cloudinary: None,
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_s3() -> Self {
        let mut config = test_config();
        config.s3 = Some(S3Config {
            bucket: "media".to_string(),
            region: "us-east-1".to_string(),
            access_key_id: "AKIDTEST".to_string(),
            secret_access_key: "secret".to_string(),
            endpoint: None,
            public_url: Some("https://cdn.example.com".to_string()),
            presign_expires_secs: 600,
        });
        Self::with_config(config).await
    }

    /// Points the catalog client at `base_url`, usually a mock server.
    pub async fn with_catalog(base_url: String) -> Self {
        let mut config = test_config();
        config.catalog_base_url = base_url;
        Self::with_config(config).await
    }

    async fn with_config(config: Config) -> Self {
        let db = test_db().await;
        let http = wreq::Client::builder().build().unwrap();
        let catalog =
            CatalogClient::new(http.clone(), config.catalog_base_url.clone(), config.catalog_rps);
        let sessions = SessionManager::new(
            db.clone(),
            config.auth.session_ttl_days,
            config.auth.admin_emails.clone(),
        );

        let state = Arc::new(AppState {
            config: Arc::new(config),
            db,
            sessions,
            identity: Arc::new(StubIdentity),
            catalog: Arc::new(catalog),
            http,
        });
        let router = routes::router(state.clone());
        Self { state, router }
    }

    pub async fn sign_in(&self, uid: &str, email: &str) -> String {
        let identity = VerifiedIdentity {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            name: None,
            avatar: None,
        };
        let (_, session) = self.state.sessions.sign_in(identity).await.unwrap();
        session.token
    }

    pub async fn sign_in_admin(&self) -> String {
        self.sign_in("admin-uid", ADMIN_EMAIL).await
    }

    pub async fn send(&self, req: Request<Body>) -> Response {
        self.router.clone().oneshot(req).await.unwrap()
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        token: Option<&String>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };
        let resp = self.send(req).await;
        (resp.status(), body_json(resp).await)
    }

    pub async fn get(&self, path: &str, token: Option<&String>) -> (StatusCode, Value) {
        self.call(Method::GET, path, token, None).await
    }

    pub async fn post(&self, path: &str, token: Option<&String>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, path, token, Some(body)).await
    }

    pub async fn put(&self, path: &str, token: Option<&String>, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, path, token, Some(body)).await
    }

    pub async fn patch(
        &self,
        path: &str,
        token: Option<&String>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.call(Method::PATCH, path, token, Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&String>) -> (StatusCode, Value) {
        self.call(Method::DELETE, path, token, None).await
    }

    pub async fn delete_json(
        &self,
        path: &str,
        token: Option<&String>,
        body: Value,
    ) -> (StatusCode, Value) {
        self.call(Method::DELETE, path, token, Some(body)).await
    }

    pub async fn raw_post_json(&self, path: &str, body: Value) -> Response {
        let req = Request::builder()
            .method(Method::POST)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(req).await
    }

    pub async fn get_with_cookie(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let cookie = format!("{}={token}", self.state.config.auth.cookie_name);
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap();
        let resp = self.send(req).await;
        (resp.status(), body_json(resp).await)
    }
}

pub async fn body_json(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Inserts a movie of `type_slug` with one episode created at `episode_created_at`.
pub async fn seed_movie(
    db: &DatabaseConnection,
    type_slug: &str,
    name: &str,
    episode_created_at: i64,
) -> movie::Model {
    let ty = types::ensure(db, type_slug, type_slug, 0).await.unwrap();
    let movie = movie::ActiveModel {
        name: Set(name.to_string()),
        slug: Set(slugify(name)),
        view: Set(0),
        actors: Set("[]".to_string()),
        directors: Set("[]".to_string()),
        type_id: Set(Some(ty.id)),
        created_at: Set(0),
        updated_at: Set(0),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    episode::ActiveModel {
        movie_id: Set(movie.id),
        name: Set("Tập 1".to_string()),
        slug: Set("tap-1".to_string()),
        created_at: Set(episode_created_at),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();

    movie
}
