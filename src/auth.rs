use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use axum_extra::extract::CookieJar;
use cookie::{Cookie, SameSite};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::{
    AppState,
    config::AuthConfig,
    entities::user,
    error::{AppError, AppResult},
    models::UserProfile,
};

/// The signed-in user behind the request's session cookie or bearer token.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub user::Model);

/// A signed-in user with the ADMIN role.
#[derive(Clone, Debug)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| AppError::unauthorized("not signed in"))?;
        let user = state.sessions.authenticate(&token).await?;
        Ok(Self(user))
    }
}

impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(AppError::forbidden("admin role required"));
        }
        Ok(Self(user))
    }
}

fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    bearer.or_else(|| {
        CookieJar::from_headers(headers).get(cookie_name).map(|c| c.value().to_string())
    })
}

fn session_cookie(auth: &AuthConfig, token: String, max_age_secs: i64) -> Cookie<'static> {
    Cookie::build((auth.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(auth.cookie_secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age_secs))
        .build()
}

#[derive(Debug, Deserialize)]
pub struct SessionRequest {
    pub id_token: String,
}

pub async fn create_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(req): Json<SessionRequest>,
) -> AppResult<(CookieJar, Json<Value>)> {
    let id_token = req.id_token.trim();
    if id_token.is_empty() {
        return Err(AppError::bad_request("id_token is required"));
    }

    let identity = state.identity.verify(id_token).await?;
    let (user, session) = state.sessions.sign_in(identity).await?;
    tracing::info!(user_id = user.id, "signed in");

    let cookie = session_cookie(
        &state.config.auth,
        session.token.clone(),
        state.sessions.ttl_seconds(),
    );
    let body = json!({
        "user": UserProfile::from(user),
        "token": session.token,
        "expires_at": session.expires_at,
    });
    Ok((jar.add(cookie), Json(body)))
}

pub async fn refresh_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    let token = session_token(&headers, &state.config.auth.cookie_name)
        .ok_or_else(|| AppError::unauthorized("not signed in"))?;
    let session = state.sessions.refresh(&token).await?;

    let cookie =
        session_cookie(&state.config.auth, session.token, state.sessions.ttl_seconds());
    Ok((jar.add(cookie), Json(json!({ "expires_at": session.expires_at }))))
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<Value>)> {
    if let Some(token) = session_token(&headers, &state.config.auth.cookie_name) {
        state.sessions.revoke(&token).await?;
    }
    let removal = Cookie::build(state.config.auth.cookie_name.clone()).path("/").build();
    Ok((jar.remove(removal), Json(json!({ "signed_out": true }))))
}
