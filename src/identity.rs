use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// Turns a client-side ID token into a verified identity.
pub trait IdentityProvider: Send + Sync {
    fn verify<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>>;
}

/// Verifies Firebase ID tokens through the Identity Toolkit `accounts:lookup` endpoint.
pub struct FirebaseIdentity {
    client: wreq::Client,
    api_key: String,
    base_url: String,
}

impl FirebaseIdentity {
    pub fn new(client: wreq::Client, api_key: String, base_url: String) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("FIREBASE_API_KEY not set - sign-in is disabled");
        }
        Self { client, api_key, base_url }
    }

    async fn lookup(&self, id_token: &str) -> AppResult<VerifiedIdentity> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::unauthorized("sign-in is not configured"));
        }

        let url = format!("{}/accounts:lookup", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "idToken": id_token }))
            .send()
            .await?;

        if resp.status().is_client_error() {
            tracing::debug!(status = %resp.status(), "id token rejected");
            return Err(AppError::unauthorized("invalid id token"));
        }

        let body: LookupResponse = resp.error_for_status()?.json().await?;
        body.users
            .into_iter()
            .next()
            .map(|u| VerifiedIdentity {
                uid: u.local_id,
                email: u.email,
                name: u.display_name,
                avatar: u.photo_url,
            })
            .ok_or_else(|| AppError::unauthorized("invalid id token"))
    }
}

impl IdentityProvider for FirebaseIdentity {
    fn verify<'a>(&'a self, id_token: &'a str) -> BoxFuture<'a, AppResult<VerifiedIdentity>> {
        Box::pin(self.lookup(id_token))
    }
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
}
