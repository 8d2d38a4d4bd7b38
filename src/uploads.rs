use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sha2::{Digest, Sha256};

use crate::{
    config::{CloudinaryConfig, S3Config},
    error::{AppError, AppResult},
    slug::slugify,
};

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone, Debug, Serialize)]
pub struct PresignedUpload {
    pub upload_url: String,
    pub key: String,
    pub public_url: String,
    pub content_type: Option<String>,
    pub expires_in: u64,
}

/// Inputs for an AWS SigV4 query-string signature. `path` is already URI-encoded.
#[derive(Clone, Debug)]
pub struct PresignParams<'a> {
    pub method: &'a str,
    pub scheme: &'a str,
    pub host: &'a str,
    pub path: &'a str,
    pub region: &'a str,
    pub access_key_id: &'a str,
    pub secret_access_key: &'a str,
    pub timestamp: jiff::Timestamp,
    pub expires_secs: u64,
}

pub fn presign_url(p: &PresignParams<'_>) -> AppResult<String> {
    let utc = p.timestamp.to_zoned(jiff::tz::TimeZone::UTC);
    let amz_date = utc.strftime("%Y%m%dT%H%M%SZ").to_string();
    let date_stamp = utc.strftime("%Y%m%d").to_string();
    let scope = format!("{date_stamp}/{}/s3/aws4_request", p.region);

    let credential = format!("{}/{scope}", p.access_key_id);
    let query = format!(
        "X-Amz-Algorithm=AWS4-HMAC-SHA256&X-Amz-Credential={}&X-Amz-Date={amz_date}&X-Amz-Expires={}&X-Amz-SignedHeaders=host",
        urlencoding::encode(&credential),
        p.expires_secs,
    );

    let canonical_request =
        format!("{}\n{}\n{query}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD", p.method, p.path, p.host);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let k_date = hmac_sha256(format!("AWS4{}", p.secret_access_key).as_bytes(), date_stamp.as_bytes())?;
    let k_region = hmac_sha256(&k_date, p.region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, b"s3")?;
    let k_signing = hmac_sha256(&k_service, b"aws4_request")?;
    let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes())?);

    Ok(format!("{}://{}{}?{query}&X-Amz-Signature={signature}", p.scheme, p.host, p.path))
}

/// Builds a presigned PUT for a fresh object key derived from `filename`.
pub fn presign_put(
    cfg: &S3Config,
    filename: &str,
    content_type: Option<String>,
    folder: Option<&str>,
    now: jiff::Timestamp,
) -> AppResult<PresignedUpload> {
    let key = object_key(filename, folder)?;
    let encoded_key = key.split('/').map(|seg| urlencoding::encode(seg)).collect::<Vec<_>>().join("/");

    let (scheme, host, path) = match &cfg.endpoint {
        Some(endpoint) => {
            let (scheme, rest) = match endpoint.split_once("://") {
                Some((scheme, rest)) => (scheme.to_string(), rest),
                None => ("https".to_string(), endpoint.as_str()),
            };
            (scheme, rest.trim_end_matches('/').to_string(), format!("/{}/{encoded_key}", cfg.bucket))
        },
        None => (
            "https".to_string(),
            format!("{}.s3.{}.amazonaws.com", cfg.bucket, cfg.region),
            format!("/{encoded_key}"),
        ),
    };

    let upload_url = presign_url(&PresignParams {
        method: "PUT",
        scheme: &scheme,
        host: &host,
        path: &path,
        region: &cfg.region,
        access_key_id: &cfg.access_key_id,
        secret_access_key: &cfg.secret_access_key,
        timestamp: now,
        expires_secs: cfg.presign_expires_secs,
    })?;

    let public_url = match &cfg.public_url {
        Some(base) => format!("{}/{encoded_key}", base.trim_end_matches('/')),
        None => format!("{scheme}://{host}{path}"),
    };

    Ok(PresignedUpload {
        upload_url,
        key,
        public_url,
        content_type,
        expires_in: cfg.presign_expires_secs,
    })
}

/// `<folder>/<uuid>-<slugified stem>.<ext>`; folder defaults to `uploads`.
pub fn object_key(filename: &str, folder: Option<&str>) -> AppResult<String> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(AppError::bad_request("filename is required"));
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    };
    let stem = match slugify(stem) {
        s if s.is_empty() => "file".to_string(),
        s => s,
    };
    let ext: Option<String> = ext
        .map(|e| e.chars().filter(char::is_ascii_alphanumeric).collect::<String>().to_lowercase())
        .filter(|e| !e.is_empty());
    let folder = folder.map(slugify).filter(|f| !f.is_empty()).unwrap_or_else(|| "uploads".into());

    let id = uuid::Uuid::new_v4().simple();
    Ok(match ext {
        Some(ext) => format!("{folder}/{id}-{stem}.{ext}"),
        None => format!("{folder}/{id}-{stem}"),
    })
}

#[derive(Clone, Debug, Serialize)]
pub struct CloudinaryUpload {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Deserialize)]
struct CloudinaryResponse {
    secure_url: String,
    public_id: String,
}

/// Cloudinary signature: sorted `k=v` pairs joined by `&`, secret appended, SHA-256 hex.
pub fn cloudinary_signature(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let joined =
        params.iter().map(|(k, v)| format!("{k}={v}")).collect::<Vec<_>>().join("&");
    hex::encode(Sha256::digest(format!("{joined}{api_secret}").as_bytes()))
}

/// Uploads a remote URL or data URI to Cloudinary with a signed request.
pub async fn cloudinary_upload(
    http: &wreq::Client,
    cfg: &CloudinaryConfig,
    file: &str,
    folder: Option<&str>,
    now: i64,
) -> AppResult<CloudinaryUpload> {
    if file.trim().is_empty() {
        return Err(AppError::bad_request("file is required"));
    }

    let mut params = BTreeMap::new();
    params.insert("timestamp", now.to_string());
    if let Some(folder) = folder.map(str::trim).filter(|f| !f.is_empty()) {
        params.insert("folder", folder.to_string());
    }
    let signature = cloudinary_signature(&params, &cfg.api_secret);

    let mut body = json!({
        "file": file,
        "api_key": cfg.api_key,
        "signature": signature,
        "signature_algorithm": "sha256",
    });
    for (k, v) in &params {
        body[*k] = Value::String(v.clone());
    }

    let url = format!("{}/{}/auto/upload", cfg.api_url.trim_end_matches('/'), cfg.cloud_name);
    let resp = http.post(url).json(&body).send().await?;
    if resp.status().is_client_error() {
        let status = resp.status();
        let detail: Value = resp.json().await.unwrap_or(Value::Null);
        let msg = detail["error"]["message"].as_str().unwrap_or("upload rejected").to_string();
        tracing::warn!(status = %status, error = %msg, "cloudinary upload rejected");
        return Err(AppError::bad_request(msg));
    }

    let uploaded: CloudinaryResponse = resp.error_for_status()?.json().await?;
    Ok(CloudinaryUpload { url: uploaded.secure_url, public_id: uploaded.public_id })
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> AppResult<Vec<u8>> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| anyhow::anyhow!("hmac key: {e}"))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}
