//! Cloudinary-backed implementation of the `AvatarStore` port.
//!
//! Uploads are signed server-side: the request parameters (minus the file and
//! API key) are sorted, joined as `key=value` pairs, suffixed with the API
//! secret and hashed with SHA-256. Each contact owns a single public id so a
//! re-upload overwrites the previous image.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ContactId;
use crate::domain::ports::{AvatarStore, AvatarStoreError, AvatarUpload};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);
const PUBLIC_ID_PREFIX: &str = "contacts";

/// Account credentials for the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Uploads avatars to Cloudinary and returns their HTTPS URL.
pub struct CloudinaryAvatarStore {
    client: Client,
    endpoint: Url,
    credentials: CloudinaryCredentials,
    clock: Arc<dyn Clock>,
}

impl CloudinaryAvatarStore {
    /// Build an adapter for the configured cloud.
    ///
    /// # Errors
    ///
    /// Returns [`AvatarStoreError::Transport`] when the HTTP client cannot be
    /// constructed or the cloud name does not form a valid URL.
    pub fn new(
        credentials: CloudinaryCredentials,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AvatarStoreError> {
        let endpoint = Url::parse(&format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            credentials.cloud_name
        ))
        .map_err(|err| AvatarStoreError::transport(err.to_string()))?;
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .map_err(|err| AvatarStoreError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            credentials,
            clock,
        })
    }
}

fn public_id(contact_id: ContactId) -> String {
    format!("{PUBLIC_ID_PREFIX}/{contact_id}")
}

/// SHA-256 hex signature over the sorted `params` followed by `secret`.
fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|left, right| left.0.cmp(right.0));
    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    hex::encode(Sha256::digest(format!("{joined}{secret}").as_bytes()))
}

fn map_transport_error(error: reqwest::Error) -> AvatarStoreError {
    AvatarStoreError::transport(error.to_string())
}

fn map_status_error(status: StatusCode, body: &[u8]) -> AvatarStoreError {
    let detail = serde_json::from_slice::<ErrorResponse>(body)
        .map(|parsed| parsed.error.message)
        .unwrap_or_else(|_| format!("status {}", status.as_u16()));
    if status.is_client_error() {
        AvatarStoreError::rejected(detail)
    } else {
        AvatarStoreError::transport(detail)
    }
}

fn parse_upload(body: &[u8]) -> Result<String, AvatarStoreError> {
    serde_json::from_slice::<UploadResponse>(body)
        .map(|parsed| parsed.secure_url)
        .map_err(|err| AvatarStoreError::transport(format!("unexpected response: {err}")))
}

#[async_trait]
impl AvatarStore for CloudinaryAvatarStore {
    async fn upload(&self, upload: AvatarUpload) -> Result<String, AvatarStoreError> {
        let timestamp = self.clock.utc().timestamp().to_string();
        let public_id = public_id(upload.contact_id);
        let signature = sign(
            &[
                ("overwrite", "true"),
                ("public_id", public_id.as_str()),
                ("timestamp", timestamp.as_str()),
            ],
            self.credentials.api_secret.as_str(),
        );
        let file = Part::bytes(upload.bytes)
            .file_name("avatar")
            .mime_str(&upload.content_type)
            .map_err(|err| AvatarStoreError::rejected(err.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("api_key", self.credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("public_id", public_id)
            .text("overwrite", "true")
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        let url = parse_upload(body.as_ref())?;
        debug!(contact_id = %upload.contact_id, "avatar uploaded");
        Ok(url)
    }
}

/// Store used when image hosting credentials are absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredAvatarStore;

#[async_trait]
impl AvatarStore for UnconfiguredAvatarStore {
    async fn upload(&self, _upload: AvatarUpload) -> Result<String, AvatarStoreError> {
        Err(AvatarStoreError::unconfigured())
    }
}
