use crate::archive::service_account::{ServiceAccountKey, DRIVE_FILE_SCOPE};
use crate::archive::{ArchiveError, Archiver};
use crate::core::config::ArchiveConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh this long before the token actually expires
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct CreatedFile {
    id: String,
}

struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Archives attachments into a shared Google Drive folder
///
/// Authenticates as a service account whose key file is looked up on every
/// upload, so dropping the file in place enables archiving without a restart.
pub struct DriveArchiver {
    client: reqwest::Client,
    credentials_file: PathBuf,
    folder_id: String,
    api_base: String,
    link_prefix: String,
    token: Mutex<Option<CachedToken>>,
}

impl DriveArchiver {
    pub fn new(config: &ArchiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials_file: config.credentials_file.clone(),
            folder_id: config.folder_id.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            link_prefix: config.link_prefix.trim_end_matches('/').to_string(),
            token: Mutex::new(None),
        })
    }

    /// Public viewing link for an uploaded file
    pub fn share_link(&self, file_id: &str) -> String {
        format!("{}/file/d/{}/view?usp=sharing", self.link_prefix, file_id)
    }

    async fn access_token(&self, key: &ServiceAccountKey) -> Result<String, ArchiveError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() + TOKEN_EXPIRY_MARGIN < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let assertion = key.assertion(DRIVE_FILE_SCOPE, chrono::Utc::now().timestamp())?;

        let response = self
            .client
            .post(&key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(request_error)?;

        let response = check_status(response, "token request").await?;
        let token: TokenResponse = response.json().await.map_err(request_error)?;

        debug!(expires_in = token.expires_in, "Obtained Drive access token");

        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        });

        Ok(token.access_token)
    }

    async fn create_file(
        &self,
        token: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<String, ArchiveError> {
        let mut metadata = json!({ "name": filename });
        if !self.folder_id.is_empty() {
            metadata["parents"] = json!([self.folder_id]);
        }

        let boundary = hex::encode(rand::random::<[u8; 16]>());
        let body = multipart_related(&boundary, &metadata.to_string(), &content);

        let response = self
            .client
            .post(format!("{}/upload/drive/v3/files", self.api_base))
            .query(&[("uploadType", "multipart"), ("fields", "id")])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(request_error)?;

        let response = check_status(response, "file upload").await?;
        let created: CreatedFile = response.json().await.map_err(request_error)?;
        Ok(created.id)
    }

    async fn share_publicly(&self, token: &str, file_id: &str) -> Result<(), ArchiveError> {
        let response = self
            .client
            .post(format!("{}/drive/v3/files/{}/permissions", self.api_base, file_id))
            .bearer_auth(token)
            .json(&json!({ "type": "anyone", "role": "reader" }))
            .send()
            .await
            .map_err(request_error)?;

        check_status(response, "permission update").await?;
        Ok(())
    }
}

#[async_trait]
impl Archiver for DriveArchiver {
    async fn upload(&self, file_path: &Path, filename: &str) -> Result<String, ArchiveError> {
        let Some(key) = ServiceAccountKey::from_file(&self.credentials_file)? else {
            info!(
                credentials_file = %self.credentials_file.display(),
                "Service account file not found, keeping attachment locally"
            );
            return Err(ArchiveError::NotConfigured);
        };

        let content = tokio::fs::read(file_path).await.map_err(|e| {
            ArchiveError::Permanent(format!("cannot read {}: {}", file_path.display(), e))
        })?;

        let token = self.access_token(&key).await?;
        let file_id = self.create_file(&token, filename, content).await?;
        self.share_publicly(&token, &file_id).await?;

        let link = self.share_link(&file_id);
        info!(filename = %filename, file_id = %file_id, "Attachment archived to Drive");
        Ok(link)
    }
}

fn multipart_related(boundary: &str, metadata: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(content.len() + metadata.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

fn request_error(e: reqwest::Error) -> ArchiveError {
    if e.is_decode() || e.is_builder() {
        ArchiveError::Permanent(e.to_string())
    } else {
        ArchiveError::Transient(e.to_string())
    }
}

async fn check_status(
    response: reqwest::Response,
    stage: &str,
) -> Result<reqwest::Response, ArchiveError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let detail = response.text().await.unwrap_or_default();
    warn!(stage = stage, status = %status, detail = %detail, "Drive API call failed");

    let message = format!("{} returned {}", stage, status);
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Err(ArchiveError::Transient(message))
    } else {
        Err(ArchiveError::Permanent(message))
    }
}
