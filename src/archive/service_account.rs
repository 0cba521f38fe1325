use crate::archive::ArchiveError;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

pub const DRIVE_FILE_SCOPE: &str = "https://www.googleapis.com/auth/drive.file";

/// The parts of a service-account key file needed to request tokens
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

impl ServiceAccountKey {
    /// Read a key file; `Ok(None)` when the file does not exist
    pub fn from_file(path: &Path) -> Result<Option<Self>, ArchiveError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ArchiveError::Permanent(format!(
                    "cannot read service account file {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map(Some).map_err(|e| {
            ArchiveError::Permanent(format!(
                "malformed service account file {}: {}",
                path.display(),
                e
            ))
        })
    }

    /// Signed JWT for the OAuth2 jwt-bearer grant
    pub fn assertion(&self, scope: &str, now: i64) -> Result<String, ArchiveError> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|e| ArchiveError::Permanent(format!("invalid service account key: {}", e)))?;

        let claims = Claims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|e| ArchiveError::Permanent(format!("failed to sign assertion: {}", e)))
    }
}
