pub mod drive;
pub mod service_account;

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

pub use drive::DriveArchiver;

/// Why an attachment was not archived remotely
///
/// In every case the caller keeps the local copy.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("Remote archive is not configured")]
    NotConfigured,

    #[error("Temporary archive failure: {0}")]
    Transient(String),

    #[error("Permanent archive failure: {0}")]
    Permanent(String),
}

/// Moves an uploaded attachment to durable remote storage
#[async_trait]
pub trait Archiver: Send + Sync {
    /// Upload `file_path` under `filename`, returning a public link
    async fn upload(&self, file_path: &Path, filename: &str) -> Result<String, ArchiveError>;
}
