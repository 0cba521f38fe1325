pub mod smtp;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

pub use smtp::SmtpMailer;

/// Why a notification was not delivered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MailError {
    #[error("Mail delivery is not configured")]
    NotConfigured,

    /// Worth retrying later: network trouble, timeouts, 4xx SMTP replies
    #[error("Temporary mail failure: {0}")]
    Transient(String),

    /// Will fail again as-is: bad address, rejected login, 5xx SMTP replies
    #[error("Permanent mail failure: {0}")]
    Permanent(String),
}

/// Sends plain-text notifications
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError>;
}

/// Mailer used when no `[mail]` section is configured
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), MailError> {
        tracing::warn!(to = %to, subject = %subject, "Mail not configured, message dropped");
        Err(MailError::NotConfigured)
    }
}
