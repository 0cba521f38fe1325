use crate::core::config::MailConfig;
use crate::mail::{MailError, Mailer};
use anyhow::{Context, Result};
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::time::Duration;
use tracing::{error, info, warn};

/// SMTP submission over STARTTLS with login credentials
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport; no connection is made until the first send
    pub fn new(config: &MailConfig) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .context(format!("Invalid SMTP host '{}'", config.smtp_host))?
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build();

        let from = config
            .sender()
            .parse::<Mailbox>()
            .context(format!("Invalid sender address '{}'", config.sender()))?;

        Ok(Self { transport, from })
    }

    fn build_message(&self, to: &str, subject: &str, body: &str) -> Result<Message, MailError> {
        let to = to
            .parse::<Mailbox>()
            .map_err(|e| MailError::Permanent(format!("invalid recipient '{}': {}", to, e)))?;

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.trim().to_string())
            .map_err(|e| MailError::Permanent(format!("failed to build message: {}", e)))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        let message = self.build_message(to, subject, body).map_err(|e| {
            warn!(to = %to, error = %e, "Refusing to send email");
            e
        })?;

        match self.transport.send(message).await {
            Ok(response) => {
                info!(to = %to, subject = %subject, code = %response.code(), "Email sent");
                Ok(())
            }
            Err(e) if e.is_permanent() => {
                error!(to = %to, error = %e, "Email rejected by SMTP server");
                Err(MailError::Permanent(e.to_string()))
            }
            Err(e) => {
                error!(to = %to, error = %e, "Failed to send email");
                Err(MailError::Transient(e.to_string()))
            }
        }
    }
}
