// Application state (AppState)

use crate::archive::{Archiver, DriveArchiver};
use crate::core::config::{Config, DEFAULT_LOGIN_URL};
use crate::mail::{DisabledMailer, Mailer, SmtpMailer};
use crate::stores::{JsonFileStore, UserStore};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Shared application state
///
/// Each collaborator sits behind a trait object so tests can swap in
/// in-memory doubles.
#[derive(Clone)]
pub struct AppState {
    /// User directory
    pub store: Arc<dyn UserStore>,

    /// Outgoing notifications
    pub mailer: Arc<dyn Mailer>,

    /// Remote attachment storage
    pub archiver: Arc<dyn Archiver>,

    /// Configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the production collaborators described by `config`
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn UserStore> =
            Arc::new(JsonFileStore::new(config.storage.users_file.clone()));

        let mailer: Arc<dyn Mailer> = match &config.mail {
            Some(mail) => Arc::new(SmtpMailer::new(mail).context("Failed to set up SMTP mailer")?),
            None => Arc::new(DisabledMailer),
        };

        let archiver: Arc<dyn Archiver> = Arc::new(
            DriveArchiver::new(&config.archive).context("Failed to set up Drive archiver")?,
        );

        Ok(Self::with_parts(config, store, mailer, archiver))
    }

    pub fn with_parts(
        config: Config,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn Mailer>,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        Self {
            store,
            mailer,
            archiver,
            config: Arc::new(config),
        }
    }

    /// Login page advertised in credential emails
    pub fn login_url(&self) -> &str {
        self.config
            .mail
            .as_ref()
            .map(|mail| mail.login_url.as_str())
            .unwrap_or(DEFAULT_LOGIN_URL)
    }
}
