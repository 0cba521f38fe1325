use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::PathBuf;

use crate::credentials::generator::{DEFAULT_EMAIL_DOMAIN, DEFAULT_PASSWORD_LENGTH};

/// Environment variable that overrides `mail.password`
pub const SMTP_PASSWORD_ENV: &str = "ARCHIVES_SMTP_PASSWORD";

/// Portal login page advertised in credential emails
pub const DEFAULT_LOGIN_URL: &str = "https://stiarchives.x10.mx";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    pub mail: Option<MailConfig>,
    #[serde(default)]
    pub archive: ArchiveConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "default_email_domain")]
    pub email_domain: String,
    #[serde(default = "default_password_length")]
    pub password_length: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Sender mailbox, defaults to `username`
    pub from: Option<String>,
    #[serde(default = "default_login_url")]
    pub login_url: String,
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Links starting with this prefix are remote attachments
    #[serde(default = "default_link_prefix")]
    pub link_prefix: String,
    #[serde(default = "default_archive_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    /// When set, admin endpoints require a matching `x-api-key` header
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_file: default_users_file(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            email_domain: default_email_domain(),
            password_length: default_password_length(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            credentials_file: default_credentials_file(),
            folder_id: String::new(),
            api_base: default_api_base(),
            link_prefix: default_link_prefix(),
            timeout_secs: default_archive_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

impl MailConfig {
    pub fn sender(&self) -> &str {
        self.from.as_deref().unwrap_or(&self.username)
    }
}

// Default value functions
fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MiB
}

fn default_users_file() -> PathBuf {
    PathBuf::from("users.json")
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_email_domain() -> String {
    DEFAULT_EMAIL_DOMAIN.to_string()
}

fn default_password_length() -> usize {
    DEFAULT_PASSWORD_LENGTH
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_mail_timeout() -> u64 {
    30
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from("service_account.json")
}

fn default_api_base() -> String {
    "https://www.googleapis.com".to_string()
}

fn default_link_prefix() -> String {
    "https://drive.google.com".to_string()
}

fn default_archive_timeout() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let mut config = Self::from_toml(&content)?;

        if let Ok(password) = std::env::var(SMTP_PASSWORD_ENV) {
            if let Some(mail) = config.mail.as_mut() {
                mail.password = password;
            }
        }

        config.validate()?;

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse config file")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("Server port must be greater than 0");
        }

        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            bail!("max_upload_bytes must be greater than 0");
        }

        if self.storage.users_file.as_os_str().is_empty() {
            bail!("users_file must not be empty");
        }

        if self.storage.upload_dir.as_os_str().is_empty() {
            bail!("upload_dir must not be empty");
        }

        let domain = &self.credentials.email_domain;
        if domain.is_empty() || domain.contains('@') || domain.chars().any(char::is_whitespace) {
            bail!("Invalid email_domain '{}'", domain);
        }

        if self.credentials.password_length < 4 {
            bail!("password_length must be at least 4");
        }

        if let Some(mail) = &self.mail {
            if mail.smtp_host.is_empty() {
                bail!("smtp_host must not be empty");
            }

            if mail.smtp_port == 0 {
                bail!("smtp_port must be greater than 0");
            }

            if mail.username.is_empty() {
                bail!("mail username must not be empty");
            }

            if mail.password.is_empty() {
                bail!(
                    "mail password must be set in the config file or via {}",
                    SMTP_PASSWORD_ENV
                );
            }

            if mail.timeout_secs == 0 {
                bail!("mail timeout_secs must be greater than 0");
            }
        }

        if self.archive.timeout_secs == 0 {
            bail!("archive timeout_secs must be greater than 0");
        }

        if !self.archive.link_prefix.starts_with("https://")
            && !self.archive.link_prefix.starts_with("http://")
        {
            bail!("link_prefix must be an http(s) URL");
        }

        if let Some(key) = &self.admin.api_key {
            if key.is_empty() {
                bail!("admin api_key must not be empty when set");
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
