use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::core::config::Config;
use crate::core::state::AppState;
use crate::models::user::UserStatus;

// this runs at boot time
pub fn prepare_storage(config: &Config) -> Result<()> {
    let upload_dir = &config.storage.upload_dir;
    std::fs::create_dir_all(upload_dir).context(format!(
        "Failed to create upload directory: {}",
        upload_dir.display()
    ))?;

    if let Some(parent) = config.storage.users_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).context(format!(
                "Failed to create directory for users file: {}",
                parent.display()
            ))?;
        }
    }

    if !config.archive.credentials_file.exists() {
        warn!(
            credentials_file = %config.archive.credentials_file.display(),
            "Service account key not found, attachments will be kept locally"
        );
    }

    if config.mail.is_none() {
        warn!("No [mail] section configured, outgoing email is disabled");
    }

    Ok(())
}

/// Load the user directory once so a corrupt file stops the boot
pub fn check_user_store(state: &AppState) -> Result<()> {
    let users = state
        .store
        .load()
        .context("Failed to load user directory")?;

    let pending = users
        .iter()
        .filter(|user| user.status() == UserStatus::Pending)
        .count();

    info!(
        users = users.len(),
        pending,
        users_file = %state.config.storage.users_file.display(),
        "User directory loaded"
    );

    Ok(())
}
