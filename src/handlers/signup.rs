use crate::archive::ArchiveError;
use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::credentials::{generate_password, generate_school_email};
use crate::models::requests::{present, SignupResponse};
use crate::models::user::UserRecord;
use crate::utils::filename::attachment_filename;
use crate::utils::time::{current_timestamp_millis, iso_timestamp, record_id};
use axum::{
    body::Bytes,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::Map;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

const MISSING_FIELDS: &str = "All fields are required";

/// The registration attachment as received
struct Attachment {
    filename: String,
    content: Bytes,
}

#[derive(Default)]
struct SignupForm {
    fullname: Option<String>,
    personal_email: Option<String>,
    student_id: Option<String>,
    role: Option<String>,
    section: Option<String>,
    raf: Option<Attachment>,
}

impl SignupForm {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = SignupForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "raf" => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content = field.bytes().await.map_err(multipart_error)?;
                    form.raf = Some(Attachment { filename, content });
                }
                "fullname" => form.fullname = Some(text(field).await?),
                "personal_email" => form.personal_email = Some(text(field).await?),
                "student_id" => form.student_id = Some(text(field).await?),
                "role" => form.role = Some(text(field).await?),
                "section" => form.section = Some(text(field).await?),
                other => {
                    tracing::debug!(field = %other, "Ignoring unknown signup field");
                }
            }
        }

        Ok(form)
    }

    fn is_complete(&self) -> bool {
        present(&self.fullname).is_some()
            && present(&self.personal_email).is_some()
            && present(&self.student_id).is_some()
            && present(&self.role).is_some()
            && present(&self.section).is_some()
            && self.raf.as_ref().is_some_and(|raf| !raf.filename.is_empty())
    }
}

async fn text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(multipart_error)
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        warn!(error = %e, "Signup upload too large");
        ApiError::PayloadTooLarge
    } else {
        warn!(error = %e, "Malformed signup form");
        ApiError::bad_request(MISSING_FIELDS)
    }
}

/// Where an attachment ended up
enum StoredAttachment {
    Remote(String),
    Local(PathBuf),
}

impl StoredAttachment {
    fn raf_path(&self) -> String {
        match self {
            StoredAttachment::Remote(link) => link.clone(),
            StoredAttachment::Local(path) => path.to_string_lossy().into_owned(),
        }
    }

    /// Drop an attachment no record points to
    async fn discard(&self) {
        match self {
            StoredAttachment::Local(path) => {
                if let Err(e) = tokio::fs::remove_file(path).await {
                    warn!(path = %path.display(), error = %e, "Failed to remove orphaned attachment");
                }
            }
            StoredAttachment::Remote(link) => {
                warn!(link = %link, "Archived attachment has no user record");
            }
        }
    }
}

/// Keep the attachment in the upload directory and try to archive it
///
/// The local copy is deleted once archiving worked.
async fn store_attachment(
    state: &AppState,
    student_id: &str,
    attachment: &Attachment,
) -> Result<StoredAttachment, ApiError> {
    let upload_dir = &state.config.storage.upload_dir;
    let filename = attachment_filename(student_id, current_timestamp_millis(), &attachment.filename);
    let local_path = upload_dir.join(&filename);

    write_local(upload_dir, &local_path, &attachment.content)
        .await
        .map_err(|e| {
            error!(path = %local_path.display(), error = %e, "Failed to save attachment");
            ApiError::internal("Failed to save attachment")
        })?;

    match state.archiver.upload(&local_path, &filename).await {
        Ok(link) => {
            if let Err(e) = tokio::fs::remove_file(&local_path).await {
                warn!(path = %local_path.display(), error = %e, "Failed to remove archived attachment");
            }
            Ok(StoredAttachment::Remote(link))
        }
        Err(ArchiveError::NotConfigured) => Ok(StoredAttachment::Local(local_path)),
        Err(e) => {
            warn!(path = %local_path.display(), error = %e, "Archiving failed, keeping attachment locally");
            Ok(StoredAttachment::Local(local_path))
        }
    }
}

async fn write_local(dir: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(path, content).await
}

/// Register a pending account
///
/// POST /signup_user (multipart/form-data)
///
/// Fields: fullname, personal_email, student_id, role, section and the
/// `raf` file. Credentials are generated now but only mailed once an
/// administrator accepts the account.
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let multipart = multipart.map_err(|e| {
        warn!(error = %e, "Signup is not a multipart form");
        ApiError::bad_request(MISSING_FIELDS)
    })?;

    let form = SignupForm::read(multipart).await?;
    if !form.is_complete() {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    }

    let (Some(fullname), Some(personal_email), Some(student_id), Some(role), Some(section), Some(raf)) = (
        form.fullname,
        form.personal_email,
        form.student_id,
        form.role,
        form.section,
        form.raf,
    ) else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };

    let Some(school_email) =
        generate_school_email(&fullname, &state.config.credentials.email_domain)
    else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };
    let password = generate_password(state.config.credentials.password_length);

    let attachment = store_attachment(&state, &student_id, &raf).await?;

    let now = chrono::Local::now();
    let record = UserRecord {
        id: record_id(&now),
        user_id: student_id,
        name: fullname,
        email: school_email,
        personal_email,
        password,
        role,
        section,
        created_at: iso_timestamp(&now),
        verified: false,
        rejected: false,
        banned: false,
        verified_at: None,
        raf_path: attachment.raf_path(),
        extra: Map::new(),
    };

    let user_id = record.user_id.clone();
    let email = record.email.clone();

    if let Err(e) = state.store.append(record) {
        error!(user_id = %user_id, error = %e, "Error saving user data");
        attachment.discard().await;
        return Err(ApiError::internal("Failed to save user data"));
    }

    info!(user_id = %user_id, email = %email, "Signup stored, awaiting verification");

    Ok((
        StatusCode::OK,
        Json(SignupResponse {
            status: "success".to_string(),
            message: "Account created successfully! Please wait for admin verification."
                .to_string(),
        }),
    )
        .into_response())
}
