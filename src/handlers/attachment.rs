use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::requests::{present, RafFileQuery, RedirectResponse};
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, warn};

const NOT_FOUND: &str = "File not found";

fn content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "txt" => "text/plain; charset=utf-8",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    }
}

/// Resolve `requested` to a file inside `upload_dir`
///
/// Symlinks and `..` are resolved first, so anything that lands outside the
/// directory is treated as missing.
fn resolve_local(upload_dir: &Path, requested: &str) -> Option<PathBuf> {
    let root = upload_dir.canonicalize().ok()?;
    let path = Path::new(requested).canonicalize().ok()?;

    if path.starts_with(&root) && path.is_file() {
        Some(path)
    } else {
        None
    }
}

/// Return a signup attachment
///
/// GET /get_raf_file?path=
///
/// Remote links come back as `{"redirect": link}` for the client to follow;
/// local paths are streamed inline.
pub async fn get_raf_file_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RafFileQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;

    let Some(requested) = present(&query.path) else {
        return Err(ApiError::bad_request("File path is required"));
    };

    if requested.starts_with(state.config.archive.link_prefix.as_str()) {
        debug!(link = %requested, "Redirecting to archived attachment");
        return Ok((
            StatusCode::OK,
            Json(RedirectResponse {
                redirect: requested.to_string(),
            }),
        )
            .into_response());
    }

    let Some(path) = resolve_local(&state.config.storage.upload_dir, requested) else {
        warn!(path = %requested, "Attachment not found or outside upload directory");
        return Err(ApiError::not_found(NOT_FOUND));
    };

    let content = tokio::fs::read(&path).await.map_err(|e| {
        error!(path = %path.display(), error = %e, "Error serving file");
        ApiError::internal("Failed to serve file")
    })?;

    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().replace('"', ""))
        .unwrap_or_default();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", filename),
            ),
        ],
        content,
    )
        .into_response())
}
