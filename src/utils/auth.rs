use crate::core::error::ApiError;
use crate::core::state::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

/// Header carrying the administrator key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Verify API key using constant-time comparison to prevent timing attacks
pub fn verify_api_key(provided: &str, expected: &str) -> bool {
    provided.as_bytes().len() == expected.as_bytes().len()
        && provided
            .as_bytes()
            .iter()
            .zip(expected.as_bytes().iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Gate for administrator routes
///
/// Without a configured `admin.api_key` every request passes.
pub async fn require_admin_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.config.admin.api_key.as_deref() {
        let provided = request
            .headers()
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or("");

        if !verify_api_key(provided, expected) {
            warn!(path = %request.uri().path(), "Unauthorized admin request");
            return Err(ApiError::InvalidApiKey);
        }
    }

    Ok(next.run(request).await)
}
