use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::models::requests::{present, MessageResponse, UpdateEmailRequest};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};

/// Relay an administrator's message to one recipient
///
/// POST /send_update_email
pub async fn send_update_email_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateEmailRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let (Some(to), Some(subject), Some(message)) = (
        present(&req.to_email),
        present(&req.subject),
        present(&req.message),
    ) else {
        return Err(ApiError::bad_request(
            "to_email, subject, and message are required",
        ));
    };

    if let Err(e) = state.mailer.send(to, subject, message).await {
        error!(to = %to, subject = %subject, error = %e, "Failed to send update email");
        return Err(ApiError::internal("Failed to send email"));
    }

    info!(to = %to, subject = %subject, "Update email sent");

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Email sent successfully".to_string(),
        }),
    )
        .into_response())
}
