use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::credentials::{generate_password, generate_school_email};
use crate::mail::templates;
use crate::models::requests::{present, WelcomeEmailRequest, WelcomeEmailResponse};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};

const MISSING_FIELDS: &str = "Fullname and personal_email are required";

/// Generate credentials and mail them straight to the person
///
/// POST /send_welcome_email
///
/// Nothing is stored; the generated credentials are echoed back so the
/// caller can keep them.
pub async fn send_welcome_email_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<WelcomeEmailRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let (Some(fullname), Some(personal_email)) =
        (present(&req.fullname), present(&req.personal_email))
    else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };

    let Some(school_email) =
        generate_school_email(fullname, &state.config.credentials.email_domain)
    else {
        return Err(ApiError::bad_request(MISSING_FIELDS));
    };
    let password = generate_password(state.config.credentials.password_length);

    let email = templates::account_created(fullname, &school_email, &password, state.login_url());

    if let Err(e) = state
        .mailer
        .send(personal_email, &email.subject, &email.body)
        .await
    {
        error!(to = %personal_email, error = %e, "Failed to send welcome email");
        return Err(ApiError::internal("Failed to send email"));
    }

    info!(school_email = %school_email, to = %personal_email, "Welcome email sent");

    Ok((
        StatusCode::OK,
        Json(WelcomeEmailResponse {
            school_email,
            password,
        }),
    )
        .into_response())
}
