use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /send_welcome_email`
#[derive(Debug, Deserialize)]
pub struct WelcomeEmailRequest {
    pub fullname: Option<String>,
    pub personal_email: Option<String>,
}

/// Body of `POST /send_update_email`
#[derive(Debug, Deserialize)]
pub struct UpdateEmailRequest {
    #[serde(alias = "to")]
    pub to_email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Body of `POST /update_user_status`
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub user_id: Option<Value>,
    pub action: Option<String>,
}

/// Body of `POST /remove_user`
#[derive(Debug, Deserialize)]
pub struct RemoveUserRequest {
    pub user_id: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RafFileQuery {
    pub path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WelcomeEmailResponse {
    pub school_email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SignupResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RedirectResponse {
    pub redirect: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Text form of a user identifier sent as a JSON string or number
///
/// Empty strings, zero, `false` and `null` count as missing.
pub fn user_key(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        _ => None,
    }
}

/// A form or JSON field that carries a usable value
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
