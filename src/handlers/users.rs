use crate::core::error::ApiError;
use crate::core::state::AppState;
use crate::mail::templates;
use crate::models::requests::{user_key, MessageResponse, RemoveUserRequest, UpdateStatusRequest};
use crate::models::user::{StatusAction, UserRecord};
use crate::utils::time::iso_timestamp;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// List every stored account
///
/// GET /get_users
pub async fn get_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserRecord>>, ApiError> {
    let users = state.store.load().map_err(|e| {
        error!(error = %e, "Error loading users");
        ApiError::internal("Failed to load users")
    })?;

    Ok(Json(users))
}

/// Accept, reject or ban an account
///
/// POST /update_user_status
///
/// Accepting mails the stored credentials to the personal address once the
/// record is saved. A delivery failure is logged and the new status stays.
pub async fn update_user_status_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let key = user_key(req.user_id.as_ref());
    let action = req
        .action
        .as_deref()
        .and_then(|action| action.parse::<StatusAction>().ok());

    let (Some(key), Some(action)) = (key, action) else {
        return Err(ApiError::bad_request("Invalid user_id or action"));
    };

    let now = iso_timestamp(&chrono::Local::now());
    let updated = state
        .store
        .update_status(&key, action, &now)
        .map_err(|e| {
            error!(user_id = %key, action = %action, error = %e, "Error updating user status");
            ApiError::internal("Failed to update user status")
        })?;

    let Some(user) = updated else {
        return Err(ApiError::not_found("User not found"));
    };

    info!(user_id = %key, action = %action, status = ?user.status(), "User status updated");

    if action == StatusAction::Accept {
        send_verified_email(&state, &user).await;
    }

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("User {} successfully", action.past_tense()),
        }),
    )
        .into_response())
}

async fn send_verified_email(state: &AppState, user: &UserRecord) {
    let email = templates::account_verified(
        &user.name,
        &user.email,
        &user.password,
        state.login_url(),
    );

    match state
        .mailer
        .send(&user.personal_email, &email.subject, &email.body)
        .await
    {
        Ok(()) => info!(user_id = %user.key(), to = %user.personal_email, "Verification email sent"),
        Err(e) => warn!(
            user_id = %user.key(),
            to = %user.personal_email,
            error = %e,
            "Failed to send verification email"
        ),
    }
}

/// Delete every record with the given key
///
/// POST /remove_user
///
/// Removing an unknown user still succeeds.
pub async fn remove_user_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RemoveUserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;

    let Some(key) = user_key(req.user_id.as_ref()) else {
        return Err(ApiError::bad_request("user_id is required"));
    };

    let removed = state.store.remove(&key).map_err(|e| {
        error!(user_id = %key, error = %e, "Error removing user");
        ApiError::internal("Failed to remove user")
    })?;

    info!(user_id = %key, removed, "User removal processed");

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "User removed successfully".to_string(),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use crate::archive::ArchiveError;
    use crate::mail::templates::ACCOUNT_VERIFIED_SUBJECT;
    use crate::mail::MailError;
    use crate::models::user::{UserRecord, UserStatus};
    use crate::stores::UserStore;
    use crate::testing::*;
    use axum::http::StatusCode;
    use serde_json::{json, Map};

    fn record(user_id: &str, name: &str) -> UserRecord {
        UserRecord {
            id: format!("1718000000.{:0>6}", user_id),
            user_id: user_id.to_string(),
            name: name.to_string(),
            email: "santos@sti.archives.clmb".to_string(),
            personal_email: format!("{}@example.com", user_id),
            password: "Secr3t!pass1".to_string(),
            role: "student".to_string(),
            section: "BSIT-3A".to_string(),
            created_at: "2024-06-10T12:34:56.123456".to_string(),
            verified: false,
            rejected: false,
            banned: false,
            verified_at: None,
            raf_path: "uploads/raf.pdf".to_string(),
            extra: Map::new(),
        }
    }

    fn seeded(mailer: RecordingMailer) -> TestApp {
        let app = TestApp::build("", mailer, StubArchiver::returning(Err(ArchiveError::NotConfigured)));
        app.store.append(record("2021001", "Juan Delos Santos")).unwrap();
        app.store.append(record("2021002", "Ana Reyes")).unwrap();
        app
    }

    #[tokio::test]
    async fn test_get_users_lists_records() {
        let app = seeded(RecordingMailer::default());
        let (status, body) = send_json(app.router(), get_request("/get_users")).await;

        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0]["user_id"], "2021001");
        assert_eq!(users[1]["name"], "Ana Reyes");
        assert_eq!(users[0]["verified"], false);
    }

    #[tokio::test]
    async fn test_get_users_empty_store() {
        let app = TestApp::new();
        let (status, body) = send_json(app.router(), get_request("/get_users")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_accept_marks_verified_and_mails_credentials() {
        let app = seeded(RecordingMailer::default());
        let (status, body) = send_json(
            app.router(),
            json_request(
                "POST",
                "/update_user_status",
                json!({"user_id": "2021001", "action": "accept"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User accepted successfully");

        let user = app.store.find("2021001").unwrap().unwrap();
        assert_eq!(user.status(), UserStatus::Verified);
        assert!(user.verified && !user.rejected && !user.banned);
        assert!(user.verified_at.is_some());

        let sent = app.mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "2021001@example.com");
        assert_eq!(sent[0].subject, ACCOUNT_VERIFIED_SUBJECT);
        assert!(sent[0].body.contains("santos@sti.archives.clmb"));
        assert!(sent[0].body.contains("Secr3t!pass1"));

        // the other record is untouched
        let other = app.store.find("2021002").unwrap().unwrap();
        assert_eq!(other, record("2021002", "Ana Reyes"));
    }

    #[tokio::test]
    async fn test_reject_and_ban_do_not_mail() {
        let app = seeded(RecordingMailer::default());

        for (action, message, expected) in [
            ("reject", "User rejected successfully", UserStatus::Rejected),
            ("ban", "User banned successfully", UserStatus::Banned),
        ] {
            let (status, body) = send_json(
                app.router(),
                json_request(
                    "POST",
                    "/update_user_status",
                    json!({"user_id": "2021002", "action": action}),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["message"], message);
            assert_eq!(app.store.find("2021002").unwrap().unwrap().status(), expected);
        }

        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_accept_survives_mail_failure() {
        let app = seeded(RecordingMailer::failing(MailError::Permanent(
            "550 mailbox unavailable".into(),
        )));
        let (status, body) = send_json(
            app.router(),
            json_request(
                "POST",
                "/update_user_status",
                json!({"user_id": "2021001", "action": "accept"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User accepted successfully");
        assert!(app.store.find("2021001").unwrap().unwrap().verified);
        assert_eq!(app.mailer.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_numeric_user_id_is_accepted() {
        let app = seeded(RecordingMailer::default());
        let (status, _) = send_json(
            app.router(),
            json_request(
                "POST",
                "/update_user_status",
                json!({"user_id": 2021002, "action": "ban"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(app.store.find("2021002").unwrap().unwrap().banned);
    }

    #[tokio::test]
    async fn test_update_status_invalid_input() {
        let app = seeded(RecordingMailer::default());
        let before = app.store.load().unwrap();

        for body in [
            json!({"user_id": "2021001", "action": "approve"}),
            json!({"user_id": "2021001"}),
            json!({"action": "accept"}),
            json!({"user_id": "", "action": "accept"}),
        ] {
            let (status, response) =
                send_json(app.router(), json_request("POST", "/update_user_status", body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(response["error"], "Invalid user_id or action");
        }

        assert_eq!(app.store.load().unwrap(), before);
    }

    #[tokio::test]
    async fn test_update_status_unknown_user() {
        let app = seeded(RecordingMailer::default());
        let before = app.store.load().unwrap();

        let (status, response) = send_json(
            app.router(),
            json_request(
                "POST",
                "/update_user_status",
                json!({"user_id": "9999999", "action": "accept"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(response["error"], "User not found");
        assert_eq!(app.store.load().unwrap(), before);
        assert!(app.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_remove_user() {
        let app = seeded(RecordingMailer::default());
        let (status, body) = send_json(
            app.router(),
            json_request("POST", "/remove_user", json!({"user_id": "2021001"})),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User removed successfully");
        assert_eq!(
            app.store.load().unwrap(),
            vec![record("2021002", "Ana Reyes")]
        );
    }

    #[tokio::test]
    async fn test_remove_unknown_user_succeeds() {
        let app = seeded(RecordingMailer::default());
        let (status, _) = send_json(
            app.router(),
            json_request("POST", "/remove_user", json!({"user_id": "nobody"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(app.store.load().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_remove_user_requires_id() {
        let app = seeded(RecordingMailer::default());
        let (status, response) =
            send_json(app.router(), json_request("POST", "/remove_user", json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response["error"], "user_id is required");
    }
}
