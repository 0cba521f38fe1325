// Test doubles and request helpers shared by handler tests

use crate::archive::{ArchiveError, Archiver};
use crate::core::config::Config;
use crate::core::state::AppState;
use crate::mail::{MailError, Mailer};
use crate::models::user::UserRecord;
use crate::stores::{MemoryUserStore, StoreError, UserStore};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

#[derive(Debug, Clone, PartialEq)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Mailer that remembers every message instead of sending it
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<SentEmail>>,
    pub fail_with: Option<MailError>,
}

impl RecordingMailer {
    pub fn failing(error: MailError) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_with: Some(error),
        }
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        match &self.fail_with {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

/// Archiver returning a canned result
pub struct StubArchiver {
    pub result: Result<String, ArchiveError>,
    pub calls: Mutex<Vec<(PathBuf, String, Vec<u8>)>>,
}

impl StubArchiver {
    pub fn returning(result: Result<String, ArchiveError>) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Archiver for StubArchiver {
    async fn upload(&self, file_path: &Path, filename: &str) -> Result<String, ArchiveError> {
        let content = std::fs::read(file_path).unwrap_or_default();
        self.calls
            .lock()
            .unwrap()
            .push((file_path.to_path_buf(), filename.to_string(), content));
        self.result.clone()
    }
}

/// Store whose disk is always full
pub struct FailingStore;

impl UserStore for FailingStore {
    fn load(&self) -> Result<Vec<UserRecord>, StoreError> {
        Ok(Vec::new())
    }

    fn modify(
        &self,
        _mutate: &mut dyn FnMut(&mut Vec<UserRecord>) -> bool,
    ) -> Result<(), StoreError> {
        Err(StoreError::Write(std::io::Error::other("no space left on device")))
    }
}

/// Everything a handler test needs to inspect after a request
pub struct TestApp {
    pub state: Arc<AppState>,
    pub store: Arc<MemoryUserStore>,
    pub mailer: Arc<RecordingMailer>,
    pub archiver: Arc<StubArchiver>,
    pub dir: TempDir,
}

pub fn test_config(dir: &TempDir, extra: &str) -> Config {
    let toml = format!(
        "[server]\nport = 5000\n\n[storage]\nusers_file = {:?}\nupload_dir = {:?}\n{}",
        dir.path().join("users.json"),
        dir.path().join("uploads"),
        extra
    );
    let config = Config::from_toml(&toml).unwrap();
    config.validate().unwrap();
    config
}

impl TestApp {
    pub fn new() -> Self {
        Self::build("", RecordingMailer::default(), StubArchiver::returning(Err(ArchiveError::NotConfigured)))
    }

    pub fn build(extra_config: &str, mailer: RecordingMailer, archiver: StubArchiver) -> Self {
        let dir = TempDir::new().unwrap();
        let config = test_config(&dir, extra_config);
        std::fs::create_dir_all(&config.storage.upload_dir).unwrap();

        let store = Arc::new(MemoryUserStore::new());
        let mailer = Arc::new(mailer);
        let archiver = Arc::new(archiver);

        let state = Arc::new(AppState::with_parts(
            config,
            Arc::clone(&store) as Arc<dyn UserStore>,
            Arc::clone(&mailer) as Arc<dyn Mailer>,
            Arc::clone(&archiver) as Arc<dyn Archiver>,
        ));

        Self {
            state,
            store,
            mailer,
            archiver,
            dir,
        }
    }

    pub fn router(&self) -> Router {
        crate::core::routes::build_router(Arc::clone(&self.state))
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.state.config.storage.upload_dir.clone()
    }
}

pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

pub async fn send_json(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub const BOUNDARY: &str = "X-ARCHIVES-TEST-BOUNDARY";

/// multipart/form-data body from text fields and an optional file
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }
    if let Some((name, filename, content)) = file {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(content);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn signup_fields<'a>(fullname: &'a str, personal_email: &'a str, student_id: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("fullname", fullname),
        ("personal_email", personal_email),
        ("student_id", student_id),
        ("role", "student"),
        ("section", "BSIT-3A"),
    ]
}
