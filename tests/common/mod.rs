// In-process fake of the assistant service used by the integration tests

#![allow(dead_code)]

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const PASSWORD: &str = "secret";
pub const KNOWN_USER: &str = "ada@example.com";

pub const REPORT_REPLY: &str = "I recommend Mistral-7B for this workload.\n\
Final Best Model Recommended:\n\
1. Model Name      : Mistral-7B\n\
2. Price           : $0.25 per 1M tokens\n\
4. Accuracy        : 91.5 %\n\
5. Cloud           : AWS\n";

/// Everything the fake service has been asked to do
#[derive(Default)]
pub struct FakeService {
    pub chats: Mutex<Vec<(String, String)>>,
    pub logouts: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<usize>>,
}

impl FakeService {
    pub fn chats(&self) -> Vec<(String, String)> {
        self.chats.lock().unwrap().clone()
    }

    pub fn logouts(&self) -> Vec<String> {
        self.logouts.lock().unwrap().clone()
    }

    pub fn uploads(&self) -> Vec<usize> {
        self.uploads.lock().unwrap().clone()
    }

    /// Poll until `n` logouts arrived or the deadline passes
    pub async fn wait_for_logouts(&self, n: usize, deadline: Duration) -> Vec<String> {
        let start = std::time::Instant::now();
        loop {
            let logouts = self.logouts();
            if logouts.len() >= n || start.elapsed() > deadline {
                return logouts;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

type Reply = (StatusCode, Json<Value>);

async fn chat(State(service): State<Arc<FakeService>>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let message = body["message"].as_str().unwrap_or_default().to_string();
    service.chats.lock().unwrap().push((email, message.clone()));

    match message.as_str() {
        "boom" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"status": "error", "message": "model offline"})),
        ),
        "report" => (
            StatusCode::OK,
            Json(json!({"response": REPORT_REPLY, "current_model": {"name": "Mistral-7B"}})),
        ),
        "garbled" => (StatusCode::OK, Json(json!({"reply": "wrong shape"}))),
        _ => (
            StatusCode::OK,
            Json(json!({"response": "You should use Phi-3\nAnything else?", "current_model": null})),
        ),
    }
}

async fn history(Path(identity): Path<String>) -> Reply {
    if identity != KNOWN_USER {
        return (StatusCode::OK, Json(json!([])));
    }

    (
        StatusCode::OK,
        Json(json!([
            {"email": identity, "message": "cheap model for chat?", "timestamp": "Mon, 19 Oct 2026 10:00:00 GMT"},
            {"username": "Agent", "message": "I recommend Phi-3", "timestamp": "Mon, 19 Oct 2026 10:00:00 GMT"},
            {"email": identity, "message": "something faster?", "timestamp": null}
        ])),
    )
}

async fn login(Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email.is_empty() || password.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "fail", "message": "Both email and password are required"})),
        );
    }
    if password != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"status": "fail", "message": "Incorrect password"})),
        );
    }

    (
        StatusCode::OK,
        Json(json!({"status": "success", "email": email.to_lowercase()})),
    )
}

async fn signup(Json(body): Json<Value>) -> Reply {
    if body["email"].as_str() == Some("taken@example.com") {
        return (
            StatusCode::CONFLICT,
            Json(json!({"status": "fail", "message": "Email already registered"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({"status": "success", "message": "User registered successfully"})),
    )
}

async fn logout(State(service): State<Arc<FakeService>>, Json(body): Json<Value>) -> Reply {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    service.logouts.lock().unwrap().push(email.clone());
    (
        StatusCode::OK,
        Json(json!({"status": "success", "message": format!("Data cleared for {}", email)})),
    )
}

async fn upload(State(service): State<Arc<FakeService>>, body: Bytes) -> Reply {
    let text = String::from_utf8_lossy(&body);
    if !text.contains("name=\"file\"") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "fail", "message": "No file provided"})),
        );
    }
    service.uploads.lock().unwrap().push(body.len());
    (StatusCode::OK, Json(json!({"status": "success", "file": "upload"})))
}

async fn health() -> Reply {
    (
        StatusCode::OK,
        Json(json!({"status": "healthy", "service": "AI Model Selector", "platforms": ["web"]})),
    )
}

/// Serve the fake on an ephemeral port; returns its base URL
pub async fn spawn_service(service: Arc<FakeService>) -> String {
    let app = Router::new()
        .route("/chat", post(chat))
        .route("/history/:identity", get(history))
        .route("/login", post(login))
        .route("/signup", post(signup))
        .route("/logout", post(logout))
        .route("/upload", post(upload))
        .route("/health", get(health))
        .with_state(service);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// A base URL nothing listens on
pub fn closed_port_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
