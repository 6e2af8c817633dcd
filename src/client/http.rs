// JSON-over-HTTP transport to the assistant service

use super::types::{
    ChatRequest, ChatResponse, HealthStatus, HistoryEntry, LoginRequest, LogoutRequest,
    SignupRequest, StatusResponse,
};
use super::AssistantBackend;
use crate::error::TransportError;
use crate::models::ChatMessage;
use crate::utils::display_name;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;

const NOTICE_THREAD_NAME: &str = "session-end-notice";

/// HTTP client for the assistant service
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpBackend {
    /// Create a backend for `base_url`; every request is bounded by `timeout`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("model-advisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::request("client", e))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn post_json<B: serde::Serialize + ?Sized>(
        &self,
        name: &str,
        body: &B,
    ) -> Result<reqwest::Response, TransportError> {
        let response = self
            .client
            .post(self.endpoint(name))
            .json(body)
            .send()
            .await
            .map_err(|e| TransportError::request(name, e))?;

        check_status(name, response).await
    }
}

/// Turn a non-2xx response into `TransportError::Status`
async fn check_status(
    name: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, TransportError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    Err(TransportError::Status {
        endpoint: name.to_string(),
        status,
        body: error_detail(&text),
    })
}

async fn decode<T: DeserializeOwned>(
    name: &str,
    response: reqwest::Response,
) -> Result<T, TransportError> {
    response
        .json::<T>()
        .await
        .map_err(|e| TransportError::decode(name, e))
}

/// Prefer the service's `message` field over the raw body
fn error_detail(body: &str) -> String {
    serde_json::from_str::<StatusResponse>(body)
        .ok()
        .and_then(|s| s.message)
        .unwrap_or_else(|| body.trim().to_string())
}

/// Fail unless the `{status}` envelope says "success"
fn require_success(name: &str, status: &StatusResponse) -> Result<(), TransportError> {
    if status.is_success() {
        Ok(())
    } else {
        Err(TransportError::rejected(
            name,
            status
                .message
                .clone()
                .unwrap_or_else(|| format!("status '{}'", status.status)),
        ))
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn chat(&self, identity: &str, message: &str) -> Result<String, TransportError> {
        let request = ChatRequest {
            email: identity.to_string(),
            message: message.to_string(),
        };
        let response = self.post_json("chat", &request).await?;
        let reply: ChatResponse = decode("chat", response).await?;

        if let Some(model) = &reply.current_model {
            log::debug!("Service current model: {}", model);
        }
        Ok(reply.response)
    }

    async fn upload(&self, file: &Path) -> Result<(), TransportError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|e| TransportError::request("upload", format!("{:?}: {}", file, e)))?;

        let part = reqwest::multipart::Part::bytes(bytes).file_name(display_name(file));
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint("upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError::request("upload", e))?;
        let response = check_status("upload", response).await?;

        // An empty or non-JSON 2xx body still counts as accepted
        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<StatusResponse>(&text) {
            Ok(status) if !status.status.is_empty() => require_success("upload", &status),
            _ => Ok(()),
        }
    }

    async fn history(&self, identity: &str) -> Result<Vec<ChatMessage>, TransportError> {
        let mut url = reqwest::Url::parse(&self.endpoint("history"))
            .map_err(|e| TransportError::request("history", e))?;
        url.path_segments_mut()
            .map_err(|_| TransportError::request("history", "base URL cannot carry a path"))?
            .push(identity);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransportError::request("history", e))?;
        let response = check_status("history", response).await?;
        let entries: Vec<HistoryEntry> = decode("history", response).await?;

        Ok(entries.into_iter().map(HistoryEntry::into_message).collect())
    }

    async fn login(&self, request: &LoginRequest) -> Result<String, TransportError> {
        let response = self.post_json("login", request).await?;
        let status: StatusResponse = decode("login", response).await?;
        require_success("login", &status)?;

        Ok(status.email.unwrap_or_else(|| request.email.clone()))
    }

    async fn signup(&self, request: &SignupRequest) -> Result<(), TransportError> {
        let response = self.post_json("signup", request).await?;
        let status: StatusResponse = decode("signup", response).await?;
        require_success("signup", &status)
    }

    async fn end_session(&self, identity: &str) -> Result<(), TransportError> {
        let request = LogoutRequest {
            email: identity.to_string(),
        };
        self.post_json("logout", &request).await?;
        Ok(())
    }

    fn end_session_detached(&self, identity: &str) {
        let url = self.endpoint("logout");
        let body = LogoutRequest {
            email: identity.to_string(),
        };
        let timeout = self.timeout;

        // The blocking client owns its own runtime, so it is built and dropped
        // entirely on this thread.
        let spawned = std::thread::Builder::new()
            .name(NOTICE_THREAD_NAME.to_string())
            .spawn(move || {
                let client = match reqwest::blocking::Client::builder().timeout(timeout).build() {
                    Ok(client) => client,
                    Err(e) => {
                        log::warn!("Failed to build client for session-end notice: {}", e);
                        return;
                    }
                };

                match client.post(&url).json(&body).send() {
                    Ok(res) if res.status().is_success() => {
                        log::debug!("Session-end notice delivered for {}", body.email)
                    }
                    Ok(res) => log::warn!(
                        "Session-end notice for {} returned {}",
                        body.email,
                        res.status()
                    ),
                    Err(e) => log::warn!("Session-end notice for {} failed: {}", body.email, e),
                }
            });

        if let Err(e) = spawned {
            log::warn!("Failed to spawn session-end notice thread: {}", e);
        }
    }

    async fn health(&self) -> Result<HealthStatus, TransportError> {
        let response = self
            .client
            .get(self.endpoint("health"))
            .send()
            .await
            .map_err(|e| TransportError::request("health", e))?;
        let response = check_status("health", response).await?;
        decode("health", response).await
    }
}
