use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::cli::chat::conversation_state::Conversation;
use crate::config::ClientConfig;
use crate::error::ServiceError;

/// A file picked by the user, read into memory for upload.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self { file_name, bytes })
    }
}

/// Successful reply of `/upload`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadReply {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub chat_history: Option<Conversation>,
}

#[derive(Debug, Deserialize)]
struct AskReply {
    chat_history: Conversation,
}

#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    message: &'a str,
    chat_history: &'a Conversation,
}

/// Reply of `/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default)]
    pub gradio_client: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// The three calls the chat page makes against the remote service.
///
/// The service keeps its own notion of the current session, so none of the
/// calls carry the session id returned by `upload`.
#[async_trait]
pub trait SessionService: Send + Sync {
    async fn upload(&self, document: Document) -> Result<UploadReply, ServiceError>;

    /// Sends `message` together with the whole current history and returns the
    /// updated history.
    async fn ask(
        &self,
        message: &str,
        history: &Conversation,
    ) -> Result<Conversation, ServiceError>;

    async fn clear(&self) -> Result<(), ServiceError>;
}

pub struct RagClient {
    config: ClientConfig,
    client: reqwest::Client,
}

impl RagClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url.as_str()
    }

    pub async fn health(&self) -> Result<HealthReport, ServiceError> {
        let response = self.client.get(self.config.endpoint("health")).send().await?;
        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl SessionService for RagClient {
    async fn upload(&self, document: Document) -> Result<UploadReply, ServiceError> {
        info!(
            "Uploading {} ({} bytes)",
            document.file_name,
            document.bytes.len()
        );

        let part = Part::bytes(document.bytes)
            .file_name(document.file_name)
            .mime_str("application/pdf")?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.config.endpoint("upload"))
            .multipart(form)
            .send()
            .await?;

        let body = success_body(response).await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn ask(
        &self,
        message: &str,
        history: &Conversation,
    ) -> Result<Conversation, ServiceError> {
        let request_body = AskRequest {
            message,
            chat_history: history,
        };

        debug!(
            "Sending question to service: {}",
            serde_json::to_string(&request_body)?
        );

        let response = self
            .client
            .post(self.config.endpoint("ask"))
            .json(&request_body)
            .send()
            .await?;

        let body = success_body(response).await?;
        let reply: AskReply = serde_json::from_str(&body)?;
        Ok(reply.chat_history)
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        let response = self.client.post(self.config.endpoint("clear")).send().await?;
        success_body(response).await?;
        Ok(())
    }
}

/// Returns the body of a 2xx response, or the service's error message otherwise.
async fn success_body(response: Response) -> Result<String, ServiceError> {
    let status = response.status();
    let body = response.text().await?;

    debug!("Received {} from service: {}", status, body);

    if !status.is_success() {
        let message = error_message(status.as_u16(), &body);
        error!("Service request failed with {}: {}", status, message);
        return Err(ServiceError::rejected(status.as_u16(), message));
    }

    Ok(body)
}

/// Picks the human readable message out of a failure body.
///
/// Looks at `error` first, then FastAPI's `detail`, then the raw body.
fn error_message(status: u16, body: &str) -> String {
    if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "detail"] {
            match fields.get(key) {
                Some(Value::String(text)) => return text.clone(),
                Some(Value::Null) | None => {}
                Some(other) => return other.to_string(),
            }
        }
    }

    let body = body.trim();
    if body.is_empty() {
        format!("HTTP {}", status)
    } else {
        body.to_string()
    }
}
