use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const DEFAULT_ENDPOINT: &str = "https://carboncredits-tccv-edu-chatbot.hf.space/query";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub user_message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

/// Something that turns user text into a bot reply.
///
/// Empty input is the caller's problem: implementations send whatever they
/// are given.
pub trait ChatBackend: Send + Sync + 'static {
    fn send_message(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<ChatResponse, ApiError>> + Send;
}

#[derive(Clone)]
pub struct HttpChatClient {
    client: Client,
    endpoint: String,
}

impl HttpChatClient {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ChatBackend for HttpChatClient {
    async fn send_message(&self, text: &str) -> Result<ChatResponse, ApiError> {
        let request = ChatRequest {
            user_message: text.to_string(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }

        // Decode by hand so a bad body is told apart from a dropped connection
        let bytes = response.bytes().await?;
        let chat_response: ChatResponse = serde_json::from_slice(&bytes)?;
        Ok(chat_response)
    }
}
