use crate::config::AiConfig;
use crate::errors::AppError;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

const SYSTEM_PROMPT: &str = "You are an advertising analyst helping a small business read its \
Facebook ad campaign metrics. Answer concisely, refer to the numbers in the supplied context \
when they are relevant, and suggest concrete next steps.";

#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI provider is not configured")]
    NotConfigured,
    #[error("AI request failed: {0}")]
    RequestFailed(String),
    #[error("{0}")]
    Provider(String),
    #[error("Invalid AI response: {0}")]
    InvalidResponse(String),
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// Chat-completions client (OpenRouter-compatible body).
#[derive(Clone)]
pub struct AiClient {
    client: Client,
    config: AiConfig,
}

impl AiClient {
    pub fn new(client: Client, config: AiConfig) -> Self {
        Self { client, config }
    }

    pub async fn chat(&self, message: &str, context: Option<&Value>) -> Result<String, AiError> {
        let api_key = self.config.api_key.as_deref().ok_or(AiError::NotConfigured)?;

        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(api_key)
            .json(&request_body(&self.config.model, message, context))
            .send()
            .await
            .map_err(|e| AiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .pointer("/error/message")
                .and_then(Value::as_str)
                .unwrap_or("AI provider returned an error");
            return Err(AiError::Provider(message.to_string()));
        }

        reply_text(&body)
    }
}

fn request_body(model: &str, message: &str, context: Option<&Value>) -> Value {
    let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];
    if let Some(context) = context.filter(|c| !c.is_null()) {
        messages.push(json!({
            "role": "system",
            "content": format!("Dashboard context (JSON): {context}"),
        }));
    }
    messages.push(json!({ "role": "user", "content": message }));

    json!({ "model": model, "messages": messages })
}

fn reply_text(body: &Value) -> Result<String, AiError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| AiError::InvalidResponse("missing choices[0].message.content".to_string()))
}
