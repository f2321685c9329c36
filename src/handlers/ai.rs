use super::ApiJson;
use crate::auth::AuthUser;
use crate::envelope::ApiResponse;
use crate::errors::AppError;
use crate::state::AppState;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

const MAX_MESSAGE_CHARS: usize = 4_000;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

pub async fn chat(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(payload): ApiJson<ChatRequest>,
) -> Result<ApiResponse<ChatResponse>, AppError> {
    let message = payload
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::bad_request("message is required"))?;
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::bad_request(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }

    info!(user_id = %user.user_id, "forwarding assistant question");
    let reply = state.ai.chat(&message, payload.context.as_ref()).await?;
    Ok(ApiResponse::ok(ChatResponse { reply }))
}
