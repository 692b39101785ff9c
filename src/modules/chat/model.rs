use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

pub const MAX_MESSAGES: usize = 32;
pub const MAX_CONTENT_CHARS: usize = 4000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

/// The conversation so far. The client sends the whole history each turn;
/// the server holds no chat state.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChatRequestDto {
    #[validate(length(min = 1, max = 32, message = "Between 1 and 32 messages required"))]
    pub messages: Vec<ChatMessage>,
}
