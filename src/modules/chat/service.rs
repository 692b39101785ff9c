use anyhow::anyhow;
use axum::http::StatusCode;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{instrument, warn};

use crate::config::chat::ChatConfig;
use crate::metrics;
use crate::utils::errors::AppError;

use super::model::{ChatMessage, ChatRequestDto, ChatRole, MAX_CONTENT_CHARS, MAX_MESSAGES};

const CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize)]
struct UpstreamMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct UpstreamRequest<'a> {
    model: &'a str,
    messages: Vec<UpstreamMessage<'a>>,
    stream: bool,
}

#[derive(Deserialize)]
struct UpstreamChunk {
    #[serde(default)]
    choices: Vec<UpstreamChoice>,
}

#[derive(Deserialize)]
struct UpstreamChoice {
    delta: UpstreamDelta,
}

#[derive(Deserialize)]
struct UpstreamDelta {
    content: Option<String>,
}

/// Message-list rules the derive can't express: per-message content bounds
/// and the requirement that the conversation ends on a user turn.
pub fn validate_messages(messages: &[ChatMessage]) -> Result<(), AppError> {
    if messages.is_empty() || messages.len() > MAX_MESSAGES {
        return Err(AppError::bad_request(anyhow!(
            "Between 1 and {} messages required",
            MAX_MESSAGES
        )));
    }

    for message in messages {
        let chars = message.content.chars().count();
        if message.content.trim().is_empty() || chars > MAX_CONTENT_CHARS {
            return Err(AppError::bad_request(anyhow!(
                "Message content must be between 1 and {} characters",
                MAX_CONTENT_CHARS
            )));
        }
    }

    match messages.last() {
        Some(last) if last.role == ChatRole::User => Ok(()),
        _ => Err(AppError::bad_request(anyhow!(
            "The last message must come from the user"
        ))),
    }
}

pub struct ChatService;

impl ChatService {
    /// Forwards the conversation to the upstream completions API and
    /// re-emits its deltas. Each stream item is one SSE data payload:
    /// a JSON object with the delta text, then a final `[DONE]`.
    #[instrument(skip(http, config, dto), fields(messages = dto.messages.len()))]
    pub async fn stream_completion(
        http: &reqwest::Client,
        config: &ChatConfig,
        dto: ChatRequestDto,
    ) -> Result<ReceiverStream<String>, AppError> {
        if !config.is_configured() {
            return Err(AppError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                anyhow!("Chat is not configured on this server"),
            ));
        }

        validate_messages(&dto.messages)?;

        metrics::track_chat_request();

        let mut messages = Vec::with_capacity(dto.messages.len() + 1);
        messages.push(UpstreamMessage {
            role: "system",
            content: &config.system_prompt,
        });
        for message in &dto.messages {
            messages.push(UpstreamMessage {
                role: message.role.as_str(),
                content: &message.content,
            });
        }

        let request = UpstreamRequest {
            model: &config.model,
            messages,
            stream: true,
        };

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));

        let response = http
            .post(&url)
            .bearer_auth(&config.api_key)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::new(
                    StatusCode::BAD_GATEWAY,
                    anyhow!("Chat upstream unreachable: {}", e),
                )
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %body, "Chat upstream rejected the request");
            return Err(AppError::new(
                StatusCode::BAD_GATEWAY,
                anyhow!("Chat upstream returned {}", status),
            ));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let started = Instant::now();
            let mut stream = response.bytes_stream();
            let mut buffer = String::new();

            'outer: while let Some(chunk_result) = stream.next().await {
                let chunk = match chunk_result {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!(error = %e, "Chat upstream stream broke off");
                        break;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(event_end) = buffer.find("\n\n") {
                    let event = buffer[..event_end].to_string();
                    buffer = buffer[event_end + 2..].to_string();

                    let Some(data) = event.strip_prefix("data:").map(str::trim_start) else {
                        continue;
                    };

                    if data == "[DONE]" {
                        break 'outer;
                    }

                    let Ok(parsed) = serde_json::from_str::<UpstreamChunk>(data) else {
                        warn!("Skipping unparseable chat upstream chunk");
                        continue;
                    };

                    for choice in parsed.choices {
                        if let Some(text) = choice.delta.content {
                            if text.is_empty() {
                                continue;
                            }
                            let payload = json!({ "content": text }).to_string();
                            if tx.send(payload).await.is_err() {
                                // Client hung up.
                                break 'outer;
                            }
                        }
                    }
                }
            }

            let _ = tx.send("[DONE]".to_string()).await;

            metrics::track_chat_stream_duration(started.elapsed().as_secs_f64());
        });

        Ok(ReceiverStream::new(rx))
    }
}
