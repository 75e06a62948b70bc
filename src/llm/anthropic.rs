//! Anthropic Messages API（非流式）

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::openai::truncate_body;
use super::types::{ChatCompletion, ChatMessage, ChatOptions, LlmError};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic 请求载荷
#[derive(Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    messages: Vec<&'a ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
}

/// Anthropic 响应
#[derive(Deserialize, Debug)]
struct AnthropicResponse {
    #[serde(default)]
    content: Vec<AnthropicContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct AnthropicContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

/// 调用 Anthropic API 并等待完整响应
pub async fn complete_anthropic(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
) -> Result<ChatCompletion, LlmError> {
    // 系统消息单独放在 system 字段
    let system = messages
        .iter()
        .find(|m| m.role == "system")
        .map(|m| m.content.as_str());
    let conversation: Vec<&ChatMessage> = messages.iter().filter(|m| m.role != "system").collect();

    let payload = AnthropicRequest {
        model,
        messages: conversation,
        system,
        max_tokens: options.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: options.temperature,
    };

    debug!("Anthropic API request: endpoint={}, model={}", endpoint, model);

    let response = client
        .post(endpoint)
        .header("Content-Type", "application/json")
        .header("x-api-key", api_key)
        .header("anthropic-version", ANTHROPIC_VERSION)
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_text = response.text().await.unwrap_or_default();
        error!(
            "Anthropic API error: status={}, body={}",
            status_code,
            truncate_body(&error_text)
        );
        return Err(LlmError::ApiError {
            status: status_code,
            message: error_text,
        });
    }

    let body = response.text().await?;
    let parsed: AnthropicResponse = serde_json::from_str(&body)?;

    let content: String = parsed
        .content
        .iter()
        .filter(|block| block.block_type == "text")
        .filter_map(|block| block.text.as_deref())
        .collect();

    if content.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(ChatCompletion {
        content,
        finish_reason: parsed.stop_reason,
    })
}
