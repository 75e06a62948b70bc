//! OpenAI Chat Completions API（非流式）

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::types::{ChatCompletion, ChatMessage, ChatOptions, LlmError};

/// OpenAI 请求载荷
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

/// OpenAI 响应
#[derive(Deserialize, Debug)]
struct OpenAiResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Deserialize, Debug)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

/// 调用 OpenAI API 并等待完整响应
pub async fn complete_openai(
    client: &Client,
    endpoint: &str,
    api_key: &str,
    messages: &[ChatMessage],
    model: &str,
    options: &ChatOptions,
) -> Result<ChatCompletion, LlmError> {
    let payload = OpenAiRequest {
        model,
        messages,
        temperature: options.temperature,
        max_tokens: options.max_tokens,
    };

    debug!("OpenAI API request: endpoint={}, model={}", endpoint, model);

    let response = client
        .post(endpoint)
        .header("Authorization", format!("Bearer {}", api_key))
        .header("Content-Type", "application/json")
        .json(&payload)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let status_code = status.as_u16();
        let error_text = response.text().await.unwrap_or_default();
        error!(
            "OpenAI API error: status={}, body={}",
            status_code,
            truncate_body(&error_text)
        );
        return Err(LlmError::ApiError {
            status: status_code,
            message: error_text,
        });
    }

    let body = response.text().await?;
    let parsed: OpenAiResponse = serde_json::from_str(&body)?;

    let choice = parsed.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;
    let content = choice.message.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }

    Ok(ChatCompletion {
        content,
        finish_reason: choice.finish_reason,
    })
}

/// 截断错误响应体用于日志
pub(super) fn truncate_body(text: &str) -> &str {
    match text.char_indices().nth(500) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
