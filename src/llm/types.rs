//! LLM 类型定义

use serde::{Deserialize, Serialize};

/// 聊天消息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// 角色：system, user, assistant
    pub role: String,
    /// 消息内容
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// 请求选项
#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    /// 温度参数
    pub temperature: Option<f64>,
    /// 最大输出 token 数
    pub max_tokens: Option<u32>,
}

/// 一次完整（非流式）补全的结果
#[derive(Debug, Clone, Default)]
pub struct ChatCompletion {
    /// 完整响应内容
    pub content: String,
    /// 完成原因
    pub finish_reason: Option<String>,
}

impl ChatCompletion {
    /// 输出是否因为 token 上限被截断
    ///
    /// OpenAI 返回 `length`，Anthropic 返回 `max_tokens`
    pub fn is_truncated(&self) -> bool {
        matches!(self.finish_reason.as_deref(), Some("length") | Some("max_tokens"))
    }
}

/// LLM 错误类型
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// HTTP 请求错误
    #[error("HTTP 请求失败: {0}")]
    HttpError(#[from] reqwest::Error),

    /// API 返回错误
    #[error("API 错误 ({status}): {message}")]
    ApiError { status: u16, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    ConfigError(String),

    /// JSON 解析错误
    #[error("JSON 解析失败: {0}")]
    JsonError(#[from] serde_json::Error),

    /// 响应中没有任何文本
    #[error("响应内容为空")]
    EmptyResponse,

    /// 输出达到 max_tokens 上限被截断
    #[error("响应被截断 (finish_reason: {0})")]
    Truncated(String),
}

impl LlmError {
    /// 用于请求日志的错误类别
    pub fn kind(&self) -> &'static str {
        match self {
            LlmError::HttpError(_) => "http",
            LlmError::ApiError { .. } => "api",
            LlmError::ConfigError(_) => "config",
            LlmError::JsonError(_) => "json",
            LlmError::EmptyResponse => "empty_response",
            LlmError::Truncated(_) => "truncated",
        }
    }

    /// HTTP 状态码（如果有）
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::ApiError { status, .. } => Some(*status),
            LlmError::HttpError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(finish_reason: Option<&str>) -> ChatCompletion {
        ChatCompletion {
            content: "class A {}".to_string(),
            finish_reason: finish_reason.map(str::to_string),
        }
    }

    #[test]
    fn test_is_truncated() {
        assert!(completion(Some("length")).is_truncated());
        assert!(completion(Some("max_tokens")).is_truncated());
        assert!(!completion(Some("stop")).is_truncated());
        assert!(!completion(Some("end_turn")).is_truncated());
        assert!(!completion(None).is_truncated());
    }
}
