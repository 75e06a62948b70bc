//! 统一 LLM 客户端

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

use super::anthropic::complete_anthropic;
use super::format::ApiFormat;
use super::openai::complete_openai;
use super::types::{ChatCompletion, ChatMessage, ChatOptions, LlmError};
use crate::utils::RequestLogger;

/// 补全服务抽象
///
/// 评论生成器只依赖这个 trait，测试中可以替换为内存实现。
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// 发送一次请求并等待完整响应
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: ChatOptions,
    ) -> Result<ChatCompletion, LlmError>;
}

/// 统一 LLM 客户端
///
/// 支持 OpenAI 和 Anthropic API 格式，根据模型名称自动选择
pub struct LlmClient {
    client: Client,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    request_logger: Option<Arc<RequestLogger>>,
}

impl LlmClient {
    /// 创建新的 LLM 客户端
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::ConfigError("API Key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(LlmError::HttpError)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into(),
            timeout_secs,
            request_logger: None,
        })
    }

    /// 启用请求日志
    pub fn with_request_logger(mut self, logger: Arc<RequestLogger>) -> Self {
        self.request_logger = Some(logger);
        self
    }

    /// 发送请求（自动检测 API 格式）
    pub async fn chat(
        &self,
        messages: &[ChatMessage],
        model: &str,
        options: &ChatOptions,
    ) -> Result<ChatCompletion, LlmError> {
        let api_format = ApiFormat::for_model(model);
        let endpoint = api_format.endpoint(&self.base_url);
        info!("LLM request: model={}, api_format={:?}", model, api_format);

        let log_entry = self.request_logger.as_ref().map(|logger| {
            logger.log_request(
                &RequestLogger::generate_request_id(),
                api_format,
                &endpoint,
                model,
                messages,
                options,
                self.timeout_secs,
                &self.api_key,
            )
        });
        let start = Instant::now();

        let result = match api_format {
            ApiFormat::OpenAi => {
                complete_openai(&self.client, &endpoint, &self.api_key, messages, model, options).await
            }
            ApiFormat::Anthropic => {
                complete_anthropic(&self.client, &endpoint, &self.api_key, messages, model, options)
                    .await
            }
        };

        if let (Some(logger), Some(entry)) = (&self.request_logger, log_entry) {
            match &result {
                Ok(completion) => logger.log_success(entry, start, &completion.content),
                Err(e) => logger.log_error(entry, start, e),
            }
        }

        result
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
        options: ChatOptions,
    ) -> Result<ChatCompletion, LlmError> {
        self.chat(&messages, model, &options).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options() -> ChatOptions {
        ChatOptions {
            max_tokens: Some(1500),
            ..Default::default()
        }
    }

    #[test]
    fn test_new_requires_api_key() {
        assert!(matches!(
            LlmClient::new("", "https://api.openai.com", 120),
            Err(LlmError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_openai_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "gpt-4",
                "max_tokens": 1500,
                "messages": [{"role": "user", "content": "prompt"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{
                    "message": {"role": "assistant", "content": "/// <summary>\npublic class A {}"},
                    "finish_reason": "stop"
                }]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = LlmClient::new("sk-test", mock_server.uri(), 10).unwrap();
        let result = client
            .complete(vec![ChatMessage::user("prompt")], "gpt-4", options())
            .await
            .unwrap();

        assert_eq!(result.content, "/// <summary>\npublic class A {}");
        assert_eq!(result.finish_reason.as_deref(), Some("stop"));
    }

    #[tokio::test]
    async fn test_openai_api_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&mock_server)
            .await;

        let client = LlmClient::new("sk-bad", mock_server.uri(), 10).unwrap();
        let err = client
            .complete(vec![ChatMessage::user("prompt")], "gpt-4", options())
            .await
            .unwrap_err();

        match err {
            LlmError::ApiError { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("invalid api key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_openai_empty_choices() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&mock_server)
            .await;

        let client = LlmClient::new("sk-test", mock_server.uri(), 10).unwrap();
        let err = client
            .complete(vec![ChatMessage::user("prompt")], "gpt-4", options())
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_anthropic_completion() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant"))
            .and(header("anthropic-version", "2023-06-01"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "public class "},
                    {"type": "text", "text": "B {}"}
                ],
                "stop_reason": "end_turn"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = LlmClient::new("sk-ant", mock_server.uri(), 10).unwrap();
        let result = client
            .complete(vec![ChatMessage::user("prompt")], "claude-3-5-sonnet", options())
            .await
            .unwrap();

        assert_eq!(result.content, "public class B {}");
        assert_eq!(result.finish_reason.as_deref(), Some("end_turn"));
    }

    #[tokio::test]
    async fn test_request_logger_records_calls() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&mock_server)
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let logger = Arc::new(RequestLogger::new(dir.path()));
        let client = LlmClient::new("sk-test", mock_server.uri(), 10)
            .unwrap()
            .with_request_logger(logger.clone());

        let _ = client
            .complete(vec![ChatMessage::user("prompt")], "gpt-4", options())
            .await;

        let log = std::fs::read_to_string(logger.log_path()).unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("\"status\":\"error\""));
        assert!(log.contains("\"status_code\":500"));
    }
}
