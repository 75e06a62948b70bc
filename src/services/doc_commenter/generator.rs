//! 注释生成器
//!
//! 把指令模板和文件内容拼成一个 prompt，调用补全服务，返回生成结果

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

use super::prompts;
use super::types::GenerationOutcome;
use crate::error::AppError;
use crate::llm::{ChatMessage, ChatOptions, CompletionBackend, LlmError};

// 整个响应被一个代码块包裹时取出内部内容；开头一行（语言标识符，可带空白或 \r）整行丢弃
static RE_CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\A```(?:[^\n`]*\n)?(.*?)```\z").unwrap());

/// 注释生成器
pub struct CommentGenerator {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    options: ChatOptions,
    template: String,
}

impl CommentGenerator {
    /// 创建新的注释生成器
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        model: impl Into<String>,
        options: ChatOptions,
        template: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            options,
            template: template.into(),
        }
    }

    /// 为一个文件生成带注释的新内容
    ///
    /// 每个文件只发一次请求，失败不重试。
    pub async fn generate(&self, path: &Path, code: &str) -> GenerationOutcome {
        let prompt = prompts::format_comment_prompt(&self.template, code);
        let messages = vec![ChatMessage::user(prompt)];

        debug!("Requesting comments for {} ({} chars)", path.display(), code.len());

        let completion = match self
            .backend
            .complete(messages, &self.model, self.options.clone())
            .await
        {
            Ok(completion) => completion,
            Err(e) => {
                error!("Error with completion request for {}: {}", path.display(), e);
                return GenerationOutcome::Failed(AppError::Service(e));
            }
        };

        if completion.is_truncated() {
            let reason = completion.finish_reason.unwrap_or_default();
            error!(
                "Completion for {} hit the max_tokens limit ({}), leaving file untouched",
                path.display(),
                reason
            );
            return GenerationOutcome::Failed(AppError::Service(LlmError::Truncated(reason)));
        }

        let content = strip_code_fence(&completion.content);
        if content.trim().is_empty() {
            error!("Completion for {} was empty", path.display());
            return GenerationOutcome::Failed(AppError::Service(LlmError::EmptyResponse));
        }

        if content == code {
            GenerationOutcome::Unchanged
        } else {
            GenerationOutcome::Updated(content)
        }
    }
}

/// 去掉包裹整个响应的 Markdown 代码块
///
/// 支持以下格式：
/// 1. 原始代码：原样返回
/// 2. ` ```csharp ... ``` `：返回代码块内部内容
fn strip_code_fence(response: &str) -> String {
    match RE_CODE_FENCE.captures(response.trim()) {
        Some(caps) => caps[1].to_string(),
        None => response.to_string(),
    }
}
