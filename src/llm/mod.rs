//! LLM 模块
//!
//! 提供统一的补全客户端，支持 OpenAI 和 Anthropic API 格式。

mod anthropic;
mod client;
mod format;
mod openai;
mod types;

pub use client::{CompletionBackend, LlmClient};
pub use format::ApiFormat;
pub use types::*;
