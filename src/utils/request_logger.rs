//! 补全请求日志记录器
//!
//! 把每一次补全请求追加到 JSONL 文件，便于事后排查哪个文件的请求失败了、耗时多少。

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use uuid::Uuid;

use crate::llm::{ApiFormat, ChatMessage, ChatOptions, LlmError};

const LOG_FILE_NAME: &str = "completion_requests.jsonl";
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// 请求日志条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    pub api_format: String,
    pub endpoint: String,
    /// API 密钥（脱敏）
    pub api_key_masked: String,
    pub model: String,
    /// 提示词预览（前 200 个字符）
    pub prompt_preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// 超时时间（秒）
    pub timeout: u64,
    /// pending / success / error
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_length: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// 请求日志记录器
pub struct RequestLogger {
    log_path: PathBuf,
    max_entries: usize,
    file: Mutex<Option<File>>,
}

impl RequestLogger {
    /// 在指定目录下创建日志记录器
    pub fn new(log_dir: &Path) -> Self {
        if let Err(e) = fs::create_dir_all(log_dir) {
            warn!("Failed to create request log directory {}: {}", log_dir.display(), e);
        }

        Self {
            log_path: log_dir.join(LOG_FILE_NAME),
            max_entries: DEFAULT_MAX_ENTRIES,
            file: Mutex::new(None),
        }
    }

    /// 设置保留的最大条目数
    #[cfg(test)]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 生成请求 ID
    pub fn generate_request_id() -> String {
        Uuid::new_v4().to_string()[..8].to_string()
    }

    /// API 密钥脱敏
    pub fn mask_api_key(api_key: &str) -> String {
        let chars: Vec<char> = api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    /// 截断字符串（按字符）
    fn truncate(s: &str, max_chars: usize) -> String {
        match s.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &s[..idx]),
            None => s.to_string(),
        }
    }

    /// 记录请求开始
    #[allow(clippy::too_many_arguments)]
    pub fn log_request(
        &self,
        request_id: &str,
        api_format: ApiFormat,
        endpoint: &str,
        model: &str,
        messages: &[ChatMessage],
        options: &ChatOptions,
        timeout: u64,
        api_key: &str,
    ) -> LogEntry {
        let prompt = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        LogEntry {
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            api_format: api_format.as_str().to_string(),
            endpoint: endpoint.to_string(),
            api_key_masked: Self::mask_api_key(api_key),
            model: model.to_string(),
            prompt_preview: Self::truncate(prompt, 200),
            max_tokens: options.max_tokens,
            timeout,
            status: "pending".to_string(),
            duration_ms: None,
            response_length: None,
            response_preview: None,
            error_type: None,
            error_message: None,
            status_code: None,
        }
    }

    /// 记录成功
    pub fn log_success(&self, mut entry: LogEntry, start_time: Instant, response: &str) {
        entry.status = "success".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.response_length = Some(response.chars().count());
        entry.response_preview = Some(Self::truncate(response, 300));
        self.write_entry(&entry);
    }

    /// 记录错误
    pub fn log_error(&self, mut entry: LogEntry, start_time: Instant, error: &LlmError) {
        entry.status = "error".to_string();
        entry.duration_ms = Some(start_time.elapsed().as_millis() as u64);
        entry.error_type = Some(error.kind().to_string());
        entry.error_message = Some(Self::truncate(&error.to_string(), 500));
        entry.status_code = error.status_code();
        self.write_entry(&entry);
    }

    /// 写入日志条目
    fn write_entry(&self, entry: &LogEntry) {
        let mut file_guard = self.file.lock();

        if file_guard.is_none() {
            match OpenOptions::new().create(true).append(true).open(&self.log_path) {
                Ok(f) => *file_guard = Some(f),
                Err(e) => {
                    warn!("Failed to open request log {}: {}", self.log_path.display(), e);
                    return;
                }
            }
        }

        if let Some(file) = file_guard.as_mut() {
            if let Ok(json) = serde_json::to_string(entry) {
                let _ = writeln!(file, "{}", json);
                let _ = file.flush();
            }
        }

        self.cleanup_if_needed(&mut file_guard);
    }

    /// 只保留最近的 max_entries 条
    fn cleanup_if_needed(&self, file_guard: &mut Option<File>) {
        let Ok(file) = File::open(&self.log_path) else {
            return;
        };
        let lines: Vec<String> = BufReader::new(file).lines().map_while(Result::ok).collect();

        if lines.len() > self.max_entries {
            // 重写文件后旧的追加句柄失效
            *file_guard = None;
            let keep_lines = &lines[lines.len() - self.max_entries..];
            if let Ok(mut file) = File::create(&self.log_path) {
                for line in keep_lines {
                    let _ = writeln!(file, "{}", line);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn read_entries(path: &Path) -> Vec<LogEntry> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(RequestLogger::mask_api_key("short"), "*****");
        assert_eq!(RequestLogger::mask_api_key("sk-1234567890abcd"), "sk-1...abcd");
    }

    #[test]
    fn test_log_success_and_error() {
        let dir = TempDir::new().unwrap();
        let logger = RequestLogger::new(dir.path());
        let messages = vec![ChatMessage::user("document this class")];
        let options = ChatOptions {
            max_tokens: Some(1500),
            ..Default::default()
        };

        let entry = logger.log_request(
            "req1",
            ApiFormat::OpenAi,
            "http://localhost/v1/chat/completions",
            "gpt-4",
            &messages,
            &options,
            120,
            "sk-1234567890abcd",
        );
        logger.log_success(entry, Instant::now(), "/// <summary>");

        let entry = logger.log_request(
            "req2",
            ApiFormat::OpenAi,
            "http://localhost/v1/chat/completions",
            "gpt-4",
            &messages,
            &options,
            120,
            "sk-1234567890abcd",
        );
        let err = LlmError::ApiError {
            status: 429,
            message: "rate limited".to_string(),
        };
        logger.log_error(entry, Instant::now(), &err);

        let entries = read_entries(logger.log_path());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].status, "success");
        assert_eq!(entries[0].prompt_preview, "document this class");
        assert_eq!(entries[1].status, "error");
        assert_eq!(entries[1].status_code, Some(429));
        assert_eq!(entries[1].error_type.as_deref(), Some("api"));
        assert_eq!(entries[1].api_key_masked, "sk-1...abcd");
    }

    #[test]
    fn test_cleanup_keeps_latest_entries() {
        let dir = TempDir::new().unwrap();
        let logger = RequestLogger::new(dir.path()).with_max_entries(2);
        let messages = vec![ChatMessage::user("x")];

        for id in ["a", "b", "c"] {
            let entry = logger.log_request(
                id,
                ApiFormat::Anthropic,
                "http://localhost/v1/messages",
                "claude-3-haiku",
                &messages,
                &ChatOptions::default(),
                30,
                "key",
            );
            logger.log_success(entry, Instant::now(), "ok");
        }

        let ids: Vec<String> = read_entries(logger.log_path())
            .into_iter()
            .map(|e| e.request_id)
            .collect();
        assert_eq!(ids, vec!["b".to_string(), "c".to_string()]);
    }
}
