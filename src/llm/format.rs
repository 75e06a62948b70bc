//! API 格式检测和端点构建

use serde::{Deserialize, Serialize};

/// 补全服务的协议格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiFormat {
    /// OpenAI Chat Completions API
    OpenAi,
    /// Anthropic Messages API
    Anthropic,
}

impl ApiFormat {
    /// 模型名包含 "claude"（不区分大小写）时使用 Anthropic 格式
    pub fn for_model(model: &str) -> Self {
        if model.to_ascii_lowercase().contains("claude") {
            ApiFormat::Anthropic
        } else {
            ApiFormat::OpenAi
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiFormat::OpenAi => "openai",
            ApiFormat::Anthropic => "anthropic",
        }
    }

    /// `/v1` 之后的资源路径
    fn resource(&self) -> &'static str {
        match self {
            ApiFormat::OpenAi => "chat/completions",
            ApiFormat::Anthropic => "messages",
        }
    }

    /// 由配置中的 base_url 得到完整请求地址
    ///
    /// base_url 可以是服务根地址、带 `/v1` 的地址，或已经是完整端点。
    pub fn endpoint(&self, base_url: &str) -> String {
        let base = normalize_base_url(base_url);
        let resource = self.resource();

        if base.ends_with(resource) {
            base
        } else if base.ends_with("/v1") {
            format!("{}/{}", base, resource)
        } else {
            format!("{}/v1/{}", base, resource)
        }
    }
}

/// 去掉末尾斜杠，合并协议之后的重复斜杠
fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');

    match trimmed.split_once("://") {
        Some((scheme, rest)) => {
            let mut path = String::with_capacity(rest.len());
            for c in rest.chars() {
                if !(c == '/' && path.ends_with('/')) {
                    path.push(c);
                }
            }
            format!("{}://{}", scheme, path)
        }
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_follows_model_name() {
        assert_eq!(ApiFormat::for_model("gpt-4"), ApiFormat::OpenAi);
        assert_eq!(ApiFormat::for_model("gpt-3.5-turbo"), ApiFormat::OpenAi);
        assert_eq!(ApiFormat::for_model("claude-3-5-sonnet-latest"), ApiFormat::Anthropic);
        assert_eq!(ApiFormat::for_model("anthropic/Claude-Haiku"), ApiFormat::Anthropic);
    }

    #[test]
    fn test_default_endpoints() {
        assert_eq!(
            ApiFormat::OpenAi.endpoint("https://api.openai.com"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            ApiFormat::Anthropic.endpoint("https://api.anthropic.com/"),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_gateway_base_urls() {
        // 自建网关常见写法：带 /v1、多余斜杠、完整端点
        assert_eq!(
            ApiFormat::OpenAi.endpoint("https://gateway.internal//openai/v1/"),
            "https://gateway.internal/openai/v1/chat/completions"
        );
        assert_eq!(
            ApiFormat::Anthropic.endpoint("http://127.0.0.1:8080/v1/messages"),
            "http://127.0.0.1:8080/v1/messages"
        );
        assert_eq!(
            ApiFormat::OpenAi.endpoint(" http://localhost:11434 "),
            "http://localhost:11434/v1/chat/completions"
        );
    }
}
