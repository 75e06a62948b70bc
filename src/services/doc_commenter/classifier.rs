//! 内容分类器
//!
//! 判断文件是否包含类型定义，以及是否已经带有文档注释。
//! 这是基于文本的启发式判断，不是语法解析。

use regex::Regex;
use tracing::warn;

use super::types::DocCommentConfig;

/// 内容分类能力
///
/// 两个判断相互独立；调度器只依赖这个 trait，可以换成基于解析器的实现。
pub trait ContentClassifier: Send + Sync {
    /// 是否包含类型定义（关键字之后出现 `{`）
    fn is_eligible(&self, text: &str) -> bool;

    /// 是否已经带有文档注释标记
    fn has_documentation(&self, text: &str) -> bool;
}

/// 默认的启发式分类器
pub struct HeuristicClassifier {
    type_pattern: Option<Regex>,
    doc_marker: String,
}

impl HeuristicClassifier {
    pub fn new(type_keywords: &[String], doc_marker: impl Into<String>) -> Self {
        let keywords: Vec<String> = type_keywords
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();

        // 关键字作为独立单词出现，之后任意位置有 `{`
        let type_pattern = if keywords.is_empty() {
            warn!("No type keywords configured, every file will be treated as ineligible");
            None
        } else {
            let pattern = format!(r"(?s)\b(?:{})\b.*\{{", keywords.join("|"));
            match Regex::new(&pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!("Invalid type keyword pattern '{}': {}", pattern, e);
                    None
                }
            }
        };

        Self {
            type_pattern,
            doc_marker: doc_marker.into(),
        }
    }

    pub fn from_config(config: &DocCommentConfig) -> Self {
        Self::new(&config.type_keywords, config.doc_marker.clone())
    }
}

impl ContentClassifier for HeuristicClassifier {
    fn is_eligible(&self, text: &str) -> bool {
        match &self.type_pattern {
            Some(re) => re.is_match(text),
            None => false,
        }
    }

    fn has_documentation(&self, text: &str) -> bool {
        !self.doc_marker.is_empty() && text.contains(&self.doc_marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> HeuristicClassifier {
        HeuristicClassifier::from_config(&DocCommentConfig::default())
    }

    #[test]
    fn test_is_eligible() {
        let c = classifier();
        assert!(c.is_eligible("public class Account\n{\n}"));
        assert!(c.is_eligible("internal sealed class A : B { }"));
        assert!(!c.is_eligible(""));
        assert!(!c.is_eligible("namespace X;\nusing System;"));
        // 没有代码块
        assert!(!c.is_eligible("// class"));
        // `{` 必须在关键字之后
        assert!(!c.is_eligible("{ } class"));
        // 关键字必须是独立单词
        assert!(!c.is_eligible("var subclassed = new { };"));
    }

    #[test]
    fn test_custom_keywords() {
        let c = HeuristicClassifier::new(
            &["record".to_string(), "interface".to_string()],
            "/// <summary>",
        );
        assert!(c.is_eligible("public interface IRepo {"));
        assert!(c.is_eligible("public record Point(int X) { }"));
        assert!(!c.is_eligible("public class A { }"));
    }

    #[test]
    fn test_no_keywords_never_eligible() {
        let c = HeuristicClassifier::new(&[], "/// <summary>");
        assert!(!c.is_eligible("public class A { }"));
    }

    #[test]
    fn test_has_documentation() {
        let c = classifier();
        assert!(c.has_documentation(
            "/// <summary>\n/// Account.\n/// </summary>\npublic class Account { }"
        ));
        assert!(!c.has_documentation("// plain comment\npublic class Account { }"));
        assert!(!c.has_documentation(""));
    }
}
