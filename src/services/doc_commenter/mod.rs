//! 文档注释生成模块
//!
//! 扫描目录中的源文件，调用补全服务为缺少文档注释的类型补上注释，并写回原文件
//!
//! # 流程
//!
//! - 选择文件：按后缀筛选目录中的文件（不递归）
//! - 分类：判断是否包含类定义、是否已有文档注释
//! - 生成：每个文件发送一次补全请求
//! - 写回：只在内容变化时覆盖原文件
//! - 批处理：固定大小分批，批次之间串行，批次内可并发
//!
//! # 使用示例
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! let config = DocCommentConfig::default();
//! let client = Arc::new(LlmClient::new("api_key", "https://api.openai.com", 120)?);
//! let generator = CommentGenerator::new(client, "gpt-4", ChatOptions::default(), &config.instruction_template);
//! let classifier = Arc::new(HeuristicClassifier::from_config(&config));
//!
//! let processor = DocCommentProcessor::new(config, classifier, generator);
//! let report = processor.process_directory(Path::new("./Models")).await?;
//! ```

mod classifier;
mod generator;
mod processor;
pub mod prompts;
mod scanner;
pub mod types;
mod writer;

pub use classifier::{ContentClassifier, HeuristicClassifier};
pub use generator::CommentGenerator;
pub use processor::DocCommentProcessor;
pub use scanner::ScanError;
pub use types::{DispatchMode, DocCommentConfig, FileStatus, RunReport};
