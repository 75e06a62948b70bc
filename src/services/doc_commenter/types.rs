//! 注释生成器类型定义
//!
//! 定义文件任务、生成结果、批次结果等核心类型

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::prompts::DEFAULT_INSTRUCTION_TEMPLATE;
use crate::error::AppError;

/// 单个文件的处理状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    /// 已发现
    Discovered,
    /// 已分类
    Classified,
    /// 正在请求补全服务
    Generating,
    /// 已跳过（无类定义、已有注释、文件过大）
    Skipped,
    /// 已写回新内容
    Updated,
    /// 生成结果与原文相同
    Unchanged,
    /// 处理失败
    Failed,
}

impl FileStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FileStatus::Skipped | FileStatus::Updated | FileStatus::Unchanged | FileStatus::Failed
        )
    }
}

/// 每个被发现的文件对应一个任务，处理一次后丢弃
#[derive(Debug, Clone)]
pub struct FileTask {
    pub path: PathBuf,
    pub raw_content: String,
    pub eligible: bool,
    pub already_documented: bool,
    pub status: FileStatus,
}

impl FileTask {
    pub fn new(path: PathBuf, raw_content: String) -> Self {
        Self {
            path,
            raw_content,
            eligible: false,
            already_documented: false,
            status: FileStatus::Discovered,
        }
    }

    /// 记录分类结果
    pub fn classify(&mut self, eligible: bool, already_documented: bool) {
        self.eligible = eligible;
        self.already_documented = already_documented;
        self.status = FileStatus::Classified;
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

/// 跳过原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 没有找到类定义
    NoTypeDefinition,
    /// 已经包含文档注释
    AlreadyDocumented,
    /// 文件超过大小限制
    TooLarge(u64),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoTypeDefinition => write!(f, "no class found"),
            SkipReason::AlreadyDocumented => write!(f, "already documented"),
            SkipReason::TooLarge(size) => write!(f, "file too large ({} bytes)", size),
        }
    }
}

/// 一个文件的最终结果
#[derive(Debug)]
pub enum GenerationOutcome {
    /// 生成了不同的新内容
    Updated(String),
    /// 生成内容与原文一致
    Unchanged,
    /// 未发起请求
    Skipped(SkipReason),
    /// 读取、请求或写入失败
    Failed(AppError),
}

impl GenerationOutcome {
    pub fn status(&self) -> FileStatus {
        match self {
            GenerationOutcome::Updated(_) => FileStatus::Updated,
            GenerationOutcome::Unchanged => FileStatus::Unchanged,
            GenerationOutcome::Skipped(_) => FileStatus::Skipped,
            GenerationOutcome::Failed(_) => FileStatus::Failed,
        }
    }
}

/// 单个批次的结果
#[derive(Debug, Clone)]
pub struct BatchResult {
    /// 批次序号（从 1 开始）
    pub batch_index: usize,
    /// 本批次处理的文件，保持原始顺序
    pub files_processed: Vec<PathBuf>,
    pub elapsed: Duration,
}

/// 运行统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// 通过文件选择的数量
    pub selected: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunStats {
    /// 记录一个终止状态
    pub fn record(&mut self, status: FileStatus) {
        match status {
            FileStatus::Updated => self.updated += 1,
            FileStatus::Unchanged => self.unchanged += 1,
            FileStatus::Skipped => self.skipped += 1,
            FileStatus::Failed => self.failed += 1,
            _ => {}
        }
    }

    /// 已到达终止状态的文件数
    pub fn finished(&self) -> usize {
        self.updated + self.unchanged + self.skipped + self.failed
    }
}

/// 一次运行的报告
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub batches: Vec<BatchResult>,
    /// 每个文件的最终状态，按处理顺序
    pub files: Vec<(PathBuf, FileStatus)>,
    pub elapsed: Duration,
}

impl RunReport {
    #[cfg(test)]
    pub fn status_of(&self, file_name: &str) -> Option<FileStatus> {
        self.files
            .iter()
            .find(|(path, _)| path.file_name().map(|n| n == file_name).unwrap_or(false))
            .map(|(_, status)| *status)
    }
}

/// 批次内的调度方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// 逐个处理
    Sequential,
    /// 同一批次内并发处理
    #[default]
    Concurrent,
}

/// 注释生成配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocCommentConfig {
    /// 源文件后缀（默认 ".cs"）
    #[serde(default = "default_source_suffix")]
    pub source_suffix: String,

    /// 排除的文件名后缀（默认 ".designer.cs"，自动生成的文件）
    #[serde(default = "default_exclude_suffix")]
    pub exclude_suffix: String,

    /// 额外忽略的文件名模式（glob）
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    /// 视为类型定义的关键字
    #[serde(default = "default_type_keywords")]
    pub type_keywords: Vec<String>,

    /// 文档注释标记
    #[serde(default = "default_doc_marker")]
    pub doc_marker: String,

    /// 是否跳过已有文档注释的文件
    #[serde(default = "default_skip_documented")]
    pub skip_documented: bool,

    /// 最大文件大小（字节，默认1MB）
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// 每批文件数（默认5）
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// 批次内调度方式
    #[serde(default)]
    pub dispatch: DispatchMode,

    /// 指令模板，文件内容拼接在其后
    #[serde(default = "default_instruction_template")]
    pub instruction_template: String,
}

fn default_source_suffix() -> String {
    ".cs".to_string()
}

fn default_exclude_suffix() -> String {
    ".designer.cs".to_string()
}

fn default_type_keywords() -> Vec<String> {
    vec!["class".to_string()]
}

fn default_doc_marker() -> String {
    "/// <summary>".to_string()
}

fn default_skip_documented() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    1024 * 1024
}

fn default_batch_size() -> usize {
    5
}

fn default_instruction_template() -> String {
    DEFAULT_INSTRUCTION_TEMPLATE.to_string()
}

impl Default for DocCommentConfig {
    fn default() -> Self {
        Self {
            source_suffix: default_source_suffix(),
            exclude_suffix: default_exclude_suffix(),
            ignore_patterns: Vec::new(),
            type_keywords: default_type_keywords(),
            doc_marker: default_doc_marker(),
            skip_documented: default_skip_documented(),
            max_file_size: default_max_file_size(),
            batch_size: default_batch_size(),
            dispatch: DispatchMode::default(),
            instruction_template: default_instruction_template(),
        }
    }
}
