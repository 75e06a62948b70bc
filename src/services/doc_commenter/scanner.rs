//! 目录扫描器
//!
//! 列出目标目录（不递归），按后缀筛选出需要处理的源文件

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::types::DocCommentConfig;

/// 目录扫描器
pub struct DirectoryScanner {
    source_suffix: String,
    exclude_suffix: String,
    /// 编译后的忽略模式（glob patterns）
    ignore_patterns: Vec<glob::Pattern>,
}

impl DirectoryScanner {
    /// 创建新的目录扫描器
    pub fn new(config: &DocCommentConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Invalid ignore pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            source_suffix: config.source_suffix.clone(),
            exclude_suffix: config.exclude_suffix.clone(),
            ignore_patterns,
        }
    }

    /// 列出目录中符合条件的文件名，保持目录列举顺序
    pub fn select(&self, dir: &Path) -> Result<Vec<String>, ScanError> {
        if !dir.exists() {
            return Err(ScanError::PathNotFound(dir.to_path_buf()));
        }

        if !dir.is_dir() {
            return Err(ScanError::NotADirectory(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|e| ScanError::IoError(dir.to_path_buf(), e))?;

        let mut selected = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ScanError::IoError(dir.to_path_buf(), e))?;
            let entry_path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();

            if !entry_path.is_file() {
                continue;
            }

            if self.is_selected(&name) {
                selected.push(name);
            } else {
                debug!("Ignoring: {}", entry_path.display());
            }
        }

        info!(
            "Found {} valid {} files in {}",
            selected.len(),
            self.source_suffix,
            dir.display()
        );
        Ok(selected)
    }

    /// 文件名是否满足后缀规则
    fn is_selected(&self, name: &str) -> bool {
        if !name.ends_with(&self.source_suffix) {
            return false;
        }

        if !self.exclude_suffix.is_empty() && name.ends_with(&self.exclude_suffix) {
            return false;
        }

        !self.ignore_patterns.iter().any(|p| p.matches(name))
    }
}

/// 扫描错误类型
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("路径不存在: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("路径不是目录: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO错误 ({}): {}", .0.display(), .1)]
    IoError(PathBuf, #[source] std::io::Error),
}
