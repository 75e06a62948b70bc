//! 文件写回
//!
//! 只有内容真正变化时才覆盖原文件。原地覆盖，不做备份。

use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::AppError;

/// 写回结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    Written,
    Unchanged,
}

/// 文件写回器
#[derive(Debug, Default, Clone, Copy)]
pub struct FileWriter;

impl FileWriter {
    pub fn new() -> Self {
        Self
    }

    /// 新内容与原内容不同才写入
    pub async fn write_if_changed(
        &self,
        path: &Path,
        original: &str,
        new_content: &str,
    ) -> Result<WriteResult, AppError> {
        if original == new_content {
            debug!("Content unchanged, skipping write: {}", path.display());
            return Ok(WriteResult::Unchanged);
        }

        let mut file = fs::File::create(path)
            .await
            .map_err(|e| AppError::Write(path.to_path_buf(), e))?;

        file.write_all(new_content.as_bytes())
            .await
            .map_err(|e| AppError::Write(path.to_path_buf(), e))?;

        file.flush()
            .await
            .map_err(|e| AppError::Write(path.to_path_buf(), e))?;

        debug!("File written: {}", path.display());
        Ok(WriteResult::Written)
    }
}
