//! 统一错误处理模块
//!
//! 定义应用级错误类型。配置错误和目录错误是致命的，会在处理开始前终止运行；
//! 其余错误只影响单个文件。

use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

use crate::llm::LlmError;
use crate::services::doc_commenter::ScanError;

/// 应用错误枚举
#[derive(Error, Debug)]
pub enum AppError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 目标目录不存在或不是目录
    #[error("目录错误: {0}")]
    Directory(#[from] ScanError),

    /// 补全服务调用错误
    #[error("服务错误: {0}")]
    Service(#[from] LlmError),

    /// 读取源文件失败
    #[error("读取失败 ({}): {}", .0.display(), .1)]
    Read(PathBuf, #[source] std::io::Error),

    /// 写回源文件失败
    #[error("写入失败 ({}): {}", .0.display(), .1)]
    Write(PathBuf, #[source] std::io::Error),
}

impl AppError {
    /// 是否应终止整个运行
    pub fn is_fatal(&self) -> bool {
        matches!(self, AppError::Config(_) | AppError::Directory(_))
    }

    /// 进程退出码
    pub fn exit_code(&self) -> ExitCode {
        if self.is_fatal() {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

/// 便捷类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::Config("missing API_KEY".into()).is_fatal());
        assert!(AppError::Directory(ScanError::PathNotFound(PathBuf::from("/nope"))).is_fatal());
        assert!(!AppError::Service(LlmError::EmptyResponse).is_fatal());

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!AppError::Write(PathBuf::from("a.cs"), io).is_fatal());
    }

    #[test]
    fn test_error_message_contains_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::Write(PathBuf::from("Models/X.cs"), io);
        assert!(err.to_string().contains("Models/X.cs"));
    }
}
