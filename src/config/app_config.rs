//! 应用配置管理
//!
//! 启动时加载一次：默认值 → JSON 配置文件 → 环境变量（含 .env）→ 命令行参数。
//! 构建完成后以引用形式传给各组件，不使用全局单例。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::services::doc_commenter::{DispatchMode, DocCommentConfig};

const CONFIG_FILE_NAME: &str = "doc-commenter.json";

/// 获取默认配置文件路径
fn default_config_path() -> PathBuf {
    // 配置文件位于可执行文件同级目录
    std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_FILE_NAME)
}

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM API 密钥
    #[serde(default)]
    pub api_key: String,

    /// LLM API 基础 URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// 模型名称
    #[serde(default = "default_model")]
    pub model: String,

    /// 温度参数（不设置则使用服务端默认值）
    #[serde(default)]
    pub temperature: Option<f64>,

    /// 最大输出 token 数
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// 请求超时（秒）
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// 要处理的目录
    #[serde(default)]
    pub directory: PathBuf,

    /// 从文件读取指令模板，优先于 instruction_template
    #[serde(default)]
    pub instruction_template_file: Option<PathBuf>,

    /// 请求日志目录（不设置则不记录）
    #[serde(default)]
    pub request_log_dir: Option<PathBuf>,

    /// 文件处理相关配置
    #[serde(flatten)]
    pub doc: DocCommentConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_max_tokens() -> u32 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: None,
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            directory: PathBuf::new(),
            instruction_template_file: None,
            request_log_dir: None,
            doc: DocCommentConfig::default(),
        }
    }
}

/// 命令行覆盖项
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub directory: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub sequential: bool,
    pub template_file: Option<PathBuf>,
}

/// 加载配置（读取 .env 和进程环境变量）
pub fn load_config(overrides: &ConfigOverrides) -> AppResult<AppConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        debug!("Loaded environment from {}", path.display());
    }
    let env: HashMap<String, String> = std::env::vars().collect();
    AppConfig::resolve(overrides, &env)
}

impl AppConfig {
    /// 按优先级合并各配置来源并校验
    pub fn resolve(overrides: &ConfigOverrides, env: &HashMap<String, String>) -> AppResult<Self> {
        let mut config = match &overrides.config_file {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = default_config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_env(env)?;
        config.apply_overrides(overrides);
        config.load_template_file()?;
        config.directory = normalize_directory_path(&config.directory);
        config.validate()?;

        info!(
            model = %config.model,
            directory = %config.directory.display(),
            batch_size = config.doc.batch_size,
            dispatch = ?config.doc.dispatch,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: &Path) -> AppResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("读取配置文件失败 {}: {}", path.display(), e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("解析配置文件失败 {}: {}", path.display(), e)))
    }

    fn apply_env(&mut self, env: &HashMap<String, String>) -> AppResult<()> {
        fn get<'a>(env: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
            env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty())
        }

        if let Some(key) = get(env, "API_KEY") {
            self.api_key = key.to_string();
        }
        if let Some(url) = get(env, "BASE_URL") {
            self.base_url = url.to_string();
        }
        if let Some(model) = get(env, "MODEL") {
            self.model = model.to_string();
        }
        if let Some(dir) = get(env, "DirectoryPath").or_else(|| get(env, "DIRECTORY_PATH")) {
            self.directory = PathBuf::from(dir);
        }
        if let Some(size) = get(env, "BATCH_SIZE") {
            self.doc.batch_size = size
                .parse()
                .map_err(|e| AppError::Config(format!("BATCH_SIZE 必须是正整数: {}", e)))?;
        }
        if let Some(tokens) = get(env, "MAX_TOKENS") {
            self.max_tokens = tokens
                .parse()
                .map_err(|e| AppError::Config(format!("MAX_TOKENS 必须是正整数: {}", e)))?;
        }
        Ok(())
    }

    fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(key) = &overrides.api_key {
            self.api_key = key.clone();
        }
        if let Some(model) = &overrides.model {
            self.model = model.clone();
        }
        if let Some(dir) = &overrides.directory {
            self.directory = dir.clone();
        }
        if let Some(size) = overrides.batch_size {
            self.doc.batch_size = size;
        }
        if overrides.sequential {
            self.doc.dispatch = DispatchMode::Sequential;
        }
        if let Some(path) = &overrides.template_file {
            self.instruction_template_file = Some(path.clone());
        }
    }

    fn load_template_file(&mut self) -> AppResult<()> {
        if let Some(path) = &self.instruction_template_file {
            self.doc.instruction_template = fs::read_to_string(path).map_err(|e| {
                AppError::Config(format!("读取指令模板失败 {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    /// 校验必填项
    pub fn validate(&self) -> AppResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::Config("API_KEY 未设置".to_string()));
        }
        if self.directory.as_os_str().is_empty() {
            return Err(AppError::Config("未指定要处理的目录 (DirectoryPath)".to_string()));
        }
        if self.doc.batch_size == 0 {
            return Err(AppError::Config("batch_size 必须大于 0".to_string()));
        }
        if self.doc.instruction_template.trim().is_empty() {
            return Err(AppError::Config("指令模板为空".to_string()));
        }
        if self.doc.source_suffix.is_empty() {
            return Err(AppError::Config("source_suffix 不能为空".to_string()));
        }
        Ok(())
    }
}

/// 统一目录分隔符
///
/// 非 Windows 平台上把 `\` 替换为 `/`，兼容在 .env 中写 Windows 风格路径
pub fn normalize_directory_path(path: &Path) -> PathBuf {
    if cfg!(windows) {
        path.to_path_buf()
    } else {
        PathBuf::from(path.to_string_lossy().replace('\\', "/"))
    }
}
