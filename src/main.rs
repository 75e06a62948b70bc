//! doc-commenter
//!
//! 扫描目录中的源文件，调用 LLM 为缺少文档注释的类型补充注释并写回原文件。

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod llm;
mod services;
mod utils;

use config::{load_config, ConfigOverrides};
use error::{AppError, AppResult};
use llm::{ChatOptions, LlmClient};
use services::doc_commenter::{
    CommentGenerator, DocCommentProcessor, FileStatus, HeuristicClassifier, RunReport,
};
use utils::RequestLogger;

/// Add LLM-generated documentation comments to the source files of a directory
#[derive(Parser, Debug)]
#[command(name = "doc-commenter")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory to process (overrides DirectoryPath)
    directory: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// API key for the completion service (overrides API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Model identifier, e.g. "gpt-4" or "claude-3-5-sonnet-latest"
    #[arg(short, long)]
    model: Option<String>,

    /// Number of files per batch
    #[arg(short, long)]
    batch_size: Option<usize>,

    /// Process files in a batch one at a time instead of concurrently
    #[arg(long)]
    sequential: bool,

    /// File containing the instruction template
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            config_file: self.config.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            directory: self.directory.clone(),
            batch_size: self.batch_size,
            sequential: self.sequential,
            template_file: self.template.clone(),
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "doc_commenter=debug"
    } else {
        "doc_commenter=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// 加载配置、组装各组件并处理目录
async fn run(cli: &Cli) -> AppResult<RunReport> {
    let config = load_config(&cli.overrides())?;

    let mut client = LlmClient::new(&config.api_key, &config.base_url, config.request_timeout_secs)
        .map_err(|e| AppError::Config(e.to_string()))?;
    if let Some(log_dir) = &config.request_log_dir {
        let logger = RequestLogger::new(log_dir);
        info!("Recording completion requests to {}", logger.log_path().display());
        client = client.with_request_logger(Arc::new(logger));
    }

    let options = ChatOptions {
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
    };
    let generator = CommentGenerator::new(
        Arc::new(client),
        config.model.clone(),
        options,
        config.doc.instruction_template.clone(),
    );
    let classifier = Arc::new(HeuristicClassifier::from_config(&config.doc));

    let processor = DocCommentProcessor::new(config.doc.clone(), classifier, generator);
    processor.process_directory(&config.directory).await
}

/// 输出运行摘要：每个批次的耗时、失败的文件和总体统计
fn log_report(report: &RunReport) {
    for batch in &report.batches {
        debug!(
            "Batch {}: {} files in {:.2} seconds",
            batch.batch_index,
            batch.files_processed.len(),
            batch.elapsed.as_secs_f64()
        );
    }

    for (path, status) in &report.files {
        if *status == FileStatus::Failed {
            warn!("Not updated due to an error: {}", path.display());
        }
    }

    info!(
        "Directory processing complete! {} of {} files updated ({} finished). Total time taken: {:.2} seconds.",
        report.stats.updated,
        report.stats.selected,
        report.stats.finished(),
        report.elapsed.as_secs_f64()
    );
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    info!("Starting doc-commenter...");

    match run(&cli).await {
        Ok(report) => {
            log_report(&report);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "doc-commenter",
            "./Models",
            "--batch-size",
            "3",
            "--sequential",
            "--model",
            "gpt-4o",
        ]);
        let overrides = cli.overrides();

        assert_eq!(overrides.directory, Some(PathBuf::from("./Models")));
        assert_eq!(overrides.batch_size, Some(3));
        assert!(overrides.sequential);
        assert_eq!(overrides.model.as_deref(), Some("gpt-4o"));
    }

    #[tokio::test]
    async fn test_missing_directory_aborts_run() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        std::fs::write(&config_path, "{}").unwrap();
        let missing = dir.path().join("does-not-exist");

        let cli = Cli::parse_from([
            "doc-commenter".to_string(),
            missing.to_string_lossy().to_string(),
            "--config".to_string(),
            config_path.to_string_lossy().to_string(),
            "--api-key".to_string(),
            "sk-test".to_string(),
            "--batch-size".to_string(),
            "1".to_string(),
        ]);

        let err = run(&cli).await.unwrap_err();
        assert!(matches!(err, AppError::Directory(_)));
        assert!(err.is_fatal());
    }
}
