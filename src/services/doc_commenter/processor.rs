//! 批处理调度器
//!
//! 把选中的文件按固定大小分批，批次之间严格串行，批次内可以并发；
//! 单个文件失败只记录日志，不影响其他文件。

use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use super::classifier::ContentClassifier;
use super::generator::CommentGenerator;
use super::scanner::DirectoryScanner;
use super::types::{
    BatchResult, DispatchMode, DocCommentConfig, FileStatus, FileTask, GenerationOutcome,
    RunReport, RunStats, SkipReason,
};
use super::writer::{FileWriter, WriteResult};
use crate::error::{AppError, AppResult};

/// 把列表切成大小不超过 `batch_size` 的连续分组，保持原始顺序
pub fn partition<T>(items: &[T], batch_size: usize) -> Vec<&[T]> {
    items.chunks(batch_size.max(1)).collect()
}

/// 批处理调度器
pub struct DocCommentProcessor {
    scanner: DirectoryScanner,
    classifier: Arc<dyn ContentClassifier>,
    generator: CommentGenerator,
    writer: FileWriter,
    config: DocCommentConfig,
}

impl DocCommentProcessor {
    pub fn new(
        config: DocCommentConfig,
        classifier: Arc<dyn ContentClassifier>,
        generator: CommentGenerator,
    ) -> Self {
        Self {
            scanner: DirectoryScanner::new(&config),
            classifier,
            generator,
            writer: FileWriter::new(),
            config,
        }
    }

    /// 处理整个目录
    ///
    /// 目录不存在或不是目录时直接返回错误，不处理任何文件。
    pub async fn process_directory(&self, dir: &Path) -> AppResult<RunReport> {
        let overall_start = Instant::now();

        let names = self.scanner.select(dir)?;
        let files: Vec<PathBuf> = names.iter().map(|name| dir.join(name)).collect();

        let batch_size = self.config.batch_size.max(1);
        let batches = partition(&files, batch_size);
        info!(
            "Processing {} files in {} batches (batch size {}, {:?})",
            files.len(),
            batches.len(),
            batch_size,
            self.config.dispatch
        );

        let mut report = RunReport {
            stats: RunStats {
                selected: files.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        for (index, batch) in batches.into_iter().enumerate() {
            let batch_index = index + 1;
            let batch_start = Instant::now();

            let statuses = self.process_batch(batch).await;

            for (path, status) in batch.iter().zip(statuses) {
                report.stats.record(status);
                report.files.push((path.clone(), status));
            }

            let elapsed = batch_start.elapsed();
            info!(
                "Batch {} processed. Time taken: {:.2} seconds.",
                batch_index,
                elapsed.as_secs_f64()
            );

            report.batches.push(BatchResult {
                batch_index,
                files_processed: batch.to_vec(),
                elapsed,
            });
        }

        report.elapsed = overall_start.elapsed();
        let stats = &report.stats;
        info!(
            "All batches processed! updated={}, unchanged={}, skipped={}, failed={}. Total time: {:.2} seconds.",
            stats.updated,
            stats.unchanged,
            stats.skipped,
            stats.failed,
            report.elapsed.as_secs_f64()
        );

        Ok(report)
    }

    /// 处理一个批次，等全部文件完成后返回，结果顺序与输入一致
    async fn process_batch(&self, batch: &[PathBuf]) -> Vec<FileStatus> {
        match self.config.dispatch {
            DispatchMode::Sequential => {
                let mut statuses = Vec::with_capacity(batch.len());
                for path in batch {
                    statuses.push(self.process_file(path).await);
                }
                statuses
            }
            DispatchMode::Concurrent => {
                stream::iter(batch.iter())
                    .map(|path| self.process_file(path))
                    .buffered(batch.len().max(1))
                    .collect()
                    .await
            }
        }
    }

    /// 处理单个文件并输出日志，返回终止状态
    async fn process_file(&self, path: &Path) -> FileStatus {
        info!("Processing file: {}", path.display());
        let start = Instant::now();

        let outcome = self.run_file(path).await;
        let seconds = start.elapsed().as_secs_f64();

        match &outcome {
            GenerationOutcome::Updated(_) => info!(
                "File processed successfully! Modified file: {}. Time taken: {:.2} seconds.",
                path.display(),
                seconds
            ),
            GenerationOutcome::Unchanged => info!(
                "File unchanged: {}. Time taken: {:.2} seconds.",
                path.display(),
                seconds
            ),
            GenerationOutcome::Skipped(reason) => {
                info!("Skipping file: {} ({})", path.display(), reason)
            }
            GenerationOutcome::Failed(e) => {
                error!("Error processing file: {}: {}", path.display(), e)
            }
        }

        let status = outcome.status();
        debug_assert!(status.is_terminal());
        status
    }

    async fn run_file(&self, path: &Path) -> GenerationOutcome {
        match tokio::fs::metadata(path).await {
            Ok(metadata) if metadata.len() > self.config.max_file_size => {
                return GenerationOutcome::Skipped(SkipReason::TooLarge(metadata.len()));
            }
            Ok(_) => {}
            Err(e) => return GenerationOutcome::Failed(AppError::Read(path.to_path_buf(), e)),
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => return GenerationOutcome::Failed(AppError::Read(path.to_path_buf(), e)),
        };

        let mut task = FileTask::new(path.to_path_buf(), content);
        task.classify(
            self.classifier.is_eligible(&task.raw_content),
            self.classifier.has_documentation(&task.raw_content),
        );

        if !task.eligible {
            return GenerationOutcome::Skipped(SkipReason::NoTypeDefinition);
        }

        if task.already_documented {
            if self.config.skip_documented {
                return GenerationOutcome::Skipped(SkipReason::AlreadyDocumented);
            }
            warn!(
                "{} already has documentation comments, regenerating anyway",
                task.display_path()
            );
        }

        task.status = FileStatus::Generating;
        debug!("{} -> {:?}", task.display_path(), task.status);

        match self.generator.generate(&task.path, &task.raw_content).await {
            GenerationOutcome::Updated(new_content) => {
                match self
                    .writer
                    .write_if_changed(&task.path, &task.raw_content, &new_content)
                    .await
                {
                    Ok(WriteResult::Written) => GenerationOutcome::Updated(new_content),
                    Ok(WriteResult::Unchanged) => GenerationOutcome::Unchanged,
                    Err(e) => GenerationOutcome::Failed(e),
                }
            }
            other => other,
        }
    }
}
