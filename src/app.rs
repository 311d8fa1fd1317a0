use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::combine::{self, CombineStats};
use crate::config::ResolvedConfig;
use crate::domain::Source;
use crate::error::ChargeError;
use crate::fetch::{ArchiveFetcher, DownloadInfo};
use crate::fs_util;
use crate::providers;

#[derive(Debug, Clone, Serialize)]
pub struct ProcessResult {
    pub source: Source,
    pub url: String,
    pub from_cache: bool,
    pub downloaded_bytes: u64,
    pub output_path: PathBuf,
    pub lines_read: usize,
    pub rows_written: usize,
    pub skipped_lines: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CombineResult {
    pub output_path: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub columns: usize,
    pub rows_written: usize,
}

impl CombineResult {
    fn new(output_path: PathBuf, stats: CombineStats) -> Self {
        Self {
            output_path,
            inputs: stats.inputs,
            columns: stats.columns,
            rows_written: stats.rows_written,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<F: ArchiveFetcher> {
    config: ResolvedConfig,
    fetcher: F,
}

impl<F: ArchiveFetcher> App<F> {
    pub fn new(config: ResolvedConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }

    /// Downloads and unpacks `source` into `target_dir`, then writes the
    /// normalized `<source>.csv` next to it.
    pub fn process(
        &self,
        source: Source,
        target_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<ProcessResult, ChargeError> {
        sink.event(ProgressEvent {
            message: format!(
                "phase=Prepare; processing {source} at {}",
                absolute(target_dir).display()
            ),
            elapsed: None,
        });
        fs_util::ensure_dir_exists(target_dir)?;

        let url = self.config.source_url(source).to_string();
        let archive_path = target_dir.join(source.archive_name());
        sink.event(ProgressEvent {
            message: format!("phase=Download; {url}"),
            elapsed: None,
        });
        let start = Instant::now();
        let download: DownloadInfo = self.fetcher.download(&url, &archive_path)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Download; {} bytes{}",
                download.bytes,
                if download.from_cache { " from cache" } else { "" }
            ),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: format!("phase=Unpack; {}", archive_path.display()),
            elapsed: None,
        });
        let unpacked = fs_util::unpack_archive(&archive_path, target_dir)?;
        sink.event(ProgressEvent {
            message: format!("phase=Unpack; {} files", unpacked.len()),
            elapsed: None,
        });
        let input_path = target_dir.join(source.dataset_name());
        if !unpacked.contains(&input_path) {
            return Err(ChargeError::Archive(format!(
                "archive did not contain {}",
                source.dataset_name()
            )));
        }

        let output_path = target_dir.join(source.export_name());
        sink.event(ProgressEvent {
            message: format!("phase=Export; writing {}", output_path.display()),
            elapsed: None,
        });
        let start = Instant::now();
        let stats = providers::run(source, &input_path, &output_path)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Export; {} rows from {} lines",
                stats.rows_written, stats.lines_read
            ),
            elapsed: Some(start.elapsed()),
        });

        Ok(ProcessResult {
            source,
            url,
            from_cache: download.from_cache,
            downloaded_bytes: download.bytes,
            output_path,
            lines_read: stats.lines_read,
            rows_written: stats.rows_written,
            skipped_lines: stats.skipped_lines,
        })
    }
}

/// Merges already produced CSV files into `output`.
pub fn combine(
    output: &Path,
    inputs: &[PathBuf],
    sink: &dyn ProgressSink,
) -> Result<CombineResult, ChargeError> {
    sink.event(ProgressEvent {
        message: format!(
            "phase=Combine; combining {} files at {}",
            inputs.len(),
            absolute(output).display()
        ),
        elapsed: None,
    });
    let start = Instant::now();
    let stats = combine::combine_files(output, inputs)?;
    sink.event(ProgressEvent {
        message: format!(
            "phase=Combine; {} rows, {} columns",
            stats.rows_written, stats.columns
        ),
        elapsed: Some(start.elapsed()),
    });
    Ok(CombineResult::new(output.to_path_buf(), stats))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
