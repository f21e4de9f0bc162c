//! Persistence stage: appends spot records to per-country output files.
//!
//! Every record opens its file in append mode, writes one line and closes it again. A
//! single writer task owns all appends, so lines sent for the same file land in send order.

use crate::error::{CrawlError, Result};
use serde::Serialize;
use spotter_scanner::{PageRef, RecordSender, SpotRecord};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordFormat {
    /// `{'url': 'a/b', 'Break Type': 'Reef'}`
    Literal,
    /// `{"url":"a/b","Break Type":"Reef"}`
    JsonLines,
}

impl RecordFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "literal" | "dict" => Some(RecordFormat::Literal),
            "jsonl" | "json" => Some(RecordFormat::JsonLines),
            _ => None,
        }
    }

    /// One output line, newline included.
    pub fn render(&self, record: &SpotRecord) -> Result<String> {
        let mut line = match self {
            RecordFormat::Literal => record.to_string(),
            RecordFormat::JsonLines => record.to_json_line()?,
        };
        line.push('\n');
        Ok(line)
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WriteSummary {
    pub records_written: usize,
    /// Records appended per output file name.
    pub files: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct RecordWriter {
    output_dir: PathBuf,
    format: RecordFormat,
}

impl RecordWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: RecordFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, output: &str) -> PathBuf {
        self.output_dir.join(output)
    }

    /// Append one record to the named output file.
    pub async fn append(&self, output: &str, record: &SpotRecord) -> Result<PathBuf> {
        let path = self.path_for(output);
        let line = self.format.render(record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|source| CrawlError::Output {
                path: path.clone(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| CrawlError::Output {
                path: path.clone(),
                source,
            })?;
        file.flush().await.map_err(|source| CrawlError::Output {
            path: path.clone(),
            source,
        })?;

        debug!("Appended {} to {}", record.url().unwrap_or_default(), path.display());
        Ok(path)
    }

    /// Start the writer task. It runs until every sender is dropped, or stops at the first
    /// failed append, which closes the channel under the crawlers.
    pub fn spawn(self, capacity: usize) -> (RecordSender, JoinHandle<Result<WriteSummary>>) {
        let (tx, mut rx) = mpsc::channel::<(PageRef, SpotRecord)>(capacity.max(1));

        let handle = tokio::spawn(async move {
            let mut summary = WriteSummary::default();
            while let Some((page, record)) = rx.recv().await {
                self.append(page.output(), &record).await?;
                summary.records_written += 1;
                *summary.files.entry(page.output().to_string()).or_insert(0) += 1;
            }
            Ok(summary)
        });

        (tx, handle)
    }
}
