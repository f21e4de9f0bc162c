use crate::error::{CrawlError, Result};
use crate::output::{RecordFormat, RecordWriter, WriteSummary};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use spotter_scanner::{CrawlStats, Crawler, PageRef, ScanError};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub roots: Vec<PageRef>,
    /// Crawl roots processed concurrently. Each root is still walked sequentially.
    pub threads: usize,
    /// Link depth below each root after which pages are no longer fetched.
    pub max_depth: Option<usize>,
    pub output_dir: PathBuf,
    pub record_format: RecordFormat,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub roots: Vec<CrawlStats>,
    pub output: WriteSummary,
}

impl CrawlReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn pages_fetched(&self) -> usize {
        self.roots.iter().map(|r| r.pages_fetched).sum()
    }

    pub fn listings(&self) -> usize {
        self.roots.iter().map(|r| r.listings).sum()
    }

    pub fn spots(&self) -> usize {
        self.roots.iter().map(|r| r.spots).sum()
    }

    pub fn failures(&self) -> usize {
        self.roots.iter().map(|r| r.failures.len()).sum()
    }
}

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

/// Crawl every root and append their spot records to the output files.
///
/// Fetch failures are collected in the report. A failed append stops the crawl and is
/// returned as the error.
pub async fn execute_crawl(
    crawler: Crawler,
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
) -> Result<CrawlReport> {
    let CrawlOptions {
        roots,
        threads,
        max_depth,
        output_dir,
        record_format,
        show_progress_bars,
    } = options;

    let started_at = Utc::now();
    tokio::fs::create_dir_all(&output_dir)
        .await
        .map_err(|source| CrawlError::Output {
            path: output_dir.clone(),
            source,
        })?;

    // Set up single progress bar for overall crawl progress (only if enabled)
    let progress_bar = if show_progress_bars {
        let pb = ProgressBar::new_spinner();
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting crawl...");
        Some(pb)
    } else {
        None
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let crawler = match max_depth {
        Some(depth) => crawler.with_max_depth(depth),
        None => crawler,
    };
    // Without a spinner every visited URL goes to the caller's callback instead.
    let crawler = {
        let pb_clone = progress_bar.clone();
        let count_clone = processed_count.clone();
        let callback_clone = progress_callback.clone();
        crawler.with_progress_callback(Arc::new(move |url: String| {
            let count = count_clone.fetch_add(1, Ordering::Relaxed) + 1;
            match (&pb_clone, &callback_clone) {
                (Some(pb), _) => pb.set_message(format!("[{}] {}", count, extract_url_path(&url))),
                (None, Some(callback)) => callback(format!("Visiting {}", extract_url_path(&url))),
                (None, None) => {}
            }
        }))
    };

    let writer = RecordWriter::new(output_dir, record_format);
    let (records, writer_handle) = writer.spawn(64);

    let total = roots.len();
    let results: Vec<std::result::Result<CrawlStats, ScanError>> =
        futures::stream::iter(roots.into_iter().enumerate().map(|(idx, root)| {
            let crawler = &crawler;
            let records = records.clone();
            let progress_callback = progress_callback.clone();
            async move {
                if let Some(ref callback) = progress_callback {
                    callback(format!("Scraping {}/{}: {}", idx + 1, total, root));
                }
                crawler.crawl(root, &records).await
            }
        }))
        .buffered(threads.max(1))
        .collect()
        .await;

    // Dropping the last sender lets the writer drain and finish.
    drop(records);
    drop(crawler);
    let output = writer_handle.await??;

    let mut stats = Vec::with_capacity(results.len());
    for result in results {
        stats.push(result?);
    }

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    let report = CrawlReport {
        started_at,
        finished_at: Utc::now(),
        roots: stats,
        output,
    };
    info!(
        "Crawled {} roots: {} pages, {} records written, {} failures",
        report.roots.len(),
        report.pages_fetched(),
        report.output.records_written,
        report.failures()
    );
    Ok(report)
}
