// Crawl report rendering

use crate::crawl::{CrawlReport, extract_url_path};
use crate::error::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

pub fn render_report(report: &CrawlReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(generate_crawl_report(report)),
        ReportFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

/// Generate a plain text crawl report
pub fn generate_crawl_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    out.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    out.push_str("# Summary:\n");
    out.push_str(&format!("  Roots crawled: {}\n", report.roots.len()));
    out.push_str(&format!("  Pages fetched: {}\n", report.pages_fetched()));
    out.push_str(&format!("  Listing pages: {}\n", report.listings()));
    out.push_str(&format!("  Spot records: {}\n", report.output.records_written));
    out.push_str(&format!("  Failed fetches: {}\n", report.failures()));
    out.push_str(&format!(
        "  Elapsed: {:.1}s\n",
        report.elapsed().num_milliseconds() as f64 / 1000.0
    ));

    if !report.output.files.is_empty() {
        out.push_str("\n# Output files:\n");
        for (file, count) in &report.output.files {
            out.push_str(&format!("  {} ({} records)\n", file, count));
        }
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    for root in &report.roots {
        out.push_str(&format!("## {}\n", extract_url_path(&root.root)));
        out.push_str(&format!(
            "  {} pages, {} listings, {} spots -> {}\n",
            root.pages_fetched, root.listings, root.spots, root.output
        ));
        if root.skipped_by_depth > 0 {
            out.push_str(&format!(
                "  {} links beyond max depth\n",
                root.skipped_by_depth
            ));
        }

        for failure in &root.failures {
            out.push_str(&format!(
                "  \x1b[31m✗\x1b[0m {} \x1b[90m{}\x1b[0m\n",
                extract_url_path(&failure.url),
                failure.error
            ));
        }
        out.push('\n');
    }

    out
}
