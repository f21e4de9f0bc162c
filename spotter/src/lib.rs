pub mod handlers;

// Re-export commonly used handler functions for convenience
pub use handlers::{build_crawler, build_site, expand_path, parse_country_arg, resolve_countries};

// Re-export crawl functionality from spotter-core
pub use spotter_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl};
pub use spotter_core::report::{ReportFormat, generate_crawl_report, render_report};
