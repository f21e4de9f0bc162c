pub mod countries;
pub mod crawl;
pub mod error;
pub mod output;
pub mod report;

use colored::Colorize;

pub use error::CrawlError;

const BANNER: &str = r#"
  ___ _ __   ___ | |_| |_ ___ _ __
 / __| '_ \ / _ \| __| __/ _ \ '__|
 \__ \ |_) | (_) | |_| ||  __/ |
 |___/ .__/ \___/ \__|\__\___|_|
     |_|
"#;

/// Print the startup banner with the crate version.
pub fn print_banner() {
    println!("{}", BANNER.bright_cyan().bold());
    println!(
        "  {} {}\n",
        "surf spot crawler".bright_white(),
        format!("v{}", env!("CARGO_PKG_VERSION")).bright_black()
    );
}
