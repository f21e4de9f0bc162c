//! The country list: one country path per line, e.g. `Europe/France`.
//!
//! When the list file is missing it is rebuilt from the site's top-level index page before
//! any crawling starts.

use crate::error::{CrawlError, Result};
use spotter_scanner::{Crawler, PageRef, Site};
use std::fs;
use std::path::Path;
use tracing::info;

pub const DEFAULT_COUNTRY_LIST: &str = "countryList.txt";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryList {
    pub countries: Vec<String>,
    /// True when the list was fetched from the site during this call.
    pub fetched: bool,
}

/// Parse a country list, one trimmed path per line. Blank lines are skipped.
pub fn parse_country_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn read_country_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| CrawlError::CountryList {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_country_list(&content))
}

pub fn write_country_list(path: &Path, countries: &[String]) -> Result<()> {
    let mut content = countries.join("\n");
    if !content.is_empty() {
        content.push('\n');
    }
    fs::write(path, content).map_err(|source| CrawlError::CountryList {
        path: path.to_path_buf(),
        source,
    })
}

/// Country paths linked from the site index.
pub async fn fetch_country_list(crawler: &Crawler) -> Result<Vec<String>> {
    let index_url = crawler.site().index_url();
    info!("Fetching country index {}", index_url);

    let html = crawler.fetcher().fetch(&index_url).await?;
    Ok(crawler.extractor().country_paths(&html))
}

/// Read the list at `path`, or fetch it from the site and write it there first when the
/// file does not exist (or `refresh` is set). A failed fetch leaves no file behind.
pub async fn load_or_fetch(path: &Path, crawler: &Crawler, refresh: bool) -> Result<CountryList> {
    if path.exists() && !refresh {
        return Ok(CountryList {
            countries: read_country_list(path)?,
            fetched: false,
        });
    }

    info!("Country list {} not found, building it from the site", path.display());
    let countries = fetch_country_list(crawler).await?;
    write_country_list(path, &countries)?;
    info!("Wrote {} countries to {}", countries.len(), path.display());

    Ok(CountryList {
        countries,
        fetched: true,
    })
}

/// One crawl root per country.
pub fn crawl_roots(site: &Site, countries: &[String]) -> Vec<PageRef> {
    countries.iter().map(|c| site.country_root(c)).collect()
}
