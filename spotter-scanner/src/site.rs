//! Layout of the crawled site: where pages live and which markup identifies them.

use crate::error::{Result, ScanError};
use crate::page::PageRef;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://www.wannasurf.com";

#[derive(Debug, Clone)]
pub struct Site {
    base_url: String,
    /// Path segment every spot and listing page lives under.
    pub spot_prefix: String,
    pub index_suffix: String,
    /// `id` of the table that marks a listing page.
    pub listing_table_id: String,
    pub gps_label_class: String,
    pub label_class: String,
    /// Anchors on the top-level index that point at countries with spots.
    pub country_link_selector: String,
}

impl Site {
    pub fn new(base_url: &str) -> Result<Self> {
        let parsed = Url::parse(base_url)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if parsed.cannot_be_a_base() {
            return Err(ScanError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }

        Ok(Self::with_base(base_url.trim_end_matches('/').to_string()))
    }

    fn with_base(base_url: String) -> Self {
        Self {
            base_url,
            spot_prefix: "/spot/".to_string(),
            index_suffix: "/index.html".to_string(),
            listing_table_id: "wanna-table".to_string(),
            gps_label_class: "wanna-item-label-gps".to_string(),
            label_class: "wanna-item-label".to_string(),
            country_link_selector: r#"a[class="wanna-sublink countryWithSpot"][href]"#.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Top-level page listing every country.
    pub fn index_url(&self) -> String {
        format!("{}{}index.html", self.base_url, self.spot_prefix)
    }

    pub fn country_url(&self, country: &str) -> String {
        format!(
            "{}{}{}{}",
            self.base_url, self.spot_prefix, country, self.index_suffix
        )
    }

    /// Output file for a country path: its first segment plus `.txt`.
    pub fn output_file_for(country: &str) -> String {
        let region = country.split('/').next().unwrap_or_default();
        format!("{}.txt", region)
    }

    pub fn country_root(&self, country: &str) -> PageRef {
        PageRef::new(self.country_url(country), Self::output_file_for(country))
    }

    /// Absolute URL for a link found on a listing page.
    ///
    /// Root-relative paths are appended to the base verbatim so the URL text matches what
    /// the site printed; anything else goes through normal URL resolution.
    pub fn resolve(&self, href: &str) -> Result<String> {
        if href.starts_with('/') && !href.starts_with("//") {
            return Ok(format!("{}{}", self.base_url, href));
        }

        let base = Url::parse(&format!("{}/", self.base_url))
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        base.join(href)
            .map(|u| u.to_string())
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", href, e)))
    }

    /// Crawl-relative path stored in a spot record's `url` field.
    pub fn record_path(&self, url: &str) -> String {
        url.replace(&self.index_suffix, "")
            .replace(&format!("{}{}", self.base_url, self.spot_prefix), "")
    }

    /// Country path as written to the country list, from an index page href.
    pub fn country_path(&self, href: &str) -> String {
        href.replace(&self.spot_prefix, "")
            .replace(&self.index_suffix, "")
    }
}

impl Default for Site {
    fn default() -> Self {
        Self::with_base(DEFAULT_BASE_URL.to_string())
    }
}
