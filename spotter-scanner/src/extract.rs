//! Page classification and extraction.
//!
//! A page holding the listing table is a listing page; anything else is treated as a spot
//! page. Extraction is pure: spot records are handed back to the caller, never written here.

use crate::error::{Result, ScanError};
use crate::listing::{ListingRow, ListingTable, SUBLINK_COLUMN};
use crate::page::PageRef;
use crate::site::Site;
use crate::spot::{MISSING_VALUE, SpotRecord};
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extracted {
    Spot(SpotRecord),
    /// Already cleaned.
    Listing(ListingTable),
}

pub struct PageExtractor {
    site: Site,
    listing_table: Selector,
    thead: Selector,
    header_cell: Selector,
    tbody: Selector,
    row: Selector,
    cell: Selector,
    anchor: Selector,
    gps_label: Selector,
    label: Selector,
    country_link: Selector,
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::SelectorError(format!("{}: {}", css, e)))
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

impl PageExtractor {
    pub fn new(site: Site) -> Result<Self> {
        Ok(Self {
            listing_table: selector(&format!("table[id=\"{}\"]", site.listing_table_id))?,
            thead: selector("thead")?,
            header_cell: selector("th")?,
            tbody: selector("tbody")?,
            row: selector("tr")?,
            cell: selector("td")?,
            anchor: selector("a")?,
            gps_label: selector(&format!("span.{}", site.gps_label_class))?,
            label: selector(&format!("span.{}", site.label_class))?,
            country_link: selector(&site.country_link_selector)?,
            site,
        })
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    /// Classify a fetched page and extract it.
    pub fn extract(&self, html: &str, page: &PageRef) -> Extracted {
        let document = Html::parse_document(html);

        match document.select(&self.listing_table).next() {
            Some(table) => {
                let listing = self.extract_listing(table);
                debug!("Listing at {}:\n{}", page.url(), listing);
                Extracted::Listing(listing)
            }
            None => Extracted::Spot(self.extract_spot(&document, page)),
        }
    }

    /// Label/value pairs of a spot page. GPS labels come first, then the general ones.
    pub fn extract_spot(&self, document: &Html, page: &PageRef) -> SpotRecord {
        let mut record = SpotRecord::new(self.site.record_path(page.url()));

        let labels = document
            .select(&self.gps_label)
            .chain(document.select(&self.label));

        for label in labels {
            let key = element_text(label);
            let value = label
                .next_siblings()
                .find_map(ElementRef::wrap)
                .map(element_text)
                .unwrap_or_else(|| MISSING_VALUE.to_string());
            record.insert(key, value);
        }

        record
    }

    /// Header texts, rows and first-cell links of a listing table, cleaned.
    pub fn extract_listing(&self, table: ElementRef<'_>) -> ListingTable {
        let mut headers: Vec<String> = table
            .select(&self.thead)
            .next()
            .map(|thead| thead.select(&self.header_cell).map(element_text).collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        if let Some(tbody) = table.select(&self.tbody).next() {
            for tr in tbody.select(&self.row) {
                let cells: Vec<String> = tr.select(&self.cell).map(element_text).collect();
                let link = tr
                    .select(&self.cell)
                    .next()
                    .and_then(|first| first.select(&self.anchor).next())
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string);

                if link.is_some() && !headers.iter().any(|h| h == SUBLINK_COLUMN) {
                    headers.push(SUBLINK_COLUMN.to_string());
                }
                rows.push(ListingRow::new(cells, link));
            }
        }

        ListingTable::from_rows(headers, rows).clean()
    }

    /// Country paths linked from the top-level index page, prefix and suffix stripped.
    pub fn country_paths(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        document
            .select(&self.country_link)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| self.site.country_path(href))
            .collect()
    }
}
