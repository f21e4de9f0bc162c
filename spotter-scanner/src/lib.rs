pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod listing;
pub mod page;
pub mod site;
pub mod spot;

pub use crawler::{CrawlStats, Crawler, FetchFailure, ProgressCallback, RecordSender};
pub use error::ScanError;
pub use extract::{Extracted, PageExtractor};
pub use fetch::{Fetcher, FetcherConfig};
pub use listing::{ListingRow, ListingTable, SUBLINK_COLUMN};
pub use page::PageRef;
pub use site::Site;
pub use spot::SpotRecord;
