use crate::error::{Result, ScanError};
use crate::extract::{Extracted, PageExtractor};
use crate::fetch::{Fetcher, FetcherConfig};
use crate::page::PageRef;
use crate::site::Site;
use crate::spot::SpotRecord;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub type ProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Spot records leave the crawler through this channel, tagged with their page.
pub type RecordSender = mpsc::Sender<(PageRef, SpotRecord)>;

#[derive(Debug, Clone, Serialize)]
pub struct FetchFailure {
    pub url: String,
    pub error: String,
}

/// Counters for one crawl root.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CrawlStats {
    pub root: String,
    pub output: String,
    pub pages_fetched: usize,
    pub listings: usize,
    pub spots: usize,
    pub skipped_by_depth: usize,
    pub failures: Vec<FetchFailure>,
}

impl CrawlStats {
    fn new(root: &PageRef) -> Self {
        Self {
            root: root.url().to_string(),
            output: root.output().to_string(),
            ..Self::default()
        }
    }
}

pub struct Crawler {
    fetcher: Fetcher,
    extractor: PageExtractor,
    max_depth: Option<usize>,
    progress_callback: Option<ProgressCallback>,
}

impl Crawler {
    pub fn new(site: Site) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(&FetcherConfig::default())?,
            extractor: PageExtractor::new(site)?,
            max_depth: None,
            progress_callback: None,
        })
    }

    pub fn with_fetcher(mut self, fetcher: Fetcher) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Pages deeper than `depth` links below the root are not fetched.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn site(&self) -> &Site {
        self.extractor.site()
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    pub fn extractor(&self) -> &PageExtractor {
        &self.extractor
    }

    /// Fetch one page and run it through classification and extraction.
    pub async fn fetch_page(&self, page: &PageRef) -> Result<Extracted> {
        let html = self.fetcher.fetch(page.url()).await?;
        Ok(self.extractor.extract(&html, page))
    }

    /// Walk everything reachable from `root`, depth-first, in listing row order.
    ///
    /// Spot records are sent on `records` in pre-order. A failed fetch only ends its own
    /// branch; a closed record channel ends the whole crawl.
    pub async fn crawl(&self, root: PageRef, records: &RecordSender) -> Result<CrawlStats> {
        info!("Starting crawl of {}", root);

        let mut stats = CrawlStats::new(&root);
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<(PageRef, usize)> = vec![(root, 0)];

        while let Some((page, depth)) = frontier.pop() {
            if !visited.insert(page.url().to_string()) {
                debug!("Already visited {}", page.url());
                continue;
            }

            debug!("Visiting {} (depth {})", page.url(), depth);
            if let Some(ref callback) = self.progress_callback {
                callback(page.url().to_string());
            }

            let extracted = match self.fetch_page(&page).await {
                Ok(extracted) => extracted,
                Err(e) if e.is_branch_local() => {
                    warn!("Crawl error for {}: {}", page.url(), e);
                    stats.failures.push(FetchFailure {
                        url: page.url().to_string(),
                        error: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            stats.pages_fetched += 1;

            match extracted {
                Extracted::Spot(record) => {
                    stats.spots += 1;
                    let url = page.url().to_string();
                    records
                        .send((page, record))
                        .await
                        .map_err(|_| ScanError::RecordChannelClosed(url))?;
                }
                Extracted::Listing(table) => {
                    stats.listings += 1;
                    if !table.has_sublinks() {
                        continue;
                    }

                    let child_depth = depth + 1;
                    if self.max_depth.is_some_and(|max| child_depth > max) {
                        stats.skipped_by_depth += table.sublinks().len();
                        continue;
                    }

                    let mut children = Vec::new();
                    for href in table.sublinks() {
                        match self.site().resolve(href) {
                            Ok(url) => children.push((page.child(url), child_depth)),
                            Err(e) => {
                                warn!("Skipping sublink {} on {}: {}", href, page.url(), e);
                                stats.failures.push(FetchFailure {
                                    url: href.to_string(),
                                    error: e.to_string(),
                                });
                            }
                        }
                    }
                    // Reversed so the first row is popped first.
                    frontier.extend(children.into_iter().rev());
                }
            }
        }

        info!(
            "Crawl of {} complete. {} pages, {} spots, {} failures",
            stats.root,
            stats.pages_fetched,
            stats.spots,
            stats.failures.len()
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn listing(links: &[(&str, &str)]) -> String {
        let mut html = String::from(
            r#"<html><body><table id="wanna-table"><thead><tr><th>Name</th></tr></thead><tbody>"#,
        );
        for (name, href) in links {
            html.push_str(&format!(
                r#"<tr><td><a href="{}">{}</a></td></tr>"#,
                href, name
            ));
        }
        html.push_str("</tbody></table></body></html>");
        html
    }

    fn spot(kind: &str) -> String {
        format!(
            r#"<html><body><span class="wanna-item-label">Break Type</span><span>{}</span></body></html>"#,
            kind
        )
    }

    async fn mount(server: &MockServer, route: &str, status: u16, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(status)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    /// Indonesia -> [Bali -> [leftpoint, uluwatu], Java -> [missing, gland], nusa]
    async fn indonesia(server: &MockServer) {
        mount(
            server,
            "/spot/Asia/Indonesia/index.html",
            200,
            listing(&[
                ("Bali", "/spot/Asia/Indonesia/Bali/index.html"),
                ("Java", "/spot/Asia/Indonesia/Java/index.html"),
                ("Nusa", "/spot/Asia/Indonesia/nusa/index.html"),
            ]),
        )
        .await;
        mount(
            server,
            "/spot/Asia/Indonesia/Bali/index.html",
            200,
            listing(&[
                ("Left Point", "/spot/Asia/Indonesia/Bali/leftpoint/index.html"),
                ("Uluwatu", "/spot/Asia/Indonesia/Bali/uluwatu/index.html"),
            ]),
        )
        .await;
        mount(
            server,
            "/spot/Asia/Indonesia/Java/index.html",
            200,
            listing(&[
                ("Gone", "/spot/Asia/Indonesia/Java/gone/index.html"),
                ("G-Land", "/spot/Asia/Indonesia/Java/gland/index.html"),
            ]),
        )
        .await;
        mount(server, "/spot/Asia/Indonesia/Bali/leftpoint/index.html", 200, spot("Reef")).await;
        mount(server, "/spot/Asia/Indonesia/Bali/uluwatu/index.html", 200, spot("Reef-coral")).await;
        mount(server, "/spot/Asia/Indonesia/Java/gone/index.html", 404, String::new()).await;
        mount(server, "/spot/Asia/Indonesia/Java/gland/index.html", 200, spot("Reef-rocky")).await;
        mount(server, "/spot/Asia/Indonesia/nusa/index.html", 200, spot("Point")).await;
    }

    fn crawler(server: &MockServer) -> Crawler {
        Crawler::new(Site::new(&server.uri()).unwrap()).unwrap()
    }

    async fn collect(crawler: &Crawler, root: PageRef) -> (CrawlStats, Vec<(PageRef, SpotRecord)>) {
        let (tx, mut rx) = mpsc::channel(64);
        let stats = crawler.crawl(root, &tx).await.unwrap();
        drop(tx);

        let mut records = Vec::new();
        while let Some(item) = rx.recv().await {
            records.push(item);
        }
        (stats, records)
    }

    #[tokio::test]
    async fn test_depth_first_preorder() {
        let server = MockServer::start().await;
        indonesia(&server).await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Asia/Indonesia");
        let (stats, records) = collect(&crawler, root).await;

        let paths: Vec<&str> = records.iter().filter_map(|(_, r)| r.url()).collect();
        assert_eq!(
            paths,
            vec![
                "Asia/Indonesia/Bali/leftpoint",
                "Asia/Indonesia/Bali/uluwatu",
                "Asia/Indonesia/Java/gland",
                "Asia/Indonesia/nusa",
            ]
        );
        assert!(records.iter().all(|(page, _)| page.output() == "Asia.txt"));
        assert_eq!(records[0].1.get("Break Type"), Some("Reef"));

        assert_eq!(stats.spots, 4);
        assert_eq!(stats.listings, 3);
        assert_eq!(stats.pages_fetched, 7);
        assert_eq!(stats.failures.len(), 1);
        assert!(stats.failures[0].url.ends_with("/Java/gone/index.html"));
    }

    #[tokio::test]
    async fn test_root_is_spot_page() {
        let server = MockServer::start().await;
        mount(&server, "/spot/Oceania/Tonga/index.html", 200, spot("Reef")).await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Oceania/Tonga");
        let (stats, records) = collect(&crawler, root).await;

        assert_eq!(stats.spots, 1);
        assert_eq!(records[0].1.url(), Some("Oceania/Tonga"));
    }

    #[tokio::test]
    async fn test_root_fetch_failure_is_not_fatal() {
        let server = MockServer::start().await;
        mount(&server, "/spot/Europe/Nowhere/index.html", 500, String::new()).await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Europe/Nowhere");
        let (stats, records) = collect(&crawler, root).await;

        assert!(records.is_empty());
        assert_eq!(stats.pages_fetched, 0);
        assert_eq!(stats.failures.len(), 1);
    }

    #[tokio::test]
    async fn test_cycles_are_visited_once() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/spot/Europe/Loop/index.html",
            200,
            listing(&[
                ("Self", "/spot/Europe/Loop/index.html"),
                ("Spot", "/spot/Europe/Loop/a/index.html"),
            ]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/spot/Europe/Loop/a/index.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string(spot("Beach")))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Europe/Loop");
        let (stats, records) = collect(&crawler, root).await;

        assert_eq!(records.len(), 1);
        assert_eq!(stats.pages_fetched, 2);
    }

    #[tokio::test]
    async fn test_max_depth() {
        let server = MockServer::start().await;
        indonesia(&server).await;

        let crawler = crawler(&server).with_max_depth(1);
        let root = crawler.site().country_root("Asia/Indonesia");
        let (stats, records) = collect(&crawler, root).await;

        let paths: Vec<&str> = records.iter().filter_map(|(_, r)| r.url()).collect();
        assert_eq!(paths, vec!["Asia/Indonesia/nusa"]);
        assert_eq!(stats.skipped_by_depth, 4);
    }

    #[tokio::test]
    async fn test_listing_without_sublinks_ends_branch() {
        let server = MockServer::start().await;
        mount(
            &server,
            "/spot/Africa/Empty/index.html",
            200,
            r#"<table id="wanna-table"><thead><tr><th>Name</th></tr></thead>
               <tbody><tr><td>Nothing here</td></tr></tbody></table>"#
                .to_string(),
        )
        .await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Africa/Empty");
        let (stats, records) = collect(&crawler, root).await;

        assert!(records.is_empty());
        assert_eq!(stats.listings, 1);
        assert_eq!(stats.pages_fetched, 1);
    }

    #[tokio::test]
    async fn test_progress_reported_per_url() {
        let server = MockServer::start().await;
        indonesia(&server).await;

        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let crawler = crawler(&server).with_progress_callback(Arc::new(move |url| {
            seen_clone.lock().unwrap().push(url);
        }));
        let root = crawler.site().country_root("Asia/Indonesia");
        collect(&crawler, root).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 8);
        assert!(seen[0].ends_with("/spot/Asia/Indonesia/index.html"));
        assert!(seen[1].ends_with("/spot/Asia/Indonesia/Bali/index.html"));
    }

    #[tokio::test]
    async fn test_closed_channel_aborts() {
        let server = MockServer::start().await;
        mount(&server, "/spot/Oceania/Tonga/index.html", 200, spot("Reef")).await;

        let crawler = crawler(&server);
        let root = crawler.site().country_root("Oceania/Tonga");
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let err = crawler.crawl(root, &tx).await.unwrap_err();
        assert!(matches!(err, ScanError::RecordChannelClosed(_)));
    }
}
