use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use spotter_core::countries::{CountryList, crawl_roots, load_or_fetch};
use spotter_core::CrawlError;
use spotter_core::crawl::{CrawlOptions, execute_crawl};
use spotter_core::output::RecordFormat;
use spotter_core::report::{ReportFormat, render_report};
use spotter_scanner::{Crawler, Fetcher, Site};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. `RUST_LOG` wins over the `verbose` default.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

pub fn build_site(base_url: &str) -> anyhow::Result<Site> {
    Site::new(base_url).with_context(|| format!("Invalid base URL '{}'", base_url))
}

pub fn build_crawler(site: Site, timeout_secs: u64) -> anyhow::Result<Crawler> {
    let fetcher = Fetcher::with_timeout(timeout_secs).context("Failed to create HTTP client")?;
    let crawler = Crawler::new(site).context("Failed to set up page extraction")?;
    Ok(crawler.with_fetcher(fetcher))
}

/// Parse a `--country` value into a country path.
///
/// Accepts `Europe/France`, `/Europe/France/`, or a full country page URL on the site.
pub fn parse_country_arg(site: &Site, arg: &str) -> Option<String> {
    let arg = arg.trim();
    let rest = arg.strip_prefix(site.base_url()).unwrap_or(arg);
    let path = site.country_path(rest);

    let path = path.trim_matches('/');
    if path.is_empty() {
        eprintln!("⚠️  Skipping empty country '{}'", arg);
        return None;
    }
    Some(path.to_string())
}

/// Countries to crawl: the single `--country` value, or the country list (fetched and
/// written first when the file is missing).
pub async fn resolve_countries(
    crawler: &Crawler,
    country: Option<&String>,
    country_list: &Path,
) -> anyhow::Result<CountryList> {
    if let Some(country) = country {
        let Some(path) = parse_country_arg(crawler.site(), country) else {
            bail!("--country must name a country path such as \"Europe/France\"");
        };
        return Ok(CountryList {
            countries: vec![path],
            fetched: false,
        });
    }

    let list = load_or_fetch(country_list, crawler, false)
        .await
        .with_context(|| format!("Could not load country list {}", country_list.display()))?;
    if list.countries.is_empty() {
        return Err(CrawlError::NoCountries(country_list.to_path_buf()).into());
    }
    Ok(list)
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> anyhow::Result<()> {
    let country = sub_matches.get_one::<String>("country");
    let country_list = expand_path(
        sub_matches
            .get_one::<String>("country-list")
            .map(String::as_str)
            .unwrap_or(spotter_core::countries::DEFAULT_COUNTRY_LIST),
    );
    let output_dir = expand_path(
        sub_matches
            .get_one::<String>("output-dir")
            .map(String::as_str)
            .unwrap_or("."),
    );
    let base_url = sub_matches
        .get_one::<String>("base-url")
        .map(String::as_str)
        .unwrap_or(spotter_scanner::site::DEFAULT_BASE_URL);
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&1);
    let max_depth = sub_matches.get_one::<usize>("max-depth").copied();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let record_format = sub_matches
        .get_one::<String>("records")
        .and_then(|f| RecordFormat::from_str(f))
        .unwrap_or(RecordFormat::Literal);
    let report_format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);
    let show_progress = !sub_matches.get_flag("no-progress") && !quiet;

    let site = build_site(base_url)?;
    let crawler = build_crawler(site, timeout)?;

    let countries = resolve_countries(&crawler, country, &country_list).await?;
    if countries.fetched && !quiet {
        println!(
            "{} Built country list {} ({} countries)",
            "✓".green().bold(),
            country_list.display().to_string().bright_white(),
            countries.countries.len().to_string().cyan()
        );
    }

    // Print crawl configuration
    if !quiet {
        println!("\n🏄 Crawling {} country(ies)", countries.countries.len());
        println!("Site: {}", crawler.site().base_url());
        println!("Workers: {}", threads);
        match max_depth {
            Some(depth) => println!("Max depth: {}", depth),
            None => println!("Max depth: unlimited"),
        }
        println!("Output: {}\n", output_dir.display());
    }

    let roots = crawl_roots(crawler.site(), &countries.countries);
    debug!("Crawl roots: {:?}", roots);

    let options = CrawlOptions {
        roots,
        threads,
        max_depth,
        output_dir,
        record_format,
        show_progress_bars: show_progress,
    };

    let progress_callback = Arc::new(move |msg: String| {
        if !quiet {
            println!("{} {}", "→".blue(), msg);
        }
    });

    let report = execute_crawl(crawler, options, Some(progress_callback))
        .await
        .context("Crawl failed")?;

    if !quiet {
        println!("\n{} Crawl complete!\n", "✓".green().bold());
    }
    print!("{}", render_report(&report, report_format)?);
    Ok(())
}

pub async fn handle_countries(sub_matches: &ArgMatches) -> anyhow::Result<()> {
    let country_list = expand_path(
        sub_matches
            .get_one::<String>("country-list")
            .map(String::as_str)
            .unwrap_or(spotter_core::countries::DEFAULT_COUNTRY_LIST),
    );
    let base_url = sub_matches
        .get_one::<String>("base-url")
        .map(String::as_str)
        .unwrap_or(spotter_scanner::site::DEFAULT_BASE_URL);
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap_or(&10);
    let refresh = sub_matches.get_flag("refresh");

    let crawler = build_crawler(build_site(base_url)?, timeout)?;
    let list = load_or_fetch(&country_list, &crawler, refresh)
        .await
        .with_context(|| format!("Could not load country list {}", country_list.display()))?;

    for country in &list.countries {
        println!("{}", country);
    }
    eprintln!(
        "{} {} countries {} {}",
        "✓".green().bold(),
        list.countries.len().to_string().cyan(),
        if list.fetched { "written to" } else { "read from" },
        country_list.display().to_string().bright_white()
    );
    Ok(())
}
