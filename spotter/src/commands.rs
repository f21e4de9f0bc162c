use crate::CLAP_STYLING;
use clap::{arg, command};
use spotter_core::countries::DEFAULT_COUNTRY_LIST;
use spotter_scanner::site::DEFAULT_BASE_URL;

fn base_url_arg() -> clap::Arg {
    arg!(--"base-url" <URL>)
        .required(false)
        .help("Root of the site to crawl")
        .env("SPOTTER_BASE_URL")
        .default_value(DEFAULT_BASE_URL)
}

fn country_list_arg() -> clap::Arg {
    arg!(-l --"country-list" <PATH>)
        .required(false)
        .help("Country list file, one country path per line. Built from the site if missing.")
        .default_value(DEFAULT_COUNTRY_LIST)
}

fn timeout_arg() -> clap::Arg {
    arg!(--"timeout" <SECONDS>)
        .required(false)
        .help("Request timeout in seconds")
        .value_parser(clap::value_parser!(u64))
        .default_value("10")
}

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("spotter")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("spotter")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(-v --"verbose" "Log every fetched page and listing table")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl one country, or every country in the country list, appending each \
                spot to <output-dir>/<Region>.txt",
                )
                .arg(
                    arg!(-c --"country" <PATH>)
                        .required(false)
                        .help("Single country path to crawl instead of the whole list (e.g. \"Europe/France\")"),
                )
                .arg(country_list_arg())
                .arg(
                    arg!(-o --"output-dir" <PATH>)
                        .required(false)
                        .help("Directory the per-region output files are appended to")
                        .default_value("."),
                )
                .arg(base_url_arg())
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("Countries crawled concurrently. Each country is still walked in order.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("1"),
                )
                .arg(
                    arg!(-d --"max-depth" <DEPTH>)
                        .required(false)
                        .help("Stop following links this many levels below each country page")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(timeout_arg())
                .arg(
                    arg!(-r --"records" <FORMAT>)
                        .required(false)
                        .help("Record line format: literal, jsonl")
                        .value_parser(["literal", "jsonl"])
                        .default_value("literal"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(--"no-progress")
                        .required(false)
                        .help("Disable the progress spinner")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
        .subcommand(
            command!("countries")
                .about("Print the country list, building it from the site index if it is missing")
                .arg(country_list_arg())
                .arg(base_url_arg())
                .arg(timeout_arg())
                .arg(
                    arg!(--"refresh")
                        .required(false)
                        .help("Rebuild the list from the site even if the file exists")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
