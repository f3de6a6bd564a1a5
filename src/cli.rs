use crate::client::Client;
use crate::config::Config;
use crate::error::SearchError;
use crate::logging::{setup_logging, LogLevel};
use crate::options::{SearchOptions, SearchType};
use crate::query::SearchQuery;
use crate::search::SearchResults;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use comfy_table::Table;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

fn default(path: &Path) -> String {
    format!("[default: {}]", path.as_os_str().to_string_lossy())
}

/// French address search tool
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[arg(short, long = "config", value_name = "FILE", help = default(&Config::default_path()))]
    pub config_path: Option<PathBuf>,

    /// [default: warn]
    #[arg(long, global = true)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Search for an address and print the matches
    Search {
        #[command(flatten)]
        query: QueryArgs,
        /// Print the response body as JSON
        #[arg(short, long)]
        json: bool,
    },
    /// Print the request URL for a search without sending it
    Url {
        #[command(flatten)]
        query: QueryArgs,
    },
    /// Write the current configuration to the config file
    Init,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Text to search for, e.g. "8 bd du port"
    term: String,

    /// Maximum number of results
    #[arg(short, long)]
    limit: Option<u32>,

    /// Complete partial words
    #[arg(short, long, value_name = "BOOL")]
    autocomplete: Option<bool>,

    /// Prefer results near this longitude
    #[arg(long, allow_negative_numbers = true)]
    longitude: Option<f64>,

    /// Prefer results near this latitude
    #[arg(long, allow_negative_numbers = true)]
    latitude: Option<f64>,

    /// Restrict results to one kind of place
    #[arg(short = 't', long = "type", value_enum)]
    search_type: Option<SearchType>,

    #[arg(short, long)]
    postcode: Option<String>,

    /// INSEE code of the city
    #[arg(long)]
    citycode: Option<String>,

    /// Options as a JSON object e.g. '{"limit": 5}' (flags take precedence)
    #[arg(short, long, value_name = "JSON")]
    options: Option<String>,
}

impl QueryArgs {
    /// Config defaults, then `--options`, then individual flags.
    fn to_query(&self, defaults: &SearchOptions) -> Result<SearchQuery> {
        let from_json = match &self.options {
            Some(raw) => {
                let value: Value = serde_json::from_str(raw)?;
                SearchOptions::from_value(&value)?
            }
            None => SearchOptions::default(),
        };
        let flags = SearchOptions {
            limit: self.limit,
            autocomplete: self.autocomplete,
            longitude: self.longitude,
            latitude: self.latitude,
            search_type: self.search_type,
            postcode: self.postcode.clone(),
            citycode: self.citycode.clone(),
        };
        let options = defaults.merge(&from_json).merge(&flags);
        Ok(SearchQuery::new(&self.term, options)?)
    }
}

pub fn cli() -> Result<()> {
    run(Cli::parse())
}

/// Options rejected before any request exit with 2, every other failure with 1.
pub fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<SearchError>() {
        Some(err) if err.is_validation() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}

fn run(args: Cli) -> Result<()> {
    let mut config = match &args.config_path {
        Some(path) => Config::load(path.to_owned())?,
        None => Config::from_default_path()?,
    };
    if let Some(level) = args.log_level {
        config.main.logging.console_level = level;
        config.main.logging.file_level = level;
    }
    let _guard = setup_logging(&config.main.logging)?;
    debug!("Command line arguments: {:#?}", &args);
    debug!("Config: {:#?}", &config);

    match &args.command {
        Commands::Search { query, json } => search(&config, query, *json)?,
        Commands::Url { query } => println!("{}", query.to_query(&config.main.defaults)?.url()),
        Commands::Init => config.write_config_file()?,
    }
    Ok(())
}

fn search(config: &Config, args: &QueryArgs, json: bool) -> Result<()> {
    let query = args.to_query(&config.main.defaults)?;
    let client = Client::with_http(config.http_client());
    let results = client.search_query(&query)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        info!("No search results for {}", query.term);
    } else {
        println!("{}", results_table(&results));
    }
    Ok(())
}

fn results_table(results: &SearchResults) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Label", "Type", "Score", "Longitude", "Latitude"]);
    for result in &results.features {
        let score = result
            .properties
            .score
            .map(|s| format!("{s:.2}"))
            .unwrap_or_default();
        table.add_row(vec![
            result.properties.label.clone(),
            result.properties.r#type.clone(),
            score,
            coordinate(result.longitude()),
            coordinate(result.latitude()),
        ]);
    }
    table
}

fn coordinate(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
