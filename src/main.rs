use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use feed_rs::model::Feed;
use serde_json::json;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worldcat_search::config::{
    find_config_file, get_config, load_config, user_config_path, Config, ConfigFile, LoggingConfig,
};
use worldcat_search::models::{LibraryType, XmlElement};
use worldcat_search::{
    CatalogUrlOptions, CitationOptions, LibraryLocationsOptions, LibraryResult,
    OpenSearchOptions, Record, RecordHelpers, SingleRecordOptions, SruResult, SruSearchOptions,
    Transcript, WorldCatClient,
};

/// WorldCat - Search the WorldCat bibliographic catalog
#[derive(Parser, Debug)]
#[command(name = "worldcat")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search the WorldCat catalog: OpenSearch, SRU, holdings, records and citations", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v debug, -vv trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// API key (overrides WORLDCAT_API_KEY and the config file)
    #[arg(long, global = true)]
    key: Option<String>,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Print the response body exactly as received
    #[arg(long, global = true, default_value_t = false)]
    raw: bool,

    /// Output format for decoded results
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable summary
    Text,
    /// JSON (machine-readable)
    Json,
}

/// Library type filter for holdings lookups
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LibTypeArg {
    Academic,
    Public,
    Government,
    Other,
}

impl From<LibTypeArg> for LibraryType {
    fn from(arg: LibTypeArg) -> Self {
        match arg {
            LibTypeArg::Academic => LibraryType::Academic,
            LibTypeArg::Public => LibraryType::Public,
            LibTypeArg::Government => LibraryType::Government,
            LibTypeArg::Other => LibraryType::Other,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Keyword search (OpenSearch feed)
    #[command(alias = "s")]
    OpenSearch {
        /// Search terms
        query: String,

        /// Feed format: atom or rss
        #[arg(long)]
        format: Option<String>,

        /// Position of the first result (1-based)
        #[arg(long)]
        start: Option<u32>,

        /// Number of results
        #[arg(long, short = 'n')]
        count: Option<u32>,

        /// Citation format to embed in each entry
        #[arg(long)]
        cformat: Option<String>,
    },

    /// Structured search with a CQL query
    Sru {
        /// CQL query, e.g. 'srw.ti = "civil war" and srw.yr = 1990'
        query: String,

        /// Record schema: marc, dublincore or a schema URI
        #[arg(long)]
        schema: Option<String>,

        /// Position of the first record (1-based)
        #[arg(long)]
        start: Option<u32>,

        /// Maximum number of records
        #[arg(long, short = 'n')]
        max: Option<u32>,

        /// Sort keys, e.g. 'Date,,0'
        #[arg(long)]
        sort: Option<String>,
    },

    /// Libraries holding a record
    #[command(alias = "holdings")]
    Libraries {
        /// OCLC number
        #[arg(long, conflicts_with = "isbn", required_unless_present = "isbn")]
        oclc: Option<String>,

        /// ISBN
        #[arg(long)]
        isbn: Option<String>,

        /// Postal code, city or country to sort libraries by distance
        #[arg(long)]
        location: Option<String>,

        /// Restrict to one type of library
        #[arg(long, value_enum)]
        libtype: Option<LibTypeArg>,

        /// Maximum number of libraries
        #[arg(long, short = 'n')]
        max: Option<u32>,

        /// Request the JSON representation
        #[arg(long)]
        json: bool,
    },

    /// Fetch one bibliographic record
    Record {
        /// OCLC number
        #[arg(long, group = "id")]
        oclc: Option<String>,

        /// ISBN
        #[arg(long, group = "id")]
        isbn: Option<String>,

        /// ISSN
        #[arg(long, group = "id")]
        issn: Option<String>,

        /// Other standard number
        #[arg(long, group = "id")]
        sn: Option<String>,
    },

    /// Catalog URLs of specific libraries for a record
    CatalogUrl {
        /// OCLC number
        #[arg(long, conflicts_with = "isbn", required_unless_present = "isbn")]
        oclc: Option<String>,

        /// ISBN
        #[arg(long)]
        isbn: Option<String>,

        /// OCLC library symbols (repeat or comma-separate)
        #[arg(long = "symbol", value_delimiter = ',', required = true)]
        symbols: Vec<String>,

        /// Request the JSON representation
        #[arg(long)]
        json: bool,
    },

    /// Formatted citation for a record
    #[command(alias = "cite")]
    Citation {
        /// OCLC number
        oclc: String,

        /// Citation style: apa, chicago, harvard, mla, turabian or all
        #[arg(long)]
        cformat: Option<String>,
    },

    /// Write a starter worldcat.toml (per-user config directory by default)
    Init {
        /// Where to write the file
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = match &config_path {
        Some(path) => {
            load_config(path).with_context(|| format!("Failed to load {}", path.display()))?
        }
        None => get_config(),
    };

    init_tracing(cli.verbose, &config.logging);
    if let Some(path) = &config_path {
        tracing::info!("Using config file: {}", path.display());
    }

    if let Commands::Init { path, force } = &cli.command {
        return init_config(path.clone(), cli.key.clone(), *force);
    }

    let client = build_client(&cli, &config)?;
    run(&cli, &client).await
}

/// Log filter directive: `-v` flags win over the configured level
fn log_filter(verbose: u8, logging: &LoggingConfig) -> String {
    let level = match verbose {
        0 => logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    format!("worldcat_search={level},worldcat={level}")
}

fn init_tracing(verbose: u8, logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| log_filter(verbose, logging)),
    );
    let registry = tracing_subscriber::registry().with(filter);

    if logging.format.as_deref() == Some("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// Write a starter config file, refusing to replace an existing one unless forced
fn init_config(path: Option<PathBuf>, key: Option<String>, force: bool) -> Result<()> {
    let path = path
        .or_else(user_config_path)
        .context("No config directory on this platform; pass --path")?;
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    ConfigFile::starter(key)
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn build_client(cli: &Cli, config: &Config) -> Result<WorldCatClient> {
    let mut client = WorldCatClient::from_config(config)?;
    if let Some(key) = &cli.key {
        client.set_api_key(key.clone());
    }
    if let Some(timeout) = cli.timeout {
        client = client.with_timeout(Duration::from_secs(timeout));
    }
    if client.api_key().is_none() {
        bail!("No API key: pass --key, set WORLDCAT_API_KEY, or add [api] key to worldcat.toml");
    }
    Ok(client)
}

async fn run(cli: &Cli, client: &WorldCatClient) -> Result<()> {
    match &cli.command {
        Commands::OpenSearch {
            query,
            format,
            start,
            count,
            cformat,
        } => {
            let mut options = OpenSearchOptions::new(query);
            options.format = format.clone();
            options.start = *start;
            options.count = *count;
            options.cformat = cformat.clone();

            let response = client.open_search(&options).await?;
            if !print_raw(cli, &response.transcript) {
                output_feed(&response.value, cli.output);
            }
        }

        Commands::Sru {
            query,
            schema,
            start,
            max,
            sort,
        } => {
            let mut options = SruSearchOptions::new(query);
            options.format = schema.clone();
            options.start_record = *start;
            options.maximum_records = *max;
            options.sort_keys = sort.clone();

            let response = client.sru_search(&options).await?;
            if !print_raw(cli, &response.transcript) {
                output_sru(&response.value, cli.output)?;
            }
        }

        Commands::Libraries {
            oclc,
            isbn,
            location,
            libtype,
            max,
            json,
        } => {
            let options = LibraryLocationsOptions {
                oclc_number: oclc.clone(),
                isbn: isbn.clone(),
                location: location.clone(),
                libtype: libtype.map(LibraryType::from),
                maximum_libraries: *max,
                format: json.then(|| "json".to_string()),
                ..Default::default()
            };

            let response = client.library_locations(&options).await?;
            if !print_raw(cli, &response.transcript) {
                output_libraries(&response.value, cli.output)?;
            }
        }

        Commands::Record {
            oclc,
            isbn,
            issn,
            sn,
        } => {
            let options = SingleRecordOptions {
                oclc_number: oclc.clone(),
                isbn: isbn.clone(),
                issn: issn.clone(),
                sn: sn.clone(),
                ..Default::default()
            };

            let response = client.single_record(&options).await?;
            if !print_raw(cli, &response.transcript) {
                output_records(std::slice::from_ref(&response.value), cli.output)?;
            }
        }

        Commands::CatalogUrl {
            oclc,
            isbn,
            symbols,
            json,
        } => {
            let options = CatalogUrlOptions {
                oclc_number: oclc.clone(),
                isbn: isbn.clone(),
                format: json.then(|| "json".to_string()),
                ..Default::default()
            }
            .symbols(symbols.iter().cloned());

            let response = client.library_catalog_url(&options).await?;
            if !print_raw(cli, &response.transcript) {
                output_libraries(&response.value, cli.output)?;
            }
        }

        Commands::Citation { oclc, cformat } => {
            let mut options = CitationOptions::oclc(oclc);
            options.cformat = cformat.clone();

            let response = client.formatted_citations(&options).await?;
            match cli.output {
                OutputFormat::Json if !cli.raw => {
                    println!("{}", json!({ "citation": response.value }))
                }
                _ => println!("{}", response.value.trim_end()),
            }
        }

        Commands::Init { path, force } => init_config(path.clone(), cli.key.clone(), *force)?,
    }

    Ok(())
}

/// Print the raw body when `--raw` was given
fn print_raw(cli: &Cli, transcript: &Transcript) -> bool {
    if cli.raw {
        println!("{}", transcript.body);
    }
    cli.raw
}

fn output_feed(feed: &Feed, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = feed
                .entries
                .iter()
                .map(|entry| {
                    json!({
                        "id": entry.id,
                        "title": entry.title.as_ref().map(|t| t.content.clone()),
                        "authors": entry.authors.iter().map(|a| a.name.clone()).collect::<Vec<_>>(),
                        "link": entry.links.first().map(|l| l.href.clone()),
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "title": feed.title.as_ref().map(|t| t.content.clone()),
                    "entries": entries,
                }))
                .unwrap_or_default()
            );
        }
        OutputFormat::Text => {
            if feed.entries.is_empty() {
                println!("No results found.");
                return;
            }
            for (i, entry) in feed.entries.iter().enumerate() {
                let title = entry
                    .title
                    .as_ref()
                    .map(|t| t.content.as_str())
                    .unwrap_or("(untitled)");
                println!("{}. {}", i + 1, title);
                if let Some(author) = entry.authors.first() {
                    println!("   {}", author.name);
                }
                if let Some(link) = entry.links.first() {
                    println!("   {}", link.href);
                }
            }
        }
    }
}

fn output_sru(result: &SruResult, format: OutputFormat) -> Result<()> {
    match result {
        SruResult::Records(records) => output_records(records, format),
        SruResult::Document(doc) => match format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(doc)?);
                Ok(())
            }
            OutputFormat::Text => {
                print_element(&doc.root, 0);
                Ok(())
            }
        },
    }
}

fn output_records(records: &[Record], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(records)?),
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No records found.");
            }
            for record in records {
                println!(
                    "{}  {}",
                    record.control_number().unwrap_or("-"),
                    record.title().unwrap_or("(untitled)")
                );
                if let Some(author) = record.author() {
                    println!("   {}", author);
                }
                let isbns = record.isbns();
                if !isbns.is_empty() {
                    println!("   ISBN {}", isbns.join(", "));
                }
            }
        }
    }
    Ok(())
}

fn output_libraries(result: &LibraryResult, format: OutputFormat) -> Result<()> {
    match (result, format) {
        (LibraryResult::Json(map), _) => println!("{}", serde_json::to_string_pretty(map)?),
        (LibraryResult::Xml(doc), OutputFormat::Json) => {
            println!("{}", serde_json::to_string_pretty(doc)?)
        }
        (LibraryResult::Xml(doc), OutputFormat::Text) => {
            let holdings = doc.root.find_all("holding");
            if holdings.is_empty() {
                print_element(&doc.root, 0);
            }
            for holding in holdings {
                let name = holding
                    .find("physicalLocation")
                    .map(|e| e.trimmed_text())
                    .filter(|t| !t.is_empty())
                    .unwrap_or("(unknown library)");
                println!("{}", name);
                if let Some(url) = holding
                    .find("electronicAddress")
                    .and_then(|e| e.child_text("text"))
                {
                    println!("   {}", url);
                }
            }
        }
    }
    Ok(())
}

fn print_element(element: &XmlElement, depth: usize) {
    let indent = "  ".repeat(depth);
    let text = element.trimmed_text();
    if element.children.is_empty() && !text.is_empty() {
        println!("{}{}: {}", indent, element.name, text);
    } else {
        println!("{}{}", indent, element.name);
    }
    for child in &element.children {
        print_element(child, depth + 1);
    }
}
