use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Parser};
use quiver_client::{Client, Config};
use quiver_core::SortSpec;
use std::path::PathBuf;
use twyg::{LogLevel, OptsBuilder};

mod commands;

#[derive(Debug, Parser)]
#[command(name = "quiver", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Service URL (overrides QUIVER_SERVICE_URL and the config file)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Debug, clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Check the connection and show server information
    ///
    /// Reports readiness, the server version and the enabled modules, and
    /// whether the configured vectorizer module is among them.
    Meta,
    /// Create, list and delete collections
    Schema {
        #[command(subcommand)]
        command: SchemaCommand,
    },
    /// Import, count and list records
    Objects {
        #[command(subcommand)]
        command: ObjectsCommand,
    },
    /// Retrieve records by filter, sort order and limit
    ///
    /// Filters are JSON expression trees, for example:
    ///
    ///   {"and": [{"condition": {"path": "year", "operator": "GreaterThan", "value": 2000}},
    ///            {"condition": {"path": "genre", "operator": "Equal", "value": "Sci-Fi"}}]}
    Query {
        /// Collection name
        collection: String,
        /// Filter expression as JSON
        #[arg(long)]
        filter: Option<String>,
        /// Sort key as property[:asc|desc]; repeat for secondary keys
        #[arg(long = "sort")]
        sort: Vec<SortSpec>,
        /// Maximum number of records
        #[arg(long)]
        limit: Option<usize>,
        /// Properties to return (comma-separated; default all)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,
    },
    /// Find records similar to concepts or a vector
    Search {
        /// Collection name
        collection: String,
        /// Concept text; repeat for several concepts
        #[arg(long = "concept", required_unless_present = "vector")]
        concepts: Vec<String>,
        /// Reference vector as a JSON array
        #[arg(long, conflicts_with = "concepts")]
        vector: Option<String>,
        /// Drop results farther than this distance
        #[arg(long)]
        max_distance: Option<f32>,
        /// Maximum number of records
        #[arg(long)]
        limit: Option<usize>,
        /// Filter expression as JSON, for hybrid search
        #[arg(long)]
        filter: Option<String>,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration
    Show,
    /// Print the config file path
    Path,
    /// Print an example config file
    Example,
    /// Create the config file with defaults
    Init,
    /// Set a value in the config file
    Set {
        /// Setting name, e.g. service_url
        key: String,
        /// New value
        value: String,
    },
}

#[derive(Debug, clap::Subcommand)]
enum SchemaCommand {
    /// List collections and their properties
    List,
    /// Create a collection from a class JSON file
    ///
    /// When the file has no "vectorizer" key, the configured vectorizer
    /// module, model and endpoint are used.
    Create {
        /// Path to the collection definition
        file: PathBuf,
    },
    /// Delete a collection and all of its records
    Delete {
        /// Collection name
        name: String,
        /// Succeed when the collection does not exist
        #[arg(long)]
        missing_ok: bool,
    },
}

#[derive(Debug, clap::Subcommand)]
enum ObjectsCommand {
    /// Count the records of a collection
    Count {
        /// Collection name
        collection: String,
    },
    /// List records of a collection
    List {
        /// Collection name
        collection: String,
        /// Maximum number of records
        #[arg(long, default_value_t = 10)]
        limit: usize,
        /// Include each record's vector
        #[arg(long)]
        vector: bool,
    },
    /// Import records from a JSON array of property objects
    Import {
        /// Collection name
        collection: String,
        /// Path to the records file
        file: PathBuf,
    },
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LogLevel::Warn,
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };
    let opts = OptsBuilder::new()
        .coloured(true)
        .level(level)
        .build()
        .map_err(|e| anyhow!("Failed to configure logging: {e}"))?;
    twyg::setup(opts).map_err(|e| anyhow!("Failed to set up logging: {e}"))?;
    Ok(())
}

fn load_config(url: Option<String>) -> Result<Config> {
    let config = Config::load().context("Failed to load configuration")?;
    Ok(match url {
        Some(url) => config.with_service_url(url),
        None => config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;
    run(cli).await
}

/// Dispatch a parsed command line. Configuration is loaded only by the
/// commands that use it, so `config set` and friends can repair a broken file.
async fn run(cli: Cli) -> Result<()> {
    let load = || load_config(cli.url.clone());

    match cli.command {
        Commands::Config { command } => match command {
            ConfigCommand::Show => commands::config::show_config(&load()?)?,
            ConfigCommand::Path => commands::config::show_path()?,
            ConfigCommand::Example => commands::config::show_example()?,
            ConfigCommand::Init => commands::config::init_config()?,
            ConfigCommand::Set { key, value } => commands::config::set_config(&key, &value)?,
        },
        Commands::Meta => {
            let config = load()?;
            let client = connect(&config)?;
            commands::meta::show_meta(&client, &config).await?;
        }
        Commands::Schema { command } => {
            let config = load()?;
            let client = connect(&config)?;
            match command {
                SchemaCommand::List => commands::schema::list(&client).await?,
                SchemaCommand::Create { file } => {
                    commands::schema::create(&client, &config, &file).await?;
                }
                SchemaCommand::Delete { name, missing_ok } => {
                    commands::schema::delete(&client, &name, missing_ok).await?;
                }
            }
        }
        Commands::Objects { command } => {
            let config = load()?;
            let client = connect(&config)?;
            match command {
                ObjectsCommand::Count { collection } => {
                    commands::objects::count(&client, &collection).await?;
                }
                ObjectsCommand::List {
                    collection,
                    limit,
                    vector,
                } => commands::objects::list(&client, &collection, limit, vector).await?,
                ObjectsCommand::Import { collection, file } => {
                    commands::objects::import(&client, &collection, &file).await?;
                }
            }
        }
        Commands::Query {
            collection,
            filter,
            sort,
            limit,
            select,
        } => {
            let config = load()?;
            let client = connect(&config)?;
            let args = commands::query::GetArgs {
                collection,
                filter,
                sort,
                limit,
                select,
            };
            commands::query::run_get(&client, args).await?;
        }
        Commands::Search {
            collection,
            concepts,
            vector,
            max_distance,
            limit,
            filter,
        } => {
            let config = load()?;
            let client = connect(&config)?;
            let args = commands::query::SearchArgs {
                collection,
                concepts,
                vector,
                max_distance,
                limit,
                filter,
            };
            commands::query::run_search(&client, args).await?;
        }
    }

    Ok(())
}

fn connect(config: &Config) -> Result<Client> {
    Client::new(config)
        .with_context(|| format!("Invalid connection settings for {}", config.service_url))
}
