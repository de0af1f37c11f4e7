use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use nd_core::config::{NewsConfig, StorageKind};
use nd_core::logging::init_logging;
use nd_core::{Logger, NewsStorage, Summarizer, SummaryInput};
use nd_ingest::{handle_command, IngestCommands, IngestContext};
use nd_summary::SummaryGenerator;
use nd_web::AppState;
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_seconds = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;

        for c in s.trim().chars() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if c.is_whitespace() {
                continue;
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit = match c {
                    's' => 1,
                    'm' => 60,
                    'h' => 3600,
                    'd' => 86400,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_seconds = num
                    .checked_mul(unit)
                    .and_then(|secs| total_seconds.checked_add(secs))
                    .ok_or_else(|| format!("Duration too large: {}", s))?;
                current_number.clear();
                has_unit = true;
            } else {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            let num = current_number
                .parse::<u64>()
                .map_err(|_| "Invalid number in duration".to_string())?;
            total_seconds += num;
            has_unit = true;
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }
        if total_seconds == 0 {
            return Err("Duration must be longer than zero".to_string());
        }

        Ok(HumanDuration(Duration::from_secs(total_seconds)))
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "News aggregation backend with extended summaries", long_about = None)]
struct Cli {
    /// Configuration file; ./newsdesk.toml is used when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Storage backend (memory, sqlite); overrides the configuration
    #[arg(long, global = true)]
    storage: Option<StorageKind>,
    /// SQLite database file; overrides the configuration
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on, e.g. 0.0.0.0:8000
        #[arg(long)]
        bind: Option<SocketAddr>,
    },
    /// Fetch news and maintain stored articles
    Ingest {
        #[command(subcommand)]
        command: IngestCommands,
        /// Repeat `fetch` periodically (e.g. 1h, 30m, 1d, 1h15m30s)
        #[arg(long, global = true)]
        interval: Option<HumanDuration>,
    },
    /// Print the extended summary for a piece of text
    Summarize {
        #[arg(long)]
        description: String,
        #[arg(long, default_value = "")]
        content: String,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<NewsConfig> {
    let mut config = NewsConfig::load_with_dotenv(cli.config.as_deref())
        .context("failed to load configuration")?;
    if let Some(backend) = cli.storage {
        config.storage.backend = backend;
    }
    if let Some(db) = &cli.db {
        config.storage.path = db.clone();
    }
    Ok(config)
}

async fn open_storage(config: &NewsConfig) -> anyhow::Result<Arc<dyn NewsStorage>> {
    let storage = nd_storage::create_storage(&config.storage)
        .await
        .with_context(|| format!("failed to open {:?} storage", config.storage.backend))?;
    info!("💾 Storage initialized successfully (using {:?})", config.storage.backend);
    Ok(storage)
}

fn summarizer(config: &NewsConfig, logger: &Logger) -> Arc<dyn Summarizer> {
    Arc::new(SummaryGenerator::new(config.summary, logger.clone()))
}

async fn serve(config: NewsConfig, bind: Option<SocketAddr>, logger: Logger) -> anyhow::Result<()> {
    let addr = match bind {
        Some(addr) => addr,
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid server.bind address: {}", config.server.bind))?,
    };
    let storage = open_storage(&config).await?;
    let summarizer = summarizer(&config, &logger);

    let mut state = AppState::new(storage.clone(), summarizer.clone(), logger.clone());
    let ctx = IngestContext {
        storage,
        summarizer,
        mediastack: config.mediastack.clone(),
        logger: logger.clone(),
    };
    match ctx.manager() {
        Ok(manager) => {
            info!("📰 News fetching enabled (source: {})", manager.source_name());
            state = state.with_ingest(manager);
        }
        Err(e) => logger.warn(&format!("News fetching disabled: {}", e)),
    }

    nd_web::serve(state, addr).await.context("server failed")
}

async fn ingest(
    config: NewsConfig,
    command: IngestCommands,
    interval: Option<HumanDuration>,
    logger: Logger,
) -> anyhow::Result<()> {
    if interval.is_some() && !matches!(command, IngestCommands::Fetch { .. }) {
        bail!("--interval only applies to `ingest fetch`");
    }

    let storage = open_storage(&config).await?;
    let ctx = IngestContext {
        summarizer: summarizer(&config, &logger),
        storage,
        mediastack: config.mediastack,
        logger,
    };
    let mut out = io::stdout();

    if let Some(HumanDuration(every)) = interval {
        info!("Running in periodic mode with {}s interval", every.as_secs());
        loop {
            info!("Starting fetch cycle");
            if let Err(e) = handle_command(&command, &ctx, &mut out).await {
                error!("Error during fetch: {}", e);
            }
            info!("Waiting {}s before next fetch", every.as_secs());
            tokio::time::sleep(every).await;
        }
    }

    handle_command(&command, &ctx, &mut out)
        .await
        .context("ingest command failed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let logger = init_logging("info");
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Serve { bind } => serve(config, bind, logger).await,
        Commands::Ingest { command, interval } => ingest(config, command, interval, logger).await,
        Commands::Summarize {
            description,
            content,
        } => {
            let input = SummaryInput::new(description, content);
            println!("{}", summarizer(&config, &logger).summarize(&input).text());
            Ok(())
        }
    }
}
