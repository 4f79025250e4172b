use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use stock_snapshot::{
    commands::{refresh, summary, tickers},
    config::TickerSourceKind,
    context::AppContext,
};

const DEFAULT_SUMMARY_TOP: usize = 10;

#[derive(Parser)]
#[command(name = "stock-snapshot")]
#[command(about = "Scores index constituents on fundamentals and writes a JSON snapshot")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every market, score each stock and write the snapshot (default)
    Refresh {
        /// Destination for the snapshot (defaults to SNAPSHOT_OUTPUT or data.json)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Where market rosters come from (defaults to TICKER_SOURCE)
        #[arg(long, value_enum)]
        source: Option<TickerSourceKind>,
        /// Comma separated market ids to limit the run to
        #[arg(long, value_delimiter = ',')]
        markets: Vec<String>,
    },
    /// Print the roster a refresh would fetch for one market
    Tickers {
        /// Market id (sp500, nasdaq, dax, ftse, cac, nikkei)
        market: String,
        #[arg(long, value_enum)]
        source: Option<TickerSourceKind>,
    },
    /// Print the top ranked stocks of an existing snapshot
    Summary {
        /// Snapshot to read (defaults to SNAPSHOT_OUTPUT or data.json)
        #[arg(short, long, value_name = "PATH")]
        input: Option<PathBuf>,
        /// Stocks to show per market
        #[arg(long, default_value_t = DEFAULT_SUMMARY_TOP)]
        top: usize,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stdout)
        .init();

    let app_context = AppContext::from_env()?;

    match cli.command.unwrap_or(Commands::Refresh {
        output: None,
        source: None,
        markets: Vec::new(),
    }) {
        Commands::Refresh {
            output,
            source,
            markets,
        } => {
            info!("Starting snapshot refresh. Not financial advice.");
            refresh::run(
                &app_context,
                refresh::RefreshOptions {
                    output,
                    source,
                    markets,
                },
            )
            .await?;
        }
        Commands::Tickers { market, source } => {
            tickers::run(&app_context, &market, source).await?;
        }
        Commands::Summary { input, top } => {
            summary::run(&app_context, input, top).await?;
        }
    }

    Ok(())
}
