use crate::aggregator::Aggregator;
use crate::config::TickerSourceKind;
use crate::context::AppContext;
use crate::snapshot::Snapshot;
use anyhow::Result;
use log::info;
use std::path::PathBuf;

#[derive(Debug, Clone, Default)]
pub struct RefreshOptions {
    pub output: Option<PathBuf>,
    pub source: Option<TickerSourceKind>,
    /// Market ids to include; empty means every market.
    pub markets: Vec<String>,
}

pub async fn run(app: &AppContext, options: RefreshOptions) -> Result<Snapshot> {
    let table = app.markets().restrict_to(&options.markets)?;
    let kind = options.source.unwrap_or(app.settings().ticker_source);
    let output_path = options
        .output
        .unwrap_or_else(|| app.settings().output_path.clone());

    info!(
        "Refreshing {} markets using the {}",
        table.markets().len(),
        kind.label()
    );

    let source = app.ticker_source(kind)?;
    let provider = app.quote_provider()?;
    let aggregator = Aggregator::new(source.as_ref(), &provider, app.settings().request_delay);
    let snapshot = aggregator.build(&table).await;

    snapshot.save_to_file(&output_path)?;
    info!(
        "Done! {} total stocks written to {}",
        snapshot.total_stocks(),
        output_path.display()
    );
    info!("Updated: {}", snapshot.updated);

    Ok(snapshot)
}
