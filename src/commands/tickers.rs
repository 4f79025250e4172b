use crate::config::TickerSourceKind;
use crate::context::AppContext;
use crate::tickers::TickerSourceError;
use anyhow::Result;
use log::info;

/// Prints the roster a refresh would fetch for one market, one symbol per line.
pub async fn run(
    app: &AppContext,
    market_id: &str,
    source: Option<TickerSourceKind>,
) -> Result<Vec<String>> {
    let market = app
        .markets()
        .get(market_id)
        .ok_or_else(|| TickerSourceError::UnknownMarket(market_id.trim().to_string()))?;
    let kind = source.unwrap_or(app.settings().ticker_source);

    let tickers = app.ticker_source(kind)?.resolve(market).await?;
    info!(
        "{}: {} symbols from the {}",
        market.name,
        tickers.len(),
        kind.label()
    );
    for symbol in &tickers {
        println!("{}", symbol);
    }

    Ok(tickers)
}
