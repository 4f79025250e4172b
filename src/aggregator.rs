use crate::fetcher::MarketFetcher;
use crate::markets::MarketTable;
use crate::snapshot::{MarketSnapshot, Snapshot};
use crate::tickers::TickerSource;
use crate::yahoo::QuoteProvider;
use chrono::Utc;
use log::{info, warn};
use std::time::Duration;

/// Runs every configured market through ticker resolution and the fetcher.
pub struct Aggregator<'a> {
    source: &'a dyn TickerSource,
    fetcher: MarketFetcher<'a, dyn QuoteProvider + 'a>,
}

impl<'a> Aggregator<'a> {
    pub fn new(
        source: &'a dyn TickerSource,
        provider: &'a (dyn QuoteProvider + 'a),
        request_delay: Duration,
    ) -> Self {
        Self {
            source,
            fetcher: MarketFetcher::new(provider, request_delay),
        }
    }

    /// A market whose roster cannot be resolved still gets an entry, with no stocks.
    pub async fn build(&self, table: &MarketTable) -> Snapshot {
        let mut snapshot = Snapshot::new(Utc::now());

        for market in table.markets() {
            info!("=== {} ===", market.name);

            let stocks = match self.source.resolve(market).await {
                Ok(tickers) => {
                    let result = self.fetcher.fetch_market(market, &tickers).await;
                    if !result.skipped.is_empty() || !result.failed.is_empty() {
                        info!(
                            "  {} skipped without price, {} failed",
                            result.skipped.len(),
                            result.failed.len()
                        );
                    }
                    result.stocks
                }
                Err(err) => {
                    warn!(
                        "  {}: {} lookup failed: {}",
                        market.id,
                        self.source.label(),
                        err
                    );
                    Vec::new()
                }
            };

            info!("  -> {} stocks fetched", stocks.len());
            snapshot.markets.insert(
                market.id,
                MarketSnapshot {
                    name: market.name.to_string(),
                    stocks,
                },
            );
        }

        snapshot
    }
}
