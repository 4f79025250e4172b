use crate::markets::Market;
use crate::models::{QuoteInfo, StockMetrics, StockRecord};
use crate::scoring::score_quote;
use crate::yahoo::QuoteProvider;
use anyhow::Result;
use log::{info, warn};
use std::time::Duration;
use tokio::time::sleep;

pub enum SymbolOutcome {
    Scored(StockRecord),
    /// Neither close field held a positive price.
    NoPrice,
}

#[derive(Debug, Clone, Default)]
pub struct MarketResult {
    /// Ranked by score, highest first.
    pub stocks: Vec<StockRecord>,
    pub skipped: Vec<String>,
    pub failed: Vec<String>,
}

/// Fetches and scores one market's roster, one symbol at a time.
pub struct MarketFetcher<'a, P: QuoteProvider + ?Sized> {
    provider: &'a P,
    request_delay: Duration,
}

impl<'a, P: QuoteProvider + ?Sized> MarketFetcher<'a, P> {
    pub fn new(provider: &'a P, request_delay: Duration) -> Self {
        Self {
            provider,
            request_delay,
        }
    }

    pub async fn fetch_symbol(&self, symbol: &str) -> Result<SymbolOutcome> {
        let info = self.provider.fetch_quote(symbol).await?;
        Ok(match build_stock_record(symbol, &info) {
            Some(record) => SymbolOutcome::Scored(record),
            None => SymbolOutcome::NoPrice,
        })
    }

    /// Never fails as a whole: a symbol that errors is logged and left out.
    pub async fn fetch_market(&self, market: &Market, tickers: &[String]) -> MarketResult {
        let total = tickers.len();
        info!("  Fetching {} tickers for {}...", total, market.id);

        let mut result = MarketResult::default();
        for (idx, symbol) in tickers.iter().enumerate() {
            let position = idx + 1;
            match self.fetch_symbol(symbol).await {
                Ok(SymbolOutcome::Scored(record)) => {
                    info!(
                        "    [{}/{}] {} - score {}",
                        position, total, symbol, record.score
                    );
                    result.stocks.push(record);
                }
                Ok(SymbolOutcome::NoPrice) => {
                    info!("    [{}/{}] {} - no price, skip", position, total, symbol);
                    result.skipped.push(symbol.clone());
                }
                Err(err) => {
                    warn!("    [{}/{}] {} - error: {:#}", position, total, symbol, err);
                    result.failed.push(symbol.clone());
                }
            }

            // Upstream rate-limits aggressive clients.
            if position < total && !self.request_delay.is_zero() {
                sleep(self.request_delay).await;
            }
        }

        rank_by_score(&mut result.stocks);
        result
    }
}

pub fn build_stock_record(symbol: &str, info: &QuoteInfo) -> Option<StockRecord> {
    let price = info.resolved_price()?;
    let card = score_quote(info);
    Some(StockRecord {
        symbol: symbol.to_string(),
        name: info.display_name(symbol),
        price,
        currency: info.currency_or_default(),
        score: card.score,
        score_details: card.details,
        metrics: StockMetrics::from_quote(info, price),
    })
}

/// Highest score first. The sort is stable, so equal scores keep fetch order.
pub fn rank_by_score(stocks: &mut [StockRecord]) {
    stocks.sort_by(|a, b| b.score.cmp(&a.score));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::MarketTable;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    enum Canned {
        Quote(QuoteInfo),
        Fail(&'static str),
    }

    #[derive(Default)]
    struct FakeProvider {
        quotes: HashMap<String, Canned>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        fn with(mut self, symbol: &str, canned: Canned) -> Self {
            self.quotes.insert(symbol.to_string(), canned);
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl QuoteProvider for FakeProvider {
        async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo> {
            self.calls.lock().unwrap().push(symbol.to_string());
            match self.quotes.get(symbol) {
                Some(Canned::Quote(info)) => Ok(info.clone()),
                Some(Canned::Fail(message)) => Err(anyhow!(*message)),
                None => Err(anyhow!("unknown symbol {}", symbol)),
            }
        }
    }

    fn quote(price: Option<f64>, pe: Option<f64>) -> Canned {
        Canned::Quote(QuoteInfo {
            previous_close: price,
            trailing_pe: pe,
            short_name: Some("Test Corp".to_string()),
            currency: Some("USD".to_string()),
            ..Default::default()
        })
    }

    fn tickers(symbols: &[&str]) -> Vec<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn ranks_by_score_and_keeps_fetch_order_on_ties() {
        let provider = FakeProvider::default()
            .with("LOW", quote(Some(10.0), Some(80.0)))
            .with("TIE1", quote(Some(10.0), Some(22.0)))
            .with("HIGH", quote(Some(10.0), Some(9.0)))
            .with("TIE2", quote(Some(10.0), Some(24.0)));
        let table = MarketTable::default();
        let market = table.get("sp500").unwrap();

        let fetcher = MarketFetcher::new(&provider, Duration::ZERO);
        let result = fetcher
            .fetch_market(market, &tickers(&["LOW", "TIE1", "HIGH", "TIE2"]))
            .await;

        let order: Vec<&str> = result.stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(order, vec!["HIGH", "TIE1", "TIE2", "LOW"]);
        assert!(result
            .stocks
            .windows(2)
            .all(|pair| pair[0].score >= pair[1].score));
        assert_eq!(provider.calls(), tickers(&["LOW", "TIE1", "HIGH", "TIE2"]));
    }

    #[tokio::test]
    async fn symbols_without_price_are_skipped() {
        let provider = FakeProvider::default()
            .with("NOPRICE", quote(None, Some(10.0)))
            .with("ZERO", quote(Some(0.0), Some(10.0)))
            .with("OK", quote(Some(5.0), None));
        let table = MarketTable::default();
        let market = table.get("dax").unwrap();

        let result = MarketFetcher::new(&provider, Duration::ZERO)
            .fetch_market(market, &tickers(&["NOPRICE", "ZERO", "OK"]))
            .await;

        assert_eq!(result.stocks.len(), 1);
        assert_eq!(result.stocks[0].symbol, "OK");
        assert_eq!(result.stocks[0].score, 0);
        assert_eq!(result.skipped, tickers(&["NOPRICE", "ZERO"]));
        assert!(result.failed.is_empty());
    }

    #[tokio::test]
    async fn failing_symbol_does_not_disturb_others() {
        let provider = FakeProvider::default()
            .with("A", quote(Some(1.0), Some(12.0)))
            .with("B", Canned::Fail("HTTP 500"))
            .with("C", quote(Some(2.0), Some(30.0)));
        let table = MarketTable::default();
        let market = table.get("ftse").unwrap();

        let result = MarketFetcher::new(&provider, Duration::ZERO)
            .fetch_market(market, &tickers(&["A", "B", "C"]))
            .await;

        let symbols: Vec<&str> = result.stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["A", "C"]);
        assert_eq!(result.stocks[0].score, 25);
        assert_eq!(result.stocks[1].score, 10);
        assert_eq!(result.failed, tickers(&["B"]));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_runs_between_symbols_only() {
        let provider = FakeProvider::default()
            .with("A", quote(Some(1.0), Some(12.0)))
            .with("B", quote(Some(2.0), Some(18.0)))
            .with("C", quote(Some(3.0), Some(40.0)));
        let table = MarketTable::default();
        let market = table.get("cac").unwrap();
        let delay = Duration::from_millis(50);

        let started = tokio::time::Instant::now();
        let result = MarketFetcher::new(&provider, delay)
            .fetch_market(market, &tickers(&["A", "B", "C"]))
            .await;
        let elapsed = started.elapsed();

        assert_eq!(result.stocks.len(), 3);
        assert!(elapsed >= delay * 2, "elapsed {:?}", elapsed);
        assert!(elapsed < delay * 3, "elapsed {:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn single_symbol_is_not_delayed() {
        let provider = FakeProvider::default().with("ONLY", quote(Some(1.0), None));
        let table = MarketTable::default();
        let market = table.get("nikkei").unwrap();

        let started = tokio::time::Instant::now();
        MarketFetcher::new(&provider, Duration::from_secs(5))
            .fetch_market(market, &tickers(&["ONLY"]))
            .await;
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn record_uses_fallbacks() {
        let info = QuoteInfo {
            regular_market_previous_close: Some(3.25),
            long_name: Some("Long Name plc".to_string()),
            ..Default::default()
        };
        let record = build_stock_record("XYZ.L", &info).unwrap();
        assert_eq!(record.price, 3.25);
        assert_eq!(record.name, "Long Name plc");
        assert_eq!(record.currency, "");
        assert_eq!(record.metrics.previous_close, Some(3.25));
        assert!(record.score_details.is_empty());
    }
}
