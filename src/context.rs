use crate::config::{RunSettings, TickerSourceKind};
use crate::http_client::build_client;
use crate::markets::MarketTable;
use crate::tickers::{IndexPageTickerSource, StaticTickerSource, TickerSource};
use crate::yahoo::YahooClient;
use anyhow::Result;

/// Settings and market table shared by every command.
#[derive(Debug, Clone)]
pub struct AppContext {
    settings: RunSettings,
    markets: MarketTable,
}

impl AppContext {
    pub fn initialize(settings: RunSettings, markets: MarketTable) -> Self {
        Self { settings, markets }
    }

    pub fn from_env() -> Result<Self> {
        let settings = RunSettings::from_env()?;
        Ok(Self::initialize(settings, MarketTable::default()))
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    pub fn markets(&self) -> &MarketTable {
        &self.markets
    }

    pub fn ticker_source(&self, kind: TickerSourceKind) -> Result<Box<dyn TickerSource>> {
        let roster_size = self.settings.roster_size;
        match kind {
            TickerSourceKind::Static => Ok(Box::new(StaticTickerSource::new(roster_size))),
            TickerSourceKind::Dynamic => {
                let http = build_client(
                    &self.settings.user_agent,
                    Some(self.settings.index_page_timeout),
                    self.settings.extra_ca_cert.as_deref(),
                )?;
                Ok(Box::new(IndexPageTickerSource::new(http, roster_size)))
            }
        }
    }

    /// Quote requests carry no client timeout; a stalled symbol is bounded by
    /// the transport alone.
    pub fn quote_provider(&self) -> Result<YahooClient> {
        let http = build_client(
            &self.settings.user_agent,
            None,
            self.settings.extra_ca_cert.as_deref(),
        )?;
        Ok(YahooClient::new(
            http,
            &self.settings.yahoo_base_url,
            &self.settings.yahoo_cookie_url,
        ))
    }
}
