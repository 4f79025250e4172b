use crate::models::QuoteInfo;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tokio::sync::OnceCell;

const QUOTE_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics";

/// Source of per-symbol fundamentals.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo>;
}

/// Yahoo Finance quoteSummary client.
///
/// Yahoo only answers quote requests that carry a session cookie and the
/// matching crumb, so both are fetched once and reused for the whole run.
pub struct YahooClient {
    http: Client,
    base_url: String,
    cookie_url: String,
    crumb: OnceCell<Option<String>>,
}

impl YahooClient {
    pub fn new(http: Client, base_url: &str, cookie_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            cookie_url: cookie_url.to_string(),
            crumb: OnceCell::new(),
        }
    }

    async fn crumb(&self) -> Option<&str> {
        self.crumb
            .get_or_init(|| async {
                match self.fetch_crumb().await {
                    Ok(crumb) => Some(crumb),
                    Err(err) => {
                        warn!("Yahoo crumb unavailable, continuing without it: {err:#}");
                        None
                    }
                }
            })
            .await
            .as_deref()
    }

    async fn fetch_crumb(&self) -> Result<String> {
        // fc.yahoo.com answers 404 but still sets the session cookie.
        if let Err(err) = self.http.get(&self.cookie_url).send().await {
            warn!("Session cookie request to {} failed: {}", self.cookie_url, err);
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let body = self
            .http
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned error", url))?
            .text()
            .await
            .context("failed to read crumb")?;

        let crumb = body.trim();
        if crumb.is_empty() || crumb.contains('<') || crumb.contains('{') {
            return Err(anyhow!("unexpected crumb payload from {}", url));
        }
        debug!("Obtained Yahoo crumb");
        Ok(crumb.to_string())
    }
}

#[async_trait]
impl QuoteProvider for YahooClient {
    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteInfo> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let mut query = vec![("modules", QUOTE_MODULES.to_string())];
        if let Some(crumb) = self.crumb().await {
            query.push(("crumb", crumb.to_string()));
        }

        let envelope = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?
            .error_for_status()
            .with_context(|| format!("GET {} returned error", url))?
            .json::<QuoteSummaryEnvelope>()
            .await
            .context("failed to parse quoteSummary response")?;

        envelope.into_quote_info(symbol)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    #[serde(default)]
    result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    error: Option<QuoteSummaryError>,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl QuoteSummaryEnvelope {
    fn into_quote_info(self, symbol: &str) -> Result<QuoteInfo> {
        if let Some(error) = self.quote_summary.error {
            return Err(anyhow!(
                "quoteSummary error for {}: {} {}",
                symbol,
                error.code.unwrap_or_default(),
                error.description.unwrap_or_default()
            ));
        }
        self.quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .map(QuoteSummaryResult::into_quote_info)
            .ok_or_else(|| anyhow!("no quoteSummary result for {}", symbol))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResult {
    #[serde(default)]
    price: Option<PriceModule>,
    #[serde(default)]
    summary_detail: Option<SummaryDetailModule>,
    #[serde(default)]
    financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatisticsModule>,
}

impl QuoteSummaryResult {
    fn into_quote_info(self) -> QuoteInfo {
        let price = self.price.unwrap_or_default();
        let detail = self.summary_detail.unwrap_or_default();
        let financials = self.financial_data.unwrap_or_default();
        let stats = self.default_key_statistics.unwrap_or_default();

        QuoteInfo {
            trailing_pe: detail.trailing_pe,
            price_to_book: stats.price_to_book,
            return_on_equity: financials.return_on_equity,
            gross_margins: financials.gross_margins,
            profit_margins: financials.profit_margins.or(stats.profit_margins),
            debt_to_equity: financials.debt_to_equity,
            current_ratio: financials.current_ratio,
            revenue_growth: financials.revenue_growth,
            price_to_sales_trailing_12_months: detail.price_to_sales_trailing_12_months,
            trailing_eps: stats.trailing_eps,
            previous_close: detail.previous_close,
            regular_market_previous_close: detail
                .regular_market_previous_close
                .or(price.regular_market_previous_close),
            dividend_yield: detail.dividend_yield,
            short_name: price.short_name,
            long_name: price.long_name,
            currency: detail.currency.or(price.currency),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    regular_market_previous_close: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetailModule {
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    previous_close: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    regular_market_previous_close: Option<f64>,
    #[serde(rename = "trailingPE", default, deserialize_with = "deserialize_f64_opt")]
    trailing_pe: Option<f64>,
    #[serde(
        rename = "priceToSalesTrailing12Months",
        default,
        deserialize_with = "deserialize_f64_opt"
    )]
    price_to_sales_trailing_12_months: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    dividend_yield: Option<f64>,
    #[serde(default)]
    currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialDataModule {
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    return_on_equity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    gross_margins: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    profit_margins: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    debt_to_equity: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    current_ratio: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    revenue_growth: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatisticsModule {
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    price_to_book: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    trailing_eps: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_f64_opt")]
    profit_margins: Option<f64>,
}

/// Accepts numbers, numeric strings, `null`, and Yahoo's `{"raw": n, "fmt": "..."}`
/// wrappers. An empty wrapper means the value is unknown.
fn deserialize_f64_opt<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(F64OptVisitor)
}

struct LenientF64(Option<f64>);

impl<'de> Deserialize<'de> for LenientF64 {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(F64OptVisitor).map(LenientF64)
    }
}

struct F64OptVisitor;

impl<'de> Visitor<'de> for F64OptVisitor {
    type Value = Option<f64>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number, numeric string, or {\"raw\": number} object")
    }

    fn visit_none<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(None)
    }

    fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(value as f64))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(Some(value as f64))
    }

    fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.trim().parse::<f64>().ok())
    }

    fn visit_string<E>(self, value: String) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        Ok(value.trim().parse::<f64>().ok())
    }

    fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut raw = None;
        while let Some(key) = map.next_key::<String>()? {
            if key == "raw" {
                raw = map.next_value::<LenientF64>()?.0;
            } else {
                map.next_value::<de::IgnoredAny>()?;
            }
        }
        Ok(raw)
    }
}
