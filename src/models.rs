use serde::{Deserialize, Serialize};

/// Fundamentals for one symbol as reported by the quote provider.
///
/// Every field is optional; the provider omits whatever it does not know.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteInfo {
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
    pub return_on_equity: Option<f64>,
    pub gross_margins: Option<f64>,
    pub profit_margins: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub price_to_sales_trailing_12_months: Option<f64>,
    pub trailing_eps: Option<f64>,
    pub previous_close: Option<f64>,
    pub regular_market_previous_close: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub currency: Option<String>,
}

impl QuoteInfo {
    /// Last close used as the display price. Zero or negative closes do not count.
    pub fn resolved_price(&self) -> Option<f64> {
        positive(self.previous_close).or_else(|| positive(self.regular_market_previous_close))
    }

    pub fn display_name(&self, symbol: &str) -> String {
        non_empty(self.short_name.as_deref())
            .or_else(|| non_empty(self.long_name.as_deref()))
            .unwrap_or(symbol)
            .to_string()
    }

    pub fn currency_or_default(&self) -> String {
        self.currency.clone().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub value: f64,
    pub score: u32,
    pub max: u32,
}

/// Per-metric points. A metric the provider did not report has no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pb: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roe: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gross_margin: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub net_margin: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debt_to_equity: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_ratio: Option<ScoreDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue_growth: Option<ScoreDetail>,
}

impl ScoreBreakdown {
    pub fn entries(&self) -> Vec<(&'static str, &ScoreDetail)> {
        [
            ("pe", self.pe.as_ref()),
            ("pb", self.pb.as_ref()),
            ("roe", self.roe.as_ref()),
            ("grossMargin", self.gross_margin.as_ref()),
            ("netMargin", self.net_margin.as_ref()),
            ("debtToEquity", self.debt_to_equity.as_ref()),
            ("currentRatio", self.current_ratio.as_ref()),
            ("revenueGrowth", self.revenue_growth.as_ref()),
        ]
        .into_iter()
        .filter_map(|(key, detail)| detail.map(|detail| (key, detail)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn total(&self) -> u32 {
        self.entries().iter().map(|(_, detail)| detail.score).sum()
    }
}

/// Raw metrics shipped to the site. Percentages are already multiplied by 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockMetrics {
    pub pe: Option<f64>,
    pub pb: Option<f64>,
    pub roe: Option<f64>,
    pub gross_margin: Option<f64>,
    pub net_margin: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
    pub revenue_growth: Option<f64>,
    pub ps: Option<f64>,
    pub eps: Option<f64>,
    pub previous_close: Option<f64>,
    pub dividend_yield: Option<f64>,
}

impl StockMetrics {
    pub fn from_quote(info: &QuoteInfo, price: f64) -> Self {
        Self {
            pe: finite(info.trailing_pe),
            pb: finite(info.price_to_book),
            roe: percent(info.return_on_equity),
            gross_margin: percent(info.gross_margins),
            net_margin: percent(info.profit_margins),
            debt_to_equity: finite(info.debt_to_equity),
            current_ratio: finite(info.current_ratio),
            revenue_growth: percent(info.revenue_growth),
            ps: finite(info.price_to_sales_trailing_12_months),
            eps: finite(info.trailing_eps),
            previous_close: Some(price),
            dividend_yield: percent(info.dividend_yield),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockRecord {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub currency: String,
    pub score: u32,
    pub score_details: ScoreBreakdown,
    pub metrics: StockMetrics,
}

/// Rounds to `decimals` places. A scaled value sitting exactly on a half goes
/// to the even neighbour, so `1.25` becomes `1.2`.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let scaled = value * factor;
    let floor = scaled.floor();
    let rounded = if scaled - floor == 0.5 {
        if floor % 2.0 == 0.0 {
            floor
        } else {
            floor + 1.0
        }
    } else {
        scaled.round()
    };
    rounded / factor
}

/// Drops NaN and infinities so they behave like a missing metric.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn percent(fraction: Option<f64>) -> Option<f64> {
    finite(fraction).map(|value| round_to(value * 100.0, 2))
}

fn positive(value: Option<f64>) -> Option<f64> {
    finite(value).filter(|v| *v > 0.0)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_halves_round_to_even() {
        assert_eq!(round_to(1.25, 1), 1.2);
        assert_eq!(round_to(0.125, 2), 0.12);
        assert_eq!(round_to(2.5, 0), 2.0);
        assert_eq!(round_to(3.5, 0), 4.0);
        assert_eq!(round_to(-2.5, 0), -2.0);
        assert_eq!(round_to(14.996, 2), 15.0);
        assert_eq!(round_to(1.26, 1), 1.3);
    }

    #[test]
    fn price_falls_back_to_regular_market_close() {
        let info = QuoteInfo {
            previous_close: Some(0.0),
            regular_market_previous_close: Some(41.5),
            ..Default::default()
        };
        assert_eq!(info.resolved_price(), Some(41.5));

        let missing = QuoteInfo {
            previous_close: None,
            regular_market_previous_close: Some(-1.0),
            ..Default::default()
        };
        assert_eq!(missing.resolved_price(), None);
    }

    #[test]
    fn display_name_skips_blank_names() {
        let info = QuoteInfo {
            short_name: Some("  ".to_string()),
            long_name: Some("Siemens Aktiengesellschaft".to_string()),
            ..Default::default()
        };
        assert_eq!(info.display_name("SIE.DE"), "Siemens Aktiengesellschaft");
        assert_eq!(QuoteInfo::default().display_name("SIE.DE"), "SIE.DE");
        assert_eq!(QuoteInfo::default().currency_or_default(), "");
    }

    #[test]
    fn metrics_convert_fractions_to_percent() {
        let info = QuoteInfo {
            trailing_pe: Some(18.123456),
            return_on_equity: Some(0.123456),
            dividend_yield: Some(0.0215),
            gross_margins: Some(f64::NAN),
            ..Default::default()
        };
        let metrics = StockMetrics::from_quote(&info, 101.0);
        assert_eq!(metrics.pe, Some(18.123456));
        assert_eq!(metrics.roe, Some(12.35));
        assert_eq!(metrics.dividend_yield, Some(2.15));
        assert_eq!(metrics.gross_margin, None);
        assert_eq!(metrics.previous_close, Some(101.0));
    }

    #[test]
    fn stock_record_uses_site_field_names() {
        let record = StockRecord {
            symbol: "7203.T".to_string(),
            name: "トヨタ自動車".to_string(),
            price: 2800.0,
            currency: "JPY".to_string(),
            score: 25,
            score_details: ScoreBreakdown {
                pe: Some(ScoreDetail {
                    value: 9.5,
                    score: 25,
                    max: 25,
                }),
                ..Default::default()
            },
            metrics: StockMetrics::default(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["scoreDetails"]["pe"]["score"], 25);
        assert!(json["scoreDetails"].get("pb").is_none());
        assert!(json["metrics"]["pb"].is_null());
        assert_eq!(json["name"], "トヨタ自動車");
    }
}
