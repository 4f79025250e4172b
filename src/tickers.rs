use crate::markets::{IndexPage, Market};
use async_trait::async_trait;
use log::debug;
use scraper::{ElementRef, Html};
use std::collections::HashSet;
use thiserror::Error;

/// Suffixes that already name an exchange in Yahoo's symbol syntax.
const EXCHANGE_QUALIFIERS: [&str; 12] = [
    "DE", "F", "L", "PA", "AS", "MI", "BR", "MC", "SW", "T", "HK", "TO",
];

#[derive(Debug, Error)]
pub enum TickerSourceError {
    #[error("no table with a {columns} column and at least {min_rows} rows on {url}")]
    NotFound {
        url: String,
        columns: String,
        min_rows: usize,
    },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("unknown market {0}")]
    UnknownMarket(String),
}

#[async_trait]
pub trait TickerSource: Send + Sync {
    async fn resolve(&self, market: &Market) -> Result<Vec<String>, TickerSourceError>;

    fn label(&self) -> &'static str;
}

pub struct StaticTickerSource {
    roster_size: usize,
}

impl StaticTickerSource {
    pub fn new(roster_size: usize) -> Self {
        Self { roster_size }
    }
}

#[async_trait]
impl TickerSource for StaticTickerSource {
    async fn resolve(&self, market: &Market) -> Result<Vec<String>, TickerSourceError> {
        Ok(build_roster(
            market.roster.iter().map(|symbol| symbol.to_string()),
            self.roster_size,
        ))
    }

    fn label(&self) -> &'static str {
        "static roster"
    }
}

/// Scrapes the market's public index page for its membership table.
pub struct IndexPageTickerSource {
    http: reqwest::Client,
    roster_size: usize,
}

impl IndexPageTickerSource {
    /// `http` should carry a browser user agent and a bounded timeout.
    pub fn new(http: reqwest::Client, roster_size: usize) -> Self {
        Self { http, roster_size }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, TickerSourceError> {
        let http_error = |source| TickerSourceError::Http {
            url: url.to_string(),
            source,
        };
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(http_error)?
            .error_for_status()
            .map_err(http_error)?;
        response.text().await.map_err(http_error)
    }
}

#[async_trait]
impl TickerSource for IndexPageTickerSource {
    async fn resolve(&self, market: &Market) -> Result<Vec<String>, TickerSourceError> {
        let page = &market.index_page;
        let html = self.fetch_page(page.url).await?;
        let raw = extract_symbols(&html, page)?;
        debug!(
            "{}: {} raw symbols extracted from {}",
            market.id,
            raw.len(),
            page.url
        );
        Ok(build_roster(
            raw.iter()
                .filter_map(|symbol| normalize_symbol(symbol, page.suffix)),
            self.roster_size,
        ))
    }

    fn label(&self) -> &'static str {
        "index page"
    }
}

/// De-duplicates while keeping first occurrence, then truncates.
pub fn build_roster<I>(symbols: I, roster_size: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .filter(|symbol| seen.insert(symbol.clone()))
        .take(roster_size)
        .collect()
}

/// Returns the symbol column of the first table that has a matching header and
/// at least `page.min_rows` values.
pub fn extract_symbols(html: &str, page: &IndexPage) -> Result<Vec<String>, TickerSourceError> {
    let document = Html::parse_document(html);

    for table in elements_named(document.root_element(), "table") {
        let rows: Vec<ElementRef> = elements_named(table, "tr")
            .filter(|row| owning_table(*row).map(|owner| owner.id()) == Some(table.id()))
            .collect();

        let Some(header_index) = rows.iter().position(|row| is_header_row(*row)) else {
            continue;
        };
        let Some(column) = cells(rows[header_index])
            .iter()
            .position(|cell| header_matches(&cell_text(*cell), page.columns))
        else {
            continue;
        };

        let values: Vec<String> = rows[header_index + 1..]
            .iter()
            .filter_map(|row| cells(*row).get(column).map(|cell| cell_text(*cell)))
            .filter_map(|text| text.split_whitespace().last().map(str::to_string))
            .collect();

        if values.len() >= page.min_rows {
            return Ok(values);
        }
        debug!(
            "Skipping table with {} symbols on {} (need {})",
            values.len(),
            page.url,
            page.min_rows
        );
    }

    Err(TickerSourceError::NotFound {
        url: page.url.to_string(),
        columns: page.columns.join("/"),
        min_rows: page.min_rows,
    })
}

/// Converts an index page symbol into the quote provider's syntax.
pub fn normalize_symbol(raw: &str, suffix: Option<&str>) -> Option<String> {
    let upper = strip_footnotes(raw).trim().to_uppercase();
    if upper.is_empty() {
        return None;
    }
    if has_exchange_qualifier(&upper) {
        return Some(upper);
    }

    let mut cleaned = String::with_capacity(upper.len());
    for c in upper.chars() {
        if c.is_ascii_alphanumeric() {
            cleaned.push(c);
        } else if matches!(c, '.' | '/' | '-') || c.is_whitespace() {
            cleaned.push('-');
        }
    }
    let cleaned = cleaned.trim_matches('-');
    if cleaned.is_empty() {
        return None;
    }
    Some(format!("{}{}", cleaned, suffix.unwrap_or("")))
}

fn has_exchange_qualifier(symbol: &str) -> bool {
    symbol
        .rsplit_once('.')
        .map(|(base, qualifier)| !base.is_empty() && EXCHANGE_QUALIFIERS.contains(&qualifier))
        .unwrap_or(false)
}

fn header_matches(text: &str, accepted: &[&str]) -> bool {
    let header = text.trim().to_lowercase();
    accepted.iter().any(|name| {
        header == *name
            || header
                .split(|c: char| !c.is_alphanumeric())
                .any(|word| word == *name)
    })
}

fn strip_footnotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

fn elements_named<'a>(
    root: ElementRef<'a>,
    name: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> {
    root.descendants()
        .filter_map(ElementRef::wrap)
        .filter(move |element| element.value().name() == name)
}

fn owning_table(row: ElementRef<'_>) -> Option<ElementRef<'_>> {
    row.ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "table")
}

fn cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "th" | "td"))
        .collect()
}

fn is_header_row(row: ElementRef<'_>) -> bool {
    let row_cells = cells(row);
    !row_cells.is_empty() && row_cells.iter().all(|cell| cell.value().name() == "th")
}

fn cell_text(cell: ElementRef<'_>) -> String {
    strip_footnotes(&cell.text().collect::<String>())
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::MarketTable;

    const PAGE: IndexPage = IndexPage {
        url: "https://example.org/wiki/Index",
        columns: &["ticker", "epic", "symbol"],
        min_rows: 20,
        suffix: Some(".L"),
    };

    fn constituents_table(header: &str, count: usize) -> String {
        let mut html = format!("<table><tr><th>Company</th><th>{}</th></tr>", header);
        for i in 0..count {
            html.push_str(&format!(
                "<tr><td>Company {i}</td><td><a href=\"#\">T{i}</a></td></tr>"
            ));
        }
        html.push_str("</table>");
        html
    }

    #[test]
    fn picks_first_table_with_enough_rows() {
        let html = format!(
            "<html><body>{}{}</body></html>",
            constituents_table("Symbol", 3),
            constituents_table("EPIC[1]", 25)
        );
        let symbols = extract_symbols(&html, &PAGE).unwrap();
        assert_eq!(symbols.len(), 25);
        assert_eq!(symbols[0], "T0");
        assert_eq!(symbols[24], "T24");
    }

    #[test]
    fn header_match_is_case_insensitive_and_word_based() {
        assert!(header_matches("Ticker symbol", &["ticker"]));
        assert!(header_matches("EPIC", &["epic"]));
        assert!(header_matches("Code", &["code"]));
        assert!(!header_matches("Company", &["ticker", "symbol"]));
        assert!(!header_matches("Tickers", &["ticker"]));
    }

    #[test]
    fn missing_table_is_not_found() {
        let html = format!(
            "<table><tr><th>Company</th><th>Sector</th></tr></table>{}",
            constituents_table("Ticker", 10)
        );
        let err = extract_symbols(&html, &PAGE).unwrap_err();
        match err {
            TickerSourceError::NotFound { min_rows, .. } => assert_eq!(min_rows, 20),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn nested_tables_do_not_leak_rows() {
        let inner = constituents_table("Ticker", 30);
        let html = format!(
            "<table><tr><th>Layout</th></tr><tr><td>{}</td></tr></table>",
            inner
        );
        let symbols = extract_symbols(&html, &PAGE).unwrap();
        assert_eq!(symbols.len(), 30);
    }

    #[test]
    fn normalizes_symbols_for_quote_provider() {
        assert_eq!(normalize_symbol("BRK.B", None).as_deref(), Some("BRK-B"));
        assert_eq!(normalize_symbol("BT.A", Some(".L")).as_deref(), Some("BT-A.L"));
        assert_eq!(normalize_symbol("sap", Some(".DE")).as_deref(), Some("SAP.DE"));
        assert_eq!(normalize_symbol("AI.PA", Some(".PA")).as_deref(), Some("AI.PA"));
        assert_eq!(normalize_symbol("MT.AS", Some(".PA")).as_deref(), Some("MT.AS"));
        assert_eq!(normalize_symbol("7203", Some(".T")).as_deref(), Some("7203.T"));
        assert_eq!(normalize_symbol("RR.[2]", Some(".L")).as_deref(), Some("RR.L"));
        assert_eq!(normalize_symbol(" * ", Some(".L")), None);
    }

    #[test]
    fn roster_is_deduplicated_and_truncated() {
        let symbols = ["A", "B", "A", "C", "D"].map(str::to_string);
        assert_eq!(build_roster(symbols.clone(), 3), vec!["A", "B", "C"]);
        assert_eq!(build_roster(symbols, 10), vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn static_source_keeps_roster_order() {
        let table = MarketTable::default();
        let dax = table.get("dax").unwrap();
        let source = StaticTickerSource::new(100);
        let roster = source.resolve(dax).await.unwrap();
        assert_eq!(roster[0], "SAP.DE");
        // NOEJ.DE is listed twice in the embedded roster.
        assert_eq!(roster.len(), 99);

        let short = StaticTickerSource::new(5).resolve(dax).await.unwrap();
        assert_eq!(short, vec!["SAP.DE", "SIE.DE", "ALV.DE", "MRK.DE", "DTE.DE"]);
    }
}
