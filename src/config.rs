use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUTPUT_PATH: &str = "data.json";
pub const DEFAULT_ROSTER_SIZE: usize = 100;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 300;
pub const DEFAULT_INDEX_PAGE_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TickerSourceKind {
    /// Embedded roster per market
    Static,
    /// Roster scraped from the index's public membership page
    Dynamic,
}

impl TickerSourceKind {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "dynamic" | "wikipedia" => Ok(Self::Dynamic),
            other => Err(anyhow!(
                "TICKER_SOURCE must be static or dynamic (value: {})",
                other
            )),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Static => "static roster",
            Self::Dynamic => "index page",
        }
    }
}

/// Everything a run needs besides the market table, resolved once at start-up.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub output_path: PathBuf,
    pub ticker_source: TickerSourceKind,
    pub roster_size: usize,
    pub request_delay: Duration,
    pub index_page_timeout: Duration,
    pub yahoo_base_url: String,
    pub yahoo_cookie_url: String,
    pub user_agent: String,
    pub extra_ca_cert: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
            ticker_source: TickerSourceKind::Static,
            roster_size: DEFAULT_ROSTER_SIZE,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            index_page_timeout: Duration::from_secs(DEFAULT_INDEX_PAGE_TIMEOUT_SECS),
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            yahoo_cookie_url: DEFAULT_YAHOO_COOKIE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_ca_cert: None,
        }
    }
}

impl RunSettings {
    pub fn from_env() -> Result<Self> {
        let settings: HashMap<String, String> = std::env::vars().collect();
        Self::from_settings_map(&settings)
    }

    pub fn from_settings_map(settings: &HashMap<String, String>) -> Result<Self> {
        let defaults = Self::default();

        let output_path = optional_setting(settings, "SNAPSHOT_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_path);
        let ticker_source = match optional_setting(settings, "TICKER_SOURCE") {
            Some(raw) => TickerSourceKind::parse(raw)?,
            None => defaults.ticker_source,
        };
        let roster_size = setting_u64_or(settings, "ROSTER_SIZE", DEFAULT_ROSTER_SIZE as u64, 1)?;
        let request_delay_ms =
            setting_u64_or(settings, "REQUEST_DELAY_MS", DEFAULT_REQUEST_DELAY_MS, 0)?;
        let index_page_timeout_secs = setting_u64_or(
            settings,
            "INDEX_PAGE_TIMEOUT_SECS",
            DEFAULT_INDEX_PAGE_TIMEOUT_SECS,
            1,
        )?;
        let yahoo_base_url = optional_setting(settings, "YAHOO_BASE_URL")
            .map(normalize_base_url)
            .unwrap_or(defaults.yahoo_base_url);
        let yahoo_cookie_url = optional_setting(settings, "YAHOO_COOKIE_URL")
            .map(normalize_base_url)
            .unwrap_or(defaults.yahoo_cookie_url);
        let user_agent = optional_setting(settings, "HTTP_USER_AGENT")
            .map(str::to_string)
            .unwrap_or(defaults.user_agent);
        let extra_ca_cert = optional_setting(settings, "HTTP_EXTRA_CA_CERT").map(PathBuf::from);

        Ok(Self {
            output_path,
            ticker_source,
            roster_size: roster_size as usize,
            request_delay: Duration::from_millis(request_delay_ms),
            index_page_timeout: Duration::from_secs(index_page_timeout_secs),
            yahoo_base_url,
            yahoo_cookie_url,
            user_agent,
            extra_ca_cert,
        })
    }
}

fn optional_setting<'a>(settings: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    settings
        .get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn setting_u64_or(
    settings: &HashMap<String, String>,
    key: &str,
    default: u64,
    min: u64,
) -> Result<u64> {
    let Some(raw) = optional_setting(settings, key) else {
        return Ok(default);
    };
    let value = raw
        .parse::<u64>()
        .map_err(|_| anyhow!("Setting {} must be a non-negative integer (value: {})", key, raw))?;
    if value < min {
        return Err(anyhow!(
            "Setting {} must be >= {} (value: {})",
            key,
            min,
            raw
        ));
    }
    Ok(value)
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn empty_settings_use_defaults() {
        let resolved = RunSettings::from_settings_map(&HashMap::new()).unwrap();
        assert_eq!(resolved.output_path, PathBuf::from("data.json"));
        assert_eq!(resolved.ticker_source, TickerSourceKind::Static);
        assert_eq!(resolved.roster_size, 100);
        assert_eq!(resolved.request_delay, Duration::from_millis(300));
        assert_eq!(resolved.index_page_timeout, Duration::from_secs(15));
        assert!(resolved.user_agent.starts_with("Mozilla/5.0"));
    }

    #[test]
    fn overrides_are_parsed_and_trimmed() {
        let resolved = RunSettings::from_settings_map(&settings(&[
            ("SNAPSHOT_OUTPUT", " site/data.json "),
            ("TICKER_SOURCE", "Dynamic"),
            ("ROSTER_SIZE", "25"),
            ("REQUEST_DELAY_MS", "0"),
            ("YAHOO_BASE_URL", "http://127.0.0.1:9000/"),
        ]))
        .unwrap();
        assert_eq!(resolved.output_path, PathBuf::from("site/data.json"));
        assert_eq!(resolved.ticker_source, TickerSourceKind::Dynamic);
        assert_eq!(resolved.roster_size, 25);
        assert_eq!(resolved.request_delay, Duration::ZERO);
        assert_eq!(resolved.yahoo_base_url, "http://127.0.0.1:9000");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(RunSettings::from_settings_map(&settings(&[("ROSTER_SIZE", "0")])).is_err());
        assert!(RunSettings::from_settings_map(&settings(&[("ROSTER_SIZE", "ten")])).is_err());
        assert!(
            RunSettings::from_settings_map(&settings(&[("REQUEST_DELAY_MS", "-5")])).is_err()
        );
        assert!(RunSettings::from_settings_map(&settings(&[("TICKER_SOURCE", "csv")])).is_err());
    }
}
