use anyhow::{Context, Result};
use reqwest::Certificate;
use std::fs;
use std::path::Path;
use std::time::Duration;

fn load_extra_ca_certificate(path: Option<&Path>) -> Result<Option<Certificate>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let pem = fs::read(path)
        .with_context(|| format!("failed to read CA certificate from {}", path.display()))?;
    let certificate = Certificate::from_pem(&pem)
        .with_context(|| format!("failed to parse CA certificate from {}", path.display()))?;
    Ok(Some(certificate))
}

/// Builds a client that identifies as a desktop browser.
///
/// The cookie store is needed by the quote provider, which hands out a session
/// cookie before it accepts quote requests.
pub fn build_client(
    user_agent: &str,
    timeout: Option<Duration>,
    extra_ca_cert: Option<&Path>,
) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder()
        .user_agent(user_agent)
        .cookie_store(true);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(certificate) = load_extra_ca_certificate(extra_ca_cert)? {
        builder = builder.add_root_certificate(certificate);
    }
    builder.build().context("failed to build HTTP client")
}
