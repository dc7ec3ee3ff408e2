//! Page retrieval: one HTTP GET, raw bytes back.
//!
//! No retries and no redirect policy beyond reqwest's defaults. A timeout is
//! applied only when [`ConversionConfig::fetch_timeout_secs`] is set. Any
//! network failure or non-success status is fatal; there are no partial
//! results.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Check if the input string looks like an http(s) URL.
pub fn is_http_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parse `input` as an absolute http/https URL.
pub fn validate_url(input: &str) -> Result<Url, ConvertError> {
    let trimmed = input.trim();
    let url = Url::parse(trimmed).map_err(|e| ConvertError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConvertError::InvalidUrl {
            url: trimmed.to_string(),
            reason: format!("unsupported scheme '{other}', expected http or https"),
        }),
    }
}

/// Fetch `url` and return the response body.
pub async fn fetch_page(url: &str, config: &ConversionConfig) -> Result<Vec<u8>, ConvertError> {
    let parsed = validate_url(url)?;
    info!("Fetching page: {}", parsed);

    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.as_str());
    if let Some(secs) = config.fetch_timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = builder.build().map_err(|e| ConvertError::FetchFailed {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    let response = client.get(parsed).send().await.map_err(|e| classify(url, config, e))?;

    if !response.status().is_success() {
        return Err(ConvertError::FetchFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| classify(url, config, e))?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);

    Ok(bytes.to_vec())
}

fn classify(url: &str, config: &ConversionConfig, e: reqwest::Error) -> ConvertError {
    match config.fetch_timeout_secs {
        Some(secs) if e.is_timeout() => ConvertError::FetchTimeout {
            url: url.to_string(),
            secs,
        },
        _ => ConvertError::FetchFailed {
            url: url.to_string(),
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_http_url() {
        assert!(is_http_url("https://example.com/a"));
        assert!(is_http_url("http://example.com/a"));
        assert!(!is_http_url("ftp://example.com/a"));
        assert!(!is_http_url("example.com"));
        assert!(!is_http_url(""));
    }

    #[test]
    fn validate_accepts_http_and_https() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("  https://example.com/post  ").is_ok());
    }

    #[test]
    fn validate_rejects_missing_scheme() {
        let err = validate_url("example.com").unwrap_err();
        assert!(matches!(err, ConvertError::InvalidUrl { .. }));
    }

    #[test]
    fn validate_rejects_other_schemes() {
        let err = validate_url("file:///etc/passwd").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn fetch_invalid_url_fails_before_network() {
        let config = ConversionConfig::default();
        let result = tokio_test::block_on(fetch_page("not-a-url", &config));
        assert!(matches!(result, Err(ConvertError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn fetch_unreachable_host_is_fetch_failed() {
        // Port 9 on localhost ("discard") is closed on any sane test machine.
        let config = ConversionConfig::default();
        let result = fetch_page("http://127.0.0.1:9/", &config).await;
        assert!(matches!(result, Err(ConvertError::FetchFailed { .. })));
    }
}
