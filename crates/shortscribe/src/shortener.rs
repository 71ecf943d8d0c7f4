use anyhow::{Result, anyhow, bail};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

/// Returns true when `text` is a single absolute URL written as `scheme://host...`.
///
/// The text must already be well-formed: `Url::parse` repairs inputs like
/// `http:example.com` or `https:\\example.com`, so the raw text is checked too.
pub fn is_valid_url(text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || text.contains('\\') || text.chars().any(char::is_whitespace) {
        return false;
    }

    let Ok(url) = Url::parse(text) else {
        return false;
    };
    let written_with_authority = text
        .split_once("://")
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case(url.scheme()));

    written_with_authority && url.host_str().is_some_and(|host| !host.is_empty())
}

/// Result of a shorten call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shortened {
    /// The short identifier, e.g. "bit.ly/3Nt1x0A".
    Link(String),
    /// Bitly answered 429.
    RateLimited,
}

#[derive(Clone)]
pub struct BitlyClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    domain: String,
}

impl BitlyClient {
    pub fn new(http: reqwest::Client, base_url: &str, token: String, domain: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            domain,
        }
    }

    pub async fn shorten(&self, long_url: &str) -> Result<Shortened> {
        let request = ShortenRequest {
            long_url,
            domain: &self.domain,
        };
        let url = format!("{}/v4/shorten", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await
            .map_err(|_| anyhow!("Bitly shorten request failed"))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Shortened::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Bitly shorten failed: {} {}", status, body);
        }

        let payload: ShortenResponse = response
            .json()
            .await
            .map_err(|_| anyhow!("Failed to decode Bitly response"))?;
        payload
            .id
            .filter(|id| !id.trim().is_empty())
            .map(Shortened::Link)
            .ok_or_else(|| anyhow!("Bitly response has no id"))
    }
}

#[derive(Debug, Serialize)]
struct ShortenRequest<'a> {
    long_url: &'a str,
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
struct ShortenResponse {
    #[serde(default)]
    id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_absolute_urls() {
        assert!(is_valid_url(
            "https://www.google.com/search?client=firefox-b-d&q=crong"
        ));
        assert!(is_valid_url("http://example.com"));
        assert!(is_valid_url("  https://example.com/path#frag\n"));
        assert!(is_valid_url("https://127.0.0.1:8080/x"));
        assert!(is_valid_url("ftp://example.com/file"));
        assert!(is_valid_url("HTTPS://Example.com"));
    }

    #[test]
    fn test_rejects_plain_text_and_relative() {
        assert!(!is_valid_url("hello world"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("example.com"));
        assert!(!is_valid_url("/just/a/path"));
        assert!(!is_valid_url("https://example.com and more"));
    }

    #[test]
    fn test_rejects_hostless_urls() {
        assert!(!is_valid_url("mailto:duck@example.com"));
        assert!(!is_valid_url("file:///etc/passwd"));
        assert!(!is_valid_url("https://"));
    }

    #[test]
    fn test_rejects_text_the_parser_would_repair() {
        assert!(!is_valid_url("http:example.com"));
        assert!(!is_valid_url("https:\\\\example.com"));
        assert!(!is_valid_url("https://example.com\\path"));
        assert!(!is_valid_url("https:/example.com"));
    }

    #[test]
    fn test_shorten_request_shape() {
        let request = ShortenRequest {
            long_url: "https://example.com",
            domain: "bit.ly",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"long_url": "https://example.com", "domain": "bit.ly"})
        );
    }
}
