//! Asset URL signing
//!
//! Planetary Computer serves its blobs with short-lived SAS tokens. A token
//! is requested once per collection and reused until shortly before it
//! expires.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use log::debug;
use reqwest::blocking::Client;
use reqwest::Url;
use serde::Deserialize;

use crate::errors::{ScoutError, ScoutResult};

/// Default Planetary Computer token endpoint
pub const PLANETARY_COMPUTER_TOKEN_URL: &str = "https://planetarycomputer.microsoft.com/api/sas/v1/token";

/// Tokens are refreshed this long before they expire
const EXPIRY_MARGIN_MINUTES: i64 = 5;

/// Turns a raw asset href into one that can be fetched
pub trait AssetSigner: Send + Sync {
    /// Returns the fetchable URL for an asset of `collection`
    fn sign(&self, collection: &str, href: &str) -> ScoutResult<String>;
}

/// Leaves URLs untouched
pub struct NoopSigner;

impl AssetSigner for NoopSigner {
    fn sign(&self, _collection: &str, href: &str) -> ScoutResult<String> {
        Ok(href.to_string())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct SasToken {
    token: String,
    #[serde(rename = "msft:expiry")]
    expiry: DateTime<Utc>,
}

/// Signs Azure blob URLs with Planetary Computer SAS tokens
pub struct PlanetaryComputerSigner {
    client: Client,
    endpoint: String,
    tokens: Mutex<HashMap<String, SasToken>>,
}

impl PlanetaryComputerSigner {
    pub fn new(client: Client, endpoint: &str) -> Self {
        PlanetaryComputerSigner {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            tokens: Mutex::new(HashMap::new()),
        }
    }

    fn fetch_token(&self, collection: &str) -> ScoutResult<SasToken> {
        let url = format!("{}/{}", self.endpoint, collection);
        debug!("Requesting SAS token for {}", collection);

        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(ScoutError::HttpError(format!(
                "Token request for {} failed: HTTP {}", collection, response.status())));
        }

        Ok(response.json::<SasToken>()?)
    }

    fn token_for(&self, collection: &str) -> ScoutResult<String> {
        let mut tokens = self.tokens.lock()
            .map_err(|_| ScoutError::GenericError("Token cache poisoned".to_string()))?;

        let fresh = tokens.get(collection)
            .filter(|t| t.expiry > Utc::now() + Duration::minutes(EXPIRY_MARGIN_MINUTES))
            .map(|t| t.token.clone());

        match fresh {
            Some(token) => Ok(token),
            None => {
                let token = self.fetch_token(collection)?;
                let value = token.token.clone();
                tokens.insert(collection.to_string(), token);
                Ok(value)
            }
        }
    }
}

impl AssetSigner for PlanetaryComputerSigner {
    fn sign(&self, collection: &str, href: &str) -> ScoutResult<String> {
        if !needs_signature(href) {
            return Ok(href.to_string());
        }

        let token = self.token_for(collection)?;
        Ok(append_token(href, &token))
    }
}

/// Azure blob URLs without an existing signature need one
pub fn needs_signature(href: &str) -> bool {
    match Url::parse(href) {
        Ok(url) => {
            let is_blob = url.host_str()
                .map(|host| host.ends_with(".blob.core.windows.net"))
                .unwrap_or(false);
            let signed = url.query_pairs().any(|(key, _)| key == "sig");
            is_blob && !signed
        },
        Err(_) => false,
    }
}

/// Appends a SAS query string to a URL
pub fn append_token(href: &str, token: &str) -> String {
    let separator = if href.contains('?') { '&' } else { '?' };
    format!("{}{}{}", href, separator, token.trim_start_matches('?'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unsigned_blob_urls_are_signed() {
        assert!(needs_signature("https://sentinel2l2a01.blob.core.windows.net/sentinel2-l2/a/TCI.tif"));
        assert!(!needs_signature("https://sentinel2l2a01.blob.core.windows.net/a/TCI.tif?st=1&sig=abc"));
        assert!(!needs_signature("https://example.com/TCI.tif"));
        assert!(!needs_signature("not a url"));
    }

    #[test]
    fn token_is_appended_as_query() {
        assert_eq!(append_token("https://a.blob.core.windows.net/x.tif", "st=1&sig=z"),
                   "https://a.blob.core.windows.net/x.tif?st=1&sig=z");
        assert_eq!(append_token("https://a.blob.core.windows.net/x.tif?v=2", "?st=1&sig=z"),
                   "https://a.blob.core.windows.net/x.tif?v=2&st=1&sig=z");
    }

    #[test]
    fn token_response_parses() {
        let token: SasToken = serde_json::from_str(
            r#"{"msft:expiry": "2022-09-01T12:00:00Z", "token": "st=2022&se=2022&sig=abc"}"#).unwrap();
        assert_eq!(token.token, "st=2022&se=2022&sig=abc");
        assert_eq!(token.expiry.to_rfc3339(), "2022-09-01T12:00:00+00:00");
    }

    #[test]
    fn noop_signer_returns_href() {
        assert_eq!(NoopSigner.sign("landsat-c2-l2", "https://x/y.tif").unwrap(), "https://x/y.tif");
    }
}
