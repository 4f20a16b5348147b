use std::sync::OnceLock;

use async_trait::async_trait;
use log::info;

use quotesync_core::{Error, Quote, RemoteQuoteSource, Result, SyncConfig};
use quotesync_remote::HttpQuoteSource;

/// HTTP source built on first use, so local-only commands never depend on a
/// valid endpoint.
pub struct LazyRemote {
    config: SyncConfig,
    client: OnceLock<std::result::Result<HttpQuoteSource, String>>,
}

impl LazyRemote {
    pub fn new(config: SyncConfig) -> Self {
        Self {
            config,
            client: OnceLock::new(),
        }
    }

    /// Builds the client now, surfacing a bad endpoint as a config error.
    pub fn client(&self) -> Result<&HttpQuoteSource> {
        self.client
            .get_or_init(|| {
                let client =
                    HttpQuoteSource::from_config(&self.config).map_err(|e| e.to_string())?;
                info!("[QuoteSync] Remote endpoint {}", client.endpoint());
                Ok(client)
            })
            .as_ref()
            .map_err(|msg| Error::config(msg.clone()))
    }
}

#[async_trait]
impl RemoteQuoteSource for LazyRemote {
    async fn fetch_quotes(&self) -> Result<Vec<Quote>> {
        self.client()?.fetch_quotes().await
    }

    async fn push_quote(&self, quote: &Quote) -> Result<()> {
        self.client()?.push_quote(quote).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(endpoint: &str) -> SyncConfig {
        SyncConfig {
            remote_endpoint: endpoint.to_string(),
            ..SyncConfig::default()
        }
    }

    #[test]
    fn construction_does_not_touch_the_endpoint() {
        let remote = LazyRemote::new(config_with("not a url"));
        assert!(remote.client.get().is_none());
    }

    #[tokio::test]
    async fn bad_endpoint_fails_on_first_use_as_config_error() {
        let remote = LazyRemote::new(config_with("not a url"));

        let err = remote.fetch_quotes().await.expect_err("bad endpoint");

        assert_eq!(err.code(), "config_error");
        assert!(remote.client().is_err());
    }

    #[test]
    fn valid_endpoint_builds_once() {
        let remote = LazyRemote::new(config_with("http://127.0.0.1:9/posts"));
        let first = remote.client().expect("client");
        let second = remote.client().expect("client");
        assert!(std::ptr::eq(first, second));
    }
}
