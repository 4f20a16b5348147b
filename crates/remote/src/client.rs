//! HTTP client for the remote quote endpoint.
//!
//! GET returns a JSON array of posts whose `title` becomes the quote text;
//! POST submits one `{text, category}` record.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};

use quotesync_core::config::DEFAULT_REQUEST_TIMEOUT_SECS;
use quotesync_core::{Quote, RemoteQuoteSource, SyncConfig};

use crate::error::{RemoteError, Result};
use crate::types::{PushQuoteRequest, RemotePost};

const MAX_LOG_BODY_CHARS: usize = 512;

/// Maps a GET response body into quotes tagged with the placeholder category.
///
/// Items without a usable title are skipped.
pub fn map_remote_posts(body: &str) -> Result<Vec<Quote>> {
    let posts: Vec<RemotePost> = serde_json::from_str(body)?;
    let total = posts.len();
    let quotes: Vec<Quote> = posts
        .into_iter()
        .filter_map(|post| {
            let Some(title) = post.title else {
                debug!("[RemoteQuotes] Skipping post {:?} without a title", post.id);
                return None;
            };
            match Quote::from_remote(title) {
                Ok(quote) => Some(quote),
                Err(_) => {
                    debug!("[RemoteQuotes] Skipping post {:?} with blank title", post.id);
                    None
                }
            }
        })
        .collect();
    if quotes.len() < total {
        debug!(
            "[RemoteQuotes] Mapped {} of {} posts into quotes",
            quotes.len(),
            total
        );
    }
    Ok(quotes)
}

/// Remote quote source reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpQuoteSource {
    client: reqwest::Client,
    endpoint: reqwest::Url,
}

impl HttpQuoteSource {
    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("[RemoteQuotes] Response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("[RemoteQuotes] Response error ({}): {}", status, preview);
    }

    /// Create a client for `endpoint` with the default timeout.
    pub fn new(endpoint: &str) -> Result<Self> {
        Self::with_timeout(endpoint, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(endpoint: &str, timeout: Duration) -> Result<Self> {
        let endpoint = reqwest::Url::parse(endpoint.trim()).map_err(|e| {
            RemoteError::invalid_request(format!("invalid endpoint '{endpoint}': {e}"))
        })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::with_timeout(&config.remote_endpoint, config.request_timeout)
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    /// GET the endpoint and map its posts into quotes.
    pub async fn fetch_posts(&self) -> Result<Vec<Quote>> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let body = Self::read_body(response).await?;
        let quotes = map_remote_posts(&body)?;
        debug!("[RemoteQuotes] Fetched {} quotes", quotes.len());
        Ok(quotes)
    }

    /// POST one quote as `{text, category}`.
    pub async fn post_quote(&self, quote: &Quote) -> Result<()> {
        let request = PushQuoteRequest {
            text: &quote.text,
            category: &quote.category,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_vec(&request)?)
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        debug!(
            "[RemoteQuotes] Quote accepted by remote: {}",
            body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>()
        );
        Ok(())
    }

    /// Read the response body, turning non-success statuses into API errors.
    async fn read_body(response: reqwest::Response) -> Result<String> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            let preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
            return Err(RemoteError::api(
                status.as_u16(),
                format!("Request failed: {}", preview),
            ));
        }
        Ok(body)
    }
}

#[async_trait]
impl RemoteQuoteSource for HttpQuoteSource {
    async fn fetch_quotes(&self) -> quotesync_core::Result<Vec<Quote>> {
        self.fetch_posts().await.map_err(|err| {
            debug!(
                "[RemoteQuotes] Fetch failed retry_class={:?}: {}",
                err.retry_class(),
                err
            );
            err.into()
        })
    }

    async fn push_quote(&self, quote: &Quote) -> quotesync_core::Result<()> {
        self.post_quote(quote).await.map_err(|err| {
            debug!(
                "[RemoteQuotes] Push failed retry_class={:?}: {}",
                err.retry_class(),
                err
            );
            err.into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotesync_core::PLACEHOLDER_CATEGORY;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    fn find_header_end(buf: &[u8]) -> Option<usize> {
        buf.windows(4).position(|w| w == b"\r\n\r\n")
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.expect("read request");
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(header_end) = find_header_end(&buf) {
                let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Serves one canned response and hands back the raw request it received.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
            request
        });
        (format!("http://{addr}/posts"), handle)
    }

    #[test]
    fn maps_titles_and_skips_missing_null_or_blank_ones() {
        let body = r#"[
            {"userId": 1, "id": 1, "title": "sunt aut facere", "body": "..."},
            {"userId": 1, "id": 2, "title": "   "},
            {"userId": 1, "id": 3},
            {"userId": 1, "id": 4, "title": "qui est esse"},
            {"userId": 1, "id": 5, "title": null}
        ]"#;
        let quotes = map_remote_posts(body).expect("map posts");
        let texts: Vec<&str> = quotes.iter().map(|q| q.text.as_str()).collect();
        assert_eq!(texts, vec!["sunt aut facere", "qui est esse"]);
        assert!(quotes.iter().all(|q| q.category == PLACEHOLDER_CATEGORY));
    }

    #[test]
    fn non_array_body_is_a_json_error() {
        let err = map_remote_posts(r#"{"title": "single"}"#).expect_err("object body");
        assert!(matches!(err, RemoteError::Json(_)));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let err = HttpQuoteSource::new("not a url").expect_err("invalid endpoint");
        assert!(matches!(err, RemoteError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn fetch_maps_remote_posts() {
        let (url, server) = serve_once("200 OK", r#"[{"id": 1, "title": "Keep going"}]"#).await;
        let source = HttpQuoteSource::new(&url).expect("client");

        let quotes = source.fetch_quotes().await.expect("fetch");

        assert_eq!(quotes, vec![Quote::from_remote("Keep going").expect("quote")]);
        let request = server.await.expect("server task");
        assert!(request.starts_with("GET /posts HTTP/1.1"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_parse_failure() {
        let (url, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let source = HttpQuoteSource::new(&url).expect("client");

        let err = source.fetch_quotes().await.expect_err("malformed body");

        assert_eq!(err.code(), "parse_failure");
    }

    #[tokio::test]
    async fn server_error_is_a_transport_failure() {
        let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#).await;
        let source = HttpQuoteSource::new(&url).expect("client");

        let err = source.fetch_posts().await.expect_err("server error");

        assert_eq!(err.status_code(), Some(500));
        assert_eq!(err.retry_class(), crate::error::RetryClass::Retryable);
        let core: quotesync_core::Error = err.into();
        assert_eq!(core.code(), "transport_failure");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        let source =
            HttpQuoteSource::with_timeout(&format!("http://{addr}/posts"), Duration::from_secs(5))
                .expect("client");

        let err = source.fetch_quotes().await.expect_err("connection refused");

        assert_eq!(err.code(), "transport_failure");
    }

    #[tokio::test]
    async fn push_posts_json_body() {
        let (url, server) = serve_once("201 Created", r#"{"id": 101}"#).await;
        let source = HttpQuoteSource::new(&url).expect("client");
        let quote = Quote::new("Keep going", "Motivation").expect("quote");

        source.push_quote(&quote).await.expect("push");

        let request = server.await.expect("server task");
        let lowered = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /posts HTTP/1.1"));
        assert!(lowered.contains("content-type: application/json"));
        assert!(request.ends_with(r#"{"text":"Keep going","category":"Motivation"}"#));
    }

    #[tokio::test]
    async fn rejected_push_is_a_transport_failure() {
        let (url, _server) = serve_once("400 Bad Request", r#"{"error":"nope"}"#).await;
        let source = HttpQuoteSource::new(&url).expect("client");
        let quote = Quote::new("Keep going", "Motivation").expect("quote");

        let err = source.push_quote(&quote).await.expect_err("rejected");

        assert_eq!(err.code(), "transport_failure");
    }
}
