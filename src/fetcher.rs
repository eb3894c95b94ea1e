use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;
use crate::types::{json_kind, Item, Page};

/// Issues exactly one request per call. No caching and no retries; the
/// caller decides what to do with a failure.
#[async_trait]
pub trait PageFetcher: Send + Sync + std::fmt::Debug {
    /// `page` and `page_size` are both at least 1.
    async fn fetch(&self, page: u32, page_size: u32) -> Result<Page<Item>, FetchError>;
}

/// Fetches pages from a JSON collection endpoint via
/// `GET {endpoint}?page={page}&pageSize={page_size}`.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    endpoint: String,
}

impl HttpFetcher {
    pub fn new(endpoint: String, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, page: u32, page_size: u32) -> Result<Page<Item>, FetchError> {
        debug_assert!(page >= 1 && page_size >= 1);
        debug!(endpoint = %self.endpoint, page, page_size, "fetching page");

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("page", page), ("pageSize", page_size)])
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(FetchError::Network(format!("HTTP {}: {}", status, text)));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let page = parse_page(page, &body)?;
        if page.len() > page_size as usize {
            return Err(FetchError::MalformedResponse(format!(
                "page {} has {} records, more than the page size {}",
                page.number,
                page.len(),
                page_size
            )));
        }
        Ok(page)
    }
}

/// Decode a response body: either a bare array of records or an object with
/// a `data` field. A `data` object instead of an array is a one-item page.
pub fn parse_page(number: u32, body: &str) -> Result<Page<Item>, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let records = match value {
        Value::Array(records) => records,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(records)) => records,
            Some(record @ Value::Object(_)) => vec![record],
            Some(other) => {
                return Err(FetchError::MalformedResponse(format!(
                    "`data` is {}",
                    json_kind(&other)
                )))
            }
            None => {
                return Err(FetchError::MalformedResponse(
                    "object body without `data` field".to_string(),
                ))
            }
        },
        other => {
            return Err(FetchError::MalformedResponse(format!(
                "expected an array or an object, got {}",
                json_kind(&other)
            )))
        }
    };

    let items = records
        .into_iter()
        .map(Item::from_record)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Page::new(number, items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[test]
    fn bare_array_body() {
        let page = parse_page(1, r#"[{"id": 1, "name": "a"}, {"id": 2, "name": "b"}]"#).unwrap();
        assert_eq!(page.number, 1);
        assert_eq!(page.len(), 2);
        assert_eq!(page.items[1].name, "b");
    }

    #[test]
    fn data_envelope_body() {
        let body = r#"{
            "info": {"count": 2, "totalPages": 372, "nextPage": "https://api.disneyapi.dev/character?page=2&pageSize=2"},
            "data": [
                {"_id": 6, "name": "'Olu Mel", "films": [], "tvShows": []},
                {"_id": 10, "name": ".GIFfany", "tvShows": ["Gravity Falls"]}
            ]
        }"#;
        let page = parse_page(1, body).unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page.items[0].id.to_string(), "6");
        assert_eq!(page.items[1].list_field("tvShows"), vec!["Gravity Falls"]);
    }

    #[test]
    fn single_object_data_is_one_item_page() {
        let page = parse_page(7, r#"{"data": {"_id": 4703, "name": "Mickey Mouse"}}"#).unwrap();
        assert_eq!(page.number, 7);
        assert_eq!(page.len(), 1);
        assert_eq!(page.items[0].name, "Mickey Mouse");
    }

    #[test]
    fn empty_array_is_end_of_data() {
        let page = parse_page(40, r#"{"data": []}"#).unwrap();
        assert!(page.items.is_empty());
    }

    #[test]
    fn null_data_is_malformed() {
        let err = parse_page(1, r#"{"data": null}"#).unwrap_err();
        assert_eq!(err, FetchError::MalformedResponse("`data` is null".to_string()));
    }

    #[test]
    fn missing_data_is_malformed() {
        let err = parse_page(1, r#"{"items": []}"#).unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        let err = parse_page(1, "<html>502 Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[test]
    fn one_bad_record_fails_the_page() {
        let err = parse_page(1, r#"[{"id": 1}, {"name": "no id"}]"#).unwrap_err();
        assert_eq!(
            err,
            FetchError::MalformedResponse("record has no id".to_string())
        );
    }

    #[test]
    fn timeout_is_optional() {
        let fetcher = HttpFetcher::new("http://localhost/items".to_string(), None).unwrap();
        assert_eq!(fetcher.endpoint(), "http://localhost/items");
        assert!(HttpFetcher::new(
            "http://localhost/items".to_string(),
            Some(Duration::from_secs(5))
        )
        .is_ok());
    }

    /// Answer one HTTP request with `status` and `body`; the task resolves
    /// to the request line it received.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });
        (format!("http://{}/character", addr), task)
    }

    #[tokio::test]
    async fn one_get_with_page_and_page_size() {
        let (endpoint, server) =
            serve_once("200 OK", r#"{"data": [{"_id": 112, "name": "Abu"}]}"#).await;
        let fetcher = HttpFetcher::new(endpoint, Some(Duration::from_secs(5))).unwrap();

        let page = fetcher.fetch(3, 20).await.unwrap();
        assert_eq!(page.number, 3);
        assert_eq!(page.items[0].name, "Abu");
        assert_eq!(
            server.await.unwrap(),
            "GET /character?page=3&pageSize=20 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn error_status_is_network_error() {
        let (endpoint, server) = serve_once("503 Service Unavailable", "busy").await;
        let fetcher = HttpFetcher::new(endpoint, Some(Duration::from_secs(5))).unwrap();

        let err = fetcher.fetch(1, 20).await.unwrap_err();
        assert_eq!(
            err,
            FetchError::Network("HTTP 503 Service Unavailable: busy".to_string())
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn oversized_page_is_malformed() {
        let (endpoint, server) =
            serve_once("200 OK", r#"[{"id": 1}, {"id": 2}, {"id": 3}]"#).await;
        let fetcher = HttpFetcher::new(endpoint, Some(Duration::from_secs(5))).unwrap();

        let err = fetcher.fetch(1, 2).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
        server.await.unwrap();
    }
}
