use crate::domain::ports::PageScraper;
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.firecrawl.dev";

/// Firecrawl 風格抓取服務客戶端，回傳頁面的 markdown 表示
pub struct FirecrawlClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirecrawlClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
        }
    }

    /// 改掛到其他端點（測試時指向 mock server）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PageScraper for FirecrawlClient {
    async fn scrape_markdown(&self, url: &str) -> Result<String> {
        let body = json!({
            "url": url,
            "formats": ["markdown"]
        });

        let response = self
            .client
            .post(format!("{}/v1/scrape", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::SourceError {
                url: url.to_string(),
                message: format!("scrape request failed with status {}", status),
            });
        }

        let payload: Value = response.json().await?;
        payload
            .get("data")
            .and_then(|data| data.get("markdown"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ScrapeError::SourceError {
                url: url.to_string(),
                message: "scrape response carried no markdown content".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_scrape_markdown_extracts_payload() {
        let server = MockServer::start();
        let scrape_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/scrape")
                .header("authorization", "Bearer fc-key")
                .json_body_partial(r#"{"url": "https://site.example", "formats": ["markdown"]}"#);
            then.status(200).json_body(serde_json::json!({
                "success": true,
                "data": { "markdown": "# Distributors\n\n- Alpha Corp" }
            }));
        });

        let markdown = FirecrawlClient::new("fc-key")
            .with_base_url(server.base_url())
            .scrape_markdown("https://site.example")
            .await
            .unwrap();

        scrape_mock.assert();
        assert_eq!(markdown, "# Distributors\n\n- Alpha Corp");
    }

    #[tokio::test]
    async fn test_scrape_missing_markdown_is_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/scrape");
            then.status(200)
                .json_body(serde_json::json!({ "success": true, "data": {} }));
        });

        let result = FirecrawlClient::new("fc-key")
            .with_base_url(server.base_url())
            .scrape_markdown("https://site.example")
            .await;

        match result {
            Err(ScrapeError::SourceError { url, .. }) => assert_eq!(url, "https://site.example"),
            other => panic!("expected source error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_scrape_http_failure_is_source_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/scrape");
            then.status(502);
        });

        let result = FirecrawlClient::new("fc-key")
            .with_base_url(server.base_url())
            .scrape_markdown("https://down.example")
            .await;

        assert!(matches!(result, Err(ScrapeError::SourceError { .. })));
    }
}
