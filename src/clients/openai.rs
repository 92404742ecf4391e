use crate::domain::ports::{FieldExtractor, UrlExtractor};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI 風格 chat-completions 客戶端
///
/// 同一個 handle 擔任兩個協作者角色：從輸入文字抽取 URL（帶 JSON schema
/// 的結構化回覆），以及依提示詞從網頁內容抽取欄位（回傳原始文字）。
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct WebsiteInfo {
    urls: Vec<String>,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// 改掛到其他端點（測試時指向 mock server）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn chat(&self, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScrapeError::ProcessingError {
                message: format!("chat completion failed with status {}: {}", status, detail),
            });
        }

        Ok(response.json().await?)
    }
}

fn message_content(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
}

fn message_refusal(payload: &Value) -> Option<&str> {
    payload
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("refusal")?
        .as_str()
}

#[async_trait]
impl UrlExtractor for OpenAiClient {
    async fn extract_urls(&self, text: &str) -> Result<Vec<String>> {
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant specialized in extracting URLs and websites from text."
                },
                {
                    "role": "user",
                    "content": format!("Extract all websites from this text:\n\n{}", text)
                }
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "website_info",
                    "schema": {
                        "type": "object",
                        "properties": {
                            "urls": {
                                "type": "array",
                                "items": { "type": "string" },
                                "description": "A list of URLs"
                            }
                        },
                        "required": ["urls"],
                        "additionalProperties": false
                    },
                    "strict": true
                }
            }
        });

        let payload = self.chat(body).await?;

        // 模型拒答不是錯誤，當作沒找到任何 URL
        if let Some(refusal) = message_refusal(&payload) {
            tracing::warn!("URL extraction refused by model: {}", refusal);
            return Ok(Vec::new());
        }

        let content = message_content(&payload).ok_or_else(|| ScrapeError::ProcessingError {
            message: "chat completion response carried no message content".to_string(),
        })?;
        let info: WebsiteInfo = serde_json::from_str(content)?;

        Ok(info.urls)
    }
}

#[async_trait]
impl FieldExtractor for OpenAiClient {
    async fn extract_fields(&self, content: &str, prompt: &str) -> Result<String> {
        let user_message = format!(
            "{}\n------------\ntext:\n{}\n\n-------------------------\n* Only return json format\n-------------------------",
            prompt, content
        );
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a helpful assistant specialized in extracting info from text and return in json format"
                },
                { "role": "user", "content": user_message }
            ]
        });

        let payload = self.chat(body).await?;
        let reply = message_content(&payload).ok_or_else(|| ScrapeError::ProcessingError {
            message: "chat completion response carried no message content".to_string(),
        })?;

        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> OpenAiClient {
        OpenAiClient::new("test-key", "test-model").with_base_url(server.base_url())
    }

    #[tokio::test]
    async fn test_extract_urls_parses_structured_reply() {
        let server = MockServer::start();
        let chat_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer test-key");
            then.status(200).json_body(serde_json::json!({
                "choices": [{
                    "message": {
                        "content": "{\"urls\": [\"https://a.example\", \"https://b.example\"]}"
                    }
                }]
            }));
        });

        let urls = client_for(&server)
            .extract_urls("check https://a.example and https://b.example")
            .await
            .unwrap();

        chat_mock.assert();
        assert_eq!(urls, vec!["https://a.example", "https://b.example"]);
    }

    #[tokio::test]
    async fn test_extract_urls_refusal_yields_empty_list() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{
                    "message": { "refusal": "I cannot help with that." }
                }]
            }));
        });

        let urls = client_for(&server).extract_urls("some text").await.unwrap();

        assert!(urls.is_empty());
    }

    #[tokio::test]
    async fn test_extract_fields_returns_raw_content() {
        let server = MockServer::start();
        let chat_mock = server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(serde_json::json!({
                "choices": [{
                    "message": { "content": "```json\n{\"name\": \"A\"}\n```" }
                }]
            }));
        });

        let reply = client_for(&server)
            .extract_fields("# page content", "extract the product name")
            .await
            .unwrap();

        chat_mock.assert();
        assert_eq!(reply, "```json\n{\"name\": \"A\"}\n```");
    }

    #[tokio::test]
    async fn test_chat_error_status_is_propagated() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(429).body("quota exceeded");
        });

        let result = client_for(&server).extract_urls("some text").await;

        assert!(result.is_err());
    }
}
