use crate::domain::model::AggregateTable;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_text(&self) -> &str;
    fn prompt(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_file(&self) -> &str;
    fn model(&self) -> &str;
}

/// 從自由文字找出要處理的網站 URL
#[async_trait]
pub trait UrlExtractor: Send + Sync {
    async fn extract_urls(&self, text: &str) -> Result<Vec<String>>;
}

/// 抓取單一網頁，回傳 markdown 內容
#[async_trait]
pub trait PageScraper: Send + Sync {
    async fn scrape_markdown(&self, url: &str) -> Result<String>;
}

/// 依提示詞從網頁內容抽取欄位，回傳原始（可能不合法的）JSON 文字
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract_fields(&self, content: &str, prompt: &str) -> Result<String>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<String>>;
    async fn transform(&self, urls: Vec<String>) -> Result<AggregateTable>;
    async fn load(&self, table: &AggregateTable) -> Result<String>;
}
