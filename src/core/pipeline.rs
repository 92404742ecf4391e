use crate::core::flatten::flatten;
use crate::core::merge::merge_into;
use crate::core::normalize::normalize;
use crate::domain::model::{AggregateTable, Normalized, Table};
use crate::domain::ports::{
    ConfigProvider, FieldExtractor, PageScraper, Pipeline, Storage, UrlExtractor,
};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::validate_url;
use serde_json::Value;

/// 標準抓取管道：找出 URL → 逐站抓取抽取 → 彙總 → 輸出 CSV
///
/// 外部協作者（URL 抽取、網頁抓取、欄位抽取）以明確建構的 handle 傳入，
/// 測試時可用替身替換。
pub struct ScrapePipeline<S, C, U, P, F> {
    storage: S,
    config: C,
    url_extractor: U,
    scraper: P,
    field_extractor: F,
}

impl<S, C, U, P, F> ScrapePipeline<S, C, U, P, F>
where
    S: Storage,
    C: ConfigProvider,
    U: UrlExtractor,
    P: PageScraper,
    F: FieldExtractor,
{
    pub fn new(storage: S, config: C, url_extractor: U, scraper: P, field_extractor: F) -> Self {
        Self {
            storage,
            config,
            url_extractor,
            scraper,
            field_extractor,
        }
    }

    /// 處理單一網站：抓取 → 欄位抽取 → 正規化 → 攤平
    ///
    /// 正規化失敗不是錯誤：記錄警告後回傳空表格，該站貢獻零列。
    async fn process_url(&self, url: &str) -> Result<Table> {
        let content = self.scraper.scrape_markdown(url).await?;
        tracing::debug!(
            "Scraped {} characters of markdown from {}",
            content.chars().count(),
            url
        );

        let raw = self
            .field_extractor
            .extract_fields(&content, self.config.prompt())
            .await?;

        match normalize(&Value::String(raw)) {
            Normalized::Records { records, meta } => {
                tracing::debug!(
                    "Normalized {} records from {} (shape: {}, root_key: {:?})",
                    meta.count,
                    url,
                    meta.source_shape,
                    meta.root_key
                );
                Ok(flatten(&records))
            }
            Normalized::Failed { error, original } => {
                tracing::warn!("{} for {}: {}", error, url, original);
                Ok(Table::default())
            }
        }
    }
}

#[async_trait::async_trait]
impl<S, C, U, P, F> Pipeline for ScrapePipeline<S, C, U, P, F>
where
    S: Storage,
    C: ConfigProvider,
    U: UrlExtractor,
    P: PageScraper,
    F: FieldExtractor,
{
    async fn extract(&self) -> Result<Vec<String>> {
        let discovered = self
            .url_extractor
            .extract_urls(self.config.input_text())
            .await?;
        tracing::debug!("URL extractor returned {} candidates", discovered.len());

        let mut urls = Vec::with_capacity(discovered.len());
        for url in discovered {
            match validate_url("discovered_url", &url) {
                Ok(()) => urls.push(url),
                Err(e) => tracing::warn!("Skipping discovered URL '{}': {}", url, e),
            }
        }

        Ok(urls)
    }

    async fn transform(&self, urls: Vec<String>) -> Result<AggregateTable> {
        let total = urls.len();
        let mut aggregate = AggregateTable::new();

        // 逐站循序處理；單站失敗記錄後跳過，不中斷整批
        for (index, url) in urls.iter().enumerate() {
            tracing::info!("Processing website {}/{}: {}", index + 1, total, url);

            match self.process_url(url).await {
                Ok(table) if !table.is_empty() => {
                    tracing::info!("Extracted {} records from {}", table.rows.len(), url);
                    merge_into(&mut aggregate, table, url);
                }
                Ok(_) => tracing::warn!("No data extracted from {}", url),
                Err(e) => tracing::error!("Error processing website {}: {}", url, e),
            }
        }

        Ok(aggregate)
    }

    async fn load(&self, table: &AggregateTable) -> Result<String> {
        let csv_data = to_csv(table)?;

        tracing::debug!(
            "Writing CSV ({} bytes, {} rows) to storage",
            csv_data.len(),
            table.row_count()
        );
        self.storage
            .write_file(self.config.output_file(), &csv_data)
            .await?;

        Ok(format!(
            "{}/{}",
            self.config.output_path(),
            self.config.output_file()
        ))
    }
}

/// 彙總表轉為 UTF-8 CSV：表頭為欄位名，Null 輸出為空儲存格
pub(crate) fn to_csv(table: &AggregateTable) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&table.columns)?;
    for row in &table.rows {
        let cells: Vec<String> = table
            .columns
            .iter()
            .map(|column| cell_text(row.get(column)))
            .collect();
        writer.write_record(&cells)?;
    }

    writer
        .into_inner()
        .map_err(|e| ScrapeError::ProcessingError {
            message: format!("CSV buffer flush failed: {}", e),
        })
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        text: String,
        prompt: String,
    }

    impl MockConfig {
        fn new(text: &str) -> Self {
            Self {
                text: text.to_string(),
                prompt: "extract name and formula".to_string(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_text(&self) -> &str {
            &self.text
        }

        fn prompt(&self) -> &str {
            &self.prompt
        }

        fn output_path(&self) -> &str {
            "test_output"
        }

        fn output_file(&self) -> &str {
            "scraped_data.csv"
        }

        fn model(&self) -> &str {
            "test-model"
        }
    }

    struct StubUrlExtractor {
        urls: Vec<String>,
    }

    #[async_trait]
    impl UrlExtractor for StubUrlExtractor {
        async fn extract_urls(&self, _text: &str) -> Result<Vec<String>> {
            Ok(self.urls.clone())
        }
    }

    /// 依 URL 回傳 markdown；沒登錄的 URL 模擬抓取失敗
    struct StubScraper {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageScraper for StubScraper {
        async fn scrape_markdown(&self, url: &str) -> Result<String> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScrapeError::SourceError {
                    url: url.to_string(),
                    message: "scrape failed".to_string(),
                })
        }
    }

    /// 依頁面內容回傳模型的原始回覆
    struct StubFieldExtractor {
        replies: HashMap<String, String>,
    }

    #[async_trait]
    impl FieldExtractor for StubFieldExtractor {
        async fn extract_fields(&self, content: &str, _prompt: &str) -> Result<String> {
            self.replies
                .get(content)
                .cloned()
                .ok_or_else(|| ScrapeError::ProcessingError {
                    message: "no extraction reply".to_string(),
                })
        }
    }

    fn pipeline_for(
        urls: Vec<&str>,
        pages: Vec<(&str, &str)>,
        replies: Vec<(&str, &str)>,
    ) -> (
        ScrapePipeline<MockStorage, MockConfig, StubUrlExtractor, StubScraper, StubFieldExtractor>,
        MockStorage,
    ) {
        let storage = MockStorage::new();
        let pipeline = ScrapePipeline::new(
            storage.clone(),
            MockConfig::new("see the attached websites"),
            StubUrlExtractor {
                urls: urls.into_iter().map(String::from).collect(),
            },
            StubScraper {
                pages: pages
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
            StubFieldExtractor {
                replies: replies
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            },
        );
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_extract_keeps_only_valid_http_urls() {
        let (pipeline, _) = pipeline_for(
            vec!["https://a.example", "github.com", "ftp://b.example"],
            vec![],
            vec![],
        );

        let urls = pipeline.extract().await.unwrap();

        assert_eq!(urls, vec!["https://a.example"]);
    }

    #[tokio::test]
    async fn test_transform_merges_sources_with_padding() {
        let (pipeline, _) = pipeline_for(
            vec!["https://one.example", "https://two.example"],
            vec![
                ("https://one.example", "# page one"),
                ("https://two.example", "# page two"),
            ],
            vec![
                (
                    "# page one",
                    r#"{"products": [{"Product Name": "Anapoe 20", "Formula": "C26H50O10"}]}"#,
                ),
                ("# page two", r#"{"products": [{"Formula": "C2H6O", "CAS": "64-17-5"}]}"#),
            ],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();

        assert_eq!(table.columns, vec!["product_name", "formula", "source", "cas"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0]["source"], serde_json::json!("https://one.example"));
        assert_eq!(table.rows[0]["cas"], serde_json::json!(null));
        assert_eq!(table.rows[1]["product_name"], serde_json::json!(null));
    }

    #[tokio::test]
    async fn test_transform_skips_failing_url_and_continues() {
        let (pipeline, _) = pipeline_for(
            vec!["https://broken.example", "https://ok.example"],
            // broken.example 沒登錄 → 抓取失敗
            vec![("https://ok.example", "# ok")],
            vec![("# ok", r#"[{"name": "survivor"}]"#)],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["name"], serde_json::json!("survivor"));
        assert_eq!(table.rows[0]["source"], serde_json::json!("https://ok.example"));
    }

    #[tokio::test]
    async fn test_transform_unparseable_reply_contributes_zero_rows() {
        let (pipeline, _) = pipeline_for(
            vec!["https://noisy.example"],
            vec![("https://noisy.example", "# noisy")],
            vec![("# noisy", "sorry, I could not find any structured data")],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();

        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_transform_all_sources_failing_yields_empty_aggregate() {
        let (pipeline, _) = pipeline_for(
            vec!["https://one.example", "https://two.example"],
            vec![],
            vec![],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();

        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_load_writes_csv_with_header_and_empty_cells() {
        let (pipeline, storage) = pipeline_for(
            vec!["https://one.example"],
            vec![("https://one.example", "# page one")],
            vec![("# page one", r#"[{"name": "A", "qty": 3}, {"name": "B"}]"#)],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();
        let output_path = pipeline.load(&table).await.unwrap();

        assert_eq!(output_path, "test_output/scraped_data.csv");

        let written = storage.get_file("scraped_data.csv").await.unwrap();
        let text = String::from_utf8(written).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "name,qty,source");
        assert_eq!(lines[1], "A,3,https://one.example");
        assert_eq!(lines[2], "B,,https://one.example");
    }

    #[tokio::test]
    async fn test_fenced_reply_is_recovered() {
        let (pipeline, _) = pipeline_for(
            vec!["https://fenced.example"],
            vec![("https://fenced.example", "# fenced")],
            vec![("# fenced", "```json\n{\"items\": [{\"name\": \"X\"}]}\n```")],
        );

        let urls = pipeline.extract().await.unwrap();
        let table = pipeline.transform(urls).await.unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0]["name"], serde_json::json!("X"));
    }
}
