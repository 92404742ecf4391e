use crate::domain::model::AggregateTable;
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

/// 一次執行的結果：彙總表加上實際寫出的檔案路徑（若有寫出）
#[derive(Debug, Clone)]
pub struct RunReport {
    pub table: AggregateTable,
    pub output_path: Option<String>,
}

pub struct ScrapeEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> ScrapeEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// 跑完整批次：找 URL → 逐站處理 → 寫出 CSV
    ///
    /// 空批次（找不到 URL 或全數失敗）只記錄警告，不寫檔案；
    /// 呼叫端永遠拿得到（可能為空的）彙總表。
    pub async fn run(&self) -> Result<RunReport> {
        tracing::info!("Extracting websites from text...");
        let urls = self.pipeline.extract().await?;

        if urls.is_empty() {
            tracing::warn!("No websites were found in the text.");
            return Ok(RunReport {
                table: AggregateTable::new(),
                output_path: None,
            });
        }
        tracing::info!("Found {} websites", urls.len());

        let table = self.pipeline.transform(urls).await?;

        if table.is_empty() {
            tracing::warn!("No data was extracted from any website.");
            return Ok(RunReport {
                table,
                output_path: None,
            });
        }

        tracing::info!("Writing {} rows to CSV...", table.row_count());
        let output_path = self.pipeline.load(&table).await?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(RunReport {
            table,
            output_path: Some(output_path),
        })
    }
}
