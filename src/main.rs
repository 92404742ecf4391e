use anyhow::Context;
use clap::Parser;
use scrape_etl::clients::{FirecrawlClient, OpenAiClient};
use scrape_etl::config::job::JobConfig;
use scrape_etl::domain::ports::ConfigProvider;
use scrape_etl::utils::{logger, validation::Validate};
use scrape_etl::{CliConfig, LocalStorage, ScrapeEngine, ScrapePipeline};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(cli.verbose);

    tracing::info!("🚀 Starting scrape-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    if let Some(job_path) = cli.job.clone() {
        tracing::info!("📁 Loading job file: {}", job_path);
        let job = JobConfig::from_file(&job_path)
            .with_context(|| format!("failed to load job file '{}'", job_path))?;
        run(job).await
    } else {
        run(cli).await
    }
}

async fn run<C: ConfigProvider + Validate>(config: C) -> anyhow::Result<()> {
    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let openai_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY is not set")?;
    let firecrawl_key =
        std::env::var("FIRECRAWL_API_KEY").context("FIRECRAWL_API_KEY is not set")?;

    // 明確建構協作者 handle 與管道
    let storage = LocalStorage::new(config.output_path().to_string());
    let url_extractor = OpenAiClient::new(openai_key.clone(), config.model());
    let field_extractor = OpenAiClient::new(openai_key, config.model());
    let scraper = FirecrawlClient::new(firecrawl_key);

    let pipeline = ScrapePipeline::new(storage, config, url_extractor, scraper, field_extractor);
    let engine = ScrapeEngine::new(pipeline);

    let report = engine.run().await?;

    match report.output_path {
        Some(path) => {
            tracing::info!("✅ Scraping completed successfully!");
            println!("✅ Scraping completed successfully!");
            println!("📁 {} rows saved to: {}", report.table.row_count(), path);
        }
        None => {
            println!("⚠️ No data was extracted; nothing was written.");
        }
    }

    Ok(())
}
