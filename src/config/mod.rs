pub mod cli;
pub mod job;

use crate::domain::ports::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "scrape-etl")]
#[command(about = "Extract URLs from free text, scrape them and export structured fields to CSV")]
pub struct CliConfig {
    /// Free text containing the website URLs to process
    #[arg(long, default_value = "")]
    pub text: String,

    /// Natural-language instruction describing which fields to pull out
    #[arg(long, default_value = "extract product name and molecular formula")]
    pub prompt: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, default_value = "scraped_data.csv")]
    pub output_file: String,

    #[arg(long, default_value = "gpt-4o-mini")]
    pub model: String,

    /// Run a TOML job file instead of the flags above
    #[arg(long)]
    pub job: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn input_text(&self) -> &str {
        &self.text
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn model(&self) -> &str {
        &self.model
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("text", &self.text)?;
        validation::validate_non_empty_string("prompt", &self.prompt)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_file_extensions(
            "output_file",
            &[self.output_file.clone()],
            &["csv"],
        )?;
        Ok(())
    }
}
