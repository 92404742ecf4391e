use crate::domain::ports::ConfigProvider;
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::Deserialize;
use std::path::Path;

const DEFAULT_OUTPUT_PATH: &str = "./output";
const DEFAULT_OUTPUT_FILE: &str = "scraped_data.csv";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// TOML 工作檔：宣告式描述一次抓取批次
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub job: JobInfo,
    pub input: InputConfig,
    pub extraction: Option<ExtractionConfig>,
    pub load: Option<LoadConfig>,

    #[serde(skip)]
    resolved_output_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    pub text: String,
    pub prompt: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoadConfig {
    pub output_path: Option<String>,
    pub output_file: Option<String>,
}

impl JobConfig {
    /// 從 TOML 檔案載入工作定義
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析；載入時就展開環境變數與檔名樣板
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);

        let mut config: JobConfig =
            toml::from_str(&processed).map_err(|e| ScrapeError::ConfigError {
                message: format!("TOML parsing error: {}", e),
            })?;

        config.resolved_output_file = config.render_output_file();
        Ok(config)
    }

    /// 展開輸出檔名樣板，支援 {job_name} 與 {timestamp}
    fn render_output_file(&self) -> String {
        let pattern = self
            .load
            .as_ref()
            .and_then(|load| load.output_file.clone())
            .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string());

        pattern
            .replace("{job_name}", &self.job.name)
            .replace(
                "{timestamp}",
                &chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string(),
            )
    }
}

/// 替換 ${VAR} 形式的環境變數，未設定的保留原樣
fn substitute_env_vars(content: &str) -> String {
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl ConfigProvider for JobConfig {
    fn input_text(&self) -> &str {
        &self.input.text
    }

    fn prompt(&self) -> &str {
        &self.input.prompt
    }

    fn output_path(&self) -> &str {
        self.load
            .as_ref()
            .and_then(|load| load.output_path.as_deref())
            .unwrap_or(DEFAULT_OUTPUT_PATH)
    }

    fn output_file(&self) -> &str {
        &self.resolved_output_file
    }

    fn model(&self) -> &str {
        self.extraction
            .as_ref()
            .and_then(|extraction| extraction.model.as_deref())
            .unwrap_or(DEFAULT_MODEL)
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;
        validation::validate_non_empty_string("input.text", &self.input.text)?;
        validation::validate_non_empty_string("input.prompt", &self.input.prompt)?;
        validation::validate_path("load.output_path", self.output_path())?;
        validation::validate_file_extensions(
            "load.output_file",
            &[self.output_file().to_string()],
            &["csv"],
        )?;
        Ok(())
    }
}
