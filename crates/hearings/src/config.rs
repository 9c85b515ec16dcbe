use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUT_DIR: &str = "data";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where the page fetcher looks for each chamber's schedule.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub house_url: Option<String>,
    pub senate_url: Option<String>,
    /// Upstream week selector, passed to the House API as `week=<value>`.
    pub week: Option<String>,
    pub timeout: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            house_url: None,
            senate_url: None,
            week: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ScraperConfig {
    pub fn validate(self) -> Result<Self, String> {
        for (name, url) in [("House", &self.house_url), ("Senate", &self.senate_url)] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(format!("{name} URL must be http(s), got '{url}'"));
            }
        }
        if self.week.as_deref().is_some_and(|w| w.trim().is_empty()) {
            return Err("Week must not be empty".to_string());
        }
        if self.timeout.is_zero() {
            return Err("Timeout must be greater than 0".to_string());
        }
        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub out_dir: PathBuf,
    /// Year assumed for date labels that carry none; the current year when unset.
    pub fallback_year: Option<i32>,
    pub keep_raw: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from(DEFAULT_OUT_DIR),
            fallback_year: None,
            keep_raw: false,
        }
    }
}

impl PipelineConfig {
    pub fn validate(self) -> Result<Self, String> {
        if let Some(year) = self.fallback_year
            && !(1900..=2200).contains(&year)
        {
            return Err(format!("Fallback year {year} is out of range"));
        }
        if self.out_dir.as_os_str().is_empty() {
            return Err("Output directory must not be empty".to_string());
        }
        Ok(self)
    }
}
