use std::env;
use std::path::PathBuf;

use crate::client::{FoodDataClient, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use crate::store::FileStore;

/// Runtime configuration, read from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// FoodData Central API key (`USDA_API_KEY`)
    pub api_key: String,
    /// FoodData Central base URL (`USDA_BASE_URL`)
    pub base_url: String,
    /// Results per search (`USDA_PAGE_SIZE`)
    pub page_size: u32,
    /// Directory of the file store (`CALORIE_LEDGER_DATA_DIR`)
    pub data_dir: PathBuf,
    /// Tracing filter (`RUST_LOG`), handed to `logging::init`
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: "DEMO_KEY".to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank values keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            api_key: get("USDA_API_KEY").unwrap_or(defaults.api_key),
            base_url: get("USDA_BASE_URL").unwrap_or(defaults.base_url),
            page_size: get("USDA_PAGE_SIZE")
                .and_then(|v| v.trim().parse::<u32>().ok())
                .map_or(defaults.page_size, |v| v.clamp(1, 200)),
            data_dir: get("CALORIE_LEDGER_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            log_level: get("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    pub fn client(&self) -> FoodDataClient {
        FoodDataClient::with_base_url(&self.api_key, &self.base_url).page_size(self.page_size)
    }

    pub fn file_store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(env::temp_dir)
        .join("calorie-ledger")
}
