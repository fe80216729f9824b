#[cfg(feature = "cli")]
pub mod cli;

use crate::core::invoker::TransportSettings;
use crate::core::rate_limiter::DEFAULT_CALLS_PER_MINUTE;
use crate::domain::model::Operation;
use crate::utils::error::{BrtError, Result};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{
    validate_language, validate_path, validate_range, validate_url, Validate,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

const BRT_BASE: &str = "https://wsr.brt.it:10052/web";

/// Per-minute ceiling that keeps us under BRT's 18,000 calls per hour.
pub const MAX_CALLS_PER_MINUTE: u32 = 300;

fn service_path(op: Operation) -> String {
    format!("{}/{}Service/{}", BRT_BASE, op.rpc_name(), op.rpc_name())
}

fn default_definitions() -> HashMap<String, String> {
    Operation::ALL
        .iter()
        .map(|op| (op.key().to_string(), format!("{}?wsdl", service_path(*op))))
        .collect()
}

fn default_locations() -> HashMap<String, String> {
    Operation::ALL
        .iter()
        .map(|op| (op.key().to_string(), service_path(*op)))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrtConfig {
    pub client_id: Option<String>,
    pub language: String,
    pub timeout_seconds: u64,
    pub throttle_per_minute: u32,
    pub cache_wsdl_locally: bool,
    pub wsdl_cache_path: String,
    pub https_only: bool,
    pub retry: RetryConfig,
    pub wsdl: HashMap<String, String>,
    pub locations: HashMap<String, String>,
    pub logging: LoggingConfig,
}

/// Retries are the caller's business; these values only feed the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub times: u32,
    pub delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for BrtConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            language: "en".to_string(),
            timeout_seconds: 10,
            throttle_per_minute: DEFAULT_CALLS_PER_MINUTE,
            cache_wsdl_locally: true,
            wsdl_cache_path: "storage/app/brt/wsdl".to_string(),
            https_only: true,
            retry: RetryConfig::default(),
            wsdl: default_definitions(),
            locations: default_locations(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            times: 3,
            delay_ms: 400,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl BrtConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| BrtError::ConfigParse {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BRT_CLIENT_ID})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        use std::sync::OnceLock;

        static ENV_VAR: OnceLock<Regex> = OnceLock::new();
        let re = ENV_VAR.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 套用 BRT_* 環境變數
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(client_id) = std::env::var("BRT_CLIENT_ID") {
            self.client_id = Some(client_id);
        }
        if let Ok(lang) = std::env::var("BRT_LANG") {
            self.language = lang;
        }
        if let Ok(limit) = std::env::var("BRT_THROTTLE_PER_MINUTE") {
            self.throttle_per_minute =
                limit
                    .trim()
                    .parse()
                    .map_err(|_| BrtError::InvalidConfigValue {
                        field: "BRT_THROTTLE_PER_MINUTE".to_string(),
                        value: limit.clone(),
                        reason: "Expected a positive integer".to_string(),
                    })?;
        }
        Ok(self)
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validate_language("language", &self.language)?;
        validate_range("timeout_seconds", self.timeout_seconds, 1, 300)?;
        validate_range(
            "throttle_per_minute",
            self.throttle_per_minute,
            1,
            MAX_CALLS_PER_MINUTE,
        )?;

        if self.cache_wsdl_locally {
            validate_path("wsdl_cache_path", &self.wsdl_cache_path)?;
        }

        for (key, url) in &self.wsdl {
            validate_url(&format!("wsdl.{}", key), url)?;
        }

        for (key, address) in &self.locations {
            validate_url(&format!("locations.{}", key), address)?;
            if !self.wsdl.contains_key(key) {
                return Err(BrtError::InvalidConfigValue {
                    field: format!("locations.{}", key),
                    value: address.clone(),
                    reason: "No matching entry under [wsdl]".to_string(),
                });
            }
        }

        if LogFormat::parse(&self.logging.format).is_none() {
            return Err(BrtError::InvalidConfigValue {
                field: "logging.format".to_string(),
                value: self.logging.format.clone(),
                reason: "Valid formats: compact, json".to_string(),
            });
        }

        Ok(())
    }

    /// 取得連線設定
    pub fn transport_settings(&self) -> TransportSettings {
        TransportSettings {
            timeout: Duration::from_secs(self.timeout_seconds),
            https_only: self.https_only,
        }
    }

    /// 所有 WSDL 來源，依 key 排序
    pub fn definition_urls(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.wsdl.keys().collect();
        keys.sort();
        keys.into_iter().map(|k| self.wsdl[k].clone()).collect()
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.logging.format).unwrap_or_default()
    }
}

impl Validate for BrtConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
