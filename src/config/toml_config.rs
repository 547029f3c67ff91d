use crate::adapters::gemini::{DEFAULT_GEMINI_MODELS, GEMINI_BASE_URL};
use crate::adapters::groq::{DEFAULT_GROQ_MODELS, GROQ_BASE_URL};
use crate::utils::error::{Result, ScribeError};
use crate::utils::validation::{validate_non_empty_list, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

pub const GROQ_API_KEY_ENV: &str = "GROQ_API_KEY";
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
pub const TIMEOUT_ENV: &str = "MEDSCRIBE_GENERATION_TIMEOUT_SECS";

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

static ENV_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env placeholder pattern is valid"));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MedscribeConfig {
    pub provider: ProviderConfig,
    pub generation: GenerationSettings,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub groq_base_url: Option<String>,
    pub gemini_base_url: Option<String>,
    pub groq_models: Option<Vec<String>>,
    pub gemini_models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub json: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderChoice {
    Groq,
    Gemini,
}

/// 空白或未替換的 `${VAR}` 視為未設定
fn present(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !ENV_PLACEHOLDER.is_match(v))
}

fn owned_list(defaults: &[&str]) -> Vec<String> {
    defaults.iter().map(|m| m.to_string()).collect()
}

impl ProviderConfig {
    /// 只會啟用一個 provider：有 Groq key 用 Groq，否則用 Gemini，兩者之間不互相備援
    pub fn select(&self) -> Result<ProviderChoice> {
        if present(&self.groq_api_key).is_some() {
            Ok(ProviderChoice::Groq)
        } else if present(&self.gemini_api_key).is_some() {
            Ok(ProviderChoice::Gemini)
        } else {
            Err(ScribeError::config(
                "Set either GROQ_API_KEY (recommended, free tier) or GEMINI_API_KEY",
            ))
        }
    }

    pub fn groq_api_key(&self) -> &str {
        present(&self.groq_api_key).unwrap_or_default()
    }

    pub fn gemini_api_key(&self) -> &str {
        present(&self.gemini_api_key).unwrap_or_default()
    }

    pub fn groq_base_url(&self) -> &str {
        self.groq_base_url.as_deref().unwrap_or(GROQ_BASE_URL)
    }

    pub fn gemini_base_url(&self) -> &str {
        self.gemini_base_url.as_deref().unwrap_or(GEMINI_BASE_URL)
    }

    pub fn groq_models(&self) -> Vec<String> {
        self.groq_models
            .clone()
            .unwrap_or_else(|| owned_list(DEFAULT_GROQ_MODELS))
    }

    pub fn gemini_models(&self) -> Vec<String> {
        self.gemini_models
            .clone()
            .unwrap_or_else(|| owned_list(DEFAULT_GEMINI_MODELS))
    }
}

impl MedscribeConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = Self::substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| ScribeError::InvalidConfigValueError {
            field: "toml".to_string(),
            value: String::new(),
            reason: format!("TOML parsing error: {}", e),
        })
    }

    /// 只用環境變數建立配置
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// 先讀設定檔 (若有)，再以環境變數補上未設定的欄位，最後驗證
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        if present(&self.provider.groq_api_key).is_none() {
            self.provider.groq_api_key = std::env::var(GROQ_API_KEY_ENV).ok();
        }
        if present(&self.provider.gemini_api_key).is_none() {
            self.provider.gemini_api_key = std::env::var(GEMINI_API_KEY_ENV).ok();
        }
        if self.generation.timeout_seconds.is_none() {
            if let Ok(raw) = std::env::var(TIMEOUT_ENV) {
                let seconds = raw.trim().parse::<u64>().map_err(|e| {
                    ScribeError::InvalidConfigValueError {
                        field: TIMEOUT_ENV.to_string(),
                        value: raw.clone(),
                        reason: e.to_string(),
                    }
                })?;
                self.generation.timeout_seconds = Some(seconds);
            }
        }
        Ok(self)
    }

    /// 替換環境變數 (例如 ${GROQ_API_KEY})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> String {
        ENV_PLACEHOLDER
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation.timeout_seconds.map(Duration::from_secs)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.level.as_deref()
    }

    pub fn json_logs(&self) -> bool {
        self.logging.json.unwrap_or(false)
    }

    /// 健康檢查用：provider 金鑰是否已設定
    pub fn provider_status(&self) -> &'static str {
        match self.provider.select() {
            Ok(_) => "configured",
            Err(_) => "not_configured",
        }
    }
}

impl Validate for MedscribeConfig {
    fn validate(&self) -> Result<()> {
        if let Some(url) = &self.provider.groq_base_url {
            validate_url("provider.groq_base_url", url)?;
        }
        if let Some(url) = &self.provider.gemini_base_url {
            validate_url("provider.gemini_base_url", url)?;
        }
        if let Some(models) = &self.provider.groq_models {
            validate_non_empty_list("provider.groq_models", models)?;
        }
        if let Some(models) = &self.provider.gemini_models {
            validate_non_empty_list("provider.gemini_models", models)?;
        }
        if let Some(seconds) = self.generation.timeout_seconds {
            validate_range("generation.timeout_seconds", seconds, 1, 600)?;
        }
        if let Some(level) = &self.logging.level {
            if !LOG_LEVELS.contains(&level.as_str()) {
                return Err(ScribeError::InvalidConfigValueError {
                    field: "logging.level".to_string(),
                    value: level.clone(),
                    reason: format!("Valid levels: {}", LOG_LEVELS.join(", ")),
                });
            }
        }
        Ok(())
    }
}
