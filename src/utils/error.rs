use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribeError {
    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Rate limit exceeded, retry after {}s", .retry_after.as_secs())]
    RateLimited { retry_after: Duration },

    #[error("Role '{role}' is not allowed to {action}")]
    Forbidden { role: String, action: String },

    #[error("{provider} request failed{}: {reason}", .model.as_deref().map(|m| format!(" (model {m})")).unwrap_or_default())]
    ProviderFatal {
        provider: String,
        model: Option<String>,
        reason: String,
    },

    #[error("{provider}: all {attempts} models failed, last error: {last_reason}")]
    GenerationExhausted {
        provider: String,
        attempts: usize,
        last_reason: String,
        quota_exceeded: bool,
    },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Throttling,
    Access,
    Provider,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScribeError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ValidationError { .. } => ErrorCategory::Input,
            Self::RateLimited { .. } => ErrorCategory::Throttling,
            Self::Forbidden { .. } => ErrorCategory::Access,
            Self::ProviderFatal { .. } | Self::GenerationExhausted { .. } => {
                ErrorCategory::Provider
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Throttling => ErrorSeverity::Low,
            ErrorCategory::Input | ErrorCategory::Access => ErrorSeverity::Medium,
            ErrorCategory::Provider => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給上層 HTTP 層使用的狀態碼
    pub fn http_status(&self) -> u16 {
        match self.category() {
            ErrorCategory::Input => 400,
            ErrorCategory::Throttling => 429,
            ErrorCategory::Access => 403,
            ErrorCategory::Provider => 502,
            ErrorCategory::Configuration | ErrorCategory::System => 500,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ValidationError { message } => message.clone(),
            Self::RateLimited { .. } => {
                "Too many document generation requests. Please try again later.".to_string()
            }
            Self::Forbidden { .. } => "You are not allowed to perform this action.".to_string(),
            Self::ProviderFatal { provider, .. } => {
                format!("Document generation failed: {} rejected the request.", provider)
            }
            Self::GenerationExhausted { provider, .. } => {
                format!("Document generation failed: no {} model is available right now.", provider)
            }
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                format!("The service is misconfigured: {}", self)
            }
            Self::IoError(_) | Self::SerializationError(_) => {
                "An internal error occurred.".to_string()
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::ValidationError { .. } => "Check the request input and try again.".to_string(),
            Self::RateLimited { retry_after } => {
                format!("Wait about {} seconds before generating again.", retry_after.as_secs().max(1))
            }
            Self::Forbidden { .. } => "Ask a doctor or an administrator to perform this action.".to_string(),
            Self::ProviderFatal { .. } => {
                "Check the provider API key and network connectivity.".to_string()
            }
            Self::GenerationExhausted {
                provider,
                quota_exceeded: true,
                ..
            } if provider == "gemini" => {
                "Gemini quota exceeded. Wait a few minutes or use Groq (set GROQ_API_KEY).".to_string()
            }
            Self::GenerationExhausted { .. } => {
                "Wait a few minutes and try again; the provider is rate limiting or its models are unavailable.".to_string()
            }
            Self::ConfigError { .. } | Self::MissingConfigError { .. } => {
                "Set either GROQ_API_KEY (recommended, free tier) or GEMINI_API_KEY.".to_string()
            }
            Self::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in the configuration.", field)
            }
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check the logs for details.".to_string()
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, ScribeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = ScribeError::RateLimited {
            retry_after: Duration::from_secs(30),
        };
        assert_eq!(err.http_status(), 429);
        assert_eq!(err.category(), ErrorCategory::Throttling);
        assert!(err.recovery_suggestion().contains("30 seconds"));
    }

    #[test]
    fn test_fatal_and_exhausted_are_distinct() {
        let fatal = ScribeError::ProviderFatal {
            provider: "groq".to_string(),
            model: Some("llama-3.3-70b-versatile".to_string()),
            reason: "401 invalid api key".to_string(),
        };
        let exhausted = ScribeError::GenerationExhausted {
            provider: "groq".to_string(),
            attempts: 6,
            last_reason: "429 rate limit".to_string(),
            quota_exceeded: true,
        };

        assert!(matches!(fatal, ScribeError::ProviderFatal { .. }));
        assert!(matches!(exhausted, ScribeError::GenerationExhausted { .. }));
        assert!(fatal.to_string().contains("model llama-3.3-70b-versatile"));
        assert!(exhausted.to_string().contains("429 rate limit"));
    }

    #[test]
    fn test_gemini_quota_suggests_groq() {
        let err = ScribeError::GenerationExhausted {
            provider: "gemini".to_string(),
            attempts: 6,
            last_reason: "429 RESOURCE_EXHAUSTED".to_string(),
            quota_exceeded: true,
        };
        assert!(err.recovery_suggestion().contains("GROQ_API_KEY"));
    }

    #[test]
    fn test_timeout_without_model_formats_cleanly() {
        let err = ScribeError::ProviderFatal {
            provider: "gemini".to_string(),
            model: None,
            reason: "timed out after 30s".to_string(),
        };
        assert_eq!(err.to_string(), "gemini request failed: timed out after 30s");
    }
}
