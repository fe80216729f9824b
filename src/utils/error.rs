use thiserror::Error;

/// Status code reported for local throttling, mirroring HTTP 429.
pub const THROTTLED_CODE: i64 = 429;

#[derive(Error, Debug)]
pub enum BrtError {
    #[error("{message}")]
    Throttled { message: String },

    #[error("Unknown WSDL key {key}")]
    UnknownOperation { key: String },

    #[error("Transport fault: {message}")]
    Transport { message: String },

    #[error("{reason}")]
    Outcome { code: i64, reason: String },

    #[error("Legend {legend} stalled at cursor {cursor:?} without the end-of-data code")]
    PaginationStalled { legend: String, cursor: String },

    #[error("Missing configuration: {field}")]
    MissingConfig { field: String },

    #[error("Invalid configuration value for {field}: '{value}' ({reason})")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Throttle,
    Configuration,
    Transport,
    Service,
    Internal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl BrtError {
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Numeric code carried to callers: the remote ESITO for service
    /// failures, 429 for local throttling.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Throttled { .. } => Some(THROTTLED_CODE),
            Self::Outcome { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Throttled { .. } => ErrorCategory::Throttle,
            Self::UnknownOperation { .. }
            | Self::MissingConfig { .. }
            | Self::InvalidConfigValue { .. }
            | Self::ConfigParse { .. } => ErrorCategory::Configuration,
            Self::Transport { .. } => ErrorCategory::Transport,
            Self::Outcome { .. } => ErrorCategory::Service,
            Self::PaginationStalled { .. } | Self::Io(_) => ErrorCategory::Internal,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Throttle | ErrorCategory::Transport => ErrorSeverity::Medium,
            ErrorCategory::Service => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::Internal => ErrorSeverity::Critical,
        }
    }

    /// Only throttling and transport faults are worth another attempt; the
    /// service's own rejections are permanent for the same input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Throttle | ErrorCategory::Transport
        )
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Throttled { .. } => "Too many BRT requests in the current minute".to_string(),
            Self::UnknownOperation { key } => {
                format!("No BRT service is configured for '{}'", key)
            }
            Self::Transport { message } => format!("Could not reach the BRT service: {}", message),
            Self::Outcome { code, reason } => {
                format!("BRT rejected the request: {} (ESITO={})", reason, code)
            }
            Self::PaginationStalled { legend, .. } => {
                format!("BRT legend '{}' did not signal completion", legend)
            }
            Self::MissingConfig { field } => format!("Missing required setting '{}'", field),
            Self::InvalidConfigValue { field, reason, .. } => {
                format!("Setting '{}' is invalid: {}", field, reason)
            }
            Self::ConfigParse { message } => format!("Configuration file is invalid: {}", message),
            Self::Io(e) => format!("File system error: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Throttle => "Wait for the current minute window to pass and retry",
            ErrorCategory::Transport => {
                "Check network access to wsr.brt.it and retry; run `cache-wsdl` if definitions changed"
            }
            ErrorCategory::Service => "Verify the shipment reference and client id",
            ErrorCategory::Configuration => "Review the configuration file and BRT_* environment variables",
            ErrorCategory::Internal => "Report the legend and cursor to the integration maintainers",
        }
    }
}

impl From<reqwest::Error> for BrtError {
    fn from(e: reqwest::Error) -> Self {
        Self::transport(e.to_string())
    }
}

impl From<quick_xml::Error> for BrtError {
    fn from(e: quick_xml::Error) -> Self {
        Self::transport(format!("XML error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, BrtError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_categories() {
        let throttled = BrtError::throttled("BRT minute quota exceeded");
        assert_eq!(throttled.code(), Some(429));
        assert_eq!(throttled.category(), ErrorCategory::Throttle);
        assert!(throttled.is_retryable());

        let outcome = BrtError::Outcome {
            code: -11,
            reason: "Shipment not found".to_string(),
        };
        assert_eq!(outcome.code(), Some(-11));
        assert_eq!(outcome.to_string(), "Shipment not found");
        assert!(!outcome.is_retryable());

        let transport = BrtError::transport("connection refused");
        assert_eq!(transport.code(), None);
        assert!(transport.is_retryable());
        assert_eq!(transport.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_configuration_errors_are_critical() {
        let err = BrtError::UnknownOperation {
            key: "nope".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().contains("nope"));
    }
}
