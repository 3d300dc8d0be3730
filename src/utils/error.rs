use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Fare search failed: {message}")]
    ProviderError { message: String },

    #[error("Notification delivery failed: {message}")]
    DeliveryError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration value: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Provider,
    Delivery,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl WatchError {
    pub fn provider(message: impl Into<String>) -> Self {
        Self::ProviderError {
            message: message.into(),
        }
    }

    pub fn delivery(message: impl Into<String>) -> Self {
        Self::DeliveryError {
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
            Self::ProviderError { .. } => ErrorCategory::Provider,
            Self::DeliveryError { .. } => ErrorCategory::Delivery,
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::IoError(_) | Self::CsvError(_) => ErrorCategory::Local,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Provider | ErrorCategory::Delivery => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Local => ErrorSeverity::Critical,
        }
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Configuration => 1,
            ErrorCategory::Provider => 2,
            ErrorCategory::Delivery => 3,
            ErrorCategory::Local => 4,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ProviderError { .. } => {
                "Check the fare API credentials and base URL, then run again"
            }
            Self::DeliveryError { .. } => {
                "Check the email API key and that the sender address is verified"
            }
            Self::MissingConfigError { .. } => {
                "Set the missing environment variable or add it to the config file"
            }
            Self::ConfigError { .. } | Self::InvalidConfigValueError { .. } => {
                "Fix the configuration value and run again"
            }
            Self::IoError(_) | Self::CsvError(_) => {
                "Check that the report directory exists and is writable"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ProviderError { message } => format!("Could not search fares: {}", message),
            Self::DeliveryError { message } => {
                format!("Could not send the fare email: {}", message)
            }
            Self::MissingConfigError { field } => format!("Missing setting: {}", field),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_category() {
        assert_eq!(WatchError::provider("timeout").exit_code(), 2);
        assert_eq!(WatchError::delivery("401").exit_code(), 3);
        assert_eq!(WatchError::config("bad").exit_code(), 1);
        let io = WatchError::from(std::io::Error::other("disk full"));
        assert_eq!(io.exit_code(), 4);
    }

    #[test]
    fn test_missing_config_message() {
        let err = WatchError::MissingConfigError {
            field: "BREVO_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.user_friendly_message().contains("BREVO_API_KEY"));
    }
}
