use thiserror::Error;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{service} returned HTTP {status}: {body}")]
    ApiStatusError {
        service: String,
        status: u16,
        body: String,
    },

    #[error("Unexpected {service} response: {message}")]
    ResponseFormatError { service: String, message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Structure error: {message}")]
    StructureError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    ExternalService,
    Configuration,
    Data,
    Output,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PredictionError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PredictionError::HttpError(_) => ErrorCategory::Network,
            PredictionError::ApiStatusError { .. } | PredictionError::ResponseFormatError { .. } => {
                ErrorCategory::ExternalService
            }
            PredictionError::MissingConfigError { .. }
            | PredictionError::InvalidConfigValueError { .. }
            | PredictionError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            PredictionError::StructureError { .. }
            | PredictionError::ValidationError { .. }
            | PredictionError::ProcessingError { .. }
            | PredictionError::SerializationError(_) => ErrorCategory::Data,
            PredictionError::ZipError(_) | PredictionError::CsvError(_) | PredictionError::IoError(_) => {
                ErrorCategory::Output
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            PredictionError::ValidationError { .. } => ErrorSeverity::Low,
            PredictionError::HttpError(_) => ErrorSeverity::Medium,
            PredictionError::ApiStatusError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            PredictionError::IoError(_) | PredictionError::ZipError(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::High,
        }
    }

    /// Whether repeating the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PredictionError::HttpError(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            PredictionError::ApiStatusError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PredictionError::HttpError(_) => {
                "Check your network connection or raise --timeout-seconds / --retry-attempts".to_string()
            }
            PredictionError::ApiStatusError { status: 401 | 403, service, .. } => {
                format!("Check the API key configured for {}", service)
            }
            PredictionError::ApiStatusError { status: 429, .. } => {
                "The service is rate limiting requests; wait a moment and try again".to_string()
            }
            PredictionError::ApiStatusError { service, .. } => {
                format!("{} may be unavailable; try again later", service)
            }
            PredictionError::ResponseFormatError { service, .. } => {
                format!("Check that the {} endpoint and model name are correct", service)
            }
            PredictionError::MissingConfigError { .. } => {
                "Set OPENAI_API_KEY, GOOGLE_API_KEY and MATERIALS_PROJECT_API_KEY in the environment or a .env file"
                    .to_string()
            }
            PredictionError::InvalidConfigValueError { field, .. }
            | PredictionError::ConfigValidationError { field, .. } => {
                format!("Fix the value of '{}' and run again", field)
            }
            PredictionError::ValidationError { .. } => {
                "Describe the material you need, e.g. \"transparent conductor\"".to_string()
            }
            PredictionError::StructureError { .. } => {
                "The database returned an unusable structure; try another candidate".to_string()
            }
            PredictionError::IoError(_) | PredictionError::ZipError(_) | PredictionError::CsvError(_) => {
                "Make sure the output path is writable and has free space".to_string()
            }
            PredictionError::SerializationError(_) | PredictionError::ProcessingError { .. } => {
                "Re-run with --verbose and inspect the log for details".to_string()
            }
        }
    }

    /// Process exit status for a failed run.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PredictionError::HttpError(_) => "Could not reach an external service.".to_string(),
            PredictionError::ApiStatusError { service, status, .. } => {
                format!("{} rejected the request (HTTP {}).", service, status)
            }
            PredictionError::ResponseFormatError { service, .. } => {
                format!("{} answered with an unexpected response.", service)
            }
            PredictionError::MissingConfigError { field } => {
                format!("One or more API keys are missing: {}", field)
            }
            PredictionError::ValidationError { message } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictionError>;

/// Exit status when the configuration is rejected before the run starts.
pub const INVALID_CONFIG_EXIT_CODE: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_errors_are_classified_by_code() {
        let throttled = PredictionError::ApiStatusError {
            service: "OpenAI".to_string(),
            status: 429,
            body: String::new(),
        };
        assert!(throttled.is_retryable());
        assert_eq!(throttled.severity(), ErrorSeverity::Medium);

        let unauthorized = PredictionError::ApiStatusError {
            service: "Gemini".to_string(),
            status: 401,
            body: "bad key".to_string(),
        };
        assert!(!unauthorized.is_retryable());
        assert_eq!(unauthorized.severity(), ErrorSeverity::High);
        assert_eq!(unauthorized.category(), ErrorCategory::ExternalService);
        assert!(unauthorized.recovery_suggestion().contains("Gemini"));
    }

    #[test]
    fn test_missing_keys_message() {
        let err = PredictionError::MissingConfigError {
            field: "OPENAI_API_KEY, GOOGLE_API_KEY".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(err.user_friendly_message().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn test_exit_codes_follow_severity() {
        let unavailable = PredictionError::ApiStatusError {
            service: "Materials Project".to_string(),
            status: 503,
            body: String::new(),
        };
        assert_eq!(unavailable.exit_code(), 2);

        let missing = PredictionError::MissingConfigError {
            field: "GOOGLE_API_KEY".to_string(),
        };
        assert_eq!(missing.exit_code(), 1);

        let io = PredictionError::IoError(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "read-only",
        ));
        assert_eq!(io.exit_code(), 3);
    }

    #[test]
    fn test_empty_goal_is_low_severity() {
        let err = PredictionError::ValidationError {
            message: "Please enter a valid materials design goal.".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(
            err.user_friendly_message(),
            "Please enter a valid materials design goal."
        );
        // A rejected configuration never reports success.
        assert_ne!(INVALID_CONFIG_EXIT_CODE, 0);
    }
}
