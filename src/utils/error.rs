use thiserror::Error;

#[derive(Error, Debug)]
pub enum PawcareError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API responded with {status}: {message}")]
    ApiStatusError { status: u16, message: String },

    #[error("Unexpected API response: {message}")]
    ResponseShapeError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required field: {field}")]
    MissingFieldError { field: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Reservation flow error: {message}")]
    FlowError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Api,
    Authentication,
    Configuration,
    Validation,
    Storage,
    Flow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PawcareError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PawcareError::ApiError(_) => ErrorCategory::Network,
            PawcareError::ApiStatusError { status, .. } if *status == 401 || *status == 403 => {
                ErrorCategory::Authentication
            }
            PawcareError::ApiStatusError { .. } | PawcareError::ResponseShapeError { .. } => {
                ErrorCategory::Api
            }
            PawcareError::NotAuthenticated | PawcareError::PermissionDenied { .. } => {
                ErrorCategory::Authentication
            }
            PawcareError::IoError(_) | PawcareError::SerializationError(_) => {
                ErrorCategory::Storage
            }
            PawcareError::ConfigError { .. } | PawcareError::ConfigValidationError { .. } => {
                ErrorCategory::Configuration
            }
            PawcareError::InvalidValueError { .. }
            | PawcareError::MissingFieldError { .. }
            | PawcareError::ValidationError { .. } => ErrorCategory::Validation,
            PawcareError::FlowError { .. } => ErrorCategory::Flow,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Validation | ErrorCategory::Flow => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Authentication => ErrorSeverity::Medium,
            ErrorCategory::Api => match self {
                PawcareError::ApiStatusError { status, .. } if *status >= 500 => {
                    ErrorSeverity::Medium
                }
                _ => ErrorSeverity::High,
            },
            ErrorCategory::Configuration | ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    /// 建議使用者下一步的處理方式
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            PawcareError::ApiError(_) => {
                "Check your network connection and that PAWCARE_API_URL points at a running API"
            }
            PawcareError::ApiStatusError { status, .. } => match status {
                401 => "Your session has expired, run `pawcare login` again",
                403 => "This account is not allowed to do that",
                404 => "The record no longer exists, refresh the list and try again",
                s if *s >= 500 => "The service is having trouble, try again in a moment",
                _ => "Check the values you entered and try again",
            },
            PawcareError::ResponseShapeError { .. } => {
                "The API answered in an unexpected format, check the API version"
            }
            PawcareError::IoError(_) | PawcareError::SerializationError(_) => {
                "Check that the state directory is writable, or remove the corrupted file"
            }
            PawcareError::ConfigError { .. } | PawcareError::ConfigValidationError { .. } => {
                "Fix the configuration file or command line flags"
            }
            PawcareError::InvalidValueError { .. }
            | PawcareError::MissingFieldError { .. }
            | PawcareError::ValidationError { .. } => "Correct the highlighted field and submit again",
            PawcareError::NotAuthenticated => "Run `pawcare login` first",
            PawcareError::PermissionDenied { .. } => "Sign in with an account that has the right role",
            PawcareError::FlowError { .. } => {
                "Run `pawcare reserve show` to see which step is next"
            }
        }
    }

    /// 給終端使用者看的簡短訊息
    pub fn user_friendly_message(&self) -> String {
        match self {
            PawcareError::ApiError(e) if e.is_timeout() => "The request timed out".to_string(),
            PawcareError::ApiError(_) => "Could not reach the booking service".to_string(),
            PawcareError::ApiStatusError { message, .. } => message.clone(),
            PawcareError::ResponseShapeError { .. } => {
                "The booking service returned something we could not read".to_string()
            }
            PawcareError::IoError(_) | PawcareError::SerializationError(_) => {
                "Local state could not be read or written".to_string()
            }
            PawcareError::InvalidValueError { field, reason, .. } => format!("{}: {}", field, reason),
            PawcareError::MissingFieldError { field } => format!("{} is required", field),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            PawcareError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
            PawcareError::ApiStatusError { status, .. } => *status == 404,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, PawcareError>;
