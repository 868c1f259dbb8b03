use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Invalid date '{value}': expected YYYYMMDD")]
    InvalidDate { value: String },

    #[error("Meal API error: {message}")]
    ApiError { message: String },

    #[error("Background image unavailable: {}", path.display())]
    BackgroundUnavailable { path: PathBuf },

    #[error("No usable font found (tried {})", tried.join(", "))]
    FontUnavailable { tried: Vec<String> },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Upload failed: {message}")]
    UploadError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl StoryError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            StoryError::BackgroundUnavailable { .. }
            | StoryError::FontUnavailable { .. }
            | StoryError::UploadError { .. } => ErrorSeverity::Low,
            StoryError::HttpError(_) | StoryError::ApiError { .. } => ErrorSeverity::Medium,
            StoryError::ConfigError { .. }
            | StoryError::MissingConfigError { .. }
            | StoryError::InvalidConfigValueError { .. }
            | StoryError::InvalidDate { .. }
            | StoryError::AuthenticationFailed { .. } => ErrorSeverity::High,
            StoryError::IoError(_)
            | StoryError::SerializationError(_)
            | StoryError::ImageError(_) => ErrorSeverity::Critical,
        }
    }

    /// 只有登入失敗與設定錯誤會中止整個流程
    pub fn is_fatal(&self) -> bool {
        self.severity() >= ErrorSeverity::High
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            StoryError::HttpError(_) | StoryError::ApiError { .. } => {
                "Check network connectivity and NEIS_API_KEY"
            }
            StoryError::BackgroundUnavailable { .. } => {
                "Place the background image under the assets directory"
            }
            StoryError::FontUnavailable { .. } => {
                "Install the configured font or add a fallback font path"
            }
            StoryError::AuthenticationFailed { .. } => {
                "Verify IG_USERNAME / IG_PASSWORD and remove a stale session file"
            }
            StoryError::UploadError { .. } => "Retry on the next scheduled run",
            StoryError::ConfigError { .. }
            | StoryError::MissingConfigError { .. }
            | StoryError::InvalidConfigValueError { .. }
            | StoryError::InvalidDate { .. } => "Fix the configuration file or environment",
            StoryError::IoError(_)
            | StoryError::SerializationError(_)
            | StoryError::ImageError(_) => "Check file permissions and disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, StoryError>;
