use thiserror::Error;

#[derive(Error, Debug)]
pub enum GatewayError {
    /// 远端返回 success=false
    #[error("{0}")]
    Service(String),

    /// 批量请求中第一条失败记录的消息
    #[error("{0}")]
    Batch(String),

    #[error("File size exceeds 10MB limit. Current size: {:.2}MB", megabytes(.size))]
    FileTooLarge {
        size: u64,
    },

    #[error("File type \"{0}\" is not allowed. Supported types: images, PDF, Word documents, text files.")]
    UnsupportedFileType(String),

    #[error("HTTP Request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: status code {status}, body: {body}")]
    Status {
        status: u16,
        body: String,
    },

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Upload session {0} not found")]
    SessionNotFound(i64),

    #[error("Upload session {0} is already completed")]
    SessionAlreadyCompleted(i64),
}

impl GatewayError {
    pub fn service(message: impl Into<String>) -> Self {
        Self::Service(message.into())
    }

    pub fn batch(message: impl Into<String>) -> Self {
        Self::Batch(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// 文件校验失败
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::FileTooLarge { .. } | Self::UnsupportedFileType(_))
    }
}

fn megabytes(bytes: &u64) -> f64 {
    *bytes as f64 / 1024.0 / 1024.0
}

/// Error alias
pub type Result<T, E = GatewayError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_too_large_message() {
        let err = GatewayError::FileTooLarge { size: 15 * 1024 * 1024 };
        assert_eq!(err.to_string(), "File size exceeds 10MB limit. Current size: 15.00MB");
        assert!(err.is_validation());
    }

    #[test]
    fn test_service_message_is_passed_through() {
        let err = GatewayError::service("Record limit reached");
        assert_eq!(err.to_string(), "Record limit reached");
        assert!(!err.is_validation());
    }
}
