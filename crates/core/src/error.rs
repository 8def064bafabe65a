use phpscope_api::ApiError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhpscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Encode error: {0}")]
    Encode(#[from] rmp_serde::encode::Error),
    #[error("Decode error: {0}")]
    Decode(#[from] rmp_serde::decode::Error),
    #[error("Cache error: {0}")]
    Cache(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ApiError> for PhpscopeError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Storage(msg) | ApiError::NotFound(msg) => PhpscopeError::Cache(msg),
            other => PhpscopeError::Internal(other.to_string()),
        }
    }
}

impl From<PhpscopeError> for ApiError {
    fn from(err: PhpscopeError) -> Self {
        match err {
            PhpscopeError::Io(e) => ApiError::Storage(e.to_string()),
            PhpscopeError::Cache(msg) => ApiError::Storage(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, PhpscopeError>;
