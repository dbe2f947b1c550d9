use axum::http::StatusCode;
use thiserror::Error;

/// Errors surfaced by the analytics core
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("data store error: {0}")]
    DataStore(#[from] sea_orm::DbErr),

    #[error("data store error: {0}")]
    DataStoreMessage(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),
}

impl AnalyticsError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AnalyticsError::InvalidFilter(_) => StatusCode::BAD_REQUEST,
            AnalyticsError::DataStore(_) | AnalyticsError::DataStoreMessage(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
