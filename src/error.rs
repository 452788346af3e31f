// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types shared by the store, repositories and remote clients.

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No resolved user identity; the operation did no work.
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Local store error: {0}")]
    LocalStore(String),

    #[error("Remote profile service unavailable: {0}")]
    RemoteUnavailable(String),

    #[error("Photo upload failed: {0}")]
    UploadFailed(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Movie catalog error: {0}")]
    Catalog(String),

    #[error("Invalid identity token: {0}")]
    InvalidToken(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Marker message for catalog rate limit errors.
    pub const CATALOG_RATE_LIMIT: &'static str = "rate limited";

    /// Errors raised by the remote side of a profile sync.
    ///
    /// These degrade to "local succeeded, remote failed" instead of
    /// aborting the user action.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            AppError::RemoteUnavailable(_) | AppError::UploadFailed(_)
        )
    }

    /// Check if this error is a catalog rate limit.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, AppError::Catalog(msg) if msg.contains(Self::CATALOG_RATE_LIMIT))
    }
}

// Errors are recorded in observable profile state and also returned to the
// caller, so they must be clonable. `anyhow::Error` is not, and is flattened
// to its message.
impl Clone for AppError {
    fn clone(&self) -> Self {
        match self {
            AppError::NotAuthenticated => AppError::NotAuthenticated,
            AppError::LocalStore(msg) => AppError::LocalStore(msg.clone()),
            AppError::RemoteUnavailable(msg) => AppError::RemoteUnavailable(msg.clone()),
            AppError::UploadFailed(msg) => AppError::UploadFailed(msg.clone()),
            AppError::Validation(msg) => AppError::Validation(msg.clone()),
            AppError::NotFound(msg) => AppError::NotFound(msg.clone()),
            AppError::Catalog(msg) => AppError::Catalog(msg.clone()),
            AppError::InvalidToken(msg) => AppError::InvalidToken(msg.clone()),
            AppError::Internal(err) => AppError::Internal(anyhow::anyhow!("{:#}", err)),
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        AppError::LocalStore(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!("Background task failed: {}", err))
    }
}

/// Result type alias used across the crate.
pub type Result<T> = std::result::Result<T, AppError>;
