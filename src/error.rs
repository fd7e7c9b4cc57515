//! Application-wide error types.

use thiserror::Error;

use crate::toon::ToonError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error("logger error: {0}")]
    Logger(String),

    #[error("database error: {0}")]
    Database(String),

    /// Input rejected before touching the store.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("toon codec error: {0}")]
    Codec(#[from] ToonError),

    #[error("server error: {0}")]
    Server(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn config_error_display() {
        let e = AppError::Config("missing field".into());
        assert!(!e.to_string().is_empty());
        assert!(e.to_string().contains("missing field"));
    }

    #[test]
    fn validation_error_display() {
        let e = AppError::Validation("agent_name must not be empty".into());
        assert!(e.to_string().starts_with("validation error"));
        assert!(e.to_string().contains("agent_name"));
    }

    #[test]
    fn not_found_error_display() {
        let e = AppError::NotFound("optimizer 42".into());
        assert!(e.to_string().contains("optimizer 42"));
    }

    #[test]
    fn codec_error_converts() {
        let e: AppError = ToonError::Syntax { line: 3, message: "bad header".into() }.into();
        assert!(e.to_string().contains("toon codec error"));
        assert!(e.to_string().contains("line 3"));
    }

    #[test]
    fn io_error_converts() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let e: AppError = io_err.into();
        assert!(e.to_string().contains("io error"));
        // satisfies std::error::Error trait
        let _: &dyn Error = &e;
    }
}
