//! Toon: token-oriented object notation for agent payloads.
//!
//! A line-based, indentation-scoped rendering of JSON values that drops most
//! of JSON's punctuation and collapses uniform arrays of objects into a
//! header plus comma-separated rows:
//!
//! ```text
//! id: task_001
//! tags[2]: math,exam
//! tasks[2]{id,status}:
//!   t1,pending
//!   t2,completed
//! ```
//!
//! [`encode`] and [`decode`] are pure functions over [`serde_json::Value`];
//! [`schemas`] adds typed message shapes used to validate payloads before
//! they are encoded or after they are decoded.

mod decode;
mod encode;
pub mod schemas;

use serde::Serialize;
use thiserror::Error;

pub use decode::decode;
pub use encode::encode;
pub use schemas::MessageType;

/// Two spaces per nesting level.
pub(crate) const INDENT: usize = 2;
/// Deepest indentation level the decoder accepts.
pub(crate) const MAX_DEPTH: usize = 128;
/// Separator for inline arrays, header fields and tabular rows.
pub(crate) const DELIMITER: char = ',';

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ToonError {
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("line {line}: array declares {expected} items, found {found}")]
    LengthMismatch { line: usize, expected: usize, found: usize },

    #[error("unknown message type '{0}'; expected one of: task, schedule, profile, crisis, generic")]
    UnknownMessageType(String),

    #[error("payload is not a valid {kind}: {message}")]
    Schema { kind: &'static str, message: String },
}

pub(crate) fn syntax(line: usize, message: impl Into<String>) -> ToonError {
    ToonError::Syntax { line, message: message.into() }
}

/// Size comparison between a payload's original text and its Toon form.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Savings {
    pub original_length: usize,
    pub toon_length: usize,
    /// Negative when the Toon form is longer.
    pub savings_chars: i64,
    pub savings_percent: f64,
}

/// Compare lengths in characters. Percent is rounded to two decimals.
pub fn savings(original: &str, encoded: &str) -> Savings {
    let original_length = original.chars().count();
    let toon_length = encoded.chars().count();
    let savings_chars = original_length as i64 - toon_length as i64;
    let savings_percent = if original_length == 0 {
        0.0
    } else {
        (savings_chars as f64 / original_length as f64 * 10_000.0).round() / 100.0
    };
    Savings { original_length, toon_length, savings_chars, savings_percent }
}
