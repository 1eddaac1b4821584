//! Error codes for the flowchart diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E0xx` - Definition-level errors (empty input, diagram kind)
//! - `E1xx` - Statement syntax errors

use std::fmt;

/// Error codes for categorizing diagnostic errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Empty definition.
    ///
    /// The definition contains no statements, only whitespace or comments.
    E001,

    /// Unknown diagram type.
    ///
    /// The first statement does not name a diagram type.
    E002,

    /// Unsupported diagram type.
    ///
    /// The diagram type is valid Mermaid but this engine only renders
    /// flowcharts.
    E003,

    /// Unexpected token.
    ///
    /// A statement could not be parsed at this position.
    E100,

    /// Invalid direction.
    ///
    /// The flowchart header names a direction other than `TD`, `TB`, `BT`,
    /// `LR` or `RL`.
    E101,

    /// Unclosed node shape.
    ///
    /// A node label was opened with a bracket that is never closed.
    E102,
}

impl ErrorCode {
    /// Returns the numeric code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "E001",
            ErrorCode::E002 => "E002",
            ErrorCode::E003 => "E003",
            ErrorCode::E100 => "E100",
            ErrorCode::E101 => "E101",
            ErrorCode::E102 => "E102",
        }
    }

    /// Returns a short description of what this error code means.
    pub fn description(&self) -> &'static str {
        match self {
            ErrorCode::E001 => "empty definition",
            ErrorCode::E002 => "unknown diagram type",
            ErrorCode::E003 => "unsupported diagram type",
            ErrorCode::E100 => "unexpected token",
            ErrorCode::E101 => "invalid direction",
            ErrorCode::E102 => "unclosed node shape",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
