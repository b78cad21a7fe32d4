//! Error Handling Module
//!
//! This module provides error handling for the assistant core, including:
//! - Core error types (`AssistError`, `ErrorCategory`)
//! - Classification of Gemini API failures into user-facing errors
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use wesai::error::{AssistError, ErrorCategory};
//!
//! let error = AssistError::api_error(404, "Not found");
//! assert_eq!(error.category(), ErrorCategory::Transport);
//! ```

// Module declarations
mod conversions;
pub mod helpers;
pub mod types;

// Re-exports for public API
pub use helpers::*;
pub use types::*;
