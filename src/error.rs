//! Error types for the Segdel library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SegdelError`] enum.
//!
//! # Examples
//!
//! ```
//! use segdel::error::{Result, SegdelError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SegdelError::invalid_argument("capacity must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

/// The main error type for Segdel operations.
#[derive(Error, Debug)]
pub enum SegdelError {
    /// Index-related errors raised by segment collaborators.
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors raised while matching delete queries.
    #[error("Query error: {0}")]
    Query(String),

    /// An argument violated a documented precondition.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The operation is not allowed in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with SegdelError.
pub type Result<T> = std::result::Result<T, SegdelError>;

impl SegdelError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        SegdelError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        SegdelError::Query(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SegdelError::InvalidArgument(msg.into())
    }

    /// Create a new invalid operation error.
    pub fn invalid_operation<S: Into<String>>(msg: S) -> Self {
        SegdelError::InvalidOperation(msg.into())
    }
}
