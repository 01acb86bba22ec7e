//! Errors
//!
//! Custom error types used throughout the `treepmml` crate.
use thiserror::Error;

/// Errors that can occur while building or converting a tree model.
#[derive(Debug, Error, PartialEq)]
pub enum PmmlError {
    /// The caller supplied an internally inconsistent setup.
    #[error("Invalid configuration: {0}")]
    ConfigurationError(String),
    /// A feature referenced by the tree or a transformation could not be resolved.
    #[error("Schema mismatch: {0}")]
    SchemaMismatchError(String),
    /// Invalid value parsing.
    #[error("Invalid value {0} passed for {1}, expected one of {2}.")]
    ParseString(String, String, String),
    /// Unable to write a document or model to a file.
    #[error("Unable to write to file: {0}")]
    UnableToWrite(String),
    /// Unable to read a model or context from a file.
    #[error("Unable to read from a file {0}")]
    UnableToRead(String),
}
