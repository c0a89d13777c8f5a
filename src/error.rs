//! Error taxonomy shared across the crate.
//!
//! Configuration and I/O problems abort a run before any aggregation happens;
//! `Bio` errors raised inside worker jobs fail the whole run (no partial
//! catalogs), while warnings are logged and collected by the caller.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum VarcatError {
    /// Missing or malformed build configuration options.
    #[error("(configuration) {0}")]
    Configuration(String),

    /// Unreadable or unwritable paths.
    #[error("(i/o) failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Ambiguous or missing features, impossible coordinates.
    #[error("(reference) {0}")]
    Reference(String),

    /// Violated precondition of a sequence kernel, e.g. an incomplete codon
    /// with incomplete translation disabled.
    #[error("(bio) {0}")]
    Bio(String),

    /// Aggregator invariant violation; indicates a bug, not bad input.
    #[error("(internal) {0}")]
    Internal(String),
}

impl VarcatError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VarcatError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, VarcatError>;
