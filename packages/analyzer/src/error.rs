//! Error types for the analyzer.
//!
//! Detectors never fail on "nothing found here": that is an absence, not an
//! error. `AnalyzerError` covers the boundary of the crate (loading XML,
//! reading tables and configuration, writing reports) and the single tree
//! mutation primitive.

use thiserror::Error;

/// Main error type for the analyzer library.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// XML parsing failed.
    #[error("XML parsing failed: {0}")]
    XmlParse(#[from] roxmltree::Error),

    /// The XML document has no root element to convert.
    #[error("XML document has no root element")]
    MissingRoot,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error.
    #[error("YAML serialization failed: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON serialization error.
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    /// A splice request that does not fall on plain text boundaries.
    #[error("Cannot splice <{tag}> over [{start}, {end}) (text length {length})")]
    InvalidSplice {
        tag: String,
        start: usize,
        end: usize,
        length: usize,
    },

    /// Law-number table could not be loaded.
    #[error("Invalid law number table: {0}")]
    InvalidLawNumTable(String),

    /// Analysis configuration is malformed.
    #[error("Invalid analysis configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for analyzer operations.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
