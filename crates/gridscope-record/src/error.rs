//! Error types for the record layer.

use thiserror::Error;

/// Errors raised while parsing an upstream XML document.
#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed xml: {0}")]
    Parse(#[from] quick_xml::Error),

    #[error("unbalanced element close")]
    Unbalanced,
}
