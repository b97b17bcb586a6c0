//! Export of diagrams to output formats.
//!
//! # Available Backends
//!
//! - [`svg`]: an SVG [`RenderSink`](crate::render::RenderSink) that diff-applies
//!   style records and assembles a document in render order.
//!
//! # Error Handling
//!
//! Export operations return [`Error`], covering rendering failures and I/O
//! errors. [`Error`] converts into [`CmapError::Export`] at the crate
//! boundary.
//!
//! [`CmapError::Export`]: crate::CmapError::Export

/// SVG export backend.
pub mod svg;

use crate::error::CmapError;

/// Errors that can occur during diagram export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<Error> for CmapError {
    fn from(error: Error) -> Self {
        Self::Export(error.to_string())
    }
}
