//! Error types for diagram operations.
//!
//! Every fallible [`Diagram`](crate::Diagram) operation validates its inputs
//! before mutating anything, so an `Err` always leaves the diagram unchanged.

use thiserror::Error;

use crate::id::{End, LinkId, ShapeId};

/// The main error type for cmap operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CmapError {
    /// The end of the link is already anchored to a shape.
    #[error("{end} of {link} is already connected")]
    AlreadyConnected { link: LinkId, end: End },

    /// The shape already anchors the opposite end of the link.
    #[error("{shape} is already connected to the opposite end of {link} and cannot take its {end}")]
    ShapeOnOppositeEnd { shape: ShapeId, link: LinkId, end: End },

    /// The shape does not anchor that end of the link.
    #[error("{shape} is not connected to the {end} of {link}")]
    NotConnected { shape: ShapeId, link: LinkId, end: End },

    /// The shape handle does not refer to a live shape.
    #[error("invalid node: {0}")]
    InvalidNode(ShapeId),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("export error: {0}")]
    Export(String),
}

impl CmapError {
    /// Returns true for both ways a connection slot can be taken.
    pub fn is_already_connected(&self) -> bool {
        matches!(
            self,
            Self::AlreadyConnected { .. } | Self::ShapeOnOppositeEnd { .. }
        )
    }

    pub(crate) fn unknown_link(link: LinkId) -> Self {
        Self::InvalidArgument(format!("{link} does not exist"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opposite_end_counts_as_already_connected() {
        let error = CmapError::ShapeOnOppositeEnd {
            shape: ShapeId::new(1),
            link: LinkId::new(2),
            end: End::Target,
        };
        assert!(error.is_already_connected());
        assert!(!CmapError::InvalidNode(ShapeId::new(1)).is_already_connected());
    }

    #[test]
    fn test_messages_name_components() {
        let error = CmapError::NotConnected {
            shape: ShapeId::new(1),
            link: LinkId::new(2),
            end: End::Source,
        };
        assert_eq!(error.to_string(), "shape#1 is not connected to the source of link#2");
    }
}
