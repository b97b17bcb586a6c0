//! Stable handles for diagram components and relations.
//!
//! Components live in an arena owned by the [`Diagram`](crate::Diagram) and
//! are addressed by small copyable ids. Each component kind has its own id
//! type so that a link can never be passed where a shape is expected;
//! [`ComponentId`] unifies them where any kind is accepted.

use std::{fmt, str::FromStr};

use serde::Deserialize;

macro_rules! component_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            pub(crate) fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw numeric value of this id.
            pub fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

component_id!(
    /// Handle of a [`Shape`](crate::component::Shape).
    ShapeId,
    "shape"
);
component_id!(
    /// Handle of a [`Link`](crate::component::Link).
    LinkId,
    "link"
);
component_id!(
    /// Handle of a [`ConnectorMarker`](crate::component::ConnectorMarker).
    MarkerId,
    "marker"
);
component_id!(
    /// Handle of a [`Relation`](crate::relation::Relation).
    RelationId,
    "relation"
);

/// Any component of a diagram, tagged with its kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    Shape(ShapeId),
    Link(LinkId),
    Marker(MarkerId),
}

impl ComponentId {
    /// Returns the name of the component kind.
    pub fn kind(self) -> &'static str {
        match self {
            Self::Shape(_) => "shape",
            Self::Link(_) => "link",
            Self::Marker(_) => "marker",
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shape(id) => id.fmt(f),
            Self::Link(id) => id.fmt(f),
            Self::Marker(id) => id.fmt(f),
        }
    }
}

impl From<ShapeId> for ComponentId {
    fn from(id: ShapeId) -> Self {
        Self::Shape(id)
    }
}

impl From<LinkId> for ComponentId {
    fn from(id: LinkId) -> Self {
        Self::Link(id)
    }
}

impl From<MarkerId> for ComponentId {
    fn from(id: MarkerId) -> Self {
        Self::Marker(id)
    }
}

/// One of the two endpoints of a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum End {
    Source,
    Target,
}

impl End {
    /// Both ends, source first.
    pub const ALL: [End; 2] = [End::Source, End::Target];

    /// Returns the other end of the link.
    pub fn opposite(self) -> Self {
        match self {
            Self::Source => Self::Target,
            Self::Target => Self::Source,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for End {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "target" => Ok(Self::Target),
            _ => Err(format!("unknown link end `{s}`, expected `source` or `target`")),
        }
    }
}

/// A value kept for each end of a link.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ByEnd<T> {
    source: T,
    target: T,
}

impl<T> ByEnd<T> {
    pub fn new(source: T, target: T) -> Self {
        Self { source, target }
    }

    pub fn get(&self, end: End) -> &T {
        match end {
            End::Source => &self.source,
            End::Target => &self.target,
        }
    }

    pub fn get_mut(&mut self, end: End) -> &mut T {
        match end {
            End::Source => &mut self.source,
            End::Target => &mut self.target,
        }
    }

    pub fn set(&mut self, end: End, value: T) {
        *self.get_mut(end) = value;
    }
}

impl<T: Clone> ByEnd<T> {
    /// Creates a pair holding the same value on both ends.
    pub fn splat(value: T) -> Self {
        Self {
            source: value.clone(),
            target: value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_opposite_and_parse() {
        assert_eq!(End::Source.opposite(), End::Target);
        assert_eq!(End::Target.opposite(), End::Source);
        assert_eq!("source".parse::<End>(), Ok(End::Source));
        assert!("middle".parse::<End>().is_err());
    }

    #[test]
    fn test_component_id_display() {
        assert_eq!(ComponentId::from(ShapeId::new(3)).to_string(), "shape#3");
        assert_eq!(ComponentId::from(LinkId::new(4)).kind(), "link");
    }

    #[test]
    fn test_by_end_access() {
        let mut pair = ByEnd::splat(0);
        pair.set(End::Target, 5);
        assert_eq!(*pair.get(End::Source), 0);
        assert_eq!(*pair.get(End::Target), 5);
    }
}
