//! Cmap - An interactive concept-map engine.
//!
//! A diagram holds rectangular shapes and curved links between them. Link
//! endpoints anchor onto shape outlines; moving a shape rotates or shifts the
//! attached links, and dragging the connector markers of a link rewires it.
//!
//! Every mutation only records which components changed. A single
//! [`Diagram::settle`] per frame propagates the changes through the relations
//! until the geometry is consistent and hands each changed component to a
//! [`RenderSink`](render::RenderSink) exactly once.
//!
//! # Examples
//!
//! ```
//! use cmap::{Diagram, End, component::{LinkAttrs, ShapeAttrs}, config::StyleConfig};
//! use cmap::export::svg::SvgRenderer;
//!
//! let mut diagram = Diagram::default();
//! let rust = diagram.create_shape(ShapeAttrs::default().with_content("Rust"));
//! let safety = diagram.create_shape(
//!     ShapeAttrs::default().with_content("Safety").with_position(250.0, 0.0),
//! );
//! let link = diagram.create_link(LinkAttrs::default().with_content("gives").with_arrow(true));
//! for id in [rust.into(), safety.into(), link.into()] {
//!     diagram.add(id)?;
//! }
//! diagram.connect(End::Source, rust, link)?;
//! diagram.connect(End::Target, safety, link)?;
//!
//! let mut renderer = SvgRenderer::new(&StyleConfig::default())?;
//! diagram.settle(&mut renderer);
//! assert!(renderer.render_to_string(&diagram).contains("Safety"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod attr;
pub mod cell;
pub mod component;
pub mod config;
pub mod export;
pub mod id;
pub mod relation;
pub mod render;
pub mod scheduler;

mod diagram;
mod error;

pub use cmap_core::{color, geometry};

pub use diagram::{Diagram, DragState};
pub use error::CmapError;
pub use id::{ByEnd, ComponentId, End, LinkId, MarkerId, RelationId, ShapeId};
pub use scheduler::SettleReport;
