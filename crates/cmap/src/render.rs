//! Render sinks.
//!
//! The engine never draws anything itself. At the end of every settle pass it
//! hands each changed component to a [`RenderSink`], once, and tells it about
//! components that left the diagram.

use indexmap::IndexMap;

use crate::{component::ComponentView, id::ComponentId};

/// Receiver of the redraws produced by a settle pass.
pub trait RenderSink {
    /// Draws the current state of a component.
    fn redraw(&mut self, view: ComponentView<'_>);

    /// Forgets a component removed from the render order.
    fn detach(&mut self, _id: ComponentId) {}
}

/// A style record: presentation attribute names mapped to their values.
pub type Attributes = IndexMap<&'static str, String>;

/// Returns the entries of `next` that are absent from or differ in `previous`.
pub fn diff_attributes(previous: &Attributes, next: &Attributes) -> Attributes {
    next.iter()
        .filter(|(name, value)| previous.get(*name) != Some(*value))
        .map(|(name, value)| (*name, value.clone()))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderCall {
    Redraw(ComponentId),
    Detach(ComponentId),
}

/// A sink that records the calls it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    calls: Vec<RenderCall>,
}

impl RecordingSink {
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    /// Number of times `id` was redrawn.
    pub fn redraw_count(&self, id: ComponentId) -> usize {
        self.calls
            .iter()
            .filter(|call| **call == RenderCall::Redraw(id))
            .count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl RenderSink for RecordingSink {
    fn redraw(&mut self, view: ComponentView<'_>) {
        self.calls.push(RenderCall::Redraw(view.id()));
    }

    fn detach(&mut self, id: ComponentId) {
        self.calls.push(RenderCall::Detach(id));
    }
}
