//! Change propagation scheduling.
//!
//! Property writes do not update dependent geometry immediately. Instead the
//! owning component is marked dirty with the [`Scheduler`], which asks its
//! [`FrameClock`] for a frame the first time anything becomes dirty in a turn.
//! When the host runs the frame it calls
//! [`Diagram::settle`](crate::Diagram::settle), which drains the scheduler:
//!
//! 1. Every dirty component is *resolved*: each relation registered on it is
//!    updated. Relation updates may dirty further components, which are
//!    queued and resolved in the same pass until nothing is left.
//! 2. Every component that became dirty is redrawn exactly once, in the order
//!    it was first marked.
//!
//! Many writes inside one turn therefore coalesce into a single pass.

use std::{collections::VecDeque, fmt};

use indexmap::IndexSet;
use log::trace;

use crate::id::ComponentId;

/// Source of frame callbacks.
///
/// `request_frame` is called at most once between two settle passes. The
/// host is expected to call [`Diagram::settle`](crate::Diagram::settle) when
/// the requested frame fires.
pub trait FrameClock: fmt::Debug {
    fn request_frame(&mut self);
}

/// A clock that never fires on its own; the host settles explicitly.
#[derive(Debug, Default, Clone, Copy)]
pub struct ManualClock;

impl FrameClock for ManualClock {
    fn request_frame(&mut self) {}
}

/// Collects dirty components between settle passes.
#[derive(Debug)]
pub struct Scheduler {
    clock: Option<Box<dyn FrameClock>>,
    /// Every component dirtied since the last pass, in first-marked order.
    dirty: IndexSet<ComponentId>,
    /// Dirty components whose relations have not been resolved yet.
    unresolved: VecDeque<ComponentId>,
    detached: Vec<ComponentId>,
    frame_requested: bool,
}

impl Scheduler {
    /// Creates a scheduler that requests frames from `clock`.
    pub fn new(clock: Box<dyn FrameClock>) -> Self {
        Self {
            clock: Some(clock),
            dirty: IndexSet::new(),
            unresolved: VecDeque::new(),
            detached: Vec::new(),
            frame_requested: false,
        }
    }

    /// Creates a scheduler without a rendering surface.
    ///
    /// Marking components dirty is a no-op, so nothing is ever propagated or
    /// redrawn.
    pub fn headless() -> Self {
        Self {
            clock: None,
            dirty: IndexSet::new(),
            unresolved: VecDeque::new(),
            detached: Vec::new(),
            frame_requested: false,
        }
    }

    pub fn is_headless(&self) -> bool {
        self.clock.is_none()
    }

    /// Records that `id` changed and needs its relations resolved and a redraw.
    ///
    /// A component that is dirtied again after its relations were resolved in
    /// the running pass is queued for resolution once more; it is still
    /// redrawn only once.
    pub fn mark_dirty(&mut self, id: ComponentId) {
        if self.clock.is_none() {
            return;
        }

        if self.dirty.insert(id) || !self.unresolved.contains(&id) {
            trace!(id:%; "Component marked dirty");
            self.unresolved.push_back(id);
        }

        self.request_frame();
    }

    /// Returns true if `id` has been marked dirty since the last pass.
    pub fn is_dirty(&self, id: ComponentId) -> bool {
        self.dirty.contains(&id)
    }

    /// Returns the dirty components in first-marked order.
    pub fn dirty(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.dirty.iter().copied()
    }

    /// Returns true if a frame has been requested and not yet settled.
    pub fn frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Returns true if a settle pass has anything to do.
    pub fn has_pending(&self) -> bool {
        !self.dirty.is_empty() || !self.detached.is_empty()
    }

    pub(crate) fn next_unresolved(&mut self) -> Option<ComponentId> {
        self.unresolved.pop_front()
    }

    /// Records that `id` left the render tree.
    pub(crate) fn mark_detached(&mut self, id: ComponentId) {
        if self.clock.is_none() {
            return;
        }
        self.dirty.shift_remove(&id);
        self.unresolved.retain(|queued| *queued != id);
        self.detached.push(id);
        self.request_frame();
    }

    /// Ends the running pass, returning the dirty and the detached components.
    pub(crate) fn finish_pass(&mut self) -> (Vec<ComponentId>, Vec<ComponentId>) {
        self.unresolved.clear();
        self.frame_requested = false;
        let dirty = self.dirty.drain(..).collect();
        let detached = std::mem::take(&mut self.detached);
        (dirty, detached)
    }

    fn request_frame(&mut self) {
        if self.frame_requested {
            return;
        }
        if let Some(clock) = self.clock.as_mut() {
            self.frame_requested = true;
            clock.request_frame();
        }
    }
}

/// Summary of one settle pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettleReport {
    /// Number of component resolutions performed.
    pub resolved: usize,
    /// Components handed to the render sink, in redraw order.
    pub redrawn: Vec<ComponentId>,
    /// Components removed from the render sink.
    pub detached: Vec<ComponentId>,
    /// True if the pass hit the resolution limit before reaching a fixpoint.
    pub aborted: bool,
}
