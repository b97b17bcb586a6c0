//! The diagram orchestrator.
//!
//! [`Diagram`] owns every component and relation, keeps the render order and
//! drives the settle pass. Wiring operations (connect, disconnect, connector
//! markers) live in [`wiring`](self::wiring), pointer handling in
//! [`drag`](self::drag) and the attribute accessors in [`attrs`](self::attrs).

use indexmap::IndexSet;
use log::{debug, trace, warn};

use cmap_core::geometry::{Bounds, Point, Size};

use crate::{
    component::{
        ComponentView, Components, ConnectorMarker, Link, LinkAttrs, LinkGeometry, Shape,
        ShapeAttrs,
    },
    config::AppConfig,
    error::CmapError,
    id::{ComponentId, End, LinkId, MarkerId, RelationId, ShapeId},
    relation::{Relation, Relations},
    render::RenderSink,
    scheduler::{FrameClock, ManualClock, Scheduler, SettleReport},
};

mod attrs;
mod drag;
mod wiring;

pub use drag::DragState;

/// An interactive diagram of shapes and links.
///
/// Components are created detached with [`create_shape`](Self::create_shape)
/// or [`create_link`](Self::create_link) and enter the render order with
/// [`add`](Self::add). Mutations only record which components changed; call
/// [`settle`](Self::settle) once per frame to propagate them and redraw.
///
/// # Examples
///
/// ```
/// use cmap::{Diagram, End, component::{LinkAttrs, ShapeAttrs}, render::RecordingSink};
///
/// let mut diagram = Diagram::default();
/// let a = diagram.create_shape(ShapeAttrs::default().with_position(0.0, 0.0));
/// let b = diagram.create_shape(ShapeAttrs::default().with_position(200.0, 0.0));
/// let link = diagram.create_link(LinkAttrs::default());
/// for id in [a.into(), b.into(), link.into()] {
///     diagram.add(id)?;
/// }
///
/// diagram.connect(End::Source, a, link)?;
/// diagram.connect(End::Target, b, link)?;
/// diagram.settle(&mut RecordingSink::default());
///
/// assert_eq!(diagram.connected_shape(End::Target, link), Some(b));
/// # Ok::<(), cmap::CmapError>(())
/// ```
#[derive(Debug)]
pub struct Diagram {
    config: AppConfig,
    components: Components,
    relations: Relations,
    scheduler: Scheduler,
    render_order: IndexSet<ComponentId>,
    drag: DragState,
    selected_link: Option<LinkId>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}

impl Diagram {
    /// Creates a diagram settled explicitly by the host.
    pub fn new(config: AppConfig) -> Self {
        Self::with_clock(config, Box::new(ManualClock))
    }

    /// Creates a diagram that requests frames from `clock`.
    pub fn with_clock(config: AppConfig, clock: Box<dyn FrameClock>) -> Self {
        Self::with_scheduler(config, Scheduler::new(clock))
    }

    /// Creates a diagram without a rendering surface.
    ///
    /// Property writes are stored but never propagated through relations or
    /// redrawn.
    pub fn headless(config: AppConfig) -> Self {
        Self::with_scheduler(config, Scheduler::headless())
    }

    fn with_scheduler(config: AppConfig, scheduler: Scheduler) -> Self {
        Self {
            config,
            components: Components::default(),
            relations: Relations::default(),
            scheduler,
            render_order: IndexSet::new(),
            drag: DragState::Idle,
            selected_link: None,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns true if a settle pass has pending work.
    pub fn needs_settle(&self) -> bool {
        self.scheduler.has_pending()
    }

    /// Creates a detached shape.
    pub fn create_shape(&mut self, attrs: ShapeAttrs) -> ShapeId {
        let id = ShapeId::new(self.components.next_raw_id());
        let corner_radius = self.config.style().corner_radius();
        self.components
            .insert_shape(Shape::new(id, attrs, corner_radius));
        debug!(id:%; "Created shape");
        id
    }

    /// Creates a detached link.
    pub fn create_link(&mut self, attrs: LinkAttrs) -> LinkId {
        let id = LinkId::new(self.components.next_raw_id());
        self.components.insert_link(Link::new(id, attrs));
        debug!(id:%; "Created link");
        id
    }

    /// Attaches a component to the top of the render order.
    ///
    /// Adding an attached component is a no-op. A link brings its shown
    /// connector markers along.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidNode`] or [`CmapError::InvalidArgument`]
    /// for unknown handles, and [`CmapError::InvalidArgument`] for markers,
    /// which are managed through [`show_connector`](Self::show_connector).
    pub fn add(&mut self, id: ComponentId) -> Result<(), CmapError> {
        self.ensure_exists(id)?;
        if let ComponentId::Marker(marker) = id {
            return Err(CmapError::InvalidArgument(format!(
                "{marker} is managed by its link and cannot be added directly"
            )));
        }
        if self.render_order.contains(&id) {
            return Ok(());
        }

        self.attach(id);
        if let ComponentId::Link(link) = id {
            for marker in self.markers_of(link) {
                self.attach(marker.into());
            }
        }
        debug!(id:%; "Added component");
        Ok(())
    }

    /// Removes a component from the diagram and destroys it.
    ///
    /// All connections of the component are severed first; removing a link
    /// also hides its connector markers.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles and for markers.
    pub fn remove(&mut self, id: ComponentId) -> Result<(), CmapError> {
        self.ensure_exists(id)?;
        match id {
            ComponentId::Marker(marker) => {
                return Err(CmapError::InvalidArgument(format!(
                    "{marker} is managed by its link; hide the connector instead"
                )));
            }
            ComponentId::Link(link) => {
                for end in End::ALL {
                    self.hide_connector(end, link)?;
                }
                if self.selected_link == Some(link) {
                    self.selected_link = None;
                }
            }
            ComponentId::Shape(_) => {}
        }

        self.disconnect_component(id)?;
        self.detach(id);
        self.components.remove(id);
        if self.drag.involves(id) {
            self.drag = DragState::Idle;
        }
        debug!(id:%; "Removed component");
        Ok(())
    }

    /// Returns true if the component exists, attached or not.
    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains(id)
    }

    /// Returns true if the component is in the render order.
    pub fn is_attached(&self, id: ComponentId) -> bool {
        self.render_order.contains(&id)
    }

    /// Attached components, bottom first.
    pub fn render_order(&self) -> impl Iterator<Item = ComponentId> + '_ {
        self.render_order.iter().copied()
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidNode`] if the shape does not exist.
    pub fn shape(&self, id: ShapeId) -> Result<&Shape, CmapError> {
        self.components.shape(id).ok_or(CmapError::InvalidNode(id))
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn link(&self, id: LinkId) -> Result<&Link, CmapError> {
        self.components
            .link(id)
            .ok_or_else(|| CmapError::unknown_link(id))
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the marker does not exist.
    pub fn marker(&self, id: MarkerId) -> Result<&ConnectorMarker, CmapError> {
        self.components
            .marker(id)
            .ok_or_else(|| CmapError::InvalidArgument(format!("{id} does not exist")))
    }

    pub fn view(&self, id: ComponentId) -> Option<ComponentView<'_>> {
        self.components.view(id)
    }

    pub fn relation(&self, id: RelationId) -> Option<&Relation> {
        self.relations.get(id)
    }

    /// Relations registered on a component; empty for unknown components.
    pub fn relations_of(&self, id: ComponentId) -> &[RelationId] {
        self.components.relations(id).unwrap_or_default()
    }

    /// Moves a shape so that its top-left corner is at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidNode`] if the shape does not exist.
    pub fn move_shape(&mut self, id: ShapeId, position: Point) -> Result<(), CmapError> {
        let shape = self
            .components
            .shape_mut(id)
            .ok_or(CmapError::InvalidNode(id))?;
        if shape.set_position(position, &mut self.scheduler) {
            trace!(id:%, position:?; "Moved shape");
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidNode`] if the shape does not exist and
    /// [`CmapError::InvalidArgument`] for a size that is not positive.
    pub fn set_shape_size(&mut self, id: ShapeId, size: Size) -> Result<(), CmapError> {
        if !(size.width() > 0.0 && size.height() > 0.0) {
            return Err(CmapError::InvalidArgument(format!(
                "shape size must be positive, got {}x{}",
                size.width(),
                size.height()
            )));
        }
        let shape = self
            .components
            .shape_mut(id)
            .ok_or(CmapError::InvalidNode(id))?;
        shape.set_size(size, &mut self.scheduler);
        Ok(())
    }

    /// Writes one endpoint of a link.
    ///
    /// An anchored endpoint is snapped back onto its shape by the next settle
    /// pass.
    ///
    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn set_link_endpoint(
        &mut self,
        id: LinkId,
        end: End,
        point: Point,
    ) -> Result<(), CmapError> {
        let link = self
            .components
            .link_mut(id)
            .ok_or_else(|| CmapError::unknown_link(id))?;
        link.set_endpoint(end, point, &mut self.scheduler);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn set_link_midpoint(&mut self, id: LinkId, mid: Point) -> Result<(), CmapError> {
        let link = self
            .components
            .link_mut(id)
            .ok_or_else(|| CmapError::unknown_link(id))?;
        link.set_mid(mid, &mut self.scheduler);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`CmapError::InvalidArgument`] if the link does not exist.
    pub fn set_link_geometry(
        &mut self,
        id: LinkId,
        geometry: LinkGeometry,
    ) -> Result<(), CmapError> {
        let link = self
            .components
            .link_mut(id)
            .ok_or_else(|| CmapError::unknown_link(id))?;
        link.set_geometry(geometry, &mut self.scheduler);
        Ok(())
    }

    /// Allows or forbids dragging a shape or a link.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles and for markers.
    pub fn set_draggable(&mut self, id: ComponentId, draggable: bool) -> Result<(), CmapError> {
        match id {
            ComponentId::Shape(shape) => self
                .components
                .shape_mut(shape)
                .ok_or(CmapError::InvalidNode(shape))?
                .set_draggable(draggable),
            ComponentId::Link(link) => self.link_mut(link)?.set_draggable(draggable),
            ComponentId::Marker(marker) => {
                return Err(CmapError::InvalidArgument(format!(
                    "{marker} is always draggable"
                )));
            }
        }
        Ok(())
    }

    /// Moves a component to the top of the render order.
    ///
    /// A link is followed by its connector markers; a marker brings its whole
    /// link to the front. Detached components are left alone.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles.
    pub fn to_front(&mut self, id: ComponentId) -> Result<(), CmapError> {
        self.ensure_exists(id)?;
        let link = match id {
            ComponentId::Shape(_) => {
                self.raise(id);
                return Ok(());
            }
            ComponentId::Link(link) => link,
            ComponentId::Marker(marker) => self.marker(marker)?.link(),
        };

        self.raise(link.into());
        for marker in self.markers_of(link) {
            self.raise(marker.into());
        }
        Ok(())
    }

    /// Returns the topmost attached component under `point`.
    ///
    /// Shapes are hit inside their rectangle, links inside their label box
    /// and markers inside their circle.
    pub fn from_point(&self, point: Point) -> Option<ComponentId> {
        self.render_order
            .iter()
            .rev()
            .copied()
            .find(|id| self.hit(*id, point))
    }

    /// Returns the topmost attached shape under `point`, skipping `exclude`.
    pub fn shape_at(&self, point: Point, exclude: Option<ShapeId>) -> Option<ShapeId> {
        self.render_order.iter().rev().find_map(|id| match id {
            ComponentId::Shape(shape) if Some(*shape) != exclude && self.hit(*id, point) => {
                Some(*shape)
            }
            _ => None,
        })
    }

    /// Smallest bounds holding every attached component, or `None` for an
    /// empty render order.
    pub fn content_bounds(&self) -> Option<Bounds> {
        self.render_order
            .iter()
            .filter_map(|id| self.bounds_of(*id))
            .reduce(|acc, bounds| acc.merge(&bounds))
    }

    /// Propagates every pending change and redraws what changed.
    ///
    /// Relations of dirty components are updated until no component is left
    /// unresolved. Removed components are then detached from `sink`, and every
    /// attached component that changed is redrawn exactly once, in the order
    /// it first changed.
    pub fn settle(&mut self, sink: &mut dyn RenderSink) -> SettleReport {
        let mut report = SettleReport::default();
        let limit = self.config.interaction().max_settle_updates();

        while let Some(id) = self.scheduler.next_unresolved() {
            if report.resolved >= limit {
                warn!(limit; "Settle pass did not reach a fixpoint, aborting");
                report.aborted = true;
                break;
            }
            report.resolved += 1;

            let relations = self.relations_of(id).to_vec();
            for relation in relations {
                if let Some(relation) = self.relations.get_mut(relation) {
                    relation.update(id, &mut self.components, &mut self.scheduler);
                }
            }
        }

        let (dirty, detached) = self.scheduler.finish_pass();
        for id in &detached {
            sink.detach(*id);
        }
        for id in dirty {
            if !self.render_order.contains(&id) {
                continue;
            }
            if let Some(view) = self.components.view(id) {
                sink.redraw(view);
                report.redrawn.push(id);
            }
        }
        self.relations.clear_suppressions();

        trace!(
            resolved = report.resolved,
            redrawn = report.redrawn.len(),
            detached = detached.len();
            "Settled diagram"
        );
        report.detached = detached;
        report
    }

    fn ensure_exists(&self, id: ComponentId) -> Result<(), CmapError> {
        match id {
            ComponentId::Shape(shape) => self.shape(shape).map(|_| ()),
            ComponentId::Link(link) => self.link(link).map(|_| ()),
            ComponentId::Marker(marker) => self.marker(marker).map(|_| ()),
        }
    }

    fn link_mut(&mut self, id: LinkId) -> Result<&mut Link, CmapError> {
        self.components
            .link_mut(id)
            .ok_or_else(|| CmapError::unknown_link(id))
    }

    fn attach(&mut self, id: ComponentId) {
        if self.render_order.insert(id) {
            self.scheduler.mark_dirty(id);
        }
    }

    fn detach(&mut self, id: ComponentId) {
        if self.render_order.shift_remove(&id) {
            self.scheduler.mark_detached(id);
        }
    }

    fn raise(&mut self, id: ComponentId) {
        if self.render_order.shift_remove(&id) {
            self.render_order.insert(id);
        }
    }

    fn hit(&self, id: ComponentId, point: Point) -> bool {
        match self.components.view(id) {
            Some(ComponentView::Shape(shape)) => shape.contains(point),
            Some(ComponentView::Link(link)) => link.label_bounds().contains(point),
            Some(ComponentView::Marker(marker)) => marker.contains(point),
            None => false,
        }
    }

    fn bounds_of(&self, id: ComponentId) -> Option<Bounds> {
        match self.components.view(id)? {
            ComponentView::Shape(shape) => Some(shape.bounds()),
            ComponentView::Link(link) => {
                let geometry = link.geometry();
                let points = Bounds::new_from_top_left(geometry.source, Size::default())
                    .merge(&Bounds::new_from_top_left(geometry.target, Size::default()));
                Some(points.merge(&link.label_bounds()))
            }
            ComponentView::Marker(marker) => {
                let diameter = marker.radius() * 2.0;
                Some(Bounds::new_from_center(
                    marker.position(),
                    Size::new(diameter, diameter),
                ))
            }
        }
    }
}
