//! Elbowed connector edges.

use serde::Deserialize;

use cmap_core::geometry::{Bounds, Point, Size};

use super::shape::ContentType;
use crate::{
    cell::PropertyCell,
    id::{ByEnd, ComponentId, End, LinkId, RelationId},
    scheduler::Scheduler,
};

/// Initial attributes of a link.
///
/// Endpoints left as `None` default to 70 units left and right of the
/// midpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LinkAttrs {
    pub content: String,
    pub content_type: ContentType,
    pub cx: f32,
    pub cy: f32,
    pub width: f32,
    pub height: f32,
    pub source_x: Option<f32>,
    pub source_y: Option<f32>,
    pub target_x: Option<f32>,
    pub target_y: Option<f32>,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f32,
    pub text_color: String,
    pub line_color: String,
    pub line_width: f32,
    pub has_arrow: bool,
    pub draggable: bool,
}

impl Default for LinkAttrs {
    fn default() -> Self {
        Self {
            content: String::new(),
            content_type: ContentType::Text,
            cx: 100.0,
            cy: 40.0,
            width: Link::DEFAULT_LABEL_WIDTH,
            height: Link::DEFAULT_LABEL_HEIGHT,
            source_x: None,
            source_y: None,
            target_x: None,
            target_y: None,
            background_color: String::from("white"),
            border_color: String::from("#333"),
            border_width: 2.0,
            text_color: String::from("#333"),
            line_color: String::from("#333"),
            line_width: 2.0,
            has_arrow: false,
            draggable: true,
        }
    }
}

impl LinkAttrs {
    pub fn with_mid(mut self, cx: f32, cy: f32) -> Self {
        self.cx = cx;
        self.cy = cy;
        self
    }

    pub fn with_source(mut self, x: f32, y: f32) -> Self {
        self.source_x = Some(x);
        self.source_y = Some(y);
        self
    }

    pub fn with_target(mut self, x: f32, y: f32) -> Self {
        self.target_x = Some(x);
        self.target_y = Some(y);
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_arrow(mut self, has_arrow: bool) -> Self {
        self.has_arrow = has_arrow;
        self
    }

    fn geometry(&self) -> LinkGeometry {
        let mid = Point::new(self.cx, self.cy);
        LinkGeometry {
            source: Point::new(
                self.source_x.unwrap_or(self.cx - Link::DEFAULT_HALF_SPAN),
                self.source_y.unwrap_or(self.cy),
            ),
            mid,
            target: Point::new(
                self.target_x.unwrap_or(self.cx + Link::DEFAULT_HALF_SPAN),
                self.target_y.unwrap_or(self.cy),
            ),
        }
    }
}

/// The five coordinates of a link: two endpoints and the midpoint.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LinkGeometry {
    pub source: Point,
    pub mid: Point,
    pub target: Point,
}

impl LinkGeometry {
    pub fn new(source: Point, mid: Point, target: Point) -> Self {
        Self {
            source,
            mid,
            target,
        }
    }

    pub fn endpoint(&self, end: End) -> Point {
        match end {
            End::Source => self.source,
            End::Target => self.target,
        }
    }

    pub fn with_endpoint(mut self, end: End, point: Point) -> Self {
        match end {
            End::Source => self.source = point,
            End::Target => self.target = point,
        }
        self
    }

    pub fn with_mid(mut self, mid: Point) -> Self {
        self.mid = mid;
        self
    }

    /// Moves all five coordinates by `offset`.
    pub fn translate(self, offset: Point) -> Self {
        Self {
            source: self.source.add_point(offset),
            mid: self.mid.add_point(offset),
            target: self.target.add_point(offset),
        }
    }

    /// Distance between the two endpoints.
    pub fn length(&self) -> f32 {
        self.source.distance(self.target)
    }
}

/// An edge drawn source → midpoint → target, with a label box on the midpoint.
#[derive(Debug, Clone)]
pub struct Link {
    id: LinkId,
    source: PropertyCell<Point>,
    mid: PropertyCell<Point>,
    target: PropertyCell<Point>,
    content: PropertyCell<String>,
    content_type: PropertyCell<ContentType>,
    label_size: PropertyCell<Size>,
    background_color: PropertyCell<String>,
    border_color: PropertyCell<String>,
    border_width: PropertyCell<f32>,
    text_color: PropertyCell<String>,
    line_color: PropertyCell<String>,
    line_width: PropertyCell<f32>,
    has_arrow: PropertyCell<bool>,
    draggable: bool,
    connector_enabled: ByEnd<bool>,
    pub(crate) relations: Vec<RelationId>,
}

impl Link {
    pub const DEFAULT_LABEL_WIDTH: f32 = 50.0;
    pub const DEFAULT_LABEL_HEIGHT: f32 = 20.0;
    pub const DEFAULT_LINE_WIDTH: f32 = 2.0;
    pub const DEFAULT_BORDER_WIDTH: f32 = 2.0;
    const DEFAULT_HALF_SPAN: f32 = 70.0;

    pub(crate) fn new(id: LinkId, attrs: LinkAttrs) -> Self {
        let geometry = attrs.geometry();
        Self {
            id,
            source: PropertyCell::new(geometry.source),
            mid: PropertyCell::new(geometry.mid),
            target: PropertyCell::new(geometry.target),
            content: PropertyCell::new(attrs.content),
            content_type: PropertyCell::new(attrs.content_type),
            label_size: PropertyCell::new(Size::new(attrs.width, attrs.height)),
            background_color: PropertyCell::new(attrs.background_color),
            border_color: PropertyCell::new(attrs.border_color),
            border_width: PropertyCell::new(attrs.border_width),
            text_color: PropertyCell::new(attrs.text_color),
            line_color: PropertyCell::new(attrs.line_color),
            line_width: PropertyCell::new(attrs.line_width),
            has_arrow: PropertyCell::new(attrs.has_arrow),
            draggable: attrs.draggable,
            connector_enabled: ByEnd::splat(true),
            relations: Vec::new(),
        }
    }

    pub fn id(&self) -> LinkId {
        self.id
    }

    fn owner(&self) -> ComponentId {
        self.id.into()
    }

    pub fn geometry(&self) -> LinkGeometry {
        LinkGeometry {
            source: *self.source.get(),
            mid: *self.mid.get(),
            target: *self.target.get(),
        }
    }

    pub fn source(&self) -> Point {
        *self.source.get()
    }

    pub fn target(&self) -> Point {
        *self.target.get()
    }

    /// The content anchor of the link.
    pub fn mid(&self) -> Point {
        *self.mid.get()
    }

    pub fn endpoint(&self, end: End) -> Point {
        match end {
            End::Source => self.source(),
            End::Target => self.target(),
        }
    }

    pub fn label_size(&self) -> Size {
        *self.label_size.get()
    }

    /// Label box centered on the midpoint; used for hit testing.
    pub fn label_bounds(&self) -> Bounds {
        Bounds::new_from_center(self.mid(), self.label_size())
    }

    pub fn content(&self) -> &str {
        self.content.get()
    }

    pub fn content_type(&self) -> ContentType {
        *self.content_type.get()
    }

    pub fn background_color(&self) -> &str {
        self.background_color.get()
    }

    pub fn border_color(&self) -> &str {
        self.border_color.get()
    }

    pub fn border_width(&self) -> f32 {
        *self.border_width.get()
    }

    pub fn text_color(&self) -> &str {
        self.text_color.get()
    }

    pub fn line_color(&self) -> &str {
        self.line_color.get()
    }

    pub fn line_width(&self) -> f32 {
        *self.line_width.get()
    }

    pub fn has_arrow(&self) -> bool {
        *self.has_arrow.get()
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn is_connector_enabled(&self, end: End) -> bool {
        *self.connector_enabled.get(end)
    }

    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    /// Writes all five coordinates. Returns whether anything changed.
    pub(crate) fn set_geometry(
        &mut self,
        geometry: LinkGeometry,
        scheduler: &mut Scheduler,
    ) -> bool {
        let owner = self.owner();
        let source = self.source.set(geometry.source, owner, scheduler);
        let mid = self.mid.set(geometry.mid, owner, scheduler);
        let target = self.target.set(geometry.target, owner, scheduler);
        source || mid || target
    }

    pub(crate) fn set_endpoint(
        &mut self,
        end: End,
        point: Point,
        scheduler: &mut Scheduler,
    ) -> bool {
        let owner = self.owner();
        match end {
            End::Source => self.source.set(point, owner, scheduler),
            End::Target => self.target.set(point, owner, scheduler),
        }
    }

    pub(crate) fn set_mid(&mut self, mid: Point, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.mid.set(mid, owner, scheduler)
    }

    pub(crate) fn set_label_size(&mut self, size: Size, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.label_size.set(size, owner, scheduler)
    }

    pub(crate) fn set_content(&mut self, content: String, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.content.set(content, owner, scheduler)
    }

    pub(crate) fn set_content_type(
        &mut self,
        content_type: ContentType,
        scheduler: &mut Scheduler,
    ) -> bool {
        let owner = self.owner();
        self.content_type.set(content_type, owner, scheduler)
    }

    pub(crate) fn set_background_color(
        &mut self,
        color: String,
        scheduler: &mut Scheduler,
    ) -> bool {
        let owner = self.owner();
        self.background_color.set(color, owner, scheduler)
    }

    pub(crate) fn set_border_color(&mut self, color: String, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.border_color.set(color, owner, scheduler)
    }

    pub(crate) fn set_border_width(&mut self, width: f32, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.border_width.set(width, owner, scheduler)
    }

    pub(crate) fn set_text_color(&mut self, color: String, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.text_color.set(color, owner, scheduler)
    }

    pub(crate) fn set_line_color(&mut self, color: String, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.line_color.set(color, owner, scheduler)
    }

    pub(crate) fn set_line_width(&mut self, width: f32, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.line_width.set(width, owner, scheduler)
    }

    pub(crate) fn set_has_arrow(&mut self, has_arrow: bool, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.has_arrow.set(has_arrow, owner, scheduler)
    }

    pub(crate) fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    pub(crate) fn set_connector_enabled(&mut self, end: End, enabled: bool) {
        self.connector_enabled.set(end, enabled);
    }
}
