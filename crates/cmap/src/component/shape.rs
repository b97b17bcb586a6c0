//! Rectangular diagram nodes.

use serde::Deserialize;

use cmap_core::geometry::{Bounds, Point, RoundedRect, Size};

use crate::{
    cell::PropertyCell,
    id::{ComponentId, RelationId, ShapeId},
    scheduler::Scheduler,
};

/// How the content string of a shape or link is interpreted by the renderer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Text,
    Html,
}

impl ContentType {
    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Html => "html",
        }
    }

    /// Parses a content type name, returning `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "text" => Some(Self::Text),
            "html" => Some(Self::Html),
            _ => None,
        }
    }
}

/// Initial attributes of a shape.
///
/// Every field has a default, so hosts only spell out what differs:
///
/// ```
/// # use cmap::component::ShapeAttrs;
/// let attrs = ShapeAttrs::default()
///     .with_position(100.0, 40.0)
///     .with_content("Rust");
/// assert_eq!(attrs.width, 75.0);
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShapeAttrs {
    pub content: String,
    pub content_type: ContentType,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub background_color: String,
    pub border_color: String,
    pub border_width: f32,
    pub text_color: String,
    pub draggable: bool,
}

impl Default for ShapeAttrs {
    fn default() -> Self {
        Self {
            content: String::new(),
            content_type: ContentType::Text,
            x: 0.0,
            y: 0.0,
            width: Shape::DEFAULT_WIDTH,
            height: Shape::DEFAULT_HEIGHT,
            background_color: String::from("#a7cbe6"),
            border_color: String::from("#333"),
            border_width: 2.0,
            text_color: String::from("#333"),
            draggable: true,
        }
    }
}

impl ShapeAttrs {
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// A positioned, sized rectangle with rounded corners.
#[derive(Debug, Clone)]
pub struct Shape {
    id: ShapeId,
    position: PropertyCell<Point>,
    size: PropertyCell<Size>,
    corner_radius: f32,
    content: PropertyCell<String>,
    content_type: PropertyCell<ContentType>,
    background_color: PropertyCell<String>,
    border_color: PropertyCell<String>,
    border_width: PropertyCell<f32>,
    text_color: PropertyCell<String>,
    draggable: bool,
    pub(crate) relations: Vec<RelationId>,
}

impl Shape {
    pub const DEFAULT_WIDTH: f32 = 75.0;
    pub const DEFAULT_HEIGHT: f32 = 30.0;
    pub const DEFAULT_BORDER_WIDTH: f32 = 2.0;

    pub(crate) fn new(id: ShapeId, attrs: ShapeAttrs, corner_radius: f32) -> Self {
        Self {
            id,
            position: PropertyCell::new(Point::new(attrs.x, attrs.y)),
            size: PropertyCell::new(Size::new(attrs.width, attrs.height)),
            corner_radius,
            content: PropertyCell::new(attrs.content),
            content_type: PropertyCell::new(attrs.content_type),
            background_color: PropertyCell::new(attrs.background_color),
            border_color: PropertyCell::new(attrs.border_color),
            border_width: PropertyCell::new(attrs.border_width),
            text_color: PropertyCell::new(attrs.text_color),
            draggable: attrs.draggable,
            relations: Vec::new(),
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    fn owner(&self) -> ComponentId {
        self.id.into()
    }

    /// Top-left corner of the shape.
    pub fn position(&self) -> Point {
        *self.position.get()
    }

    pub fn size(&self) -> Size {
        *self.size.get()
    }

    pub fn corner_radius(&self) -> f32 {
        self.corner_radius
    }

    pub fn center(&self) -> Point {
        self.position().add_point(self.size().half())
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new_from_top_left(self.position(), self.size())
    }

    /// The rounded-rectangle silhouette links are anchored on.
    pub fn outline(&self) -> RoundedRect {
        RoundedRect::new(self.bounds(), self.corner_radius)
    }

    /// Returns true if `point` lies on or inside the shape's rectangle.
    pub fn contains(&self, point: Point) -> bool {
        self.bounds().contains(point)
    }

    /// Point of the outline a link heading towards `external` should touch.
    pub fn connected_point(&self, external: Point) -> Point {
        self.outline().boundary_point_toward(external)
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

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    /// Relations registered on this shape.
    pub fn relations(&self) -> &[RelationId] {
        &self.relations
    }

    pub(crate) fn set_position(&mut self, position: Point, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.position.set(position, owner, scheduler)
    }

    pub(crate) fn set_size(&mut self, size: Size, scheduler: &mut Scheduler) -> bool {
        let owner = self.owner();
        self.size.set(size, owner, scheduler)
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

    pub(crate) fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;
    use crate::scheduler::ManualClock;

    fn shape(x: f32, y: f32, width: f32, height: f32) -> Shape {
        Shape::new(
            ShapeId::new(1),
            ShapeAttrs::default()
                .with_position(x, y)
                .with_size(width, height),
            4.0,
        )
    }

    #[test]
    fn test_center_and_bounds() {
        let shape = shape(10.0, 20.0, 80.0, 40.0);
        assert_eq!(shape.center(), Point::new(50.0, 40.0));
        assert!(shape.contains(Point::new(10.0, 20.0)));
        assert!(!shape.contains(Point::new(91.0, 40.0)));
    }

    #[test]
    fn test_connected_point_uses_outline() {
        let shape = shape(0.0, 0.0, 80.0, 40.0);
        let point = shape.connected_point(Point::new(40.0, -100.0));
        assert_approx_eq!(f32, point.x(), 40.0, epsilon = 0.001);
        assert_approx_eq!(f32, point.y(), 0.0, epsilon = 0.001);
    }

    #[test]
    fn test_set_position_marks_dirty_only_on_change() {
        let mut scheduler = Scheduler::new(Box::new(ManualClock));
        let mut shape = shape(0.0, 0.0, 80.0, 40.0);

        assert!(!shape.set_position(Point::new(0.0, 0.0), &mut scheduler));
        assert!(!scheduler.is_dirty(shape.id().into()));

        assert!(shape.set_position(Point::new(5.0, 0.0), &mut scheduler));
        assert!(scheduler.is_dirty(shape.id().into()));
        assert_eq!(shape.center(), Point::new(45.0, 20.0));
    }

    #[test]
    fn test_default_attrs() {
        let attrs = ShapeAttrs::default();
        assert_eq!(attrs.width, 75.0);
        assert_eq!(attrs.height, 30.0);
        assert_eq!(attrs.background_color, "#a7cbe6");
        assert!(attrs.draggable);
        assert_eq!(ContentType::from_name("html"), Some(ContentType::Html));
        assert_eq!(ContentType::from_name("svg"), None);
    }
}
