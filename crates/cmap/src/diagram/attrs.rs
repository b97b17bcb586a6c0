//! Named attribute access.

use indexmap::IndexMap;

use cmap_core::geometry::{Point, Size};

use super::Diagram;
use crate::{
    attr::{self, AttrValue, LINK_ATTRIBUTES, MARKER_ATTRIBUTES, SHAPE_ATTRIBUTES},
    component::{ComponentView, ContentType, Link, LinkAttrs, Shape, ShapeAttrs},
    error::CmapError,
    id::{ComponentId, End, LinkId, ShapeId},
};

fn unknown_attribute(id: ComponentId, name: &str) -> CmapError {
    CmapError::InvalidArgument(format!("{id} has no attribute `{name}`"))
}

fn positive_or(value: Option<&AttrValue>, default: f32) -> f32 {
    let number = attr::number_or(value, default);
    if number > 0.0 { number } else { default }
}

impl Diagram {
    /// Reads an attribute by name.
    ///
    /// # Errors
    ///
    /// Fails for unknown components and unknown attribute names.
    pub fn attr(&self, id: ComponentId, name: &str) -> Result<AttrValue, CmapError> {
        let view = match id {
            ComponentId::Shape(shape) => ComponentView::Shape(self.shape(shape)?),
            ComponentId::Link(link) => ComponentView::Link(self.link(link)?),
            ComponentId::Marker(marker) => ComponentView::Marker(self.marker(marker)?),
        };

        let value: Option<AttrValue> = match view {
            ComponentView::Shape(shape) => shape_attr(shape, name),
            ComponentView::Link(link) => link_attr(link, name),
            ComponentView::Marker(marker) => match name {
                "x" => Some(marker.position().x().into()),
                "y" => Some(marker.position().y().into()),
                "r" => Some(marker.radius().into()),
                "connected" => Some(marker.state().is_connected().into()),
                _ => None,
            },
        };
        value.ok_or_else(|| unknown_attribute(id, name))
    }

    /// Reads every attribute of a component, in a fixed order.
    ///
    /// # Errors
    ///
    /// Fails for unknown components.
    pub fn attrs(&self, id: ComponentId) -> Result<IndexMap<&'static str, AttrValue>, CmapError> {
        let names = match id {
            ComponentId::Shape(_) => SHAPE_ATTRIBUTES,
            ComponentId::Link(_) => LINK_ATTRIBUTES,
            ComponentId::Marker(_) => MARKER_ATTRIBUTES,
        };
        names
            .iter()
            .map(|name| self.attr(id, name).map(|value| (*name, value)))
            .collect()
    }

    /// Writes an attribute by name, coercing `value` to the attribute's type.
    ///
    /// `None` and values that cannot be coerced reset numeric attributes to
    /// their default. An unknown `content_type` is ignored.
    ///
    /// # Errors
    ///
    /// Fails for unknown components, unknown attribute names and for every
    /// marker attribute, which are read-only.
    pub fn set_attr(
        &mut self,
        id: ComponentId,
        name: &str,
        value: Option<AttrValue>,
    ) -> Result<(), CmapError> {
        match id {
            ComponentId::Shape(shape) => self.set_shape_attr(shape, name, value.as_ref()),
            ComponentId::Link(link) => self.set_link_attr(link, name, value.as_ref()),
            ComponentId::Marker(marker) => {
                self.marker(marker)?;
                if MARKER_ATTRIBUTES.iter().any(|attribute| *attribute == name) {
                    Err(CmapError::InvalidArgument(format!(
                        "attribute `{name}` of {marker} is read-only"
                    )))
                } else {
                    Err(unknown_attribute(id, name))
                }
            }
        }
    }

    fn set_shape_attr(
        &mut self,
        id: ShapeId,
        name: &str,
        value: Option<&AttrValue>,
    ) -> Result<(), CmapError> {
        let defaults = ShapeAttrs::default();
        let scheduler = &mut self.scheduler;
        let shape = self
            .components
            .shape_mut(id)
            .ok_or(CmapError::InvalidNode(id))?;

        match name {
            "content" => {
                shape.set_content(attr::text_or(value, ""), scheduler);
            }
            "content_type" => {
                if let Some(content_type) = content_type_of(value) {
                    shape.set_content_type(content_type, scheduler);
                }
            }
            "x" => {
                let position = shape.position().with_x(attr::number_or(value, defaults.x));
                shape.set_position(position, scheduler);
            }
            "y" => {
                let position = shape.position().with_y(attr::number_or(value, defaults.y));
                shape.set_position(position, scheduler);
            }
            "width" => {
                let size = Size::new(positive_or(value, defaults.width), shape.size().height());
                shape.set_size(size, scheduler);
            }
            "height" => {
                let size = Size::new(shape.size().width(), positive_or(value, defaults.height));
                shape.set_size(size, scheduler);
            }
            "background_color" => {
                shape.set_background_color(
                    attr::text_or(value, &defaults.background_color),
                    scheduler,
                );
            }
            "border_color" => {
                shape.set_border_color(attr::text_or(value, &defaults.border_color), scheduler);
            }
            "border_width" => {
                shape.set_border_width(attr::number_or(value, defaults.border_width), scheduler);
            }
            "text_color" => {
                shape.set_text_color(attr::text_or(value, &defaults.text_color), scheduler);
            }
            "draggable" => shape.set_draggable(attr::flag_or(value, defaults.draggable)),
            _ => return Err(unknown_attribute(id.into(), name)),
        }
        Ok(())
    }

    fn set_link_attr(
        &mut self,
        id: LinkId,
        name: &str,
        value: Option<&AttrValue>,
    ) -> Result<(), CmapError> {
        let defaults = LinkAttrs::default();
        let scheduler = &mut self.scheduler;
        let link = self
            .components
            .link_mut(id)
            .ok_or_else(|| CmapError::unknown_link(id))?;
        let mid = link.mid();

        match name {
            "content" => {
                link.set_content(attr::text_or(value, ""), scheduler);
            }
            "content_type" => {
                if let Some(content_type) = content_type_of(value) {
                    link.set_content_type(content_type, scheduler);
                }
            }
            "cx" => {
                link.set_mid(mid.with_x(attr::number_or(value, defaults.cx)), scheduler);
            }
            "cy" => {
                link.set_mid(mid.with_y(attr::number_or(value, defaults.cy)), scheduler);
            }
            "width" => {
                let size = Size::new(
                    positive_or(value, defaults.width),
                    link.label_size().height(),
                );
                link.set_label_size(size, scheduler);
            }
            "height" => {
                let size = Size::new(
                    link.label_size().width(),
                    positive_or(value, defaults.height),
                );
                link.set_label_size(size, scheduler);
            }
            "background_color" => {
                link.set_background_color(
                    attr::text_or(value, &defaults.background_color),
                    scheduler,
                );
            }
            "border_color" => {
                link.set_border_color(attr::text_or(value, &defaults.border_color), scheduler);
            }
            "border_width" => {
                link.set_border_width(attr::number_or(value, defaults.border_width), scheduler);
            }
            "text_color" => {
                link.set_text_color(attr::text_or(value, &defaults.text_color), scheduler);
            }
            "source_x" | "source_y" | "target_x" | "target_y" => {
                let (end, default) = match name {
                    "source_x" | "source_y" => (End::Source, mid.sub_point(Point::new(70.0, 0.0))),
                    _ => (End::Target, mid.add_point(Point::new(70.0, 0.0))),
                };
                let current = link.endpoint(end);
                let point = if name.ends_with("_x") {
                    current.with_x(attr::number_or(value, default.x()))
                } else {
                    current.with_y(attr::number_or(value, default.y()))
                };
                link.set_endpoint(end, point, scheduler);
            }
            "line_color" => {
                link.set_line_color(attr::text_or(value, &defaults.line_color), scheduler);
            }
            "line_width" => {
                link.set_line_width(attr::number_or(value, defaults.line_width), scheduler);
            }
            "has_arrow" => {
                link.set_has_arrow(attr::flag_or(value, defaults.has_arrow), scheduler);
            }
            "draggable" => link.set_draggable(attr::flag_or(value, defaults.draggable)),
            _ => return Err(unknown_attribute(id.into(), name)),
        }
        Ok(())
    }
}

fn content_type_of(value: Option<&AttrValue>) -> Option<ContentType> {
    match value {
        None => Some(ContentType::Text),
        Some(value) => ContentType::from_name(&value.to_text()),
    }
}

fn shape_attr(shape: &Shape, name: &str) -> Option<AttrValue> {
    let value: AttrValue = match name {
        "content" => shape.content().into(),
        "content_type" => shape.content_type().name().into(),
        "x" => shape.position().x().into(),
        "y" => shape.position().y().into(),
        "width" => shape.size().width().into(),
        "height" => shape.size().height().into(),
        "background_color" => shape.background_color().into(),
        "border_color" => shape.border_color().into(),
        "border_width" => shape.border_width().into(),
        "text_color" => shape.text_color().into(),
        "draggable" => shape.is_draggable().into(),
        _ => return None,
    };
    Some(value)
}

fn link_attr(link: &Link, name: &str) -> Option<AttrValue> {
    let geometry = link.geometry();
    let value: AttrValue = match name {
        "content" => link.content().into(),
        "content_type" => link.content_type().name().into(),
        "cx" => geometry.mid.x().into(),
        "cy" => geometry.mid.y().into(),
        "width" => link.label_size().width().into(),
        "height" => link.label_size().height().into(),
        "background_color" => link.background_color().into(),
        "border_color" => link.border_color().into(),
        "border_width" => link.border_width().into(),
        "text_color" => link.text_color().into(),
        "source_x" => geometry.source.x().into(),
        "source_y" => geometry.source.y().into(),
        "target_x" => geometry.target.x().into(),
        "target_y" => geometry.target.y().into(),
        "line_color" => link.line_color().into(),
        "line_width" => link.line_width().into(),
        "has_arrow" => link.has_arrow().into(),
        "draggable" => link.is_draggable().into(),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_text_is_coerced() {
        let mut diagram = Diagram::default();
        let shape = diagram.create_shape(ShapeAttrs::default());

        diagram
            .set_attr(shape.into(), "width", Some(AttrValue::from("200")))
            .unwrap();
        assert_eq!(diagram.shape(shape).unwrap().size().width(), 200.0);

        diagram
            .set_attr(shape.into(), "width", Some(AttrValue::from("wide")))
            .unwrap();
        assert_eq!(diagram.shape(shape).unwrap().size().width(), 75.0);

        diagram.set_attr(shape.into(), "height", None).unwrap();
        assert_eq!(diagram.attr(shape.into(), "height"), Ok(AttrValue::Number(30.0)));
    }

    #[test]
    fn test_text_and_flag_coercion() {
        let mut diagram = Diagram::default();
        let link = diagram.create_link(LinkAttrs::default());

        diagram
            .set_attr(link.into(), "content", Some(AttrValue::from(42.0)))
            .unwrap();
        diagram
            .set_attr(link.into(), "has_arrow", Some(AttrValue::from(1.0)))
            .unwrap();
        assert_eq!(diagram.link(link).unwrap().content(), "42");
        assert!(diagram.link(link).unwrap().has_arrow());
    }

    #[test]
    fn test_unknown_content_type_is_ignored() {
        let mut diagram = Diagram::default();
        let shape = diagram.create_shape(ShapeAttrs::default());

        diagram
            .set_attr(shape.into(), "content_type", Some(AttrValue::from("html")))
            .unwrap();
        diagram
            .set_attr(shape.into(), "content_type", Some(AttrValue::from("markdown")))
            .unwrap();
        assert_eq!(diagram.shape(shape).unwrap().content_type(), ContentType::Html);
    }

    #[test]
    fn test_link_endpoint_defaults_follow_midpoint() {
        let mut diagram = Diagram::default();
        let link = diagram.create_link(LinkAttrs::default().with_source(0.0, 0.0));

        diagram.set_attr(link.into(), "source_x", None).unwrap();
        diagram.set_attr(link.into(), "source_y", None).unwrap();
        assert_eq!(diagram.link(link).unwrap().source(), Point::new(30.0, 40.0));
    }

    #[test]
    fn test_marker_attributes_are_read_only() {
        let mut diagram = Diagram::default();
        let link = diagram.create_link(LinkAttrs::default());
        diagram.add(link.into()).unwrap();
        let marker = diagram.show_connector(End::Source, link).unwrap().unwrap();

        assert_eq!(diagram.attr(marker.into(), "r"), Ok(AttrValue::Number(16.0)));
        assert!(matches!(
            diagram.set_attr(marker.into(), "x", Some(AttrValue::from(3.0))),
            Err(CmapError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_unknown_attribute_rejected_and_attrs_ordered() {
        let mut diagram = Diagram::default();
        let shape = diagram.create_shape(ShapeAttrs::default().with_content("Rust"));

        assert!(diagram.attr(shape.into(), "opacity").is_err());
        assert!(diagram.set_attr(shape.into(), "opacity", None).is_err());

        let attrs = diagram.attrs(shape.into()).unwrap();
        let names: Vec<_> = attrs.keys().copied().collect();
        assert_eq!(names, SHAPE_ATTRIBUTES);
        assert_eq!(attrs["content"], AttrValue::from("Rust"));
    }
}
