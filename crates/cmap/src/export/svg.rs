//! SVG rendering.
//!
//! [`SvgRenderer`] is a [`RenderSink`]: every redraw computes the style
//! records ([`Attributes`]) of the component's parts and applies only the
//! entries that differ from the last applied record. The applied state is
//! assembled into an [`svg::Document`] in render order on demand.

use std::{collections::HashMap, f32::consts::PI, fs::File, io::Write, path::Path};

use log::{debug, error, info};
use svg::{Document, Node, node::element as svg_element};

use cmap_core::geometry::{Bounds, Point};

use super::Error;
use crate::{
    Diagram,
    component::{ComponentView, ConnectorMarker, Link, Shape},
    config::StyleConfig,
    id::ComponentId,
    render::{Attributes, RenderSink, diff_attributes},
};

/// Length of the arrow head sides.
const ARROW_LENGTH: f32 = 15.0;
/// Half opening angle of the arrow head, in degrees.
const ARROW_ANGLE: f32 = 26.0;
/// Depth of the notch at the back of the arrow head.
const ARROW_NOTCH: f32 = 7.0;
/// Space left around the content of an exported document.
const MARGIN: f32 = 50.0;
const FONT_SIZE: f32 = 14.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PartKind {
    Body,
    Text,
    Line,
    Arrow,
    Label,
    Handle,
}

#[derive(Debug, Clone, Default)]
struct Part {
    attributes: Attributes,
    text: Option<String>,
}

/// Renders diagram components to SVG elements.
#[derive(Debug)]
pub struct SvgRenderer {
    connected_color: String,
    unconnected_color: String,
    marker_opacity: f32,
    background_color: Option<String>,
    parts: HashMap<ComponentId, Vec<(PartKind, Part)>>,
    writes: usize,
}

impl SvgRenderer {
    /// Creates a renderer using the marker colors and background of `style`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if a configured color does not parse.
    pub fn new(style: &StyleConfig) -> Result<Self, Error> {
        Ok(Self {
            connected_color: style.connected_color().map_err(Error::Render)?.to_string(),
            unconnected_color: style.unconnected_color().map_err(Error::Render)?.to_string(),
            marker_opacity: style.marker_opacity(),
            background_color: style
                .background_color()
                .map_err(Error::Render)?
                .map(|color| color.to_string()),
            parts: HashMap::new(),
            writes: 0,
        })
    }

    /// Total number of attribute and text writes applied so far.
    pub fn applied_writes(&self) -> usize {
        self.writes
    }

    /// Returns true if the renderer holds drawn state for `id`.
    pub fn is_drawn(&self, id: ComponentId) -> bool {
        self.parts.contains_key(&id)
    }

    /// Last applied attribute value of a component, searched across its parts.
    pub fn applied_attribute(&self, id: ComponentId, name: &str) -> Option<&str> {
        self.parts
            .get(&id)?
            .iter()
            .find_map(|(_, part)| part.attributes.get(name))
            .map(String::as_str)
    }

    /// Builds a document holding every drawn component in render order.
    pub fn document(&self, diagram: &Diagram) -> Document {
        let bounds = diagram.content_bounds().unwrap_or_default().expand(MARGIN);
        let mut doc = Document::new()
            .set(
                "viewBox",
                format!(
                    "{} {} {} {}",
                    bounds.min_x(),
                    bounds.min_y(),
                    bounds.width(),
                    bounds.height()
                ),
            )
            .set("width", bounds.width())
            .set("height", bounds.height());

        if let Some(color) = &self.background_color {
            doc = doc.add(background(bounds, color));
        }

        for id in diagram.render_order() {
            let Some(parts) = self.parts.get(&id) else {
                continue;
            };
            let mut group = svg_element::Group::new()
                .set("id", id.to_string().replace('#', "-"))
                .set("class", id.kind());
            for (kind, part) in parts {
                group = add_part(group, *kind, part);
            }
            doc = doc.add(group);
        }
        doc
    }

    pub fn render_to_string(&self, diagram: &Diagram) -> String {
        self.document(diagram).to_string()
    }

    /// Writes the document of `diagram` to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be created or written.
    pub fn save(&self, diagram: &Diagram, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let file_name = path.display().to_string();
        info!(file_name; "Creating SVG file");

        let doc = self.document(diagram);
        let mut file = File::create(path).map_err(|err| {
            error!(file_name, err:err; "Failed to create SVG file");
            Error::Io(err)
        })?;
        write!(file, "{doc}").map_err(|err| {
            error!(file_name, err:err; "Failed to write SVG content");
            Error::Io(err)
        })
    }

    fn apply(&mut self, id: ComponentId, next: Vec<(PartKind, Part)>) {
        let cached = self.parts.entry(id).or_default();
        let mut writes = 0;
        for (index, (kind, part)) in next.into_iter().enumerate() {
            match cached.get_mut(index) {
                Some((cached_kind, cached_part)) if *cached_kind == kind => {
                    writes += diff_attributes(&cached_part.attributes, &part.attributes).len();
                    if cached_part.text != part.text {
                        writes += 1;
                    }
                    *cached_part = part;
                }
                _ => {
                    writes += part.attributes.len() + usize::from(part.text.is_some());
                    cached.truncate(index);
                    cached.push((kind, part));
                }
            }
        }
        self.writes += writes;
        debug!(id:%, writes; "Applied style records");
    }

    fn marker_color(&self, marker: &ConnectorMarker) -> &str {
        if marker.state().is_connected() {
            &self.connected_color
        } else {
            &self.unconnected_color
        }
    }
}

impl RenderSink for SvgRenderer {
    fn redraw(&mut self, view: ComponentView<'_>) {
        let parts = match view {
            ComponentView::Shape(shape) => vec![
                (PartKind::Body, Part::styled(shape_body_attributes(shape))),
                (
                    PartKind::Text,
                    Part::labelled(shape_text_attributes(shape), shape.content()),
                ),
            ],
            ComponentView::Link(link) => vec![
                (PartKind::Line, Part::styled(link_line_attributes(link))),
                (PartKind::Arrow, Part::styled(link_arrow_attributes(link))),
                (PartKind::Label, Part::styled(link_label_attributes(link))),
                (
                    PartKind::Text,
                    Part::labelled(link_text_attributes(link), link.content()),
                ),
            ],
            ComponentView::Marker(marker) => {
                let attributes =
                    marker_attributes(marker, self.marker_color(marker), self.marker_opacity);
                vec![(PartKind::Handle, Part::styled(attributes))]
            }
        };
        self.apply(view.id(), parts);
    }

    fn detach(&mut self, id: ComponentId) {
        self.parts.remove(&id);
    }
}

impl Part {
    fn styled(attributes: Attributes) -> Self {
        Self {
            attributes,
            text: None,
        }
    }

    fn labelled(attributes: Attributes, text: &str) -> Self {
        Self {
            attributes,
            text: Some(text.to_owned()),
        }
    }
}

fn background(bounds: Bounds, color: &str) -> svg_element::Rectangle {
    svg_element::Rectangle::new()
        .set("x", bounds.min_x())
        .set("y", bounds.min_y())
        .set("width", bounds.width())
        .set("height", bounds.height())
        .set("fill", color)
}

fn assign_all<T: Node>(mut node: T, attributes: &Attributes) -> T {
    for (name, value) in attributes {
        node.assign(*name, value.as_str());
    }
    node
}

fn add_part(group: svg_element::Group, kind: PartKind, part: &Part) -> svg_element::Group {
    let attributes = &part.attributes;
    match kind {
        PartKind::Body | PartKind::Label => {
            group.add(assign_all(svg_element::Rectangle::new(), attributes))
        }
        PartKind::Line | PartKind::Arrow => {
            group.add(assign_all(svg_element::Path::new(), attributes))
        }
        PartKind::Handle => group.add(assign_all(svg_element::Circle::new(), attributes)),
        PartKind::Text => {
            let content = part.text.clone().unwrap_or_default();
            group.add(assign_all(svg_element::Text::new(content), attributes))
        }
    }
}

fn record<const N: usize>(entries: [(&'static str, String); N]) -> Attributes {
    entries.into_iter().collect()
}

pub fn shape_body_attributes(shape: &Shape) -> Attributes {
    let bounds = shape.bounds();
    record([
        ("x", bounds.min_x().to_string()),
        ("y", bounds.min_y().to_string()),
        ("width", bounds.width().to_string()),
        ("height", bounds.height().to_string()),
        ("rx", shape.corner_radius().to_string()),
        ("ry", shape.corner_radius().to_string()),
        ("fill", shape.background_color().to_owned()),
        ("stroke", shape.border_color().to_owned()),
        ("stroke-width", shape.border_width().to_string()),
    ])
}

pub fn shape_text_attributes(shape: &Shape) -> Attributes {
    let center = shape.center();
    record([
        ("x", center.x().to_string()),
        ("y", center.y().to_string()),
        ("fill", shape.text_color().to_owned()),
        ("font-size", FONT_SIZE.to_string()),
        ("text-anchor", "middle".to_owned()),
        ("dominant-baseline", "central".to_owned()),
        ("data-content-type", shape.content_type().name().to_owned()),
    ])
}

/// The polyline source → midpoint → target.
pub fn link_line_attributes(link: &Link) -> Attributes {
    let geometry = link.geometry();
    record([
        (
            "d",
            format!(
                "M {} {} L {} {} L {} {}",
                geometry.source.x(),
                geometry.source.y(),
                geometry.mid.x(),
                geometry.mid.y(),
                geometry.target.x(),
                geometry.target.y()
            ),
        ),
        ("fill", "none".to_owned()),
        ("stroke", link.line_color().to_owned()),
        ("stroke-linecap", "round".to_owned()),
        ("stroke-width", link.line_width().to_string()),
    ])
}

/// Arrow head on the target, aligned with the midpoint → target segment.
///
/// The head is hidden, not omitted, when the link has no arrow.
pub fn link_arrow_attributes(link: &Link) -> Attributes {
    let geometry = link.geometry();
    let tip = geometry.target;
    let back = geometry.mid.angle_to(tip) + PI;
    let spread = ARROW_ANGLE.to_radians();

    let left = tip.polar_offset(back + spread, ARROW_LENGTH);
    let right = tip.polar_offset(back - spread, ARROW_LENGTH);
    let notch = tip.polar_offset(back, ARROW_NOTCH);

    record([
        (
            "d",
            format!(
                "M {} L {} L {} Q {} {} Z",
                coords(left),
                coords(tip),
                coords(right),
                coords(notch),
                coords(left)
            ),
        ),
        ("fill", link.line_color().to_owned()),
        ("stroke", link.line_color().to_owned()),
        ("stroke-linejoin", "round".to_owned()),
        ("stroke-width", link.line_width().to_string()),
        (
            "visibility",
            if link.has_arrow() { "visible" } else { "hidden" }.to_owned(),
        ),
    ])
}

pub fn link_label_attributes(link: &Link) -> Attributes {
    let bounds = link.label_bounds();
    record([
        ("x", bounds.min_x().to_string()),
        ("y", bounds.min_y().to_string()),
        ("width", bounds.width().to_string()),
        ("height", bounds.height().to_string()),
        ("rx", "4".to_owned()),
        ("fill", link.background_color().to_owned()),
        ("stroke", link.border_color().to_owned()),
        ("stroke-width", link.border_width().to_string()),
    ])
}

pub fn link_text_attributes(link: &Link) -> Attributes {
    let mid = link.mid();
    record([
        ("x", mid.x().to_string()),
        ("y", mid.y().to_string()),
        ("fill", link.text_color().to_owned()),
        ("font-size", FONT_SIZE.to_string()),
        ("text-anchor", "middle".to_owned()),
        ("dominant-baseline", "central".to_owned()),
        ("data-content-type", link.content_type().name().to_owned()),
    ])
}

pub fn marker_attributes(marker: &ConnectorMarker, color: &str, opacity: f32) -> Attributes {
    let position = marker.position();
    record([
        ("cx", position.x().to_string()),
        ("cy", position.y().to_string()),
        ("r", marker.radius().to_string()),
        ("fill", color.to_owned()),
        ("fill-opacity", opacity.to_string()),
    ])
}

fn coords(point: Point) -> String {
    format!("{} {}", point.x(), point.y())
}
