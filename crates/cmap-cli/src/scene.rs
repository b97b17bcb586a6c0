//! Scene scripts.
//!
//! A scene is a TOML document with three arrays of tables:
//!
//! ```toml
//! [[shapes]]
//! name = "rust"
//! content = "Rust"
//! x = 0
//! y = 0
//!
//! [[links]]
//! name = "gives"
//! content = "gives"
//! source = "rust"
//! target = "safety"
//! has_arrow = true
//!
//! [[steps]]
//! action = "move"
//! shape = "rust"
//! x = 40
//! y = 120
//! ```
//!
//! Apart from `name` (and `source`/`target` on links) every key of a shape or
//! link entry is a component attribute, applied through
//! [`Diagram::set_attr`]. Each step is one interaction turn and is followed by
//! a settle pass.
//!
//! Parsing validates the whole scene up front and reports every malformed
//! entry at once. Building can still fail on engine errors such as
//! connecting an already connected link end.

use std::{
    collections::{HashMap, HashSet},
    ops::Range,
};

use log::{debug, info};
use serde::Deserialize;
use thiserror::Error;
use toml::{Table, Value};

use cmap::{
    CmapError, ComponentId, Diagram, End, LinkId, ShapeId,
    attr::AttrValue,
    component::{LinkAttrs, ShapeAttrs},
    geometry::{Point, Size},
    render::RenderSink,
};

/// Errors found while reading or replaying a scene.
#[derive(Debug, Error)]
pub enum SceneError {
    #[error("Failed to parse scene: {message}")]
    Parse {
        message: String,
        span: Option<Range<usize>>,
    },

    #[error("{entry}: missing required field `{field}`")]
    MissingArgument { entry: String, field: &'static str },

    #[error("{entry}: invalid value for `{field}`: {reason}")]
    InvalidValue {
        entry: String,
        field: String,
        reason: String,
    },

    #[error("{entry}: unknown component `{name}`")]
    UnknownName { entry: String, name: String },

    #[error("{entry}: component name `{name}` is already taken")]
    DuplicateName { entry: String, name: String },

    #[error("{entry}: unknown action `{action}`")]
    UnknownAction { entry: String, action: String },

    #[error("{entry}: {source}")]
    Engine {
        entry: String,
        #[source]
        source: CmapError,
    },

    #[error("{} errors in scene", .0.len())]
    Multiple(Vec<SceneError>),
}

impl SceneError {
    /// Flattens [`SceneError::Multiple`] into its errors.
    pub fn errors(&self) -> Vec<&SceneError> {
        match self {
            Self::Multiple(errors) => errors.iter().flat_map(SceneError::errors).collect(),
            _ => vec![self],
        }
    }

    fn collect(mut errors: Vec<SceneError>) -> Result<(), Self> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Self::Multiple(errors)),
        }
    }
}

/// A shape or link declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentSpec {
    entry: String,
    name: String,
    attrs: Vec<(String, AttrValue)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinkSpec {
    component: ComponentSpec,
    source: Option<String>,
    target: Option<String>,
}

/// One interaction turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Move { shape: String, to: Point },
    Resize { shape: String, size: Size },
    Set {
        target: String,
        attribute: String,
        value: Option<AttrValue>,
    },
    Connect { end: End, shape: String, link: String },
    Disconnect { end: End, shape: String, link: String },
    ShowConnector { end: End, link: String },
    HideConnector { end: End, link: String },
    EnableConnector { end: End, link: String },
    DisableConnector { end: End, link: String },
    /// Press at `from`, move to `to`, release.
    Drag { from: Point, to: Point },
    ToFront { target: String },
    Remove { target: String },
}

impl Step {
    /// Component names the step refers to.
    fn names(&self) -> Vec<&str> {
        match self {
            Self::Move { shape, .. } | Self::Resize { shape, .. } => vec![shape.as_str()],
            Self::Set { target, .. } | Self::ToFront { target } | Self::Remove { target } => {
                vec![target.as_str()]
            }
            Self::Connect { shape, link, .. } | Self::Disconnect { shape, link, .. } => {
                vec![shape.as_str(), link.as_str()]
            }
            Self::ShowConnector { link, .. }
            | Self::HideConnector { link, .. }
            | Self::EnableConnector { link, .. }
            | Self::DisableConnector { link, .. } => vec![link.as_str()],
            Self::Drag { .. } => Vec::new(),
        }
    }
}

/// A parsed and validated scene.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    shapes: Vec<ComponentSpec>,
    links: Vec<LinkSpec>,
    steps: Vec<(String, Step)>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawScene {
    shapes: Vec<Table>,
    links: Vec<Table>,
    steps: Vec<Table>,
}

impl Scene {
    /// Parses and validates a TOML scene.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Parse`] for malformed TOML and the entry errors
    /// otherwise, combined into [`SceneError::Multiple`] when there are
    /// several.
    pub fn parse(source: &str) -> Result<Self, SceneError> {
        let raw: RawScene = toml::from_str(source).map_err(|err| SceneError::Parse {
            message: err.message().to_owned(),
            span: err.span(),
        })?;

        let mut errors = Vec::new();
        let mut scene = Scene::default();

        for (index, table) in raw.shapes.iter().enumerate() {
            let entry = Entry::new("shapes", index, table);
            match entry.component(&[]) {
                Ok(component) => scene.shapes.push(component),
                Err(err) => errors.push(err),
            }
        }

        for (index, table) in raw.links.iter().enumerate() {
            let entry = Entry::new("links", index, table);
            match entry.link() {
                Ok(link) => scene.links.push(link),
                Err(err) => errors.push(err),
            }
        }

        for (index, table) in raw.steps.iter().enumerate() {
            let entry = Entry::new("steps", index, table);
            match entry.step() {
                Ok(step) => scene.steps.push((entry.label, step)),
                Err(err) => errors.push(err),
            }
        }

        scene.check_names(&mut errors);
        SceneError::collect(errors)?;

        debug!(
            shapes = scene.shapes.len(),
            links = scene.links.len(),
            steps = scene.steps.len();
            "Parsed scene"
        );
        Ok(scene)
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().map(|(_, step)| step)
    }

    /// Creates the declared components in `diagram`, then replays the steps,
    /// settling into `sink` after each of them.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Engine`] for the first rejected operation.
    pub fn build(
        &self,
        diagram: &mut Diagram,
        sink: &mut dyn RenderSink,
    ) -> Result<(), SceneError> {
        let mut names = Names::default();

        for shape in &self.shapes {
            let id = diagram.create_shape(ShapeAttrs::default());
            names.insert(&shape.name, id.into());
            apply_attrs(diagram, shape, id.into())?;
            engine(&shape.entry, diagram.add(id.into()))?;
        }

        for link in &self.links {
            let entry = &link.component.entry;
            let id = diagram.create_link(LinkAttrs::default());
            names.insert(&link.component.name, id.into());
            apply_attrs(diagram, &link.component, id.into())?;
            engine(entry, diagram.add(id.into()))?;

            for (end, shape) in [(End::Source, &link.source), (End::Target, &link.target)] {
                if let Some(shape) = shape {
                    let shape = names.shape(entry, shape)?;
                    engine(entry, diagram.connect(end, shape, id))?;
                }
            }
        }

        let report = diagram.settle(sink);
        info!(redrawn = report.redrawn.len(); "Built scene");

        for (entry, step) in &self.steps {
            run_step(diagram, &names, entry, step)?;
            let report = diagram.settle(sink);
            debug!(
                entry:%,
                resolved = report.resolved,
                redrawn = report.redrawn.len();
                "Replayed step"
            );
        }
        Ok(())
    }

    /// Reports duplicate declarations and references to undeclared names.
    fn check_names(&self, errors: &mut Vec<SceneError>) {
        let mut all = HashSet::new();
        let components = self
            .shapes
            .iter()
            .chain(self.links.iter().map(|link| &link.component));
        for component in components {
            if !all.insert(component.name.as_str()) {
                errors.push(SceneError::DuplicateName {
                    entry: component.entry.clone(),
                    name: component.name.clone(),
                });
            }
        }
        let shapes: HashSet<&str> = self.shapes.iter().map(|shape| shape.name.as_str()).collect();

        for link in &self.links {
            for shape in [&link.source, &link.target].into_iter().flatten() {
                if !shapes.contains(shape.as_str()) {
                    errors.push(SceneError::UnknownName {
                        entry: link.component.entry.clone(),
                        name: shape.clone(),
                    });
                }
            }
        }

        for (entry, step) in &self.steps {
            for name in step.names() {
                if !all.contains(name) {
                    errors.push(SceneError::UnknownName {
                        entry: entry.clone(),
                        name: name.to_owned(),
                    });
                }
            }
        }
    }
}

fn run_step(
    diagram: &mut Diagram,
    names: &Names,
    entry: &str,
    step: &Step,
) -> Result<(), SceneError> {
    let result = match step {
        Step::Move { shape, to } => diagram.move_shape(names.shape(entry, shape)?, *to),
        Step::Resize { shape, size } => diagram.set_shape_size(names.shape(entry, shape)?, *size),
        Step::Set {
            target,
            attribute,
            value,
        } => diagram.set_attr(names.get(entry, target)?, attribute, value.clone()),
        Step::Connect { end, shape, link } => {
            diagram.connect(*end, names.shape(entry, shape)?, names.link(entry, link)?)
        }
        Step::Disconnect { end, shape, link } => {
            diagram.disconnect(*end, names.shape(entry, shape)?, names.link(entry, link)?)
        }
        Step::ShowConnector { end, link } => diagram
            .show_connector(*end, names.link(entry, link)?)
            .map(|_| ()),
        Step::HideConnector { end, link } => diagram.hide_connector(*end, names.link(entry, link)?),
        Step::EnableConnector { end, link } => {
            diagram.enable_connector(*end, names.link(entry, link)?)
        }
        Step::DisableConnector { end, link } => {
            diagram.disable_connector(*end, names.link(entry, link)?)
        }
        Step::Drag { from, to } => drag(diagram, *from, *to),
        Step::ToFront { target } => diagram.to_front(names.get(entry, target)?),
        Step::Remove { target } => diagram.remove(names.get(entry, target)?),
    };
    engine(entry, result)
}

fn drag(diagram: &mut Diagram, from: Point, to: Point) -> Result<(), CmapError> {
    let hit = diagram.pointer_down(from)?;
    debug!(hit:?; "Dragging");
    diagram.pointer_move(to)?;
    diagram.pointer_up();
    Ok(())
}

fn apply_attrs(
    diagram: &mut Diagram,
    spec: &ComponentSpec,
    id: ComponentId,
) -> Result<(), SceneError> {
    for (name, value) in &spec.attrs {
        engine(&spec.entry, diagram.set_attr(id, name, Some(value.clone())))?;
    }
    Ok(())
}

fn engine<T>(entry: &str, result: Result<T, CmapError>) -> Result<T, SceneError> {
    result.map_err(|source| SceneError::Engine {
        entry: entry.to_owned(),
        source,
    })
}

/// Component handles by scene name.
#[derive(Debug, Default)]
struct Names(HashMap<String, ComponentId>);

impl Names {
    fn insert(&mut self, name: &str, id: ComponentId) {
        self.0.insert(name.to_owned(), id);
    }

    fn get(&self, entry: &str, name: &str) -> Result<ComponentId, SceneError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| SceneError::UnknownName {
                entry: entry.to_owned(),
                name: name.to_owned(),
            })
    }

    fn shape(&self, entry: &str, name: &str) -> Result<ShapeId, SceneError> {
        match self.get(entry, name)? {
            ComponentId::Shape(shape) => Ok(shape),
            _ => Err(wrong_kind(entry, name, "shape")),
        }
    }

    fn link(&self, entry: &str, name: &str) -> Result<LinkId, SceneError> {
        match self.get(entry, name)? {
            ComponentId::Link(link) => Ok(link),
            _ => Err(wrong_kind(entry, name, "link")),
        }
    }
}

fn wrong_kind(entry: &str, name: &str, kind: &str) -> SceneError {
    SceneError::InvalidValue {
        entry: entry.to_owned(),
        field: name.to_owned(),
        reason: format!("`{name}` is not a {kind}"),
    }
}

/// One table of a scene array, labelled for error messages.
struct Entry<'a> {
    label: String,
    table: &'a Table,
}

impl<'a> Entry<'a> {
    fn new(section: &str, index: usize, table: &'a Table) -> Self {
        Self {
            label: format!("{section}[{index}]"),
            table,
        }
    }

    fn component(&self, reserved: &[&str]) -> Result<ComponentSpec, SceneError> {
        let name = self.string("name")?.to_owned();
        let attrs = self
            .table
            .iter()
            .filter(|(key, _)| {
                key.as_str() != "name" && !reserved.iter().any(|reserved| *reserved == key.as_str())
            })
            .map(|(key, value)| {
                attr_value(value)
                    .map(|value| (key.clone(), value))
                    .ok_or_else(|| self.invalid(key, format!("unsupported {}", value.type_str())))
            })
            .collect::<Result<_, _>>()?;

        Ok(ComponentSpec {
            entry: self.label.clone(),
            name,
            attrs,
        })
    }

    fn link(&self) -> Result<LinkSpec, SceneError> {
        Ok(LinkSpec {
            component: self.component(&["source", "target"])?,
            source: self.optional_string("source")?.map(str::to_owned),
            target: self.optional_string("target")?.map(str::to_owned),
        })
    }

    fn step(&self) -> Result<Step, SceneError> {
        let text = |field| self.string(field).map(str::to_owned);
        let step = match self.string("action")? {
            "move" => Step::Move {
                shape: text("shape")?,
                to: Point::new(self.number("x")?, self.number("y")?),
            },
            "resize" => Step::Resize {
                shape: text("shape")?,
                size: Size::new(self.number("width")?, self.number("height")?),
            },
            "set" => Step::Set {
                target: text("target")?,
                attribute: text("attribute")?,
                value: match self.table.get("value") {
                    Some(value) => Some(attr_value(value).ok_or_else(|| {
                        self.invalid("value", format!("unsupported {}", value.type_str()))
                    })?),
                    None => None,
                },
            },
            "connect" => Step::Connect {
                end: self.end()?,
                shape: text("shape")?,
                link: text("link")?,
            },
            "disconnect" => Step::Disconnect {
                end: self.end()?,
                shape: text("shape")?,
                link: text("link")?,
            },
            "show_connector" => Step::ShowConnector {
                end: self.end()?,
                link: text("link")?,
            },
            "hide_connector" => Step::HideConnector {
                end: self.end()?,
                link: text("link")?,
            },
            "enable_connector" => Step::EnableConnector {
                end: self.end()?,
                link: text("link")?,
            },
            "disable_connector" => Step::DisableConnector {
                end: self.end()?,
                link: text("link")?,
            },
            "drag" => Step::Drag {
                from: self.point("from")?,
                to: self.point("to")?,
            },
            "to_front" => Step::ToFront {
                target: text("target")?,
            },
            "remove" => Step::Remove {
                target: text("target")?,
            },
            action => {
                return Err(SceneError::UnknownAction {
                    entry: self.label.clone(),
                    action: action.to_owned(),
                });
            }
        };
        Ok(step)
    }

    fn value(&self, field: &'static str) -> Result<&'a Value, SceneError> {
        self.table
            .get(field)
            .ok_or_else(|| SceneError::MissingArgument {
                entry: self.label.clone(),
                field,
            })
    }

    fn string(&self, field: &'static str) -> Result<&'a str, SceneError> {
        match self.value(field)? {
            Value::String(text) => Ok(text),
            other => Err(self.invalid(
                field,
                format!("expected a string, found {}", other.type_str()),
            )),
        }
    }

    fn optional_string(&self, field: &'static str) -> Result<Option<&'a str>, SceneError> {
        if self.table.contains_key(field) {
            self.string(field).map(Some)
        } else {
            Ok(None)
        }
    }

    fn number(&self, field: &'static str) -> Result<f32, SceneError> {
        as_number(self.value(field)?)
            .ok_or_else(|| self.invalid(field, "expected a number"))
    }

    fn point(&self, field: &'static str) -> Result<Point, SceneError> {
        match self.value(field)? {
            Value::Array(items) if items.len() == 2 => {
                match (as_number(&items[0]), as_number(&items[1])) {
                    (Some(x), Some(y)) => Ok(Point::new(x, y)),
                    _ => Err(self.invalid(field, "expected two numbers")),
                }
            }
            _ => Err(self.invalid(field, "expected a point `[x, y]`")),
        }
    }

    fn end(&self) -> Result<End, SceneError> {
        self.string("end")?
            .parse()
            .map_err(|reason: String| self.invalid("end", reason))
    }

    fn invalid(&self, field: &str, reason: impl Into<String>) -> SceneError {
        SceneError::InvalidValue {
            entry: self.label.clone(),
            field: field.to_owned(),
            reason: reason.into(),
        }
    }
}

fn as_number(value: &Value) -> Option<f32> {
    match value {
        Value::Integer(number) => Some(*number as f32),
        Value::Float(number) => Some(*number as f32),
        _ => None,
    }
}

fn attr_value(value: &Value) -> Option<AttrValue> {
    match value {
        Value::String(text) => Some(AttrValue::from(text.as_str())),
        Value::Integer(number) => Some(AttrValue::Number(*number as f64)),
        Value::Float(number) => Some(AttrValue::Number(*number)),
        Value::Boolean(flag) => Some(AttrValue::Bool(*flag)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use cmap::render::RecordingSink;

    use super::*;

    const SCENE: &str = r#"
        [[shapes]]
        name = "rust"
        content = "Rust"

        [[shapes]]
        name = "safety"
        content = "Safety"
        x = 250
        y = "0"

        [[links]]
        name = "gives"
        content = "gives"
        source = "rust"
        target = "safety"
        has_arrow = true

        [[steps]]
        action = "move"
        shape = "safety"
        x = 250
        y = 150
    "#;

    #[test]
    fn test_parse_and_build_scene() {
        let scene = Scene::parse(SCENE).unwrap();
        assert_eq!(scene.steps().count(), 1);

        let mut diagram = Diagram::default();
        scene.build(&mut diagram, &mut RecordingSink::default()).unwrap();

        let shapes: Vec<ShapeId> = diagram
            .render_order()
            .filter_map(|id| match id {
                ComponentId::Shape(shape) => Some(shape),
                _ => None,
            })
            .collect();
        assert_eq!(shapes.len(), 2);
        assert_eq!(
            diagram.shape(shapes[1]).unwrap().position(),
            Point::new(250.0, 150.0)
        );

        let link = diagram
            .render_order()
            .find_map(|id| match id {
                ComponentId::Link(link) => Some(link),
                _ => None,
            })
            .unwrap();
        assert!(diagram.link(link).unwrap().has_arrow());
        assert_eq!(diagram.connected_shape(End::Target, link), Some(shapes[1]));
    }

    #[test]
    fn test_missing_argument_is_reported() {
        let err = Scene::parse(
            r#"
            [[steps]]
            action = "connect"
            end = "source"
            shape = "a"
            "#,
        )
        .unwrap_err();

        // the link field is checked before names are resolved
        assert!(matches!(
            err,
            SceneError::MissingArgument { field: "link", .. }
        ));
        assert_eq!(err.to_string(), "steps[0]: missing required field `link`");
    }

    #[test]
    fn test_every_bad_entry_is_reported() {
        let err = Scene::parse(
            r#"
            [[shapes]]
            content = "nameless"

            [[shapes]]
            name = "a"

            [[shapes]]
            name = "a"

            [[steps]]
            action = "fly"

            [[steps]]
            action = "move"
            shape = "ghost"
            x = 0
            y = 0
            "#,
        )
        .unwrap_err();

        let errors = err.errors();
        assert_eq!(errors.len(), 4);
        assert!(matches!(errors[0], SceneError::MissingArgument { field: "name", .. }));
        assert!(matches!(errors[1], SceneError::UnknownAction { .. }));
        assert!(matches!(errors[2], SceneError::DuplicateName { .. }));
        assert!(matches!(errors[3], SceneError::UnknownName { .. }));
    }

    #[test]
    fn test_invalid_end_is_reported() {
        let err = Scene::parse(
            r#"
            [[shapes]]
            name = "a"

            [[links]]
            name = "l"

            [[steps]]
            action = "connect"
            end = "middle"
            shape = "a"
            link = "l"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, SceneError::InvalidValue { ref field, .. } if field == "end"));
    }

    #[test]
    fn test_engine_errors_carry_entry() {
        let scene = Scene::parse(
            r#"
            [[shapes]]
            name = "a"

            [[links]]
            name = "loop"
            source = "a"

            [[steps]]
            action = "connect"
            end = "target"
            shape = "a"
            link = "loop"
            "#,
        )
        .unwrap();

        let err = scene
            .build(&mut Diagram::default(), &mut RecordingSink::default())
            .unwrap_err();
        match err {
            SceneError::Engine { entry, source } => {
                assert_eq!(entry, "steps[0]");
                assert!(source.is_already_connected());
            }
            other => panic!("Expected engine error, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_toml_has_span() {
        let err = Scene::parse("[[shapes]]\nname = ").unwrap_err();
        assert!(matches!(err, SceneError::Parse { span: Some(_), .. }));
    }
}
