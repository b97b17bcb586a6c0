//! Error adapter for converting [`CliError`] to miette diagnostics.
//!
//! This module provides the bridge between the CLI's error types and
//! miette's rich diagnostic formatting.
//!
//! # Multi-Error Support
//!
//! Scene validation reports every malformed entry at once. When a
//! [`SceneError::Multiple`] is returned, each contained error is rendered
//! independently.

use std::fmt;

use miette::{Diagnostic as MietteDiagnostic, LabeledSpan, SourceSpan};

use cmap::CmapError;

use crate::{CliError, scene::SceneError};

/// Adapter for a single scene error.
///
/// Parse errors carry a span into the scene source and are rendered with a
/// labelled snippet; entry errors name the offending entry in their message.
pub struct SceneAdapter<'a> {
    err: &'a SceneError,
    src: &'a str,
}

impl<'a> SceneAdapter<'a> {
    pub fn new(err: &'a SceneError, src: &'a str) -> Self {
        Self { err, src }
    }
}

impl fmt::Debug for SceneAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.err, f)
    }
}

impl fmt::Display for SceneAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self.err, f)
    }
}

impl std::error::Error for SceneAdapter<'_> {}

impl MietteDiagnostic for SceneAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("cmap::scene"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let help = match self.err {
            SceneError::MissingArgument { field, .. } => format!("add `{field}` to the entry"),
            SceneError::UnknownName { .. } => {
                "declare the component under [[shapes]] or [[links]]".to_string()
            }
            SceneError::UnknownAction { .. } => "supported actions are move, resize, set, \
                connect, disconnect, show_connector, hide_connector, enable_connector, \
                disable_connector, drag, to_front and remove"
                .to_string(),
            _ => return None,
        };
        Some(Box::new(help))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self.err {
            SceneError::Parse { span: Some(_), .. } => Some(&self.src as &dyn miette::SourceCode),
            _ => None,
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let SceneError::Parse {
            span: Some(span), ..
        } = self.err
        else {
            return None;
        };
        let span = SourceSpan::new(span.start.into(), span.len());
        Some(Box::new(std::iter::once(LabeledSpan::new_primary_with_span(
            Some("here".to_string()),
            span,
        ))))
    }
}

/// Adapter for non-scene [`CliError`] variants.
pub struct ErrorAdapter<'a>(pub &'a CliError);

impl fmt::Debug for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for ErrorAdapter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for ErrorAdapter<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(self.0)
    }
}

impl MietteDiagnostic for ErrorAdapter<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        let code = match &self.0 {
            CliError::Io(_) => "cmap::io",
            CliError::Config(_) => "cmap::config",
            CliError::Scene { .. } => "cmap::scene",
            CliError::Cmap(CmapError::Export(_)) => "cmap::export",
            CliError::Cmap(_) => "cmap::engine",
        };
        Some(Box::new(code))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match &self.0 {
            CliError::Config(_) => Some(Box::new(
                "check the file passed with --config or cmap/config.toml",
            )),
            _ => None,
        }
    }
}

/// A reportable error that can be rendered by miette.
#[derive(Debug)]
pub enum Reportable<'a> {
    /// A scene error, possibly with a source snippet.
    Scene(SceneAdapter<'a>),
    /// Any other error.
    Error(ErrorAdapter<'a>),
}

impl fmt::Display for Reportable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reportable::Scene(s) => fmt::Display::fmt(s, f),
            Reportable::Error(e) => fmt::Display::fmt(e, f),
        }
    }
}

impl std::error::Error for Reportable<'_> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Reportable::Scene(_) => None,
            Reportable::Error(e) => std::error::Error::source(e),
        }
    }
}

impl MietteDiagnostic for Reportable<'_> {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Scene(s) => s.code(),
            Reportable::Error(e) => e.code(),
        }
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        match self {
            Reportable::Scene(s) => s.help(),
            Reportable::Error(e) => e.help(),
        }
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        match self {
            Reportable::Scene(s) => s.source_code(),
            Reportable::Error(e) => e.source_code(),
        }
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        match self {
            Reportable::Scene(s) => s.labels(),
            Reportable::Error(e) => e.labels(),
        }
    }
}

/// Convert a [`CliError`] into a list of reportable errors.
///
/// A scene error yields one [`Reportable`] per contained error; every other
/// variant yields a single [`Reportable`].
pub fn to_reportables(err: &CliError) -> Vec<Reportable<'_>> {
    match err {
        CliError::Scene { err, src } => err
            .errors()
            .into_iter()
            .map(|err| Reportable::Scene(SceneAdapter::new(err, src)))
            .collect(),
        _ => vec![Reportable::Error(ErrorAdapter(err))],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    fn scene_error(src: &str) -> CliError {
        let err = Scene::parse(src).unwrap_err();
        CliError::new_scene_error(err, src)
    }

    #[test]
    fn test_each_scene_error_is_reportable() {
        let err = scene_error(
            r#"
            [[shapes]]
            content = "nameless"

            [[steps]]
            action = "fly"
            "#,
        );

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 2);
        assert_eq!(
            reportables[0].to_string(),
            "shapes[0]: missing required field `name`"
        );
        assert_eq!(reportables[1].to_string(), "steps[0]: unknown action `fly`");
        assert!(reportables[1].help().is_some());
        assert_eq!(
            reportables[0].code().map(|code| code.to_string()),
            Some("cmap::scene".to_string())
        );
    }

    #[test]
    fn test_parse_error_is_labelled() {
        let err = scene_error("[[shapes]]\nname = ");

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        assert!(reportables[0].source_code().is_some());
        let labels: Vec<_> = reportables[0].labels().unwrap().collect();
        assert_eq!(labels.len(), 1);
        assert!(labels[0].primary());
    }

    #[test]
    fn test_engine_error_code() {
        let err = CliError::Cmap(CmapError::Export("disk full".to_string()));

        let reportables = to_reportables(&err);
        assert_eq!(reportables.len(), 1);
        match &reportables[0] {
            Reportable::Error(e) => {
                assert_eq!(e.to_string(), "export error: disk full");
                assert_eq!(
                    e.code().map(|code| code.to_string()),
                    Some("cmap::export".to_string())
                );
            }
            Reportable::Scene(_) => panic!("Expected Error"),
        }
    }
}
