//! cmap CLI library
//!
//! This module contains the core CLI logic for the cmap concept-map tool:
//! load configuration, build a diagram from a scene script, replay its
//! interaction steps and export the settled diagram to SVG.

pub mod error_adapter;
pub mod scene;

mod args;
mod config;

pub use args::Args;
pub use config::ConfigError;

use std::fs;

use log::info;
use thiserror::Error;

use cmap::{CmapError, Diagram, export::svg::SvgRenderer};

use scene::{Scene, SceneError};

/// Errors reported by the CLI.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("{err}")]
    Scene {
        #[source]
        err: SceneError,
        src: String,
    },

    #[error(transparent)]
    Cmap(#[from] CmapError),
}

impl CliError {
    /// Wraps a scene error together with the scene source it refers to.
    pub fn new_scene_error(err: SceneError, src: impl Into<String>) -> Self {
        Self::Scene {
            err,
            src: src.into(),
        }
    }
}

/// Run the cmap CLI application
///
/// This function builds the diagram described by the input scene, replays its
/// steps and writes the resulting SVG to the output file.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `CliError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Malformed scenes and rejected scene steps
/// - Export errors
pub fn run(args: &Args) -> Result<(), CliError> {
    info!(
        input_path = args.input,
        output_path = args.output;
        "Processing scene"
    );

    let app_config = config::load_config(args.config.as_ref())?;

    let source = fs::read_to_string(&args.input)?;
    let scene = Scene::parse(&source).map_err(|err| CliError::new_scene_error(err, &source))?;

    let mut renderer = SvgRenderer::new(app_config.style()).map_err(CmapError::from)?;
    let mut diagram = Diagram::new(app_config);
    scene
        .build(&mut diagram, &mut renderer)
        .map_err(|err| CliError::new_scene_error(err, &source))?;

    renderer
        .save(&diagram, &args.output)
        .map_err(CmapError::from)?;

    info!(output_file = args.output; "SVG exported successfully");

    Ok(())
}
