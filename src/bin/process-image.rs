//! # Process Image
//!
//! Runs an image through the voxel pipeline without opening a window.
//!
//! ```bash
//! process-image <input> [output.png] [--layout layout.json]
//! ```
//!
//! Writes the processed image scaled back up to the source size with nearest-neighbor
//! sampling. With `--layout`, also writes the block descriptors as JSON.

use std::path::{Path, PathBuf};

use clap::Parser;
use thiserror::Error;

use voxelish::{
    application_state::{error::LoadError, image_store::ImageFile},
    engine_state::voxels::layout::{build_layout, BLOCK_SIZE},
    image_pipeline::{loader, process, processor::upscale_preview, PipelineError, ProcessOptions},
};

#[derive(Debug, Error)]
enum ToolError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("could not write '{path}': {source}")]
    Save {
        path: String,
        #[source]
        source: image::ImageError,
    },

    #[error("could not write '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(name = "process-image")]
#[command(about = "Run an image through the voxel pipeline and write a preview")]
struct Arguments {
    /// Image to process
    input: PathBuf,

    /// Preview destination, `<input stem>.processed.png` by default
    output: Option<PathBuf>,

    /// Also write the block layout as JSON to this path
    #[arg(long)]
    layout: Option<PathBuf>,
}

impl Arguments {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// `sprite.png` becomes `sprite.processed.png` next to the input.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!("{stem}.processed.png"))
}

fn run(arguments: &Arguments) -> Result<(), ToolError> {
    let file = ImageFile::read(&arguments.input)?;
    let options = ProcessOptions::default();

    let source = loader::decode(&file.bytes)?;
    let processed = process(&source, &options)?;
    log::info!(
        "Processed '{}' ({}): {}x{} -> {}x{}, {} opaque pixels",
        file.name,
        loader::sniff_mime_type(&file.bytes),
        source.width(),
        source.height(),
        processed.width(),
        processed.height(),
        processed.opaque_count()
    );

    let output = arguments.output_path();
    let preview: image::RgbaImage = upscale_preview(&processed, source.width(), source.height())?.into();
    preview.save(&output).map_err(|source| ToolError::Save {
        path: output.display().to_string(),
        source,
    })?;
    log::info!("Wrote preview to {}", output.display());

    if let Some(layout_path) = &arguments.layout {
        let layout = build_layout(&processed, BLOCK_SIZE);
        let json = serde_json::to_string_pretty(&layout)?;
        std::fs::write(layout_path, json).map_err(|source| ToolError::Io {
            path: layout_path.display().to_string(),
            source,
        })?;
        log::info!("Wrote {} blocks to {}", layout.len(), layout_path.display());
    }

    Ok(())
}

fn main() {
    env_logger::Builder::new()
        .target(env_logger::Target::Stdout)
        .filter_level(log::LevelFilter::Info)
        .parse_env("RUST_LOG")
        .init();

    let arguments = Arguments::parse();
    if let Err(error) = run(&arguments) {
        log::error!("{error}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_defaults_next_to_input() {
        let arguments = Arguments::try_parse_from(["process-image", "art/sprite.png"]).unwrap();
        assert_eq!(arguments.output_path(), PathBuf::from("art/sprite.processed.png"));
        assert!(arguments.layout.is_none());
    }

    #[test]
    fn layout_flag_and_explicit_output() {
        let arguments = Arguments::try_parse_from([
            "process-image",
            "in.png",
            "out.png",
            "--layout",
            "blocks.json",
        ])
        .unwrap();
        assert_eq!(arguments.output_path(), PathBuf::from("out.png"));
        assert_eq!(arguments.layout, Some(PathBuf::from("blocks.json")));
    }

    #[test]
    fn missing_input_is_rejected() {
        assert!(Arguments::try_parse_from(["process-image"]).is_err());
        assert!(Arguments::try_parse_from(["process-image", "a.png", "b.png", "c.png"]).is_err());
    }
}
