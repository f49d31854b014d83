//! Cloud animation rendering.
//!
//! Takes a downloaded MSM NetCDF file, clips it to the central-Honshu
//! window, drops already-past forecast steps, and renders one looping GIF
//! per layer variant.

pub mod canvas;
pub mod colormap;
pub mod frame;
pub mod gif;
pub mod overlays;
pub mod png;
pub mod text;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use thiserror::Error;
use tracing::info;

use gpv_common::BoundingBox;
use msm_dataset::CloudDataset;

pub use frame::{render_frame, Variant};
pub use gif::FRAME_DELAY_MS;

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Dataset(#[from] msm_dataset::DatasetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("encoding failed: {0}")]
    Encode(String),

    #[error("no frames to encode")]
    NoFrames,
}

/// The rendered window: central Honshu, Kansai through Kanto.
pub fn target_bbox() -> BoundingBox {
    BoundingBox::new(135.5, 33.5, 140.0, 37.5)
}

/// Render all four animation variants from the given dataset file.
///
/// Returns variant name to output path for every GIF written. Frames are
/// rendered in parallel per variant; the intermediate frame directories
/// live under `output_dir` and are removed before returning.
pub fn render_animations(
    dataset_path: &Path,
    output_dir: &Path,
    now: DateTime<Utc>,
) -> RenderResult<BTreeMap<String, PathBuf>> {
    let bbox = target_bbox();
    let mut dataset = CloudDataset::open(dataset_path, &bbox)?;
    info!(
        path = %dataset_path.display(),
        steps = dataset.times().len(),
        "Loaded dataset"
    );
    dataset.retain_future(now);
    info!(steps = dataset.times().len(), "Forecast steps after time filtering");

    fs::create_dir_all(output_dir)?;

    let mut outputs = BTreeMap::new();
    for variant in Variant::ALL {
        info!(variant = variant.name(), "Rendering animation");
        let frames = gif::FrameDir::create(output_dir, variant.name())?;

        (0..dataset.times().len())
            .into_par_iter()
            .map(|t| {
                let img = render_frame(&dataset, &bbox, t, variant);
                let encoded = png::encode_rgba(&img).map_err(RenderError::Encode)?;
                fs::write(frames.frame_path(t), encoded)?;
                Ok(())
            })
            .collect::<RenderResult<Vec<()>>>()?;

        let output = output_dir.join(variant.gif_filename());
        gif::encode_gif(frames.path(), &output)?;
        info!(variant = variant.name(), output = %output.display(), "Animation written");
        outputs.insert(variant.name().to_string(), output);
    }

    Ok(outputs)
}
