//! Looping GIF assembly from a directory of frame PNGs.

use std::fs;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use tracing::{debug, warn};

use crate::RenderError;

/// Display time per frame.
pub const FRAME_DELAY_MS: u32 = 500;

/// Scratch directory holding one variant's frames. Removed on drop so an
/// encode failure never leaves frame litter behind.
pub struct FrameDir {
    path: PathBuf,
}

impl FrameDir {
    pub fn create(parent: &Path, name: &str) -> std::io::Result<Self> {
        let path = parent.join(format!("cloud_temp_{name}"));
        if path.exists() {
            fs::remove_dir_all(&path)?;
        }
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frame file path. Zero-padded so lexicographic order is frame order.
    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.path.join(format!("cloud_{index:03}.png"))
    }
}

impl Drop for FrameDir {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove frame directory");
        }
    }
}

/// Encode every `cloud_*.png` in `frames_dir` (filename order) into an
/// infinitely looping GIF at `output`. Written to a sibling temp file first
/// so a crash mid-encode never clobbers the previous animation.
pub fn encode_gif(frames_dir: &Path, output: &Path) -> Result<(), RenderError> {
    let mut files: Vec<PathBuf> = fs::read_dir(frames_dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("cloud_") && n.ends_with(".png"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(RenderError::NoFrames);
    }

    let tmp = frames_dir.join("encoding.gif");
    {
        let file = fs::File::create(&tmp)?;
        let mut encoder = GifEncoder::new(file);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| RenderError::Encode(format!("set repeat: {e}")))?;

        for path in &files {
            let img = image::open(path)
                .map_err(|e| RenderError::Encode(format!("{}: {e}", path.display())))?
                .to_rgba8();
            let frame = Frame::from_parts(img, 0, 0, Delay::from_numer_denom_ms(FRAME_DELAY_MS, 1));
            encoder
                .encode_frame(frame)
                .map_err(|e| RenderError::Encode(format!("{}: {e}", path.display())))?;
        }
    }

    fs::rename(&tmp, output)?;
    debug!(frames = files.len(), output = %output.display(), "Encoded animation");
    Ok(())
}
