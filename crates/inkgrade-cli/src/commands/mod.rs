pub mod assess;
pub mod compare;
pub mod init;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};

use inkgrade_core::raster::RgbaBuffer;

/// Decode an image file into an RGBA raster.
pub fn load_raster(path: &Path) -> Result<RgbaBuffer> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image: {}", path.display()))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    Ok(RgbaBuffer::from_raw(width, height, image.into_raw())?)
}
