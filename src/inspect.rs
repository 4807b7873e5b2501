//! Image details for a local photo, read from the file header only.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::Serialize;

use crate::error::PlantIdError;
use crate::request::{fit_within, MAX_EDGE};

/// Header-level facts about an image file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ImageDetails {
    pub width: u32,
    pub height: u32,
    /// Container format, lowercase (e.g. `jpeg`, `png`).
    pub format: String,
    pub file_size: u64,
    /// Dimensions the image will have once normalized for upload.
    pub upload_width: u32,
    pub upload_height: u32,
}

impl ImageDetails {
    pub fn will_downscale(&self) -> bool {
        (self.upload_width, self.upload_height) != (self.width, self.height)
    }
}

/// Probes an image file without decoding its pixels.
pub fn inspect_image(path: &Path) -> Result<ImageDetails, PlantIdError> {
    let bytes = fs::read(path).map_err(|source| PlantIdError::ImageRead {
        path: path.to_path_buf(),
        source,
    })?;

    inspect_bytes(&bytes).map_err(|message| PlantIdError::ImageProbe {
        path: path.to_path_buf(),
        message,
    })
}

/// Probes in-memory image bytes.
pub fn inspect_bytes(bytes: &[u8]) -> Result<ImageDetails, String> {
    let format = imagesize::image_type(bytes).map_err(|source| source.to_string())?;
    let size = imagesize::blob_size(bytes).map_err(|source| source.to_string())?;

    let width = u32::try_from(size.width).map_err(|_| "width out of range".to_string())?;
    let height = u32::try_from(size.height).map_err(|_| "height out of range".to_string())?;
    let (upload_width, upload_height) = fit_within(width, height, MAX_EDGE);

    Ok(ImageDetails {
        width,
        height,
        format: format!("{:?}", format).to_ascii_lowercase(),
        file_size: bytes.len() as u64,
        upload_width,
        upload_height,
    })
}

impl fmt::Display for ImageDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Width:       {}px", self.width)?;
        writeln!(f, "Height:      {}px", self.height)?;
        writeln!(f, "Format:      {}", self.format)?;
        writeln!(f, "File size:   {} bytes", self.file_size)?;
        write!(
            f,
            "Upload size: {}x{}",
            self.upload_width, self.upload_height
        )?;
        if self.will_downscale() {
            write!(f, " (downscaled)")?;
        }
        writeln!(f)
    }
}
