//! Embedded preview decoding.

use crate::error::DecodeError;
use crate::traits::{ImageCodec, RasterImage};

/// [`ImageCodec`] backed by the `image` crate.
///
/// The format is sniffed from the data, so JPEG, PNG, GIF, BMP and TIFF
/// previews all decode the same way.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        let decoded = image::load_from_memory(bytes)?;
        if decoded.width() == 0 || decoded.height() == 0 {
            return Err(DecodeError::Empty {
                width: decoded.width(),
                height: decoded.height(),
            });
        }
        Ok(decoded.to_rgba8())
    }
}
