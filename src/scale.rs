//! Aspect-preserving resampling to exact target sizes.

use image::imageops::{self, FilterType};

use crate::dimensions::Dimensions;
use crate::error::{Error, Result};
use crate::traits::RasterImage;

/// Scales rasters to an exact size by center-cropping the source to the
/// target aspect ratio and resampling the crop.
///
/// The source aspect ratio is preserved, so nothing is stretched; content
/// near the longer edges is trimmed instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageScaler {
    filter: FilterType,
}

impl Default for ImageScaler {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl ImageScaler {
    /// Create a scaler using Lanczos3 resampling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scaler using the given resampling filter.
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }

    /// Resampling filter in use.
    pub fn filter(&self) -> FilterType {
        self.filter
    }

    /// Produce an image of exactly `target.width × target.height` pixels.
    ///
    /// Fails with [`Error::InvalidDimensions`] when the source or the target
    /// has a zero extent. Memory use is bounded by the source and target
    /// sizes whatever their aspect ratios.
    pub fn scale(&self, source: &RasterImage, target: Dimensions) -> Result<RasterImage> {
        let target = target.validate()?;
        let (width, height) = source.dimensions();
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        if (width, height) == (target.width, target.height) {
            return Ok(source.clone());
        }

        let (x, y, crop_width, crop_height) = crop_window(width, height, target);
        let window = imageops::crop_imm(source, x, y, crop_width, crop_height);
        if (crop_width, crop_height) == (target.width, target.height) {
            return Ok(window.to_image());
        }
        Ok(imageops::resize(&*window, target.width, target.height, self.filter))
    }
}

/// Centered region of a `width × height` source with the target's aspect
/// ratio, as `(x, y, width, height)`.
fn crop_window(width: u32, height: u32, target: Dimensions) -> (u32, u32, u32, u32) {
    let (sw, sh) = (u64::from(width), u64::from(height));
    let (tw, th) = (u64::from(target.width), u64::from(target.height));

    if tw * sh >= th * sw {
        // Target is relatively wider: keep full width, trim top and bottom
        let h = ((sw * th + tw / 2) / tw).clamp(1, sh) as u32;
        (0, (height - h) / 2, width, h)
    } else {
        let w = ((sh * tw + th / 2) / th).clamp(1, sw) as u32;
        ((width - w) / 2, 0, w, height)
    }
}
