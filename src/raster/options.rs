//! Rasterizer options configuration.

use image::Rgba;

/// Options for laying out and painting a page preview.
///
/// Lengths are in reference pixels: the page is laid out as if it were
/// `reference_width` pixels wide and then scaled to the canvas width.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterOptions {
    /// Width the layout is designed for (US Letter at 96 DPI)
    pub reference_width: u32,

    /// Page margin on every side
    pub margin: u32,

    /// Body text size in pixels (11pt at 96 DPI)
    pub font_size: f32,

    /// Line height as a multiple of the font size
    pub line_spacing: f32,

    /// Extra space after each block, as a multiple of the font size
    pub block_spacing: f32,

    /// Page color
    pub background: Rgba<u8>,

    /// Color of greeked text bars and table rules
    pub ink: Rgba<u8>,

    /// Fill color of image placeholders
    pub placeholder: Rgba<u8>,

    /// Largest canvas, in pixels, the rasterizer will allocate
    pub max_canvas_pixels: u64,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            reference_width: 816,
            margin: 96,
            font_size: 14.67,
            line_spacing: 1.15,
            block_spacing: 0.6,
            background: Rgba([255, 255, 255, 255]),
            ink: Rgba([64, 64, 64, 255]),
            placeholder: Rgba([205, 210, 218, 255]),
            // 8192 x 8192, 256 MiB of RGBA
            max_canvas_pixels: 1 << 26,
        }
    }
}

impl RasterOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page margin in reference pixels.
    pub fn with_margin(mut self, margin: u32) -> Self {
        self.margin = margin.min(self.reference_width / 4);
        self
    }

    /// Set the body font size in reference pixels.
    pub fn with_font_size(mut self, size: f32) -> Self {
        self.font_size = size.max(1.0);
        self
    }

    /// Set the page and ink colors.
    pub fn with_colors(mut self, background: Rgba<u8>, ink: Rgba<u8>) -> Self {
        self.background = background;
        self.ink = ink;
        self
    }

    /// Set the largest canvas area the rasterizer accepts.
    pub fn with_max_canvas_pixels(mut self, pixels: u64) -> Self {
        self.max_canvas_pixels = pixels.max(1);
        self
    }
}
