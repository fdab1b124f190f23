//! Collaborator traits used by the thumbnail pipeline.
//!
//! [`ThumbnailResolver`](crate::ThumbnailResolver) only talks to documents,
//! image decoders and markup renderers through these traits. The crate ships
//! one implementation of each ([`DocxDocument`](crate::docx::DocxDocument),
//! [`ImageCrateCodec`](crate::raster::ImageCrateCodec),
//! [`PageRasterizer`](crate::raster::PageRasterizer)); tests and callers can
//! substitute their own.

use std::fmt;
use std::io::Read;

use crate::dimensions::Dimensions;
use crate::error::{DecodeError, DocumentError, RenderError};

/// Decoded pixel buffer handed back to callers.
pub type RasterImage = image::RgbaImage;

/// Result of looking up a document's embedded preview.
pub enum EmbeddedPreview<'a> {
    /// The document carries a preview; the reader yields its encoded bytes.
    Present(Box<dyn Read + 'a>),
    /// No preview is stored in the document.
    Absent,
}

impl EmbeddedPreview<'_> {
    /// Whether the document carries a usable preview.
    pub fn is_present(&self) -> bool {
        matches!(self, EmbeddedPreview::Present(_))
    }
}

impl fmt::Debug for EmbeddedPreview<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddedPreview::Present(_) => f.write_str("Present(..)"),
            EmbeddedPreview::Absent => f.write_str("Absent"),
        }
    }
}

/// An opened document that can provide or produce a preview.
pub trait DocumentSource {
    /// Identifier used in error reports, usually the file path.
    fn identifier(&self) -> &str;

    /// Look up the embedded preview image.
    fn embedded_preview(&self) -> Result<EmbeddedPreview<'_>, DocumentError>;

    /// Declared page size in pixels, or `None` when the document has none.
    fn native_page_size(&self) -> Result<Option<Dimensions>, DocumentError>;

    /// Render the document content to markup bytes.
    fn render_markup(&self) -> Result<Vec<u8>, DocumentError>;
}

/// Decodes encoded image bytes (JPEG, PNG, ...) into a raster.
pub trait ImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError>;
}

/// Rasterizes markup onto a canvas of the given size.
pub trait MarkupRenderer {
    fn render(&self, markup: &[u8], canvas: Dimensions) -> Result<RasterImage, RenderError>;
}

impl<T: DocumentSource + ?Sized> DocumentSource for &T {
    fn identifier(&self) -> &str {
        (**self).identifier()
    }

    fn embedded_preview(&self) -> Result<EmbeddedPreview<'_>, DocumentError> {
        (**self).embedded_preview()
    }

    fn native_page_size(&self) -> Result<Option<Dimensions>, DocumentError> {
        (**self).native_page_size()
    }

    fn render_markup(&self) -> Result<Vec<u8>, DocumentError> {
        (**self).render_markup()
    }
}

impl<T: ImageCodec + ?Sized> ImageCodec for &T {
    fn decode(&self, bytes: &[u8]) -> Result<RasterImage, DecodeError> {
        (**self).decode(bytes)
    }
}

impl<T: MarkupRenderer + ?Sized> MarkupRenderer for &T {
    fn render(&self, markup: &[u8], canvas: Dimensions) -> Result<RasterImage, RenderError> {
        (**self).render(markup, canvas)
    }
}
