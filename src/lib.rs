//! # docthumb
//!
//! Thumbnail extraction and rendering for Word (DOCX) documents.
//!
//! A thumbnail is taken from the preview image embedded in the package when
//! there is one. Otherwise the document content is converted to XHTML,
//! rasterized as a greeked page at the document's page size, and resampled
//! to each requested size.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docthumb::{thumbnails_from_path, Dimensions};
//!
//! let sizes = [Dimensions::new(128, 128), Dimensions::new(256, 192)];
//! let thumbnails = thumbnails_from_path("report.docx", &sizes)?;
//! thumbnails[0].save("report-128.png").expect("write thumbnail");
//! # Ok::<(), docthumb::Error>(())
//! ```
//!
//! ## Custom Collaborators
//!
//! [`ThumbnailResolver`] works against the [`DocumentSource`],
//! [`ImageCodec`] and [`MarkupRenderer`] traits, so any piece can be
//! replaced:
//!
//! ```no_run
//! use docthumb::docx::DocxDocument;
//! use docthumb::raster::{ImageCrateCodec, PageRasterizer, RasterOptions};
//! use docthumb::{Dimensions, ImageScaler, ThumbnailResolver};
//! use image::imageops::FilterType;
//!
//! let rasterizer = PageRasterizer::with_options(RasterOptions::new().with_margin(48));
//! let resolver = ThumbnailResolver::with_collaborators(ImageCrateCodec, rasterizer)
//!     .with_scaler(ImageScaler::with_filter(FilterType::Triangle));
//!
//! let doc = DocxDocument::open("report.docx")?;
//! let thumbnails = resolver.resolve(&doc, &[Dimensions::new(200, 260)])?;
//! # Ok::<(), docthumb::Error>(())
//! ```
//!
//! ## Features
//!
//! - `async`: [`thumbnails_from_path_async`] using Tokio

pub mod container;
pub mod dimensions;
pub mod docx;
pub mod error;
pub mod model;
pub mod raster;
pub mod render;
pub mod resolver;
pub mod scale;
pub mod traits;

// Re-exports
pub use container::{OoxmlContainer, Relationship, Relationships, THUMBNAIL_REL_TYPE};
pub use dimensions::{Dimensions, ParseDimensionsError};
pub use docx::{DocxDocument, DocxParser};
pub use error::{Cause, DecodeError, DocumentError, Error, RenderError, Result, Stage};
pub use model::{
    Block, Cell, DocxContent, HeadingLevel, InlineImage, ListInfo, ListType, PageSetup,
    Paragraph, Row, Table, TextAlignment, TextRun, TextStyle,
};
pub use raster::{ImageCrateCodec, PageRasterizer, RasterOptions};
pub use resolver::ThumbnailResolver;
pub use scale::ImageScaler;
pub use traits::{DocumentSource, EmbeddedPreview, ImageCodec, MarkupRenderer, RasterImage};

use std::io::Read;
use std::path::Path;

/// Produce thumbnails for a DOCX file, one per target, in target order.
///
/// A missing or unreadable file fails with [`Error::SourceUnavailable`].
///
/// # Example
///
/// ```no_run
/// use docthumb::{thumbnails_from_path, Dimensions};
///
/// let thumbs = thumbnails_from_path("memo.docx", &[Dimensions::new(96, 96)])?;
/// assert_eq!(thumbs[0].dimensions(), (96, 96));
/// # Ok::<(), docthumb::Error>(())
/// ```
pub fn thumbnails_from_path(
    path: impl AsRef<Path>,
    targets: &[Dimensions],
) -> Result<Vec<RasterImage>> {
    let doc = DocxDocument::open(path)?;
    ThumbnailResolver::new().resolve(&doc, targets)
}

/// Produce thumbnails for a DOCX package held in memory.
///
/// `name` identifies the document in error reports.
pub fn thumbnails_from_bytes(
    name: impl Into<String>,
    data: Vec<u8>,
    targets: &[Dimensions],
) -> Result<Vec<RasterImage>> {
    let doc = DocxDocument::from_bytes(name, data)?;
    ThumbnailResolver::new().resolve(&doc, targets)
}

/// Produce thumbnails for a DOCX package read from `reader`.
pub fn thumbnails_from_reader<R: Read>(
    name: impl Into<String>,
    reader: R,
    targets: &[Dimensions],
) -> Result<Vec<RasterImage>> {
    let doc = DocxDocument::from_reader(name, reader)?;
    ThumbnailResolver::new().resolve(&doc, targets)
}

/// Async variant of [`thumbnails_from_path`].
///
/// The file is read with Tokio and the pipeline runs on the blocking pool.
#[cfg(feature = "async")]
pub async fn thumbnails_from_path_async(
    path: impl AsRef<Path>,
    targets: &[Dimensions],
) -> Result<Vec<RasterImage>> {
    let path = path.as_ref();
    let name = path.display().to_string();
    let data = tokio::fs::read(path)
        .await
        .map_err(|source| Error::SourceUnavailable {
            document: name.clone(),
            source,
        })?;

    let targets = targets.to_vec();
    let document = name.clone();
    match tokio::task::spawn_blocking(move || thumbnails_from_bytes(name, data, &targets)).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
        Err(e) => Err(Error::SourceUnavailable {
            document,
            source: std::io::Error::other(e),
        }),
    }
}
