//! Error types for the docthumb library.
//!
//! [`Error`] is what callers of the thumbnail pipeline see. The collaborator
//! layers each have their own error type ([`DocumentError`], [`DecodeError`],
//! [`RenderError`]) which the resolver wraps into
//! [`Error::ThumbnailGenerationFailed`] together with the failing [`Stage`].

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type alias for docthumb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the thumbnail pipeline.
#[derive(Error, Debug)]
pub enum Error {
    /// The document could not be opened or read at all.
    #[error("Document source unavailable: {document}")]
    SourceUnavailable {
        /// Identifier of the document (usually its path).
        document: String,
        #[source]
        source: io::Error,
    },

    /// Reading, decoding or rendering the document failed.
    #[error("Thumbnail generation failed for {document} while {stage}")]
    ThumbnailGenerationFailed {
        /// Identifier of the document (usually its path).
        document: String,
        /// Pipeline step that failed.
        stage: Stage,
        #[source]
        source: Cause,
    },

    /// A requested or derived size has a zero extent.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
}

impl Error {
    /// Wrap a collaborator failure for `document` at `stage`.
    pub(crate) fn generation(
        document: impl Into<String>,
        stage: Stage,
        cause: impl Into<Cause>,
    ) -> Self {
        Error::ThumbnailGenerationFailed {
            document: document.into(),
            stage,
            source: cause.into(),
        }
    }

    /// The failing stage, for generation failures.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::ThumbnailGenerationFailed { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

/// Step of the pipeline at which a generation failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Opening the document container.
    OpenDocument,
    /// Reading the embedded preview stream.
    ReadPreview,
    /// Decoding the embedded preview image.
    DecodePreview,
    /// Reading the declared page size.
    ReadPageSize,
    /// Converting document content to markup.
    RenderMarkup,
    /// Rasterizing the markup.
    RasterizeMarkup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Stage::OpenDocument => "opening document",
            Stage::ReadPreview => "reading embedded preview",
            Stage::DecodePreview => "decoding embedded preview",
            Stage::ReadPageSize => "reading page size",
            Stage::RenderMarkup => "rendering markup",
            Stage::RasterizeMarkup => "rasterizing markup",
        };
        f.write_str(text)
    }
}

/// Underlying cause of a [`Error::ThumbnailGenerationFailed`].
#[derive(Error, Debug)]
pub enum Cause {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Errors raised while reading a document container.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// I/O error while reading document data.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error reading ZIP archive.
    #[error("ZIP archive error: {0}")]
    ZipArchive(String),

    /// Error parsing XML content.
    #[error("XML parse error: {0}")]
    XmlParse(String),

    /// A required document component is missing.
    #[error("Missing component: {0}")]
    MissingComponent(String),
}

impl From<zip::result::ZipError> for DocumentError {
    fn from(err: zip::result::ZipError) -> Self {
        match err {
            zip::result::ZipError::Io(e) => DocumentError::Io(e),
            other => DocumentError::ZipArchive(other.to_string()),
        }
    }
}

impl From<quick_xml::Error> for DocumentError {
    fn from(err: quick_xml::Error) -> Self {
        DocumentError::XmlParse(err.to_string())
    }
}

/// Errors raised while decoding raster image bytes.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The bytes are not a supported or well-formed image.
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    /// The image decoded to zero pixels.
    #[error("Decoded image is empty ({width}x{height})")]
    Empty { width: u32, height: u32 },
}

/// Errors raised while rasterizing markup.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The markup is not well-formed.
    #[error("Markup error: {0}")]
    Markup(String),

    /// The requested canvas has a zero extent or exceeds the pixel budget.
    #[error("Invalid canvas: {width}x{height}")]
    InvalidCanvas { width: u32, height: u32 },
}

impl From<quick_xml::Error> for RenderError {
    fn from(err: quick_xml::Error) -> Self {
        RenderError::Markup(err.to_string())
    }
}
