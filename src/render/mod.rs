//! Markup rendering for documents.
//!
//! Converts the parsed content model to XHTML, the intermediate form that
//! [`PageRasterizer`](crate::raster::PageRasterizer) lays out when a document
//! has no embedded preview.
//!
//! # Example
//!
//! ```no_run
//! use docthumb::docx::DocxParser;
//! use docthumb::render::to_xhtml;
//!
//! let content = DocxParser::open("report.docx")?.parse()?;
//! let xhtml = to_xhtml(&content);
//! assert!(xhtml.starts_with("<?xml"));
//! # Ok::<(), docthumb::DocumentError>(())
//! ```

mod xhtml;

pub use xhtml::{to_xhtml, PAGE_BREAK_CLASS};
