//! Content model for Word documents.
//!
//! The DOCX parser fills these structures from `word/document.xml`, and the
//! markup renderer turns them into XHTML for rasterization.

mod document;
mod paragraph;
mod table;

pub use document::*;
pub use paragraph::*;
pub use table::*;
