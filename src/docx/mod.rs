//! DOCX (Word) document support.
//!
//! [`DocxParser`] reads a package into the content model and
//! [`DocxDocument`] exposes it to the thumbnail pipeline as a
//! [`DocumentSource`](crate::DocumentSource).

mod document;
mod numbering;
mod parser;
mod styles;
mod xml;

pub use document::DocxDocument;
pub use numbering::NumberingMap;
pub use parser::DocxParser;
pub use styles::{Style, StyleMap};
