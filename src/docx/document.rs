//! DOCX implementation of [`DocumentSource`].

use std::cell::OnceCell;
use std::io::{Cursor, Read};
use std::path::Path;

use super::DocxParser;
use crate::container::{OoxmlContainer, THUMBNAIL_REL_TYPE};
use crate::dimensions::Dimensions;
use crate::error::{DocumentError, Error, Result, Stage};
use crate::model::DocxContent;
use crate::render::to_xhtml;
use crate::traits::{DocumentSource, EmbeddedPreview};

/// Preview formats the image codec cannot handle.
const METAFILE_EXTENSIONS: [&str; 4] = ["emf", "wmf", "emz", "wmz"];

/// An opened Word document.
///
/// The body is parsed lazily, at most once, the first time page size or
/// markup is requested. Documents with an embedded preview are never parsed.
#[derive(Debug)]
pub struct DocxDocument {
    name: String,
    parser: DocxParser,
    content: OnceCell<DocxContent>,
}

impl DocxDocument {
    /// Open a DOCX file. The path becomes the document identifier.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let name = path.display().to_string();
        let data = std::fs::read(path).map_err(|source| Error::SourceUnavailable {
            document: name.clone(),
            source,
        })?;
        Self::from_bytes(name, data)
    }

    /// Open a DOCX package held in memory.
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        let name = name.into();
        match DocxParser::from_bytes(data) {
            Ok(parser) => Ok(Self::from_parser(name, parser)),
            Err(e) => Err(Error::generation(name, Stage::OpenDocument, e)),
        }
    }

    /// Read a DOCX package from any reader.
    pub fn from_reader<R: Read>(name: impl Into<String>, mut reader: R) -> Result<Self> {
        let name = name.into();
        let mut data = Vec::new();
        if let Err(source) = reader.read_to_end(&mut data) {
            return Err(Error::SourceUnavailable {
                document: name,
                source,
            });
        }
        Self::from_bytes(name, data)
    }

    /// Wrap an already constructed parser.
    pub fn from_parser(name: impl Into<String>, parser: DocxParser) -> Self {
        Self {
            name: name.into(),
            parser,
            content: OnceCell::new(),
        }
    }

    /// Parsed body content, parsed on first use.
    pub fn content(&self) -> std::result::Result<&DocxContent, DocumentError> {
        if let Some(content) = self.content.get() {
            return Ok(content);
        }
        let parsed = self.parser.parse()?;
        Ok(self.content.get_or_init(|| parsed))
    }

    /// Part name of the embedded preview, if the package declares one.
    pub fn thumbnail_part(&self) -> std::result::Result<Option<String>, DocumentError> {
        let container = self.parser.container();
        let rels = container.read_package_relationships()?;
        Ok(rels
            .first_of_type(THUMBNAIL_REL_TYPE)
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target)))
    }
}

impl DocumentSource for DocxDocument {
    fn identifier(&self) -> &str {
        &self.name
    }

    fn embedded_preview(&self) -> std::result::Result<EmbeddedPreview<'_>, DocumentError> {
        let Some(part) = self.thumbnail_part()? else {
            return Ok(EmbeddedPreview::Absent);
        };

        let extension = part
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if METAFILE_EXTENSIONS.contains(&extension.as_str()) {
            log::debug!("{}: ignoring metafile preview {}", self.name, part);
            return Ok(EmbeddedPreview::Absent);
        }

        let container = self.parser.container();
        if !container.exists(&part) {
            log::debug!("{}: thumbnail relationship targets missing part {}", self.name, part);
            return Ok(EmbeddedPreview::Absent);
        }

        let data = container.read_binary(&part)?;
        Ok(EmbeddedPreview::Present(Box::new(Cursor::new(data))))
    }

    fn native_page_size(&self) -> std::result::Result<Option<Dimensions>, DocumentError> {
        let size = self.content()?.page.map(|page| {
            let (width, height) = page.size_px();
            Dimensions::new(width, height)
        });
        if size.is_none() {
            log::debug!("{}: no page size declared", self.name);
        }
        Ok(size)
    }

    fn render_markup(&self) -> std::result::Result<Vec<u8>, DocumentError> {
        Ok(to_xhtml(self.content()?).into_bytes())
    }
}
