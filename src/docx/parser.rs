//! DOCX parser implementation.

use std::io::Read;
use std::path::Path;

use quick_xml::events::{BytesStart, Event};

use super::numbering::NumberingMap;
use super::styles::StyleMap;
use super::xml::{attr, toggle};
use crate::container::OoxmlContainer;
use crate::error::DocumentError;
use crate::model::{
    Block, Cell, DocxContent, InlineImage, ListInfo, PageSetup, Paragraph, Row, Table, TextAlignment,
    TextRun, TextStyle,
};

type Result<T> = std::result::Result<T, DocumentError>;

const OFFICE_DOCUMENT_REL_TYPES: [&str; 2] = [
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument",
    "http://purl.oclc.org/ooxml/officeDocument/relationships/officeDocument",
];

/// Parser for DOCX (Word) documents.
pub struct DocxParser {
    container: OoxmlContainer,
    main_part: String,
    styles: StyleMap,
    numbering: NumberingMap,
}

impl DocxParser {
    /// Open a DOCX file for parsing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_container(OoxmlContainer::open(path)?)
    }

    /// Create a parser from bytes.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::from_container(OoxmlContainer::from_bytes(data)?)
    }

    /// Create a parser from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_container(OoxmlContainer::from_reader(reader)?)
    }

    /// Create a parser from an opened container.
    ///
    /// Fails with [`DocumentError::MissingComponent`] when the package has
    /// no main document part.
    pub fn from_container(container: OoxmlContainer) -> Result<Self> {
        let package_rels = container.read_package_relationships()?;
        let main_part = OFFICE_DOCUMENT_REL_TYPES
            .iter()
            .find_map(|t| package_rels.first_of_type(t))
            .map(|rel| OoxmlContainer::resolve_path("", &rel.target))
            .unwrap_or_else(|| "word/document.xml".to_string());
        if !container.exists(&main_part) {
            return Err(DocumentError::MissingComponent(main_part));
        }

        let styles = match container.read_xml(&OoxmlContainer::resolve_path(&main_part, "styles.xml")) {
            Ok(xml) => StyleMap::parse(&xml)?,
            Err(DocumentError::MissingComponent(_)) => StyleMap::default(),
            Err(e) => return Err(e),
        };
        let numbering =
            match container.read_xml(&OoxmlContainer::resolve_path(&main_part, "numbering.xml")) {
                Ok(xml) => NumberingMap::parse(&xml)?,
                Err(DocumentError::MissingComponent(_)) => NumberingMap::default(),
                Err(e) => return Err(e),
            };

        Ok(Self {
            container,
            main_part,
            styles,
            numbering,
        })
    }

    /// The underlying package.
    pub fn container(&self) -> &OoxmlContainer {
        &self.container
    }

    /// Path of the main document part, usually `word/document.xml`.
    pub fn main_part(&self) -> &str {
        &self.main_part
    }

    /// Parse the document body, page setup and title.
    pub fn parse(&self) -> Result<DocxContent> {
        let xml = self.container.read_xml(&self.main_part)?;
        let mut content = BodyBuilder::new(&self.styles, &self.numbering).build(&xml)?;
        content.title = self.container.core_title();
        Ok(content)
    }
}

impl std::fmt::Debug for DocxParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxParser")
            .field("main_part", &self.main_part)
            .field("styles", &self.styles.styles.len())
            .finish()
    }
}

/// A table being filled, innermost last on the stack.
#[derive(Default)]
struct TableFrame {
    table: Table,
    row: Option<Row>,
    cell: Option<Cell>,
}

/// A paragraph being filled.
#[derive(Default)]
struct ParagraphFrame {
    para: Paragraph,
    /// Run formatting inherited from the paragraph style
    base_style: TextStyle,
    num_id: Option<String>,
    ilvl: u8,
}

/// Single-pass builder over `word/document.xml`.
struct BodyBuilder<'a> {
    styles: &'a StyleMap,
    numbering: &'a NumberingMap,
    content: DocxContent,
    tables: Vec<TableFrame>,
    paragraph: Option<ParagraphFrame>,
    run_style: TextStyle,
    image: Option<InlineImage>,
    in_body: bool,
    in_section: bool,
    in_ppr: bool,
    in_rpr: bool,
    in_run: bool,
    in_text: bool,
}

impl<'a> BodyBuilder<'a> {
    fn new(styles: &'a StyleMap, numbering: &'a NumberingMap) -> Self {
        Self {
            styles,
            numbering,
            content: DocxContent::new(),
            tables: Vec::new(),
            paragraph: None,
            run_style: TextStyle::default(),
            image: None,
            in_body: false,
            in_section: false,
            in_ppr: false,
            in_rpr: false,
            in_run: false,
            in_text: false,
        }
    }

    fn build(mut self, xml: &str) -> Result<DocxContent> {
        let mut reader = quick_xml::Reader::from_str(xml);
        // xml:space="preserve" runs carry meaningful whitespace
        reader.config_mut().trim_text(false);

        let mut buf = Vec::new();
        let mut skip_buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    // Alternate renderings and text boxes would duplicate or
                    // nest paragraphs; previews only need the main flow.
                    b"mc:Fallback" | b"w:txbxContent" => {
                        reader.read_to_end_into(e.name(), &mut skip_buf)?;
                        skip_buf.clear();
                    }
                    _ => self.start(&e),
                },
                Event::Empty(e) => self.empty(&e),
                Event::Text(t) => {
                    if self.in_text && self.in_run {
                        let text = t.unescape()?;
                        self.push_text(&text);
                    }
                }
                Event::End(e) => self.end(e.name().as_ref()),
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        // Unterminated tables still contribute what was read
        while let Some(frame) = self.tables.pop() {
            let table = close_table(frame);
            self.push_block(Block::Table(table));
        }
        Ok(self.content)
    }

    fn start(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            b"w:body" => self.in_body = true,
            b"w:p" => {
                self.paragraph = Some(ParagraphFrame::default());
            }
            b"w:pPr" if self.paragraph.is_some() => self.in_ppr = true,
            b"w:rPr" => self.in_rpr = true,
            b"w:r" if self.paragraph.is_some() => {
                self.in_run = true;
                self.run_style = self
                    .paragraph
                    .as_ref()
                    .map(|p| p.base_style.clone())
                    .unwrap_or_default();
            }
            b"w:t" => self.in_text = true,
            b"w:drawing" => self.image = Some(InlineImage::default()),
            b"w:tbl" => self.tables.push(TableFrame::default()),
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.row = Some(Row::default());
                }
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    frame.cell = Some(Cell::new());
                }
            }
            b"w:sectPr" => {
                self.in_section =
                    self.in_body && self.paragraph.is_none() && self.tables.is_empty();
            }
            // Some producers write property elements with explicit end tags
            _ => self.empty(e),
        }
    }

    fn empty(&mut self, e: &BytesStart) {
        match e.name().as_ref() {
            // A self-closed paragraph is a blank line
            b"w:p" => self.push_block(Block::Paragraph(Paragraph::new())),
            b"w:pStyle" if self.in_ppr => {
                if let (Some(frame), Some(id)) = (self.paragraph.as_mut(), attr(e, b"w:val")) {
                    frame.para.heading = self.styles.heading_level(&id);
                    if let Some(style) = self.styles.resolved(&id) {
                        if let Some(jc) = style.justification {
                            frame.para.alignment = jc;
                        }
                        frame.base_style.bold = style.bold.unwrap_or(false);
                        frame.base_style.size = style.font_size;
                    }
                }
            }
            b"w:jc" if self.in_ppr => {
                if let (Some(frame), Some(val)) = (self.paragraph.as_mut(), attr(e, b"w:val")) {
                    frame.para.alignment = TextAlignment::from_jc(&val);
                }
            }
            b"w:numId" if self.in_ppr => {
                if let Some(frame) = self.paragraph.as_mut() {
                    frame.num_id = attr(e, b"w:val");
                }
            }
            b"w:ilvl" if self.in_ppr => {
                if let Some(frame) = self.paragraph.as_mut() {
                    frame.ilvl = attr(e, b"w:val").and_then(|v| v.parse().ok()).unwrap_or(0);
                }
            }
            b"w:b" if self.in_rpr && self.in_run => self.run_style.bold = toggle(e),
            b"w:i" if self.in_rpr && self.in_run => self.run_style.italic = toggle(e),
            b"w:u" if self.in_rpr && self.in_run => self.run_style.underline = toggle(e),
            b"w:strike" if self.in_rpr && self.in_run => self.run_style.strikethrough = toggle(e),
            b"w:sz" if self.in_rpr && self.in_run => {
                if let Some(size) = attr(e, b"w:val").and_then(|v| v.parse().ok()) {
                    self.run_style.size = Some(size);
                }
            }
            b"w:br" | b"w:cr" if self.in_run => {
                let Some(frame) = self.paragraph.as_mut() else {
                    return;
                };
                if attr(e, b"w:type").as_deref() == Some("page") {
                    frame.para.page_break = true;
                } else if let Some(last) = frame.para.runs.last_mut() {
                    last.line_break = true;
                } else {
                    frame.para.runs.push(TextRun {
                        line_break: true,
                        ..TextRun::styled("", self.run_style.clone())
                    });
                }
            }
            b"w:tab" if self.in_run && !self.in_ppr => self.push_text("\t"),
            b"wp:extent" => {
                if let Some(image) = self.image.as_mut() {
                    image.width_emu = attr(e, b"cx").and_then(|v| v.parse().ok());
                    image.height_emu = attr(e, b"cy").and_then(|v| v.parse().ok());
                }
            }
            b"wp:docPr" => {
                if let Some(image) = self.image.as_mut() {
                    image.alt_text = attr(e, b"descr").filter(|d| !d.is_empty());
                }
            }
            b"a:blip" => {
                if let (Some(image), Some(id)) = (self.image.as_mut(), attr(e, b"r:embed")) {
                    image.resource_id = id;
                }
            }
            b"w:gridSpan" => {
                let span = attr(e, b"w:val").and_then(|v| v.parse().ok());
                if let Some(cell) = self.tables.last_mut().and_then(|f| f.cell.as_mut()) {
                    cell.col_span = span.unwrap_or(1).max(1);
                }
            }
            b"w:tblHeader" => {
                if let Some(row) = self.tables.last_mut().and_then(|f| f.row.as_mut()) {
                    row.is_header = toggle(e);
                }
            }
            b"w:pgSz" if self.in_section => {
                let w = attr(e, b"w:w").and_then(|v| v.parse().ok());
                let h = attr(e, b"w:h").and_then(|v| v.parse().ok());
                if let (Some(width_twips), Some(height_twips)) = (w, h) {
                    self.content.page = Some(PageSetup {
                        width_twips,
                        height_twips,
                    });
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"w:body" => self.in_body = false,
            b"w:p" => {
                if let Some(frame) = self.paragraph.take() {
                    let mut para = frame.para;
                    para.list = frame.num_id.and_then(|nid| {
                        self.numbering
                            .list_type(&nid, frame.ilvl)
                            .map(|list_type| ListInfo {
                                list_type,
                                level: frame.ilvl,
                            })
                    });
                    self.push_block(Block::Paragraph(para));
                }
                self.in_ppr = false;
                self.in_run = false;
            }
            b"w:pPr" => self.in_ppr = false,
            b"w:rPr" => self.in_rpr = false,
            b"w:r" => self.in_run = false,
            b"w:t" => self.in_text = false,
            b"w:drawing" => {
                if let (Some(image), Some(frame)) = (self.image.take(), self.paragraph.as_mut()) {
                    if !image.resource_id.is_empty() || image.size_px().is_some() {
                        frame.para.images.push(image);
                    }
                }
            }
            b"w:tc" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let (Some(cell), Some(row)) = (frame.cell.take(), frame.row.as_mut()) {
                        row.cells.push(cell);
                    }
                }
            }
            b"w:tr" => {
                if let Some(frame) = self.tables.last_mut() {
                    if let Some(row) = frame.row.take() {
                        frame.table.rows.push(row);
                    }
                }
            }
            b"w:tbl" => {
                if let Some(frame) = self.tables.pop() {
                    let table = close_table(frame);
                    self.push_block(Block::Table(table));
                }
            }
            b"w:sectPr" => self.in_section = false,
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        let Some(frame) = self.paragraph.as_mut() else {
            return;
        };
        // Merge with the previous run when formatting matches
        match frame.para.runs.last_mut() {
            Some(last) if !last.line_break && last.style == self.run_style => {
                last.text.push_str(text);
            }
            _ => frame
                .para
                .runs
                .push(TextRun::styled(text, self.run_style.clone())),
        }
    }

    /// Append to the innermost open cell, or the body.
    fn push_block(&mut self, block: Block) {
        match self.tables.last_mut() {
            Some(frame) => {
                if let Some(cell) = frame.cell.as_mut() {
                    cell.content.push(block);
                }
            }
            None => self.content.add_block(block),
        }
    }
}

fn close_table(mut frame: TableFrame) -> Table {
    if let Some(mut row) = frame.row.take() {
        if let Some(cell) = frame.cell.take() {
            row.cells.push(cell);
        }
        frame.table.rows.push(row);
    }
    frame.table
}
