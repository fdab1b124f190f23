//! XHTML markup to layout blocks.
//!
//! Only the structure needed for a greeked preview survives: word extents,
//! relative font sizes, alignment, list nesting, table grids, image boxes
//! and rules.

use quick_xml::events::{BytesStart, Event};
use unicode_width::UnicodeWidthStr;

use crate::error::RenderError;
use crate::model::TextAlignment;
use crate::render::PAGE_BREAK_CLASS;

/// Image box used when `<img>` carries no usable size.
const DEFAULT_IMAGE_PX: u32 = 96;

/// Body text size in points; CSS point sizes are relative to this.
const BODY_POINTS: f32 = 11.0;

/// A word of text, measured in character cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Word {
    pub columns: u32,
    /// Font size relative to body text
    pub scale: f32,
    pub bold: bool,
    /// A forced line break follows this word.
    pub break_after: bool,
}

/// A paragraph, heading or list item.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextBlock {
    pub words: Vec<Word>,
    pub align: TextAlignment,
    /// List nesting depth, 0 outside lists
    pub indent: u32,
    /// Draw a list marker before the first line.
    pub marker: bool,
    pub scale: f32,
    pub bold: bool,
}

impl TextBlock {
    fn new(scale: f32, bold: bool) -> Self {
        Self {
            words: Vec::new(),
            align: TextAlignment::Left,
            indent: 0,
            marker: false,
            scale,
            bold,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TableCell {
    pub span: u32,
    pub header: bool,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum LayoutBlock {
    Text(TextBlock),
    Table(Vec<Vec<TableCell>>),
    Image { width: u32, height: u32 },
    Rule,
    PageBreak,
}

/// Parse markup into layout blocks, in document order.
pub(crate) fn parse(markup: &[u8]) -> Result<Vec<LayoutBlock>, RenderError> {
    let mut reader = quick_xml::Reader::from_reader(markup);
    let mut builder = LayoutBuilder::default();
    let mut buf = Vec::new();
    let mut skip = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"head" | b"style" | b"script" => {
                    let end = e.to_end().into_owned();
                    reader.read_to_end_into(end.name(), &mut skip)?;
                    skip.clear();
                }
                _ => builder.start(&e),
            },
            Event::Empty(e) => {
                builder.start(&e);
                builder.end(e.local_name().as_ref());
            }
            Event::End(e) => builder.end(e.local_name().as_ref()),
            Event::Text(e) => {
                let text = match e.unescape() {
                    Ok(text) => text.into_owned(),
                    // HTML named entities are not XML; keep the raw text
                    Err(_) => String::from_utf8_lossy(&e).into_owned(),
                };
                builder.text(&text);
            }
            Event::CData(e) => builder.text(&String::from_utf8_lossy(&e)),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(builder.finish())
}

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<TableCell>>,
    row: Option<Vec<TableCell>>,
    cell: Option<TableCell>,
}

#[derive(Default)]
struct LayoutBuilder {
    blocks: Vec<LayoutBlock>,
    text: Option<TextBlock>,
    /// Images met inside the current text block
    pending_images: Vec<(u32, u32)>,
    /// Inline formatting: (bold, font scale) per open element
    inline: Vec<(bool, Option<f32>)>,
    list_depth: u32,
    table: Option<TableState>,
    table_depth: u32,
}

impl LayoutBuilder {
    fn start(&mut self, e: &BytesStart) {
        let name = e.local_name();
        match name.as_ref() {
            b"p" | b"div" | b"li" | b"blockquote" | b"pre" | b"h1" | b"h2" | b"h3" | b"h4"
            | b"h5" | b"h6" => {
                if self.table_depth > 0 {
                    self.cell_break();
                    return;
                }
                self.flush_text();
                let (scale, bold) = heading_scale(name.as_ref());
                let mut block = TextBlock::new(scale, bold);
                block.align = attribute(e, b"style")
                    .and_then(|style| css_property(&style, "text-align").map(align_from_css))
                    .unwrap_or_default();
                block.indent = self.list_depth;
                block.marker = name.as_ref() == b"li";
                self.text = Some(block);
            }
            b"ul" | b"ol" => {
                self.flush_text();
                self.list_depth += 1;
            }
            b"table" => {
                self.flush_text();
                self.table_depth += 1;
                if self.table_depth == 1 {
                    self.table = Some(TableState::default());
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    table.row = Some(Vec::new());
                }
            }
            b"td" | b"th" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    let span = attribute(e, b"colspan")
                        .and_then(|v| v.trim().parse::<u32>().ok())
                        .unwrap_or(1)
                        .max(1);
                    table.cell = Some(TableCell {
                        span,
                        header: name.as_ref() == b"th",
                        words: Vec::new(),
                    });
                }
            }
            b"br" => self.line_break(),
            b"hr" => {
                if self.table_depth > 0 {
                    return;
                }
                self.flush_text();
                let page_break = attribute(e, b"class")
                    .is_some_and(|class| class.split_whitespace().any(|c| c == PAGE_BREAK_CLASS));
                self.blocks.push(if page_break {
                    LayoutBlock::PageBreak
                } else {
                    LayoutBlock::Rule
                });
            }
            b"img" => {
                if self.table_depth > 0 {
                    return;
                }
                let size = |key: &[u8]| {
                    attribute(e, key)
                        .and_then(|v| v.trim().trim_end_matches("px").parse::<u32>().ok())
                        .filter(|&v| v > 0)
                        .unwrap_or(DEFAULT_IMAGE_PX)
                };
                let image = (size(b"width"), size(b"height"));
                if self.text.is_some() {
                    self.pending_images.push(image);
                } else {
                    self.blocks.push(LayoutBlock::Image {
                        width: image.0,
                        height: image.1,
                    });
                }
            }
            b"strong" | b"b" | b"em" | b"i" | b"u" | b"s" | b"span" | b"a" | b"sub" | b"sup"
            | b"code" => {
                let bold = matches!(name.as_ref(), b"strong" | b"b");
                let scale = attribute(e, b"style")
                    .and_then(|style| css_property(&style, "font-size").and_then(font_scale));
                self.inline.push((bold, scale));
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"p" | b"div" | b"li" | b"blockquote" | b"pre" | b"h1" | b"h2" | b"h3" | b"h4"
            | b"h5" | b"h6" => {
                if self.table_depth == 0 {
                    self.flush_text();
                }
            }
            b"ul" | b"ol" => {
                self.flush_text();
                self.list_depth = self.list_depth.saturating_sub(1);
            }
            b"td" | b"th" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    if let (Some(row), Some(cell)) = (table.row.as_mut(), table.cell.take()) {
                        row.push(cell);
                    }
                }
            }
            b"tr" if self.table_depth == 1 => {
                if let Some(table) = self.table.as_mut() {
                    if let Some(row) = table.row.take() {
                        table.rows.push(row);
                    }
                }
            }
            b"table" if self.table_depth > 0 => {
                self.table_depth -= 1;
                if self.table_depth == 0 {
                    self.flush_table();
                }
            }
            b"strong" | b"b" | b"em" | b"i" | b"u" | b"s" | b"span" | b"a" | b"sub" | b"sup"
            | b"code" => {
                self.inline.pop();
            }
            b"body" => self.flush_text(),
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let (bold, scale) = self.inline_style();
        let words = text.split_whitespace().map(|w| Word {
            columns: (w.width() as u32).max(1),
            scale,
            bold,
            break_after: false,
        });

        if self.table_depth > 0 {
            if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
                cell.words.extend(words);
            }
            return;
        }

        let mut words = words.peekable();
        if words.peek().is_none() {
            return;
        }
        let list_depth = self.list_depth;
        let block = self.text.get_or_insert_with(|| {
            let mut block = TextBlock::new(1.0, false);
            block.indent = list_depth;
            block
        });
        block.words.extend(words);
    }

    /// Current (bold, scale), falling back to the block's own.
    fn inline_style(&self) -> (bool, f32) {
        let (block_scale, block_bold) = self
            .text
            .as_ref()
            .map(|b| (b.scale, b.bold))
            .unwrap_or((1.0, false));
        let bold = block_bold || self.inline.iter().any(|(b, _)| *b);
        let scale = self
            .inline
            .iter()
            .rev()
            .find_map(|(_, s)| *s)
            .unwrap_or(block_scale);
        (bold, scale)
    }

    fn line_break(&mut self) {
        let words = if self.table_depth > 0 {
            match self.table.as_mut().and_then(|t| t.cell.as_mut()) {
                Some(cell) => &mut cell.words,
                None => return,
            }
        } else {
            let list_depth = self.list_depth;
            &mut self
                .text
                .get_or_insert_with(|| {
                    let mut block = TextBlock::new(1.0, false);
                    block.indent = list_depth;
                    block
                })
                .words
        };
        match words.last_mut() {
            Some(word) => word.break_after = true,
            None => words.push(Word {
                columns: 0,
                scale: 1.0,
                bold: false,
                break_after: true,
            }),
        }
    }

    /// Paragraphs inside a cell start on a new line.
    fn cell_break(&mut self) {
        if let Some(word) = self
            .table
            .as_mut()
            .and_then(|t| t.cell.as_mut())
            .and_then(|c| c.words.last_mut())
        {
            word.break_after = true;
        }
    }

    fn flush_text(&mut self) {
        if let Some(block) = self.text.take() {
            self.blocks.push(LayoutBlock::Text(block));
        }
        for (width, height) in self.pending_images.drain(..) {
            self.blocks.push(LayoutBlock::Image { width, height });
        }
    }

    fn flush_table(&mut self) {
        if let Some(table) = self.table.take() {
            let rows: Vec<_> = table.rows.into_iter().filter(|r| !r.is_empty()).collect();
            if !rows.is_empty() {
                self.blocks.push(LayoutBlock::Table(rows));
            }
        }
    }

    fn finish(mut self) -> Vec<LayoutBlock> {
        self.flush_text();
        self.flush_table();
        self.blocks
    }
}

fn heading_scale(tag: &[u8]) -> (f32, bool) {
    match tag {
        b"h1" => (2.0, true),
        b"h2" => (1.6, true),
        b"h3" => (1.35, true),
        b"h4" => (1.15, true),
        b"h5" => (1.05, true),
        b"h6" => (1.0, true),
        _ => (1.0, false),
    }
}

fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == key)
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()))
}

/// Value of one declaration in an inline `style` attribute.
fn css_property<'a>(style: &'a str, property: &str) -> Option<&'a str> {
    style.split(';').find_map(|decl| {
        let (name, value) = decl.split_once(':')?;
        name.trim()
            .eq_ignore_ascii_case(property)
            .then(|| value.trim())
    })
}

fn align_from_css(value: &str) -> TextAlignment {
    match value.to_ascii_lowercase().as_str() {
        "center" => TextAlignment::Center,
        "right" | "end" => TextAlignment::Right,
        "justify" => TextAlignment::Justify,
        _ => TextAlignment::Left,
    }
}

/// CSS font size relative to 11pt body text.
fn font_scale(value: &str) -> Option<f32> {
    let value = value.trim().to_ascii_lowercase();
    let scale = if let Some(pt) = value.strip_suffix("pt") {
        pt.trim().parse::<f32>().ok()? / BODY_POINTS
    } else if let Some(px) = value.strip_suffix("px") {
        px.trim().parse::<f32>().ok()? * 0.75 / BODY_POINTS
    } else if let Some(em) = value.strip_suffix("em") {
        em.trim().parse::<f32>().ok()?
    } else {
        return None;
    };
    (scale.is_finite() && scale > 0.0).then_some(scale.clamp(0.25, 6.0))
}
