//! DOCX styles parsing.

use super::xml::{attr, toggle};
use crate::error::DocumentError;
use crate::model::{HeadingLevel, TextAlignment};
use std::collections::HashMap;

/// A paragraph or character style definition.
#[derive(Debug, Clone, Default)]
pub struct Style {
    /// Style ID (e.g., "Heading1")
    pub id: String,
    /// Display name (e.g., "heading 1")
    pub name: String,
    pub based_on: Option<String>,
    /// Outline level (0-based) for heading styles
    pub outline_level: Option<u8>,
    pub justification: Option<TextAlignment>,
    pub bold: Option<bool>,
    /// Font size in half-points
    pub font_size: Option<u32>,
}

/// Styles from `word/styles.xml`, keyed by ID.
#[derive(Debug, Clone, Default)]
pub struct StyleMap {
    pub styles: HashMap<String, Style>,
}

impl StyleMap {
    /// Parse styles from XML content.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut map = StyleMap::default();
        if xml.trim().is_empty() {
            return Ok(map);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut current: Option<Style> = None;
        let mut in_ppr = false;
        let mut in_rpr = false;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        current = Some(Style {
                            id: attr(&e, b"w:styleId").unwrap_or_default(),
                            ..Default::default()
                        });
                    }
                    b"w:pPr" => in_ppr = true,
                    b"w:rPr" => in_rpr = true,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => {
                    if let Some(style) = current.as_mut() {
                        match e.name().as_ref() {
                            b"w:name" => style.name = attr(&e, b"w:val").unwrap_or_default(),
                            b"w:basedOn" => style.based_on = attr(&e, b"w:val"),
                            b"w:outlineLvl" if in_ppr => {
                                style.outline_level =
                                    attr(&e, b"w:val").and_then(|v| v.parse().ok());
                            }
                            b"w:jc" if in_ppr => {
                                style.justification =
                                    attr(&e, b"w:val").map(|v| TextAlignment::from_jc(&v));
                            }
                            b"w:b" if in_rpr => style.bold = Some(toggle(&e)),
                            b"w:sz" if in_rpr => {
                                style.font_size = attr(&e, b"w:val").and_then(|v| v.parse().ok());
                            }
                            _ => {}
                        }
                    }
                }
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"w:style" => {
                        if let Some(style) = current.take() {
                            if !style.id.is_empty() {
                                map.styles.insert(style.id.clone(), style);
                            }
                        }
                        in_ppr = false;
                        in_rpr = false;
                    }
                    b"w:pPr" => in_ppr = false,
                    b"w:rPr" => in_rpr = false,
                    _ => {}
                },
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        Ok(map)
    }

    /// Get a style by ID with `basedOn` inheritance applied.
    pub fn resolved(&self, id: &str) -> Option<Style> {
        let mut style = self.styles.get(id)?.clone();

        // Bounded walk; style chains in the wild can be cyclic
        let mut next = style.based_on.clone();
        for _ in 0..10 {
            let Some(base) = next.as_deref().and_then(|b| self.styles.get(b)) else {
                break;
            };
            style.outline_level = style.outline_level.or(base.outline_level);
            style.justification = style.justification.or(base.justification);
            style.bold = style.bold.or(base.bold);
            style.font_size = style.font_size.or(base.font_size);
            next = base.based_on.clone();
        }

        Some(style)
    }

    /// Heading level implied by a paragraph style.
    pub fn heading_level(&self, style_id: &str) -> HeadingLevel {
        let Some(style) = self.resolved(style_id) else {
            return heading_from_id(style_id);
        };
        if let Some(level) = style.outline_level {
            // outlineLvl 9 is "body text"
            return HeadingLevel::from_number(level.saturating_add(1));
        }
        match style.name.to_lowercase().as_str() {
            "title" => HeadingLevel::H1,
            "subtitle" => HeadingLevel::H2,
            name => name
                .strip_prefix("heading ")
                .and_then(|n| n.trim().parse::<u8>().ok())
                .map(HeadingLevel::from_number)
                .unwrap_or_else(|| heading_from_id(style_id)),
        }
    }
}

/// Fallback for documents without styles.xml: "Heading2" → H2.
fn heading_from_id(id: &str) -> HeadingLevel {
    id.strip_prefix("Heading")
        .or_else(|| id.strip_prefix("heading"))
        .and_then(|digits| digits.trim().parse::<u8>().ok())
        .map(HeadingLevel::from_number)
        .unwrap_or(HeadingLevel::None)
}
