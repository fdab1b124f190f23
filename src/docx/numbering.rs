//! DOCX numbering (list) parsing.

use super::xml::attr;
use crate::error::DocumentError;
use crate::model::ListType;
use std::collections::HashMap;

/// Numbering definitions from `word/numbering.xml`.
///
/// Only the list kind per level is kept; counters and level text are not
/// needed for previews.
#[derive(Debug, Clone, Default)]
pub struct NumberingMap {
    /// abstractNumId → number format per level
    abstract_formats: HashMap<String, HashMap<u8, String>>,
    /// numId → abstractNumId
    instances: HashMap<String, String>,
}

impl NumberingMap {
    /// Parse numbering from XML content.
    pub fn parse(xml: &str) -> Result<Self, DocumentError> {
        let mut map = NumberingMap::default();
        if xml.trim().is_empty() {
            return Ok(map);
        }

        let mut reader = quick_xml::Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut abstract_id: Option<String> = None;
        let mut level: Option<u8> = None;
        let mut num_id: Option<String> = None;

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => abstract_id = attr(&e, b"w:abstractNumId"),
                    b"w:lvl" if abstract_id.is_some() => {
                        level = attr(&e, b"w:ilvl").and_then(|v| v.parse().ok());
                    }
                    b"w:num" => num_id = attr(&e, b"w:numId"),
                    _ => {}
                },
                Ok(quick_xml::events::Event::Empty(e)) => match e.name().as_ref() {
                    b"w:numFmt" => {
                        if let (Some(aid), Some(lvl), Some(fmt)) =
                            (&abstract_id, level, attr(&e, b"w:val"))
                        {
                            map.abstract_formats
                                .entry(aid.clone())
                                .or_default()
                                .insert(lvl, fmt);
                        }
                    }
                    b"w:abstractNumId" => {
                        if let (Some(nid), Some(aid)) = (&num_id, attr(&e, b"w:val")) {
                            map.instances.insert(nid.clone(), aid);
                        }
                    }
                    _ => {}
                },
                Ok(quick_xml::events::Event::End(e)) => match e.name().as_ref() {
                    b"w:abstractNum" => abstract_id = None,
                    b"w:lvl" => level = None,
                    b"w:num" => num_id = None,
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

    /// List kind for a numbered paragraph, or `None` when the paragraph is
    /// not actually in a list (`numId` 0 or an unknown instance).
    pub fn list_type(&self, num_id: &str, level: u8) -> Option<ListType> {
        if num_id == "0" {
            return None;
        }
        let abstract_id = self.instances.get(num_id)?;
        let format = self
            .abstract_formats
            .get(abstract_id)
            .and_then(|levels| levels.get(&level))
            .map(String::as_str);
        Some(match format {
            Some("bullet") | Some("none") | None => ListType::Bullet,
            Some(_) => ListType::Numbered,
        })
    }
}
