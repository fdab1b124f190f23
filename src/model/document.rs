//! Document-level content model.

use super::{Paragraph, Table};
use serde::{Deserialize, Serialize};

/// A block-level element of the document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph(Paragraph),
    Table(Table),
}

/// Page geometry from the body-level `w:sectPr`.
///
/// Values are in twentieths of a point (twips), as stored in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSetup {
    pub width_twips: u32,
    pub height_twips: u32,
}

impl PageSetup {
    /// Twips per CSS pixel at 96 DPI.
    pub const TWIPS_PER_PX: u32 = 15;

    /// Page extent in CSS pixels, rounded to nearest.
    pub fn size_px(&self) -> (u32, u32) {
        let per_px = u64::from(Self::TWIPS_PER_PX);
        // Fits in u32 for any u32 input
        let px = |twips: u32| ((u64::from(twips) + per_px / 2) / per_px) as u32;
        (px(self.width_twips), px(self.height_twips))
    }
}

/// Parsed content of a Word document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocxContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<PageSetup>,

    pub blocks: Vec<Block>,
}

impl DocxContent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_block(&mut self, block: Block) {
        self.blocks.push(block);
    }

    /// Top-level paragraphs, in order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(|b| match b {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
