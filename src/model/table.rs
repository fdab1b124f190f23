//! Table models.

use super::document::Block;
use serde::{Deserialize, Serialize};

/// A table cell. Cells may hold paragraphs and nested tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub content: Vec<Block>,

    /// Number of grid columns spanned (`w:gridSpan`)
    #[serde(default = "one", skip_serializing_if = "is_one")]
    pub col_span: u32,
}

fn one() -> u32 {
    1
}

fn is_one(n: &u32) -> bool {
    *n == 1
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: Vec::new(),
            col_span: 1,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Block::Paragraph(super::Paragraph::with_text(text))],
            col_span: 1,
        }
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub cells: Vec<Cell>,

    /// Marked as a repeating header row (`w:tblHeader`)
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_header: bool,
}

impl Row {
    /// Grid columns covered, counting spans.
    pub fn effective_columns(&self) -> usize {
        self.cells.iter().map(|c| c.col_span.max(1) as usize).sum()
    }
}

/// A table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Widest row, in grid columns.
    pub fn column_count(&self) -> usize {
        self.rows
            .iter()
            .map(Row::effective_columns)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.cells.is_empty())
    }
}
