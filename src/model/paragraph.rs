//! Paragraph and text run models.

use serde::{Deserialize, Serialize};

/// Text alignment within a paragraph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl TextAlignment {
    /// Map a `w:jc` value.
    pub fn from_jc(val: &str) -> Self {
        match val {
            "center" => TextAlignment::Center,
            "right" | "end" => TextAlignment::Right,
            "both" | "distribute" => TextAlignment::Justify,
            _ => TextAlignment::Left,
        }
    }

    /// CSS `text-align` keyword.
    pub fn css(self) -> &'static str {
        match self {
            TextAlignment::Left => "left",
            TextAlignment::Center => "center",
            TextAlignment::Right => "right",
            TextAlignment::Justify => "justify",
        }
    }
}

/// Heading level (h1-h6 or none).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadingLevel {
    #[default]
    None,
    H1,
    H2,
    H3,
    H4,
    H5,
    H6,
}

impl HeadingLevel {
    /// Create a heading level from a number (1-6).
    pub fn from_number(n: u8) -> Self {
        match n {
            1 => HeadingLevel::H1,
            2 => HeadingLevel::H2,
            3 => HeadingLevel::H3,
            4 => HeadingLevel::H4,
            5 => HeadingLevel::H5,
            6 => HeadingLevel::H6,
            _ => HeadingLevel::None,
        }
    }

    /// Get the numeric level (0 for none, 1-6 for headings).
    pub fn level(&self) -> u8 {
        match self {
            HeadingLevel::None => 0,
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
            HeadingLevel::H5 => 5,
            HeadingLevel::H6 => 6,
        }
    }

    pub fn is_heading(&self) -> bool {
        !matches!(self, HeadingLevel::None)
    }
}

/// List type for numbered paragraphs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    #[default]
    Bullet,
    Numbered,
}

/// List membership of a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListInfo {
    pub list_type: ListType,
    /// Nesting level (0 = top level)
    pub level: u8,
}

/// Run formatting that affects the rendered preview.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub strikethrough: bool,

    /// Font size in half-points (`w:sz`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
}

/// A run of uniformly formatted text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,

    #[serde(default)]
    pub style: TextStyle,

    /// A line break follows this run.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub line_break: bool,
}

impl TextRun {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
            line_break: false,
        }
    }
}

/// An inline drawing; only its extent matters for previews.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineImage {
    /// Relationship ID of the image part.
    pub resource_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,

    /// Width in EMUs (914400 per inch)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width_emu: Option<u64>,

    /// Height in EMUs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height_emu: Option<u64>,
}

impl InlineImage {
    /// Extent converted to CSS pixels at 96 DPI.
    pub fn size_px(&self) -> Option<(u32, u32)> {
        const EMU_PER_PX: u64 = 9525;
        let w = self.width_emu? / EMU_PER_PX;
        let h = self.height_emu? / EMU_PER_PX;
        (w > 0 && h > 0).then_some((w as u32, h as u32))
    }
}

/// A paragraph of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "is_not_heading")]
    pub heading: HeadingLevel,

    #[serde(default)]
    pub alignment: TextAlignment,

    pub runs: Vec<TextRun>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListInfo>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<InlineImage>,

    /// An explicit page break (`w:br w:type="page"`) occurs inside.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub page_break: bool,
}

fn is_not_heading(h: &HeadingLevel) -> bool {
    !h.is_heading()
}

impl Paragraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![TextRun::plain(text)],
            ..Default::default()
        }
    }

    pub fn heading(level: HeadingLevel, text: impl Into<String>) -> Self {
        Self {
            heading: level,
            ..Self::with_text(text)
        }
    }

    pub fn plain_text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// No text and no images.
    pub fn is_empty(&self) -> bool {
        self.images.is_empty() && self.runs.iter().all(|r| r.text.is_empty() && !r.line_break)
    }
}
