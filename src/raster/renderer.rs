//! Greeked page rasterizer.

use image::Rgba;
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use super::layout::{self, LayoutBlock, TableCell, TextBlock, Word};
use super::RasterOptions;
use crate::dimensions::Dimensions;
use crate::error::RenderError;
use crate::model::TextAlignment;
use crate::traits::{MarkupRenderer, RasterImage};

/// Character cell width as a fraction of the font size.
const COLUMN_EM: f32 = 0.5;

/// [`MarkupRenderer`] that draws XHTML as a greeked page.
///
/// Text becomes word-sized bars, tables become ruled grids and images
/// become filled placeholders. Nothing past the first page break, or past
/// the bottom margin of the canvas, is drawn.
#[derive(Debug, Clone, Default)]
pub struct PageRasterizer {
    options: RasterOptions,
}

impl PageRasterizer {
    /// Create a rasterizer with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a rasterizer with the given options.
    pub fn with_options(options: RasterOptions) -> Self {
        Self { options }
    }

    /// Options used for layout and painting.
    pub fn options(&self) -> &RasterOptions {
        &self.options
    }
}

impl MarkupRenderer for PageRasterizer {
    fn render(&self, markup: &[u8], canvas: Dimensions) -> Result<RasterImage, RenderError> {
        if canvas.width == 0
            || canvas.height == 0
            || canvas.area() > self.options.max_canvas_pixels
        {
            return Err(RenderError::InvalidCanvas {
                width: canvas.width,
                height: canvas.height,
            });
        }

        let blocks = layout::parse(markup)?;
        let mut image = RasterImage::from_pixel(canvas.width, canvas.height, self.options.background);
        let drawn = Painter::new(&mut image, &self.options).paint(&blocks);
        log::debug!(
            "rasterized {} of {} layout blocks onto {}",
            drawn,
            blocks.len(),
            canvas
        );
        Ok(image)
    }
}

/// A wrapped line: (x offset, width, word) per item.
#[derive(Default)]
struct Line<'a> {
    items: Vec<(f32, f32, &'a Word)>,
    width: f32,
    scale: f32,
    forced: bool,
}

struct Painter<'a> {
    image: &'a mut RasterImage,
    options: &'a RasterOptions,
    /// Canvas pixels per reference pixel
    factor: f32,
    left: f32,
    right: f32,
    bottom: f32,
    y: f32,
}

impl<'a> Painter<'a> {
    fn new(image: &'a mut RasterImage, options: &'a RasterOptions) -> Self {
        let factor = image.width() as f32 / options.reference_width.max(1) as f32;
        let margin = options.margin as f32 * factor;
        let (width, height) = (image.width() as f32, image.height() as f32);
        Self {
            image,
            options,
            factor,
            left: margin,
            right: (width - margin).max(margin),
            bottom: (height - margin).max(margin),
            y: margin,
        }
    }

    fn em(&self) -> f32 {
        self.options.font_size * self.factor
    }

    fn line_height(&self, scale: f32) -> f32 {
        scale * self.em() * self.options.line_spacing
    }

    /// Paint blocks top-down; returns how many were drawn in full.
    fn paint(&mut self, blocks: &[LayoutBlock]) -> usize {
        let mut drawn = 0;
        for block in blocks {
            let complete = match block {
                LayoutBlock::Text(text) => self.paint_text(text),
                LayoutBlock::Table(rows) => self.paint_table(rows),
                LayoutBlock::Image { width, height } => self.paint_image(*width, *height),
                LayoutBlock::Rule => self.paint_rule(),
                LayoutBlock::PageBreak => false,
            };
            if !complete {
                break;
            }
            drawn += 1;
            self.y += self.options.block_spacing * self.em();
        }
        drawn
    }

    fn paint_text(&mut self, block: &TextBlock) -> bool {
        let indent = block.indent as f32 * self.em() * 1.8;
        let x0 = (self.left + indent).min(self.right);
        let avail = self.right - x0;

        let lines = self.wrap(&block.words, avail);
        if lines.is_empty() {
            // Blank paragraph
            let height = self.line_height(block.scale);
            if self.y + height > self.bottom {
                return false;
            }
            self.y += height;
            return true;
        }

        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            let height = self.line_height(line.scale);
            if self.y + height > self.bottom {
                return false;
            }
            if i == 0 && block.marker {
                let size = (self.em() * 0.3).max(1.0);
                let x = x0 - self.em() * 0.9;
                let y = self.y + (height - size) / 2.0;
                self.fill(x, y, size, size, self.options.ink);
            }

            let slack = (avail - line.width).max(0.0);
            let (offset, gap) = match block.align {
                TextAlignment::Left => (0.0, 0.0),
                TextAlignment::Center => (slack / 2.0, 0.0),
                TextAlignment::Right => (slack, 0.0),
                TextAlignment::Justify if i < last && !line.forced && line.items.len() > 1 => {
                    (0.0, slack / (line.items.len() - 1) as f32)
                }
                TextAlignment::Justify => (0.0, 0.0),
            };
            for (n, (x, width, word)) in line.items.iter().enumerate() {
                let bar = word.scale * self.em() * if word.bold { 0.7 } else { 0.55 };
                let bar_x = x0 + offset + x + gap * n as f32;
                let bar_y = self.y + (height - bar) / 2.0;
                self.fill(bar_x, bar_y, *width, bar, self.options.ink);
            }
            self.y += height;
        }
        true
    }

    fn paint_table(&mut self, rows: &[Vec<TableCell>]) -> bool {
        let columns = rows
            .iter()
            .map(|row| row.iter().map(|c| c.span).sum::<u32>())
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return true;
        }
        let column_width = (self.right - self.left) / columns as f32;
        let pad = self.em() * 0.3;

        for row in rows {
            let mut cells = Vec::with_capacity(row.len());
            let mut x = self.left;
            let mut row_height = self.line_height(1.0);
            for cell in row {
                let width = column_width * cell.span as f32;
                let lines = self.wrap(&cell.words, (width - 2.0 * pad).max(1.0));
                let height: f32 = lines.iter().map(|l| self.line_height(l.scale)).sum();
                row_height = row_height.max(height);
                cells.push((x, width, cell.header, lines));
                x += width;
            }
            row_height += 2.0 * pad;

            if self.y + row_height > self.bottom {
                return false;
            }
            for (x, width, header, lines) in &cells {
                if *header {
                    self.fill(*x, self.y, *width, row_height, self.options.placeholder);
                }
                self.outline(*x, self.y, *width, row_height, self.options.ink);

                let mut line_y = self.y + pad;
                for line in lines {
                    let height = self.line_height(line.scale);
                    for (word_x, word_width, word) in &line.items {
                        let bar = word.scale * self.em() * 0.55;
                        let bar_y = line_y + (height - bar) / 2.0;
                        self.fill(x + pad + word_x, bar_y, *word_width, bar, self.options.ink);
                    }
                    line_y += height;
                }
            }
            self.y += row_height;
        }
        true
    }

    fn paint_image(&mut self, width: u32, height: u32) -> bool {
        let avail = self.right - self.left;
        let mut w = width as f32 * self.factor;
        let mut h = height as f32 * self.factor;
        if w > avail {
            h *= avail / w;
            w = avail;
        }

        // Partially visible images are cut at the bottom margin
        let visible = h.min(self.bottom - self.y);
        if visible <= 0.0 {
            return false;
        }
        self.fill(self.left, self.y, w, visible, self.options.placeholder);
        self.outline(self.left, self.y, w, visible, self.options.ink);
        draw_line_segment_mut(
            &mut *self.image,
            (self.left, self.y),
            (self.left + w, self.y + visible),
            self.options.ink,
        );
        self.y += visible;
        visible >= h
    }

    fn paint_rule(&mut self) -> bool {
        let height = self.em();
        if self.y + height > self.bottom {
            return false;
        }
        let thickness = self.factor.max(1.0);
        let y = self.y + (height - thickness) / 2.0;
        self.fill(self.left, y, self.right - self.left, thickness, self.options.ink);
        self.y += height;
        true
    }

    /// Greedy line breaking of words into `avail` pixels.
    fn wrap<'w>(&self, words: &'w [Word], avail: f32) -> Vec<Line<'w>> {
        let column = self.em() * COLUMN_EM;
        let mut lines = Vec::new();
        let mut line = Line::default();

        for word in words {
            if word.columns > 0 {
                let width = (word.columns as f32 * column * word.scale).min(avail);
                let mut x = if line.items.is_empty() {
                    0.0
                } else {
                    line.width + column * word.scale
                };
                if !line.items.is_empty() && x + width > avail {
                    lines.push(std::mem::take(&mut line));
                    x = 0.0;
                }
                line.items.push((x, width, word));
                line.width = x + width;
            }
            line.scale = line.scale.max(word.scale);
            if word.break_after {
                line.forced = true;
                lines.push(std::mem::take(&mut line));
            }
        }
        if !line.items.is_empty() {
            lines.push(line);
        }
        lines
    }

    fn fill(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        if let Some(rect) = rect(x, y, width, height) {
            draw_filled_rect_mut(&mut *self.image, rect, color);
        }
    }

    fn outline(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgba<u8>) {
        if let Some(rect) = rect(x, y, width, height) {
            draw_hollow_rect_mut(&mut *self.image, rect, color);
        }
    }
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    let (w, h) = (width.round(), height.round());
    if !(x.is_finite() && y.is_finite()) || w < 1.0 || h < 1.0 {
        return None;
    }
    Some(Rect::at(x.round() as i32, y.round() as i32).of_size(w as u32, h as u32))
}
