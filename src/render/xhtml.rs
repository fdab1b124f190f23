//! XHTML renderer implementation.

use std::fmt::Write;

use crate::model::{Block, DocxContent, ListType, Paragraph, Table, TextRun};

/// Class of the `<hr/>` emitted for explicit page breaks.
pub const PAGE_BREAK_CLASS: &str = "page-break";

/// Convert parsed document content to an XHTML string.
pub fn to_xhtml(content: &DocxContent) -> String {
    let mut out = String::with_capacity(1024 + content.blocks.len() * 128);

    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<html xmlns=\"http://www.w3.org/1999/xhtml\">\n<head>\n");
    out.push_str("<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\"/>\n");
    if let Some(ref title) = content.title {
        out.push_str("<title>");
        escape_into(title, &mut out);
        out.push_str("</title>\n");
    }
    out.push_str("</head>\n");

    match content.page {
        Some(page) => {
            let (w, h) = page.size_px();
            let _ = writeln!(out, "<body style=\"width:{}px;min-height:{}px\">", w, h);
        }
        None => out.push_str("<body>\n"),
    }

    render_blocks(&content.blocks, &mut out);

    out.push_str("</body>\n</html>\n");
    out
}

fn render_blocks(blocks: &[Block], out: &mut String) {
    let mut lists = ListStack::default();
    for block in blocks {
        match block {
            Block::Paragraph(para) => match para.list {
                Some(info) => {
                    lists.enter(info.list_type, info.level as usize + 1, out);
                    out.push_str("<li>");
                    render_inline(para, out);
                    out.push_str("</li>\n");
                    render_page_break(para, out);
                }
                None => {
                    lists.close_all(out);
                    render_paragraph(para, out);
                }
            },
            Block::Table(table) => {
                lists.close_all(out);
                render_table(table, out);
            }
        }
    }
    lists.close_all(out);
}

/// Open `<ul>`/`<ol>` elements, outermost first.
#[derive(Default)]
struct ListStack(Vec<ListType>);

impl ListStack {
    fn enter(&mut self, list_type: ListType, depth: usize, out: &mut String) {
        while self.0.len() > depth {
            self.close(out);
        }
        if self.0.len() == depth && self.0.last() != Some(&list_type) {
            self.close(out);
        }
        while self.0.len() < depth {
            out.push_str(list_tag(list_type, false));
            self.0.push(list_type);
        }
    }

    fn close(&mut self, out: &mut String) {
        if let Some(list_type) = self.0.pop() {
            out.push_str(list_tag(list_type, true));
        }
    }

    fn close_all(&mut self, out: &mut String) {
        while !self.0.is_empty() {
            self.close(out);
        }
    }
}

fn list_tag(list_type: ListType, closing: bool) -> &'static str {
    match (list_type, closing) {
        (ListType::Bullet, false) => "<ul>\n",
        (ListType::Bullet, true) => "</ul>\n",
        (ListType::Numbered, false) => "<ol>\n",
        (ListType::Numbered, true) => "</ol>\n",
    }
}

fn render_paragraph(para: &Paragraph, out: &mut String) {
    let tag = match para.heading.level() {
        0 => "p".to_string(),
        n => format!("h{}", n),
    };

    out.push('<');
    out.push_str(&tag);
    if para.alignment != Default::default() {
        let _ = write!(out, " style=\"text-align:{}\"", para.alignment.css());
    }
    out.push('>');
    render_inline(para, out);
    let _ = writeln!(out, "</{}>", tag);

    render_page_break(para, out);
}

fn render_page_break(para: &Paragraph, out: &mut String) {
    if para.page_break {
        let _ = writeln!(out, "<hr class=\"{}\"/>", PAGE_BREAK_CLASS);
    }
}

fn render_inline(para: &Paragraph, out: &mut String) {
    for run in &para.runs {
        render_run(run, out);
    }
    for image in &para.images {
        out.push_str("<img src=\"");
        escape_into(&image.resource_id, out);
        out.push_str("\" alt=\"");
        escape_into(image.alt_text.as_deref().unwrap_or(""), out);
        out.push('"');
        if let Some((w, h)) = image.size_px() {
            let _ = write!(out, " width=\"{}\" height=\"{}\"", w, h);
        }
        out.push_str("/>");
    }
}

fn render_run(run: &TextRun, out: &mut String) {
    let style = &run.style;
    let mut closers: Vec<&str> = Vec::new();

    if let Some(half_points) = style.size {
        let _ = write!(
            out,
            "<span style=\"font-size:{}pt\">",
            half_points as f32 / 2.0
        );
        closers.push("</span>");
    }
    for (on, open, close) in [
        (style.bold, "<strong>", "</strong>"),
        (style.italic, "<em>", "</em>"),
        (style.underline, "<u>", "</u>"),
        (style.strikethrough, "<s>", "</s>"),
    ] {
        if on {
            out.push_str(open);
            closers.push(close);
        }
    }

    escape_into(&run.text, out);

    for close in closers.iter().rev() {
        out.push_str(close);
    }
    if run.line_break {
        out.push_str("<br/>");
    }
}

fn render_table(table: &Table, out: &mut String) {
    if table.is_empty() {
        return;
    }
    out.push_str("<table border=\"1\">\n");
    for row in &table.rows {
        out.push_str("<tr>");
        let cell_tag = if row.is_header { "th" } else { "td" };
        for cell in &row.cells {
            out.push('<');
            out.push_str(cell_tag);
            if cell.col_span > 1 {
                let _ = write!(out, " colspan=\"{}\"", cell.col_span);
            }
            out.push('>');
            render_blocks(&cell.content, out);
            let _ = write!(out, "</{}>", cell_tag);
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
}
