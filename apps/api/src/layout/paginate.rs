//! Pagination: flows a `Document` onto fixed-size pages.
//!
//! Output is a list of pages holding positioned text lines. Both document
//! sinks draw exactly these lines, so preview and export break lines and pages
//! at the same places.
//!
//! Positions are in points; `baseline_pt` is measured down from the top edge.
//! Line text is already folded into the WinAnsi repertoire.

use serde::Serialize;

use crate::layout::charset::fold_to_win_ansi;
use crate::layout::font_metrics::{get_metrics, FontFace, PageConfig};
use crate::render::document::{Block, Document, TextStyle};

const BULLET: &str = "\u{2022}";
const BULLET_OFFSET_PT: f32 = 2.0;
const LIST_INDENT_PT: f32 = 14.0;
const SECTION_GAP_PT: f32 = 14.0;
const GROUP_GAP_PT: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedLine {
    pub text: String,
    pub face: FontFace,
    pub size_pt: f32,
    pub x_pt: f32,
    pub baseline_pt: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub number: usize,
    pub lines: Vec<PositionedLine>,
}

/// One horizontal row of text: a wrapped line, plus the bullet on a list item's first row.
struct Row {
    cells: Vec<(String, f32)>,
    face: FontFace,
    size_pt: f32,
    space_before_pt: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Word wrap
// ────────────────────────────────────────────────────────────────────────────

/// Greedy word wrap. Explicit newlines start a new line; blank lines are dropped.
///
/// A single word wider than `max_width_pt` is placed on its own line rather than split.
pub fn wrap_text(text: &str, face: FontFace, size_pt: f32, max_width_pt: f32) -> Vec<String> {
    let metrics = get_metrics(face);
    let space_w = metrics.space_width * size_pt;
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_w = metrics.measure_pt(word, size_pt);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width_pt {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines
}

// ────────────────────────────────────────────────────────────────────────────
// Block flow
// ────────────────────────────────────────────────────────────────────────────

fn text_rows(
    rows: &mut Vec<Row>,
    text: &str,
    face: FontFace,
    size_pt: f32,
    x_pt: f32,
    max_width_pt: f32,
    space_before_pt: f32,
) {
    for (i, line) in wrap_text(&fold_to_win_ansi(text), face, size_pt, max_width_pt)
        .into_iter()
        .enumerate()
    {
        rows.push(Row {
            cells: vec![(line, x_pt)],
            face,
            size_pt,
            space_before_pt: if i == 0 { space_before_pt } else { 0.0 },
        });
    }
}

fn flow_block(rows: &mut Vec<Row>, block: &Block, config: &PageConfig, space_before_pt: f32) {
    let body = config.body_size_pt;
    let left = config.margin_pt;
    let width = config.text_width_pt();

    match block {
        Block::Heading { level, text } => {
            let (size, gap) = match level {
                1 => (body * 2.0, 0.0),
                2 => (body * 1.3, SECTION_GAP_PT),
                _ => (body * 1.1, 0.0),
            };
            text_rows(rows, text, FontFace::Bold, size, left, width, gap.max(space_before_pt));
        }
        Block::Paragraph { text, style } => {
            let (face, size) = match style {
                TextStyle::Regular => (FontFace::Regular, body),
                TextStyle::Emphasis => (FontFace::Bold, body),
                TextStyle::Muted => (FontFace::Oblique, body * 0.9),
            };
            text_rows(rows, text, face, size, left, width, space_before_pt);
        }
        Block::ListItem { text } => {
            let first = rows.len();
            text_rows(
                rows,
                text,
                FontFace::Regular,
                body,
                left + LIST_INDENT_PT,
                width - LIST_INDENT_PT,
                space_before_pt,
            );
            if let Some(row) = rows.get_mut(first) {
                row.cells
                    .insert(0, (BULLET.to_string(), left + BULLET_OFFSET_PT));
            }
        }
        Block::Group { blocks } => {
            for (i, inner) in blocks.iter().enumerate() {
                let gap = if i == 0 {
                    GROUP_GAP_PT.max(space_before_pt)
                } else {
                    0.0
                };
                flow_block(rows, inner, config, gap);
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Pagination
// ────────────────────────────────────────────────────────────────────────────

/// Lays the document out on pages. Always returns at least one (possibly empty) page.
pub fn paginate(document: &Document, config: &PageConfig) -> Vec<Page> {
    let mut rows = Vec::new();
    for section in &document.sections {
        for block in &section.blocks {
            flow_block(&mut rows, block, config, 0.0);
        }
    }

    let mut pages = vec![Page {
        number: 1,
        lines: Vec::new(),
    }];
    let mut cursor = config.margin_pt;

    for row in rows {
        let leading = row.size_pt * config.line_height;
        let page_is_empty = pages.last().map_or(true, |p| p.lines.is_empty());
        let mut gap = if page_is_empty { 0.0 } else { row.space_before_pt };

        if !page_is_empty && cursor + gap + leading > config.bottom_limit_pt() {
            pages.push(Page {
                number: pages.len() + 1,
                lines: Vec::new(),
            });
            cursor = config.margin_pt;
            gap = 0.0;
        }

        let top = cursor + gap;
        let baseline_pt = top + row.size_pt;
        if let Some(page) = pages.last_mut() {
            for (text, x_pt) in row.cells {
                page.lines.push(PositionedLine {
                    text,
                    face: row.face,
                    size_pt: row.size_pt,
                    x_pt,
                    baseline_pt,
                });
            }
        }
        cursor = top + leading;
    }

    pages
}
