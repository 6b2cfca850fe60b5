//! Drawing primitives for the pcdice screen.
//!
//! `RenderBuf` wraps a ratatui `Buffer` and takes our `Style`. Besides text it
//! knows the shapes the screen is built from: fixed-width slot cells, rules,
//! the progress meter and the error banner. Everything clips at the buffer
//! edge.

use ratatui::buffer::Buffer;
use ratatui::style::Style as RatStyle;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Widget};

pub use ratatui::layout::Rect;

use super::style::Style;

pub struct RenderBuf<'a> {
    buf: &'a mut Buffer,
}

impl<'a> RenderBuf<'a> {
    pub fn new(buf: &'a mut Buffer) -> Self {
        Self { buf }
    }

    fn clip(&self, area: Rect) -> Rect {
        area.intersection(self.buf.area)
    }

    pub fn set_cell(&mut self, x: u16, y: u16, ch: char, style: Style) {
        if let Some(cell) = self.buf.cell_mut((x, y)) {
            cell.set_char(ch).set_style(RatStyle::from(style));
        }
    }

    /// Single-line text starting at (x, y), cut at the right edge.
    pub fn draw_str(&mut self, x: u16, y: u16, text: &str, style: Style) {
        let bounds = self.buf.area;
        if x < bounds.left() || x >= bounds.right() || y < bounds.top() || y >= bounds.bottom() {
            return;
        }
        let room = (bounds.right() - x) as usize;
        self.buf.set_stringn(x, y, text, room, RatStyle::from(style));
    }

    pub fn fill(&mut self, area: Rect, ch: char, style: Style) {
        let area = self.clip(area);
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                self.set_cell(x, y, ch, style);
            }
        }
    }

    /// One grid cell: `style` over the whole row of `area`, `label` from its
    /// left edge, never spilling into the next cell.
    pub fn label_cell(&mut self, area: Rect, label: &str, style: Style) {
        let row = Rect::new(area.x, area.y, area.width, 1);
        self.fill(row, ' ', style);
        let label: String = label.chars().take(area.width as usize).collect();
        self.draw_str(area.x, area.y, &label, style);
    }

    pub fn hline(&mut self, x: u16, y: u16, width: u16, style: Style) {
        for i in 0..width {
            self.set_cell(x.saturating_add(i), y, '─', style);
        }
    }

    /// Progress meter along the first row of `area`.
    pub fn meter(&mut self, area: Rect, fraction: f32, filled: Style, empty: Style) {
        let done = filled_cells(fraction, area.width);
        for i in 0..area.width {
            let (ch, style) = if i < done { ('█', filled) } else { ('░', empty) };
            self.set_cell(area.x + i, area.y, ch, style);
        }
    }

    /// Full-width row with `text` inset by one column.
    pub fn banner(&mut self, area: Rect, text: &str, style: Style) {
        self.fill(Rect::new(area.x, area.y, area.width, 1), ' ', style);
        let text: String = text.chars().take(area.width.saturating_sub(2) as usize).collect();
        self.draw_str(area.x + 1, area.y, &text, style);
    }

    /// Bordered box with a styled title. Returns the area inside the border.
    pub fn draw_block(&mut self, area: Rect, title: &str, border_style: Style, title_style: Style) -> Rect {
        let block = Block::bordered()
            .border_style(RatStyle::from(border_style))
            .title(Span::styled(title, RatStyle::from(title_style)));
        let inner = block.inner(area);
        block.render(area, self.buf);
        inner
    }

    /// A row of differently styled runs.
    pub fn draw_line(&mut self, area: Rect, runs: &[(&str, Style)]) {
        let spans: Vec<Span> = runs
            .iter()
            .map(|&(text, style)| Span::styled(text, RatStyle::from(style)))
            .collect();
        Line::from(spans).render(area, self.buf);
    }
}

/// Cells lit for `fraction` of `width`.
pub fn filled_cells(fraction: f32, width: u16) -> u16 {
    let f = fraction.clamp(0.0, 1.0);
    ((f * width as f32).round() as u16).min(width)
}
