use std::collections::HashMap;

use embedded_graphics::{
    mono_font::{MonoFont, MonoTextStyle},
    pixelcolor::BinaryColor,
    prelude::*,
    text::{renderer::TextRenderer, Baseline, Text},
};

use crate::{
    config::Overflow,
    pager::{line_capacity, Page, LINE_SPACING},
};

pub mod font;
pub mod frame;

pub use frame::Frame;

/// Pixels a scrolling line moves left per frame.
pub const SCROLL_STEP: i32 = 2;
/// Slack kept on the right when truncating.
pub const TRUNCATE_MARGIN: u32 = 4;

/// Horizontal offsets of scrolling lines, keyed by (page index, line index).
///
/// Keys are positions, not content, so the table must be reset whenever the
/// pages are rebuilt.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScrollOffsets {
    offsets: HashMap<(usize, usize), i32>,
}

impl ScrollOffsets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page: usize, line: usize) -> Option<i32> {
        self.offsets.get(&(page, line)).copied()
    }

    pub fn reset(&mut self) {
        self.offsets.clear();
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Current x for the line, then step the stored offset for the next frame.
    pub fn advance(&mut self, page: usize, line: usize, text_width: i32, panel_width: i32) -> i32 {
        let offset = self.offsets.entry((page, line)).or_insert(0);
        let x = *offset;
        *offset = next_offset(x, text_width, panel_width);
        x
    }
}

/// Step left; once the text is fully past the left edge it re-enters at the right.
pub fn next_offset(current: i32, text_width: i32, panel_width: i32) -> i32 {
    let next = current - SCROLL_STEP;
    if next < -text_width {
        panel_width
    } else {
        next
    }
}

pub fn centered_x(panel_width: u32, text_width: u32) -> i32 {
    (panel_width as i32 - text_width as i32) / 2
}

/// Lays out one page of `label: value` lines on a panel-sized target.
#[derive(Clone, Copy)]
pub struct Renderer {
    font: &'static MonoFont<'static>,
    width: u32,
    height: u32,
    overflow: Overflow,
}

impl Renderer {
    pub fn new(font: &'static MonoFont<'static>, width: u32, height: u32, overflow: Overflow) -> Self {
        Self {
            font,
            width,
            height,
            overflow,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn line_height(&self) -> u32 {
        font::glyph_height(self.font) + LINE_SPACING
    }

    pub fn capacity(&self) -> usize {
        line_capacity(self.height, font::glyph_height(self.font))
    }

    fn style(&self) -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(self.font, BinaryColor::On)
    }

    pub fn text_width(&self, text: &str) -> u32 {
        let metrics = self
            .style()
            .measure_string(text, Point::zero(), Baseline::Top);
        metrics.next_position.x.max(0) as u32
    }

    /// Drop trailing characters until the text fits within the truncation margin.
    pub fn truncate_to_fit(&self, text: &str) -> String {
        let limit = self.width.saturating_sub(TRUNCATE_MARGIN);
        let mut out = text.to_string();
        while !out.is_empty() && self.text_width(&out) > limit {
            out.pop();
        }
        out
    }

    /// Clear `target` and draw `page`. Scroll state for `page_index` is advanced
    /// in `offsets` for every line wider than the panel.
    pub fn draw_page<D>(
        &self,
        target: &mut D,
        page_index: usize,
        page: &Page,
        offsets: &mut ScrollOffsets,
    ) -> std::result::Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        target.clear(BinaryColor::Off)?;
        let style = self.style();
        for (line, entry) in page.entries.iter().enumerate() {
            let mut text = entry.text();
            let text_width = self.text_width(&text);
            let x = match self.overflow {
                Overflow::Truncate => {
                    text = self.truncate_to_fit(&text);
                    centered_x(self.width, self.text_width(&text))
                }
                Overflow::Scroll if text_width > self.width => offsets.advance(
                    page_index,
                    line,
                    text_width as i32,
                    self.width as i32,
                ),
                Overflow::Scroll => centered_x(self.width, text_width),
            };
            let y = (line as u32 * self.line_height()) as i32;
            Text::with_baseline(&text, Point::new(x, y), style, Baseline::Top).draw(target)?;
        }
        Ok(())
    }
}
