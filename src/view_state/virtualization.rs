//! Row virtualization contract
//!
//! Lets a renderer window a long session: rows are keyed by bubble id, and
//! a row needs re-measuring only when its `(id, streaming, content_len)`
//! fingerprint changes. During a stream that is the placeholder row alone.

use std::collections::HashMap;

use unicode_width::UnicodeWidthStr;

use crate::models::ChatBubble;

/// Stable key of a rendered row: the bubble id.
pub type RowKey = String;

/// Everything a renderer needs to decide whether a row's size may have changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowFingerprint {
    pub id: RowKey,
    pub streaming: bool,
    /// Content length in bytes
    pub content_len: usize,
}

impl RowFingerprint {
    pub fn of(bubble: &ChatBubble) -> Self {
        Self {
            id: bubble.id.clone(),
            streaming: bubble.streaming,
            content_len: bubble.content.len(),
        }
    }
}

/// Indices in `next` whose fingerprint differs from the row with the same
/// id in `prev`, plus rows that are new.
pub fn changed_rows(prev: &[RowFingerprint], next: &[RowFingerprint]) -> Vec<usize> {
    let previous: HashMap<&str, &RowFingerprint> =
        prev.iter().map(|fp| (fp.id.as_str(), fp)).collect();

    next.iter()
        .enumerate()
        .filter(|(_, fp)| previous.get(fp.id.as_str()) != Some(fp))
        .map(|(index, _)| index)
        .collect()
}

/// Height in visual lines of a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHeight {
    /// Index of the row in the session
    pub row_index: usize,
    /// Number of visual lines this row occupies (after wrapping)
    pub visual_lines: usize,
    /// Cumulative visual line offset from the start of all rows
    pub cumulative_offset: usize,
}

/// Estimate wrapped height of a bubble at `viewport_width` columns.
///
/// Uses display width, so CJK text counts two columns per character.
/// Includes one blank separator line, plus one for the typing indicator of
/// an empty placeholder.
pub fn estimate_row_height(bubble: &ChatBubble, viewport_width: usize) -> usize {
    let width = viewport_width.max(1);

    let content_lines: usize = if bubble.content.is_empty() {
        1
    } else {
        bubble
            .content
            .lines()
            .map(|line| UnicodeWidthStr::width(line).div_ceil(width).max(1))
            .sum()
    };
    let typing_indicator = usize::from(bubble.streaming && bubble.content.is_empty());

    content_lines + typing_indicator + 1
}

/// Heights and cumulative offsets for every bubble, in order.
pub fn build_row_heights(bubbles: &[ChatBubble], viewport_width: usize) -> Vec<RowHeight> {
    let mut offset = 0;
    bubbles
        .iter()
        .enumerate()
        .map(|(row_index, bubble)| {
            let visual_lines = estimate_row_height(bubble, viewport_width);
            let height = RowHeight {
                row_index,
                visual_lines,
                cumulative_offset: offset,
            };
            offset += visual_lines;
            height
        })
        .collect()
}

/// Total visual lines of all rows.
pub fn total_lines(heights: &[RowHeight]) -> usize {
    heights
        .last()
        .map(|h| h.cumulative_offset + h.visual_lines)
        .unwrap_or(0)
}

/// Calculate the visible range of row indices based on scroll position.
///
/// Returns `(start_index, end_index, first_row_line_offset)` where `start`
/// is inclusive, `end` exclusive, and the offset is how many lines of the
/// first row are scrolled above the viewport.
pub fn calculate_visible_range(
    heights: &[RowHeight],
    scroll_from_top: usize,
    viewport_height: usize,
) -> (usize, usize, usize) {
    if heights.is_empty() || viewport_height == 0 {
        return (0, 0, 0);
    }

    if scroll_from_top >= total_lines(heights) {
        return (heights.len(), heights.len(), 0);
    }

    // First row whose bottom edge is below the scroll position
    let start_index = heights
        .iter()
        .position(|h| h.cumulative_offset + h.visual_lines > scroll_from_top)
        .unwrap_or(heights.len());

    let first_row_line_offset =
        scroll_from_top.saturating_sub(heights[start_index].cumulative_offset);

    let visible_end = scroll_from_top + viewport_height;
    let end_index = heights
        .iter()
        .position(|h| h.cumulative_offset >= visible_end)
        .unwrap_or(heights.len());

    (start_index, end_index, first_row_line_offset)
}

/// Measured heights keyed by row, reused until the row's fingerprint or the
/// viewport width changes.
#[derive(Debug, Default)]
pub struct RowHeightCache {
    width: usize,
    entries: HashMap<RowKey, (RowFingerprint, usize)>,
    measurements: u64,
}

impl RowHeightCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Height of `bubble`, measuring only on a cache miss.
    pub fn height_for(&mut self, bubble: &ChatBubble, viewport_width: usize) -> usize {
        if viewport_width != self.width {
            self.entries.clear();
            self.width = viewport_width;
        }

        let fingerprint = RowFingerprint::of(bubble);
        if let Some((cached, height)) = self.entries.get(&bubble.id) {
            if *cached == fingerprint {
                return *height;
            }
        }

        let height = estimate_row_height(bubble, viewport_width);
        self.measurements += 1;
        self.entries.insert(bubble.id.clone(), (fingerprint, height));
        height
    }

    /// Drop rows no longer present in the session.
    pub fn retain_rows(&mut self, bubbles: &[ChatBubble]) {
        let live: std::collections::HashSet<&str> =
            bubbles.iter().map(|b| b.id.as_str()).collect();
        self.entries.retain(|id, _| live.contains(id.as_str()));
    }

    /// How many times a row was actually measured.
    pub fn measurements(&self) -> u64 {
        self.measurements
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
