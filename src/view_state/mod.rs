//! View-only state for rendering consumers
//!
//! This module exposes session state in the shape a windowed renderer
//! needs, without depending on any particular UI toolkit.

pub mod virtualization;

pub use virtualization::{
    build_row_heights, calculate_visible_range, changed_rows, estimate_row_height, total_lines,
    RowFingerprint, RowHeight, RowHeightCache, RowKey,
};
