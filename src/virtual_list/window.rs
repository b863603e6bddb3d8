//! Fixed-height window computation.

use std::ops::Range;

use serde::Serialize;

// == Virtual Window ==
/// The slice of a list to mount, and where to place it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VirtualWindow {
    /// First mounted index (inclusive)
    pub start_index: usize,
    /// Last mounted index (exclusive)
    pub end_index: usize,
    /// Translation applied to the mounted rows
    pub offset_px: f64,
    /// Height of the full scrollable area
    pub total_height_px: f64,
}

impl VirtualWindow {
    pub fn range(&self) -> Range<usize> {
        self.start_index..self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index - self.start_index
    }

    pub fn is_empty(&self) -> bool {
        self.start_index == self.end_index
    }

    pub fn contains(&self, index: usize) -> bool {
        self.range().contains(&index)
    }
}

/// Computes the window for a list of `item_count` rows of `item_height_px`.
///
/// `item_height_px` must be positive and finite; `VirtualList` checks that.
/// Negative or non-finite scroll offsets read as 0. The offset is not clamped
/// against the container height, so resizing alone never moves `offset_px`.
pub fn compute_window(
    item_count: usize,
    item_height_px: f64,
    container_height_px: f64,
    scroll_offset_px: f64,
    overscan_count: usize,
) -> VirtualWindow {
    let scroll = if scroll_offset_px.is_finite() {
        scroll_offset_px.max(0.0)
    } else {
        0.0
    };
    let container = if container_height_px.is_finite() {
        container_height_px.max(0.0)
    } else {
        0.0
    };

    // Float-to-int casts saturate, so huge offsets stay in range.
    let first_visible = (scroll / item_height_px).floor() as usize;
    let start_index = first_visible.saturating_sub(overscan_count).min(item_count);

    let rows_in_view = (container / item_height_px).ceil() as usize;
    let visible_count = rows_in_view.saturating_add(overscan_count.saturating_mul(2));
    let end_index = start_index.saturating_add(visible_count).min(item_count);

    VirtualWindow {
        start_index,
        end_index,
        offset_px: start_index as f64 * item_height_px,
        total_height_px: item_count as f64 * item_height_px,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_scenario() {
        let w = compute_window(10_000, 50.0, 500.0, 2500.0, 2);
        assert_eq!(w.start_index, 48);
        assert_eq!(w.end_index, 62);
        assert_eq!(w.len(), 14);
        assert_eq!(w.offset_px, 2400.0);
        assert_eq!(w.total_height_px, 500_000.0);
    }

    #[test]
    fn test_top_of_list() {
        let w = compute_window(10_000, 50.0, 500.0, 0.0, 2);
        assert_eq!(w.range(), 0..14);
        assert_eq!(w.offset_px, 0.0);
    }

    #[test]
    fn test_bottom_of_list_is_clamped() {
        let w = compute_window(100, 50.0, 500.0, 4500.0, 2);
        assert_eq!(w.start_index, 88);
        assert_eq!(w.end_index, 100);
    }

    #[test]
    fn test_short_list() {
        let w = compute_window(3, 50.0, 500.0, 0.0, 5);
        assert_eq!(w.range(), 0..3);
        assert_eq!(w.total_height_px, 150.0);
    }

    #[test]
    fn test_empty_list() {
        let w = compute_window(0, 50.0, 500.0, 300.0, 2);
        assert!(w.is_empty());
        assert_eq!(w.start_index, 0);
    }

    #[test]
    fn test_negative_and_nan_scroll_read_as_zero() {
        assert_eq!(compute_window(100, 20.0, 100.0, -40.0, 1).start_index, 0);
        assert_eq!(compute_window(100, 20.0, 100.0, f64::NAN, 1).start_index, 0);
    }

    #[test]
    fn test_scroll_past_end() {
        let w = compute_window(10, 50.0, 100.0, 1e12, 2);
        assert_eq!(w.start_index, 10);
        assert_eq!(w.end_index, 10);
    }

    #[test]
    fn test_partial_row_offset() {
        let w = compute_window(1_000, 30.0, 100.0, 95.0, 0);
        assert_eq!(w.start_index, 3);
        assert_eq!(w.end_index, 7);
        assert!(w.contains(3));
        assert!(!w.contains(7));
    }
}
