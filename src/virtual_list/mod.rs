//! Virtual List Module
//!
//! Windowed rendering for large fixed-height lists: only the rows in view,
//! plus an overscan buffer on each side, are handed to the presentation
//! layer. State is per list instance and recomputed from scratch on every
//! scroll or resize.

mod infinite;
mod window;


use serde::Serialize;
use thiserror::Error;

pub use infinite::{LoadMoreTrigger, DEFAULT_LOAD_THRESHOLD};
pub use window::{compute_window, VirtualWindow};

/// Rows rendered beyond each edge of the viewport by default.
pub const DEFAULT_OVERSCAN: usize = 5;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WindowError {
    #[error("Item height must be positive and finite, got {0}")]
    InvalidItemHeight(f64),

    #[error("Container height must be non-negative and finite, got {0}")]
    InvalidContainerHeight(f64),
}

/// Result of a scroll event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScrollUpdate {
    pub window: VirtualWindow,
    /// The caller should request more rows now
    pub load_more: bool,
}

/// Rendered output of the visible slice.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedWindow<N> {
    /// `(index, node)` for every mounted row, in order
    pub rows: Vec<(usize, N)>,
    pub window: VirtualWindow,
}

// == Virtual List ==
#[derive(Debug, Clone)]
pub struct VirtualList {
    item_count: usize,
    item_height_px: f64,
    container_height_px: f64,
    scroll_offset_px: f64,
    overscan_count: usize,
    trigger: LoadMoreTrigger,
}

impl VirtualList {
    pub fn new(item_height_px: f64, container_height_px: f64) -> Result<Self, WindowError> {
        check_item_height(item_height_px)?;
        check_container_height(container_height_px)?;
        Ok(Self {
            item_count: 0,
            item_height_px,
            container_height_px,
            scroll_offset_px: 0.0,
            overscan_count: DEFAULT_OVERSCAN,
            trigger: LoadMoreTrigger::default(),
        })
    }

    pub fn with_overscan(mut self, overscan_count: usize) -> Self {
        self.overscan_count = overscan_count;
        self
    }

    pub fn with_load_threshold(mut self, threshold: f64) -> Self {
        self.trigger = LoadMoreTrigger::new(threshold);
        self
    }

    pub fn with_item_count(mut self, item_count: usize) -> Self {
        self.item_count = item_count;
        self
    }

    pub fn item_count(&self) -> usize {
        self.item_count
    }

    pub fn scroll_offset_px(&self) -> f64 {
        self.scroll_offset_px
    }

    pub fn is_loading(&self) -> bool {
        self.trigger.is_loading()
    }

    /// Height of the full scrollable area.
    pub fn total_height_px(&self) -> f64 {
        self.item_count as f64 * self.item_height_px
    }

    // == Window ==
    pub fn window(&self) -> VirtualWindow {
        self.window_for(self.item_count)
    }

    fn window_for(&self, item_count: usize) -> VirtualWindow {
        compute_window(
            item_count,
            self.item_height_px,
            self.container_height_px,
            self.scroll_offset_px,
            self.overscan_count,
        )
    }

    // == Events ==
    /// Records a new scroll position. Negative offsets read as 0.
    pub fn set_scroll_offset(&mut self, scroll_offset_px: f64) -> VirtualWindow {
        self.scroll_offset_px = if scroll_offset_px.is_finite() {
            scroll_offset_px.max(0.0)
        } else {
            0.0
        };
        self.window()
    }

    /// Scroll handler for lists that page in more rows.
    pub fn on_scroll(&mut self, scroll_offset_px: f64, has_more: bool) -> ScrollUpdate {
        let window = self.set_scroll_offset(scroll_offset_px);
        let load_more = self.trigger.check(
            self.scroll_offset_px,
            self.container_height_px,
            window.total_height_px,
            has_more,
        );
        ScrollUpdate { window, load_more }
    }

    /// Resize handler. The scroll offset is untouched.
    pub fn resize(&mut self, container_height_px: f64) -> Result<VirtualWindow, WindowError> {
        check_container_height(container_height_px)?;
        self.container_height_px = container_height_px;
        Ok(self.window())
    }

    pub fn set_item_count(&mut self, item_count: usize) -> VirtualWindow {
        self.item_count = item_count;
        self.window()
    }

    /// Appends a loaded page and re-arms the load trigger.
    pub fn finish_load(&mut self, item_count: usize) -> VirtualWindow {
        self.trigger.finish_load();
        self.set_item_count(item_count)
    }

    // == Render ==
    /// Runs `render_item` over the windowed slice of `items` only.
    pub fn render<T, N>(
        &self,
        items: &[T],
        mut render_item: impl FnMut(&T, usize) -> N,
    ) -> RenderedWindow<N> {
        let window = self.window_for(items.len());
        let rows = items[window.range()]
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let index = window.start_index + i;
                (index, render_item(item, index))
            })
            .collect();
        RenderedWindow { rows, window }
    }
}

fn check_item_height(px: f64) -> Result<(), WindowError> {
    if px.is_finite() && px > 0.0 {
        Ok(())
    } else {
        Err(WindowError::InvalidItemHeight(px))
    }
}

fn check_container_height(px: f64) -> Result<(), WindowError> {
    if px.is_finite() && px >= 0.0 {
        Ok(())
    } else {
        Err(WindowError::InvalidContainerHeight(px))
    }
}
