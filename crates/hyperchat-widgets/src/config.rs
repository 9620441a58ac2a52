#![forbid(unsafe_code)]

//! Tunables for the virtualized message list.

use hyperchat_core::Edge;

/// Fallback height for items that were never measured.
pub const DEFAULT_ITEM_HEIGHT: u32 = 130;

/// Configuration for [`VirtualMessageList`](crate::list::VirtualMessageList).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListConfig {
    /// Height estimate for unmeasured items. Default: 130.
    pub default_item_height: u32,
    /// Scroll coalescing window in milliseconds. Default: 16.
    pub scroll_throttle_ms: u64,
    /// Distance from `load_more_edge` that arms the load-more sentinel. Default: 200.
    pub load_more_margin: u64,
    /// Edge whose sentinel requests older items. Default: top.
    pub load_more_edge: Edge,
    /// Mounted-item cap before the window degrades. Default: 5000.
    pub max_rendered_items: usize,
    /// Distance from the bottom still treated as "at the bottom". Default: 40.
    pub stick_to_bottom_threshold: u64,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            default_item_height: DEFAULT_ITEM_HEIGHT,
            scroll_throttle_ms: 16,
            load_more_margin: 200,
            load_more_edge: Edge::Top,
            max_rendered_items: 5000,
            stick_to_bottom_threshold: 40,
        }
    }
}

impl ListConfig {
    /// Set the default item height.
    #[must_use]
    pub fn with_default_item_height(mut self, height: u32) -> Self {
        self.default_item_height = height;
        self
    }

    /// Set the load-more margin.
    #[must_use]
    pub fn with_load_more_margin(mut self, margin: u64) -> Self {
        self.load_more_margin = margin;
        self
    }

    /// Set the mounted-item cap.
    #[must_use]
    pub fn with_max_rendered_items(mut self, cap: usize) -> Self {
        self.max_rendered_items = cap;
        self
    }

    /// Set the bottom stickiness threshold.
    #[must_use]
    pub fn with_stick_to_bottom_threshold(mut self, threshold: u64) -> Self {
        self.stick_to_bottom_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_default_values() {
        let config = ListConfig::default();
        assert_eq!(config.default_item_height, 130);
        assert_eq!(config.scroll_throttle_ms, 16);
        assert_eq!(config.load_more_margin, 200);
        assert_eq!(config.load_more_edge, Edge::Top);
        assert_eq!(config.max_rendered_items, 5000);
        assert_eq!(config.stick_to_bottom_threshold, 40);
    }

    #[test]
    fn builders_override_fields() {
        let config = ListConfig::default()
            .with_default_item_height(20)
            .with_load_more_margin(5)
            .with_max_rendered_items(10)
            .with_stick_to_bottom_threshold(0);
        assert_eq!(config.default_item_height, 20);
        assert_eq!(config.load_more_margin, 5);
        assert_eq!(config.max_rendered_items, 10);
        assert_eq!(config.stick_to_bottom_threshold, 0);
    }
}
