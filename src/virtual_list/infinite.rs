//! Infinite-scroll trigger.

/// Fraction of the total height at which more rows are requested.
pub const DEFAULT_LOAD_THRESHOLD: f64 = 0.8;

/// Fires a load request once per threshold crossing.
///
/// After firing, the trigger stays quiet until either the load finishes
/// (`finish_load`) or the viewport moves back above the threshold.
#[derive(Debug, Clone)]
pub struct LoadMoreTrigger {
    threshold: f64,
    armed: bool,
    in_flight: bool,
}

impl LoadMoreTrigger {
    /// `threshold` is clamped to `(0, 1]`; anything else falls back to the default.
    pub fn new(threshold: f64) -> Self {
        let threshold = if threshold.is_finite() && threshold > 0.0 {
            threshold.min(1.0)
        } else {
            DEFAULT_LOAD_THRESHOLD
        };
        Self {
            threshold,
            armed: true,
            in_flight: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight
    }

    /// Returns `true` when the caller should start loading more rows.
    pub fn check(
        &mut self,
        scroll_offset_px: f64,
        container_height_px: f64,
        total_height_px: f64,
        has_more: bool,
    ) -> bool {
        let reached = scroll_offset_px + container_height_px >= self.threshold * total_height_px;
        if !reached {
            self.armed = true;
            return false;
        }
        if !has_more || self.in_flight || !self.armed {
            return false;
        }

        self.armed = false;
        self.in_flight = true;
        true
    }

    /// Marks the outstanding load as done and re-arms the trigger.
    pub fn finish_load(&mut self) {
        self.in_flight = false;
        self.armed = true;
    }
}

impl Default for LoadMoreTrigger {
    fn default() -> Self {
        Self::new(DEFAULT_LOAD_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_once_per_crossing() {
        let mut t = LoadMoreTrigger::default();
        // 1000px of content, 200px viewport
        assert!(!t.check(500.0, 200.0, 1000.0, true));
        assert!(t.check(600.0, 200.0, 1000.0, true));
        assert!(!t.check(650.0, 200.0, 1000.0, true));
        assert!(!t.check(800.0, 200.0, 1000.0, true));
        assert!(t.is_loading());
    }

    #[test]
    fn test_rearms_after_load() {
        let mut t = LoadMoreTrigger::default();
        assert!(t.check(600.0, 200.0, 1000.0, true));
        t.finish_load();
        assert!(!t.is_loading());

        // More rows arrived, viewport now well above the new threshold
        assert!(!t.check(600.0, 200.0, 2000.0, true));
        assert!(t.check(1400.0, 200.0, 2000.0, true));
    }

    #[test]
    fn test_guarded_while_in_flight_even_after_scrolling_back() {
        let mut t = LoadMoreTrigger::default();
        assert!(t.check(600.0, 200.0, 1000.0, true));
        assert!(!t.check(0.0, 200.0, 1000.0, true));
        assert!(!t.check(700.0, 200.0, 1000.0, true));
    }

    #[test]
    fn test_no_more_rows() {
        let mut t = LoadMoreTrigger::default();
        assert!(!t.check(800.0, 200.0, 1000.0, false));
        assert!(!t.is_loading());
        // Becomes available later while still past the threshold
        assert!(t.check(800.0, 200.0, 1000.0, true));
    }

    #[test]
    fn test_threshold_clamping() {
        assert_eq!(LoadMoreTrigger::new(1.5).threshold(), 1.0);
        assert_eq!(LoadMoreTrigger::new(0.0).threshold(), DEFAULT_LOAD_THRESHOLD);
        assert_eq!(LoadMoreTrigger::new(f64::NAN).threshold(), DEFAULT_LOAD_THRESHOLD);
    }
}
