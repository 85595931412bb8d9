//! Pass configuration.

use crate::scoreboard::ScoreboardLayout;

/// Default number of ticks a confirmation may follow the last hover.
pub const DEFAULT_CONFIRM_WINDOW_TICKS: u32 = 120;

/// Default tick ceiling for roster resolution.
pub const DEFAULT_RESOLUTION_TICK_LIMIT: u32 = 150_000;

/// Tunables shared by the analysis passes.
///
/// # Example
///
/// ```
/// use dota_report_parser::config::ParserConfig;
///
/// let config = ParserConfig::default().with_confirm_window(90);
/// assert_eq!(config.confirm_window_ticks, 90);
/// assert_eq!(config.resolution_tick_limit, 150_000);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Maximum ticks between a report button hover and its confirmation.
    pub confirm_window_ticks: u32,
    /// Tick after which an incomplete roster is a timeout.
    pub resolution_tick_limit: u32,
    /// Scoreboard geometry.
    pub layout: ScoreboardLayout,
}

impl Default for ParserConfig {
    fn default() -> Self {
        ParserConfig {
            confirm_window_ticks: DEFAULT_CONFIRM_WINDOW_TICKS,
            resolution_tick_limit: DEFAULT_RESOLUTION_TICK_LIMIT,
            layout: ScoreboardLayout::default(),
        }
    }
}

impl ParserConfig {
    /// Returns the config with a different confirmation window.
    #[must_use]
    pub fn with_confirm_window(mut self, ticks: u32) -> Self {
        self.confirm_window_ticks = ticks;
        self
    }

    /// Returns the config with a different roster tick ceiling.
    #[must_use]
    pub fn with_resolution_tick_limit(mut self, ticks: u32) -> Self {
        self.resolution_tick_limit = ticks;
        self
    }

    /// Returns the config with different scoreboard geometry.
    #[must_use]
    pub fn with_layout(mut self, layout: ScoreboardLayout) -> Self {
        self.layout = layout;
        self
    }
}
