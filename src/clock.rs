//! Match clock: converts simulation ticks into elapsed match time.
//!
//! The clock starts at the tick the game rules enter [`GAME_START_STATE`] and
//! excludes the paused ticks the game rules publish. Until the clock has
//! started every conversion yields `00:00`.

use std::fmt;

use crate::stream::Tick;

/// Simulation ticks per second.
pub const TICK_RATE: u32 = 30;

/// Game rules state code that starts the match clock.
pub const GAME_START_STATE: i32 = 5;

/// Elapsed match time, displayed as zero-padded `MM:SS`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchTime {
    /// Whole minutes.
    pub minutes: u32,
    /// Remaining seconds (0-59).
    pub seconds: u32,
}

impl MatchTime {
    /// Converts a number of elapsed ticks.
    #[must_use]
    pub fn from_ticks(ticks: u32) -> Self {
        let total_seconds = ticks / TICK_RATE;
        MatchTime {
            minutes: total_seconds / 60,
            seconds: total_seconds % 60,
        }
    }
}

impl fmt::Display for MatchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.minutes, self.seconds)
    }
}

/// Clock state for one parse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchClock {
    begin_tick: Option<Tick>,
    paused_ticks: u32,
}

impl MatchClock {
    /// Creates a clock that has not started yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the clock at `tick`. Only the first call has an effect.
    ///
    /// Returns whether the clock was started by this call.
    pub fn start(&mut self, tick: Tick) -> bool {
        if self.begin_tick.is_some() {
            return false;
        }
        self.begin_tick = Some(tick);
        true
    }

    /// Records the total paused ticks published by the game rules.
    ///
    /// Non-positive values are ignored; positive values replace the stored
    /// total.
    pub fn set_paused_ticks(&mut self, paused: i32) {
        if let Ok(paused) = u32::try_from(paused) {
            if paused > 0 {
                self.paused_ticks = paused;
            }
        }
    }

    /// Returns whether the game start has been observed.
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.begin_tick.is_some()
    }

    /// Returns the tick the clock started at.
    #[must_use]
    pub fn begin_tick(&self) -> Option<Tick> {
        self.begin_tick
    }

    /// Returns the total paused ticks.
    #[must_use]
    pub fn paused_ticks(&self) -> u32 {
        self.paused_ticks
    }

    /// Elapsed unpaused ticks at `tick`, saturating at zero.
    #[must_use]
    pub fn effective_ticks(&self, tick: Tick) -> u32 {
        match self.begin_tick {
            Some(begin) => tick.saturating_sub(begin).saturating_sub(self.paused_ticks),
            None => 0,
        }
    }

    /// Match time at `tick`.
    #[must_use]
    pub fn elapsed(&self, tick: Tick) -> MatchTime {
        MatchTime::from_ticks(self.effective_ticks(tick))
    }
}
