//! Report hover tracking.
//!
//! A report is made by opening the scoreboard, clicking the report button in
//! a player's row and then confirming in a dialog. Replays carry no report
//! event, only each controller's scoreboard flag, cursor and aspect ratio.
//! [`HoverTracker`] reconstructs the sequence per reporter slot:
//!
//! 1. While the scoreboard is open, hovering a report button for another
//!    slot records that slot. The first target of a sequence is kept until a
//!    report is emitted.
//! 2. A cursor inside the confirmation box within the confirmation window of
//!    the last hover yields a [`ConfirmIntent`].
//!
//! Closing the scoreboard does not reset anything. Only
//! [`HoverTracker::complete`] clears a slot.

pub mod layout;

pub use layout::{CursorPosition, ScoreboardLayout};

use std::collections::HashMap;

use tracing::{trace, warn};

use crate::roster::SLOT_COUNT;
use crate::stream::Tick;

/// Hover memory of one reporter slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HoverState {
    /// First slot hovered since the last report.
    pub first_target: Option<usize>,
    /// Most recently hovered slot.
    pub last_target: Option<usize>,
    /// Tick of the most recent hover.
    pub last_hover_tick: Option<Tick>,
}

impl HoverState {
    /// Records a hover over `target`'s report button at `tick`.
    pub fn record_hover(&mut self, target: usize, tick: Tick) {
        self.first_target.get_or_insert(target);
        self.last_target = Some(target);
        self.last_hover_tick = Some(tick);
    }

    /// Returns the last hover tick if `tick` is at most `window` ticks after
    /// it.
    #[must_use]
    pub fn hover_within(&self, tick: Tick, window: u32) -> Option<Tick> {
        self.last_hover_tick
            .filter(|hover| tick >= *hover && tick - *hover <= window)
    }

    /// Picks the slot a confirmation by `reporter` refers to.
    ///
    /// The first hovered target wins, then the last one, then `current`
    /// (the row under the cursor right now). Out-of-range slots and the
    /// reporter's own slot are skipped.
    #[must_use]
    pub fn confirmation_target(&self, reporter: usize, current: Option<usize>) -> Option<usize> {
        let valid = |slot: &usize| *slot < SLOT_COUNT && *slot != reporter;
        self.first_target
            .filter(valid)
            .or_else(|| self.last_target.filter(valid))
            .or_else(|| current.filter(valid))
    }

    /// Forgets the whole sequence.
    pub fn clear(&mut self) {
        *self = HoverState::default();
    }
}

/// A confirmed report, before the target's identity is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmIntent {
    /// Slot of the player who confirmed.
    pub reporter_slot: usize,
    /// Slot of the reported player.
    pub target_slot: usize,
    /// Tick of the hover that preceded the confirmation.
    pub hover_tick: Tick,
}

/// Per-slot hover state machine.
#[derive(Debug, Clone)]
pub struct HoverTracker {
    layout: ScoreboardLayout,
    confirm_window: u32,
    slots: [HoverState; SLOT_COUNT],
    panels: HashMap<u64, bool>,
}

impl HoverTracker {
    /// Creates a tracker with no recorded hovers.
    #[must_use]
    pub fn new(layout: ScoreboardLayout, confirm_window: u32) -> Self {
        HoverTracker {
            layout,
            confirm_window,
            slots: [HoverState::default(); SLOT_COUNT],
            panels: HashMap::new(),
        }
    }

    /// Returns the geometry used for hit-testing.
    #[must_use]
    pub fn layout(&self) -> &ScoreboardLayout {
        &self.layout
    }

    /// Returns the hover state of `slot`.
    #[must_use]
    pub fn state(&self, slot: usize) -> Option<&HoverState> {
        self.slots.get(slot)
    }

    /// Records whether `steam_id`'s scoreboard is open.
    ///
    /// Returns `true` when this toggles the recorded state. A player never
    /// seen before counts as closed.
    #[must_use]
    pub fn set_panel(&mut self, steam_id: u64, open: bool) -> bool {
        let was_open = self.panels.insert(steam_id, open).unwrap_or(false);
        was_open != open
    }

    /// Processes one open-scoreboard update of `reporter`'s controller.
    ///
    /// The confirmation box is checked before the hover is recorded, so the
    /// returned intent always refers to hovers from earlier updates. The
    /// hover state is left untouched when an intent is returned; call
    /// [`complete`](Self::complete) once the report has been emitted.
    pub fn observe(
        &mut self,
        reporter: usize,
        cursor: CursorPosition,
        aspect: f32,
        tick: Tick,
    ) -> Option<ConfirmIntent> {
        if reporter >= SLOT_COUNT {
            return None;
        }
        let hovered = self.layout.report_button_row(cursor, aspect);
        let in_confirm_box = self.layout.in_confirm_box(cursor);
        let state = &mut self.slots[reporter];

        let mut intent = None;
        if in_confirm_box {
            if let Some(hover_tick) = state.hover_within(tick, self.confirm_window) {
                match state.confirmation_target(reporter, hovered) {
                    Some(target_slot) => {
                        if state.first_target != Some(target_slot) {
                            warn!(
                                reporter,
                                first = ?state.first_target,
                                last = ?state.last_target,
                                target_slot,
                                "first hovered target unusable, falling back"
                            );
                        }
                        intent = Some(ConfirmIntent {
                            reporter_slot: reporter,
                            target_slot,
                            hover_tick,
                        });
                    }
                    None => warn!(
                        reporter,
                        first = ?state.first_target,
                        last = ?state.last_target,
                        current = ?hovered,
                        "no usable report target, skipping confirmation"
                    ),
                }
            }
        }

        if let Some(target) = hovered.filter(|slot| *slot != reporter) {
            trace!(reporter, target, tick, "report button hovered");
            state.record_hover(target, tick);
        }

        intent
    }

    /// Clears `slot` after its report was emitted.
    pub fn complete(&mut self, slot: usize) {
        if let Some(state) = self.slots.get_mut(slot) {
            state.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDESCREEN: f32 = 16.0 / 9.0;
    const CONFIRM: CursorPosition = CursorPosition { x: 1001, y: 860 };
    const ROW_Y: [i32; SLOT_COUNT] = [120, 190, 260, 330, 400, 500, 570, 640, 710, 780];

    fn row(slot: usize) -> CursorPosition {
        CursorPosition {
            x: 880,
            y: ROW_Y[slot],
        }
    }

    fn tracker() -> HoverTracker {
        HoverTracker::new(ScoreboardLayout::default(), 120)
    }

    #[test]
    fn test_hover_then_confirm() {
        let mut tracker = tracker();
        assert_eq!(tracker.observe(0, row(3), WIDESCREEN, 1000), None);

        let intent = tracker.observe(0, CONFIRM, WIDESCREEN, 1090);
        assert_eq!(
            intent,
            Some(ConfirmIntent {
                reporter_slot: 0,
                target_slot: 3,
                hover_tick: 1000,
            })
        );
    }

    #[test]
    fn test_window_is_inclusive() {
        let mut tracker = tracker();
        tracker.observe(2, row(7), WIDESCREEN, 500);
        assert!(tracker.observe(2, CONFIRM, WIDESCREEN, 620).is_some());
        assert_eq!(tracker.observe(2, CONFIRM, WIDESCREEN, 621), None);
    }

    #[test]
    fn test_late_confirm_is_ignored() {
        let mut tracker = tracker();
        tracker.observe(0, row(3), WIDESCREEN, 1000);
        assert_eq!(tracker.observe(0, CONFIRM, WIDESCREEN, 1150), None);
    }

    #[test]
    fn test_first_target_is_preferred() {
        let mut tracker = tracker();
        tracker.observe(4, row(6), WIDESCREEN, 100);
        tracker.observe(4, row(8), WIDESCREEN, 110);

        let intent = tracker.observe(4, CONFIRM, WIDESCREEN, 150).unwrap();
        assert_eq!(intent.target_slot, 6);
        // Timestamp comes from the latest hover
        assert_eq!(intent.hover_tick, 110);
    }

    #[test]
    fn test_own_row_is_never_recorded() {
        let mut tracker = tracker();
        for slot in 0..SLOT_COUNT {
            tracker.observe(slot, row(slot), WIDESCREEN, 10);
            assert_eq!(tracker.state(slot), Some(&HoverState::default()));
            assert_eq!(tracker.observe(slot, CONFIRM, WIDESCREEN, 20), None);
        }
    }

    #[test]
    fn test_state_survives_until_complete() {
        let mut tracker = tracker();
        tracker.observe(1, row(5), WIDESCREEN, 100);
        assert!(!tracker.set_panel(42, false));
        assert!(tracker.set_panel(42, true));

        assert!(tracker.observe(1, CONFIRM, WIDESCREEN, 130).is_some());
        // Not completed yet, so a second confirmation repeats the intent
        assert!(tracker.observe(1, CONFIRM, WIDESCREEN, 131).is_some());

        tracker.complete(1);
        assert_eq!(tracker.observe(1, CONFIRM, WIDESCREEN, 132), None);
        assert_eq!(tracker.state(1), Some(&HoverState::default()));
    }

    #[test]
    fn test_confirmation_target_fallbacks() {
        let state = HoverState {
            first_target: Some(2),
            last_target: Some(4),
            last_hover_tick: Some(1),
        };
        assert_eq!(state.confirmation_target(0, None), Some(2));
        assert_eq!(state.confirmation_target(2, None), Some(4));

        let state = HoverState {
            first_target: Some(2),
            last_target: Some(2),
            last_hover_tick: Some(1),
        };
        assert_eq!(state.confirmation_target(2, Some(7)), Some(7));
        assert_eq!(state.confirmation_target(2, Some(2)), None);
        assert_eq!(state.confirmation_target(2, Some(12)), None);

        let state = HoverState {
            first_target: Some(11),
            last_target: None,
            last_hover_tick: Some(1),
        };
        assert_eq!(state.confirmation_target(0, None), None);
    }

    #[test]
    fn test_panel_transitions() {
        let mut tracker = tracker();
        assert!(!tracker.set_panel(7, false));
        assert!(tracker.set_panel(7, true));
        assert!(!tracker.set_panel(7, true));
        assert!(tracker.set_panel(7, false));
        assert!(!tracker.set_panel(7, false));
    }

    #[test]
    fn test_out_of_range_reporter() {
        let mut tracker = tracker();
        assert_eq!(tracker.observe(SLOT_COUNT, row(1), WIDESCREEN, 1), None);
        tracker.complete(SLOT_COUNT);
    }
}
