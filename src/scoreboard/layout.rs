//! Scoreboard geometry.
//!
//! Cursor positions arrive in the controller's native cursor space and are
//! rescaled to a canonical 1920x1080 screen before hit-testing. The report
//! button column moves horizontally with the aspect ratio and with whether
//! the tips sub-panel is shown, so both placements are tested. Row bands and
//! the confirmation box are fixed in canonical space.
//!
//! All values are empirical and only describe one scoreboard layout.

/// An inclusive range of canonical pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Band {
    /// First covered coordinate.
    pub start: i32,
    /// Last covered coordinate.
    pub end: i32,
}

impl Band {
    /// Creates a band covering `start..=end`.
    #[must_use]
    pub const fn new(start: i32, end: i32) -> Self {
        Band { start, end }
    }

    /// Returns whether `value` lies inside the band.
    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.start..=self.end).contains(&value)
    }
}

/// A rectangle in canonical space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Horizontal extent.
    pub x: Band,
    /// Vertical extent.
    pub y: Band,
}

impl Region {
    /// Returns whether `cursor` lies inside the region.
    #[must_use]
    pub fn contains(&self, cursor: CursorPosition) -> bool {
        self.x.contains(cursor.x) && self.y.contains(cursor.y)
    }
}

/// A cursor position in canonical 1920x1080 space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    /// Horizontal pixel.
    pub x: i32,
    /// Vertical pixel.
    pub y: i32,
}

/// Scoreboard geometry constants.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardLayout {
    /// Width of the controller's cursor space.
    pub native_width: f64,
    /// Height of the controller's cursor space.
    pub native_height: f64,
    /// Canonical screen width.
    pub canonical_width: f64,
    /// Canonical screen height.
    pub canonical_height: f64,
    /// Aspect ratio the panel widths were measured at.
    pub reference_aspect: f64,
    /// Scoreboard width with the tips sub-panel, at the reference aspect.
    pub panel_width: f64,
    /// Scoreboard width without the tips sub-panel.
    pub panel_width_no_tips: f64,
    /// Width the tips sub-panel adds in front of the button column.
    pub tips_width: f64,
    /// Left edge of the report button column, relative to `panel_width`.
    pub button_left: f64,
    /// Right edge of the report button column, relative to `panel_width`.
    pub button_right: f64,
    /// Vertical band of each slot's report button, by slot.
    pub rows: [Band; 10],
    /// The report confirmation dialog's button.
    pub confirm_box: Region,
}

impl Default for ScoreboardLayout {
    fn default() -> Self {
        ScoreboardLayout {
            native_width: 510.0,
            native_height: 383.0,
            canonical_width: 1920.0,
            canonical_height: 1080.0,
            reference_aspect: 1.777_777_777_78,
            panel_width: 920.0,
            panel_width_no_tips: 820.0,
            tips_width: 100.0,
            button_left: 865.0,
            button_right: 893.0,
            rows: [
                Band::new(106, 134),
                Band::new(176, 204),
                Band::new(246, 274),
                Band::new(316, 344),
                Band::new(386, 414),
                Band::new(486, 514),
                Band::new(556, 584),
                Band::new(626, 654),
                Band::new(696, 724),
                Band::new(766, 794),
            ],
            confirm_box: Region {
                x: Band::new(956, 1170),
                y: Band::new(847, 888),
            },
        }
    }
}

impl ScoreboardLayout {
    /// Rescales a native cursor position to canonical space.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_canonical(&self, native_x: i32, native_y: i32) -> CursorPosition {
        let x = f64::from(native_x) / self.native_width * self.canonical_width;
        let y = f64::from(native_y) / self.native_height * self.canonical_height;
        CursorPosition {
            x: x.round() as i32,
            y: y.round() as i32,
        }
    }

    /// Returns the slot whose report button is under `cursor`, if any.
    ///
    /// A non-positive or non-finite aspect ratio never hits.
    #[must_use]
    pub fn report_button_row(&self, cursor: CursorPosition, aspect: f32) -> Option<usize> {
        let aspect = f64::from(aspect);
        if !aspect.is_finite() || aspect <= 0.0 {
            return None;
        }

        let with_tips = self.scaled_width(self.panel_width, aspect);
        let without_tips = self.scaled_width(self.panel_width_no_tips, aspect);

        let in_column = column_contains(
            cursor.x,
            without_tips,
            (self.button_left - self.tips_width) / self.panel_width_no_tips,
            (self.button_right - self.tips_width) / self.panel_width_no_tips,
        ) || column_contains(
            cursor.x,
            with_tips,
            self.button_left / self.panel_width,
            self.button_right / self.panel_width,
        );
        if !in_column {
            return None;
        }

        self.rows.iter().position(|row| row.contains(cursor.y))
    }

    /// Returns whether `cursor` is on the confirmation dialog's button.
    #[must_use]
    pub fn in_confirm_box(&self, cursor: CursorPosition) -> bool {
        self.confirm_box.contains(cursor)
    }

    /// On-screen width of a panel that is `width` pixels wide at the
    /// reference aspect ratio.
    fn scaled_width(&self, width: f64, aspect: f64) -> f64 {
        (self.reference_aspect * (width / self.canonical_width) / aspect * self.canonical_width)
            .round()
    }
}

fn column_contains(x: i32, width: f64, left: f64, right: f64) -> bool {
    let x = f64::from(x);
    x >= (left * width).floor() && x <= (right * width).ceil()
}
