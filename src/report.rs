//! Confirmed reports and pass results.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::clock::MatchClock;
use crate::roster::Roster;
use crate::scoreboard::ConfirmIntent;

/// Whether a report was made against a teammate or an opponent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamLabel {
    /// Reporter and target are on the same team.
    Friendly,
    /// Reporter and target are on different teams.
    Enemy,
}

impl TeamLabel {
    /// Classifies a report by the two team numbers.
    #[must_use]
    pub fn classify(reporter_team: i32, target_team: i32) -> Self {
        if reporter_team == target_team {
            TeamLabel::Friendly
        } else {
            TeamLabel::Enemy
        }
    }

    /// Returns the label as written in results.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TeamLabel::Friendly => "FRIENDLY",
            TeamLabel::Enemy => "ENEMY",
        }
    }
}

impl fmt::Display for TeamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One confirmed report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Match time of the hover that led to the report, `MM:SS`.
    pub time: String,
    /// Reporter's SteamID.
    pub reporter_steam_id: u64,
    /// Reporter's slot.
    pub reporter_slot: usize,
    /// Reporter's display name.
    pub reporter_name: String,
    /// Reporter's relation to the target.
    pub reporter_team_label: TeamLabel,
    /// Reporter's hero, possibly filled in after the pass.
    pub reporter_hero: String,
    /// Reported slot.
    pub target_slot: usize,
    /// Reported player's SteamID.
    pub target_steam_id: u64,
    /// Reported player's display name.
    pub target_name: String,
    /// Reported player's hero, possibly filled in after the pass.
    pub target_hero: String,
}

/// Live details about the player confirming a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reporter<'a> {
    /// SteamID from the controller.
    pub steam_id: u64,
    /// Display name from the controller.
    pub name: &'a str,
    /// Team number from the controller.
    pub team: i32,
}

/// Outcome of a report pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Match id supplied by the caller.
    pub match_id: i64,
    /// Reports against teammates.
    pub team_report_count: u32,
    /// Reports against opponents.
    pub enemy_report_count: u32,
    /// Reports in the order they were confirmed.
    pub reports: Vec<Report>,
}

impl ParseResult {
    /// Creates an empty result.
    #[must_use]
    pub fn new(match_id: i64) -> Self {
        ParseResult {
            match_id,
            ..ParseResult::default()
        }
    }

    /// Appends a report and updates the counters.
    pub fn record(&mut self, report: Report) {
        match report.reporter_team_label {
            TeamLabel::Friendly => self.team_report_count += 1,
            TeamLabel::Enemy => self.enemy_report_count += 1,
        }
        self.reports.push(report);
    }

    /// Turns a confirmation into a report.
    ///
    /// The target's SteamID comes from the roster, or from the last non-zero
    /// SteamID seen for the slot. Without either the confirmation is dropped
    /// and `None` is returned. The report is timestamped at the intent's
    /// hover tick.
    pub fn confirm(
        &mut self,
        intent: &ConfirmIntent,
        reporter: &Reporter<'_>,
        roster: &Roster,
        clock: &MatchClock,
    ) -> Option<&Report> {
        let target = roster.player(intent.target_slot)?;

        let target_steam_id = if target.steam_id != 0 {
            target.steam_id
        } else if let Some(steam_id) = roster.known_steam_id(intent.target_slot) {
            warn!(
                target_slot = intent.target_slot,
                steam_id, "target SteamID is zero, using last known SteamID"
            );
            steam_id
        } else {
            warn!(
                target_slot = intent.target_slot,
                "could not resolve target SteamID, skipping report"
            );
            return None;
        };

        let label = TeamLabel::classify(reporter.team, target.team);
        let report = Report {
            time: clock.elapsed(intent.hover_tick).to_string(),
            reporter_steam_id: reporter.steam_id,
            reporter_slot: intent.reporter_slot,
            reporter_name: reporter.name.to_string(),
            reporter_team_label: label,
            reporter_hero: roster
                .player(intent.reporter_slot)
                .map(|p| p.hero.clone())
                .unwrap_or_default(),
            target_slot: intent.target_slot,
            target_steam_id,
            target_name: target.name.clone(),
            target_hero: target.hero.clone(),
        };

        info!(
            time = %report.time,
            reporter_slot = report.reporter_slot,
            target_slot = report.target_slot,
            label = %label,
            "report confirmed"
        );
        self.record(report);
        self.reports.last()
    }

    /// Fills in hero names that were unknown when a report was made.
    pub fn backfill_heroes(&mut self, roster: &Roster) {
        for report in &mut self.reports {
            if report.reporter_hero.is_empty() {
                if let Some(player) = roster.player(report.reporter_slot) {
                    report.reporter_hero.clone_from(&player.hero);
                }
            }
            if report.target_hero.is_empty() {
                if let Some(player) = roster.player(report.target_slot) {
                    report.target_hero.clone_from(&player.hero);
                }
            }
        }
    }

    /// Total number of reports.
    #[must_use]
    pub fn total(&self) -> usize {
        self.reports.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::PLAYER_RESOURCE_CLASS;
    use crate::stream::RecordedEntity;
    use tracing_test::traced_test;

    fn roster() -> Roster {
        let mut roster = Roster::new();
        let mut entity = RecordedEntity::new(PLAYER_RESOURCE_CLASS, 1);
        for slot in 0..10u64 {
            entity = entity
                .with(format!("m_vecPlayerData.{slot:04}.m_iPlayerSteamID"), 500 + slot)
                .with(
                    format!("m_vecPlayerData.{slot:04}.m_iPlayerTeam"),
                    if slot % 2 == 0 { 2 } else { 3 },
                )
                .with(format!("m_vecPlayerData.{slot:04}.m_iszPlayerName"), format!("p{slot}"));
        }
        roster.observe(&entity);
        roster
    }

    fn started_clock() -> MatchClock {
        let mut clock = MatchClock::new();
        clock.start(1000);
        clock
    }

    fn intent(reporter_slot: usize, target_slot: usize, hover_tick: u32) -> ConfirmIntent {
        ConfirmIntent {
            reporter_slot,
            target_slot,
            hover_tick,
        }
    }

    #[test]
    fn test_classify() {
        assert_eq!(TeamLabel::classify(2, 2), TeamLabel::Friendly);
        assert_eq!(TeamLabel::classify(2, 3), TeamLabel::Enemy);
        assert_eq!(TeamLabel::Enemy.to_string(), "ENEMY");
    }

    #[test]
    fn test_label_serialization() {
        assert_eq!(serde_json::to_string(&TeamLabel::Friendly).unwrap(), "\"FRIENDLY\"");
        assert_eq!(
            serde_json::from_str::<TeamLabel>("\"ENEMY\"").unwrap(),
            TeamLabel::Enemy
        );
    }

    #[test]
    fn test_confirm_enemy_report() {
        let roster = roster();
        let mut result = ParseResult::new(77);
        let reporter = Reporter {
            steam_id: 500,
            name: "p0",
            team: 2,
        };

        let report = result
            .confirm(&intent(0, 1, 1000 + 30 * 65), &reporter, &roster, &started_clock())
            .cloned()
            .unwrap();

        assert_eq!(report.time, "01:05");
        assert_eq!(report.reporter_team_label, TeamLabel::Enemy);
        assert_eq!(report.target_steam_id, 501);
        assert_eq!(report.target_name, "p1");
        assert_eq!(result.enemy_report_count, 1);
        assert_eq!(result.team_report_count, 0);
    }

    #[test]
    fn test_confirm_friendly_report() {
        let roster = roster();
        let mut result = ParseResult::new(77);
        let reporter = Reporter {
            steam_id: 500,
            name: "p0",
            team: 2,
        };
        result.confirm(&intent(0, 2, 1000), &reporter, &roster, &started_clock());

        assert_eq!(result.team_report_count, 1);
        assert_eq!(result.reports[0].reporter_team_label, TeamLabel::Friendly);
    }

    #[traced_test]
    #[test]
    fn test_unresolved_target_is_dropped() {
        let roster = Roster::new();
        let mut result = ParseResult::new(1);
        let reporter = Reporter {
            steam_id: 9,
            name: "x",
            team: 2,
        };

        assert!(result
            .confirm(&intent(0, 4, 10), &reporter, &roster, &started_clock())
            .is_none());
        assert_eq!(result.total(), 0);
        assert!(logs_contain("could not resolve target SteamID"));
    }

    #[test]
    fn test_backfill_heroes() {
        let mut roster = roster();
        let mut result = ParseResult::new(1);
        let reporter = Reporter {
            steam_id: 503,
            name: "p3",
            team: 3,
        };
        result.confirm(&intent(3, 4, 1200), &reporter, &roster, &started_clock());
        assert_eq!(result.reports[0].reporter_hero, "");

        roster.observe(&RecordedEntity::new("CDOTA_Unit_Hero_Axe", 300).with("m_iPlayerID", 3));
        roster.observe(&RecordedEntity::new("CDOTA_Unit_Hero_Lina", 301).with("m_iPlayerID", 4));
        result.backfill_heroes(&roster);

        assert_eq!(result.reports[0].reporter_hero, "Axe");
        assert_eq!(result.reports[0].target_hero, "Lina");
    }
}
