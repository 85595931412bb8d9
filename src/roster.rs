//! Roster and hero resolution.
//!
//! The ten-slot roster is read from the `CDOTA_PlayerResource` entity, whose
//! per-slot fields are re-emitted throughout the replay. Scalar fields are
//! last-write-wins. The hero is set once and never overwritten, because later
//! snapshots may carry stale or empty hero handles.
//!
//! Heroes are linked back to slots through whichever of these is populated:
//!
//! - the hero's `m_iPlayerID`
//! - an owner handle (`m_hOwnerEntity` or `m_hOwner`) matching a known entity
//!   index
//! - a SteamID carried on the hero itself
//!
//! Hero entities may be seen before the roster snapshot that references
//! them, so [`Roster::resolve_missing_heroes`] runs a fallback pass once the
//! stream has been consumed.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::stream::EntitySnapshot;

/// Number of roster slots.
pub const SLOT_COUNT: usize = 10;

/// Class name of the roster entity.
pub const PLAYER_RESOURCE_CLASS: &str = "CDOTA_PlayerResource";

/// Class name of per-player controller entities.
pub const PLAYER_CONTROLLER_CLASS: &str = "CDOTAPlayerController";

/// Class name of the game rules proxy entity.
pub const GAMERULES_CLASS: &str = "CDOTAGamerulesProxy";

/// Class name prefix of hero units. The remainder is the hero name.
pub const HERO_CLASS_PREFIX: &str = "CDOTA_Unit_Hero_";

/// Handle value meaning "no entity".
pub const INVALID_HANDLE: u64 = 0x00FF_FFFF;

/// Mask that recovers an entity index from a selected-hero handle.
pub const HERO_HANDLE_MASK: u32 = 0x7FFF;

const OWNER_FIELDS: [&str; 2] = ["m_hOwnerEntity", "m_hOwner"];

/// Returns the hero name embedded in a hero unit class name.
///
/// # Example
///
/// ```
/// use dota_report_parser::roster::hero_name;
///
/// assert_eq!(hero_name("CDOTA_Unit_Hero_Axe"), Some("Axe"));
/// assert_eq!(hero_name("CDOTA_PlayerResource"), None);
/// ```
#[must_use]
pub fn hero_name(class_name: &str) -> Option<&str> {
    class_name
        .strip_prefix(HERO_CLASS_PREFIX)
        .filter(|name| !name.is_empty())
}

/// Converts a signed player id into a slot index.
#[must_use]
pub fn slot_from_id(id: i32) -> Option<usize> {
    usize::try_from(id).ok().filter(|slot| *slot < SLOT_COUNT)
}

fn player_data_path(slot: usize, field: &str) -> String {
    format!("m_vecPlayerData.{slot:04}.{field}")
}

fn team_data_path(slot: usize, field: &str) -> String {
    format!("m_vecPlayerTeamData.{slot:04}.{field}")
}

/// One roster slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResource {
    /// Slot index (0-9).
    pub slot: usize,
    /// 64-bit SteamID, zero until known.
    pub steam_id: u64,
    /// Entity index the roster associates with this slot.
    pub ent_index: u32,
    /// Team number (2 or 3).
    pub team: i32,
    /// Display name.
    pub name: String,
    /// Hero name, empty until resolved.
    pub hero: String,
}

impl PlayerResource {
    /// Returns whether a hero has been resolved.
    #[must_use]
    pub fn has_hero(&self) -> bool {
        !self.hero.is_empty()
    }

    /// Sets the hero unless one is already set. Returns whether it was set.
    pub fn assign_hero(&mut self, hero: &str) -> bool {
        if self.has_hero() || hero.is_empty() {
            return false;
        }
        self.hero = hero.to_string();
        true
    }
}

/// Roster state accumulated over one pass.
#[derive(Debug, Clone)]
pub struct Roster {
    players: [PlayerResource; SLOT_COUNT],
    seen_player_resource: bool,
    /// Last non-zero SteamID seen per slot.
    steam_ids: [Option<u64>; SLOT_COUNT],
    ent_index_to_slot: HashMap<u32, usize>,
    hero_handles: [Option<u64>; SLOT_COUNT],
    heroes_by_owner: HashMap<u32, String>,
    heroes_by_index: BTreeMap<u32, String>,
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

impl Roster {
    /// Creates an empty roster with slot numbers assigned.
    #[must_use]
    pub fn new() -> Self {
        Roster {
            players: std::array::from_fn(|slot| PlayerResource {
                slot,
                ..PlayerResource::default()
            }),
            seen_player_resource: false,
            steam_ids: [None; SLOT_COUNT],
            ent_index_to_slot: HashMap::new(),
            hero_handles: [None; SLOT_COUNT],
            heroes_by_owner: HashMap::new(),
            heroes_by_index: BTreeMap::new(),
        }
    }

    /// Returns all slots.
    #[must_use]
    pub fn players(&self) -> &[PlayerResource; SLOT_COUNT] {
        &self.players
    }

    /// Returns one slot, or `None` if `slot` is out of range.
    #[must_use]
    pub fn player(&self, slot: usize) -> Option<&PlayerResource> {
        self.players.get(slot)
    }

    /// Consumes the roster and returns its slots.
    #[must_use]
    pub fn into_players(self) -> [PlayerResource; SLOT_COUNT] {
        self.players
    }

    /// Returns whether a roster snapshot has been observed.
    #[must_use]
    pub fn has_player_data(&self) -> bool {
        self.seen_player_resource
    }

    /// Finds the slot currently holding `steam_id`.
    #[must_use]
    pub fn slot_by_steam_id(&self, steam_id: u64) -> Option<usize> {
        if steam_id == 0 {
            return None;
        }
        self.players.iter().position(|p| p.steam_id == steam_id)
    }

    /// Returns the last non-zero SteamID ever seen for `slot`.
    #[must_use]
    pub fn known_steam_id(&self, slot: usize) -> Option<u64> {
        self.steam_ids.get(slot).copied().flatten()
    }

    /// Returns the selected-hero handle recorded for `slot`.
    #[must_use]
    pub fn hero_handle(&self, slot: usize) -> Option<u64> {
        self.hero_handles.get(slot).copied().flatten()
    }

    /// Returns whether every named slot has a hero (and at least one slot is
    /// named).
    #[must_use]
    pub fn is_complete(&self) -> bool {
        if !self.seen_player_resource {
            return false;
        }
        let mut named = self.players.iter().filter(|p| !p.name.is_empty()).peekable();
        named.peek().is_some() && named.all(PlayerResource::has_hero)
    }

    /// Feeds one entity snapshot into the roster.
    ///
    /// Returns whether the entity was relevant to the roster.
    pub fn observe(&mut self, entity: &dyn EntitySnapshot) -> bool {
        match entity.class_name() {
            PLAYER_RESOURCE_CLASS => self.observe_player_resource(entity),
            PLAYER_CONTROLLER_CLASS => self.observe_controller(entity),
            class => match hero_name(class) {
                Some(hero) => {
                    let hero = hero.to_string();
                    self.observe_hero(entity, &hero);
                }
                None => return false,
            },
        }
        true
    }

    fn observe_player_resource(&mut self, entity: &dyn EntitySnapshot) {
        self.seen_player_resource = true;

        for slot in 0..SLOT_COUNT {
            let player = &mut self.players[slot];

            if let Some(steam_id) = entity.get_u64(&player_data_path(slot, "m_iPlayerSteamID")) {
                player.steam_id = steam_id;
                if steam_id > 0 {
                    self.steam_ids[slot] = Some(steam_id);
                }
            }

            if let Some(ent_index) = entity.get_u32(&player_data_path(slot, "m_nPlayerSlot")) {
                player.ent_index = ent_index;
                self.ent_index_to_slot.insert(ent_index, slot);
            }

            if let Some(team) = entity.get_i32(&player_data_path(slot, "m_iPlayerTeam")) {
                player.team = team;
            }

            if let Some(name) = entity.get_str(&player_data_path(slot, "m_iszPlayerName")) {
                player.name = name.to_string();
            }

            if let Some(handle) = entity.get_u64(&team_data_path(slot, "m_hSelectedHero")) {
                if handle != 0 && handle != INVALID_HANDLE {
                    self.hero_handles[slot] = Some(handle);
                }
            }
        }
    }

    fn observe_controller(&mut self, entity: &dyn EntitySnapshot) {
        let Some(slot) = entity.get_i32("m_nPlayerID").and_then(slot_from_id) else {
            return;
        };
        if let Some(index) = entity
            .get_u32("m_nEntityIndex")
            .or_else(|| entity.get_u32("m_nPlayerSlot"))
        {
            self.ent_index_to_slot.insert(index, slot);
        }
    }

    fn observe_hero(&mut self, entity: &dyn EntitySnapshot, hero: &str) {
        self.heroes_by_index.insert(entity.index(), hero.to_string());

        if let Some(slot) = entity.get_i32("m_iPlayerID").and_then(slot_from_id) {
            self.assign_hero(slot, hero, "player id");
        }

        for field in OWNER_FIELDS {
            let Some(owner) = entity.get_u32(field).filter(|o| *o != 0) else {
                continue;
            };
            self.heroes_by_owner.insert(owner, hero.to_string());
            if let Some(&slot) = self.ent_index_to_slot.get(&owner) {
                self.assign_hero(slot, hero, field);
            }
        }

        if let Some(steam_id) = entity.get_u64("m_steamID").filter(|s| *s > 0) {
            for slot in 0..SLOT_COUNT {
                if self.steam_ids[slot] == Some(steam_id) {
                    self.assign_hero(slot, hero, "steam id");
                }
            }
        }
    }

    fn assign_hero(&mut self, slot: usize, hero: &str, via: &str) {
        if self.players[slot].assign_hero(hero) {
            debug!(slot, hero, via, "resolved hero");
        }
    }

    /// Fills in heroes that the in-stream links could not resolve.
    ///
    /// For each slot without a hero that has a selected-hero handle, the
    /// following are tried in order, stopping at the first hit:
    ///
    /// 1. `lookup(handle)`, the decoder's handle-to-entity lookup
    /// 2. the handle masked with [`HERO_HANDLE_MASK`] as a hero entity index
    /// 3. the raw handle as a hero entity index
    /// 4. any hero entity whose masked index equals the masked handle
    ///
    /// Finally a hero recorded against an owner equal to the slot's entity
    /// index is used.
    pub fn resolve_missing_heroes<F>(&mut self, lookup: F)
    where
        F: Fn(u64) -> Option<String>,
    {
        for slot in 0..SLOT_COUNT {
            if self.players[slot].has_hero() {
                continue;
            }
            match self.fallback_hero(slot, &lookup) {
                Some((hero, via)) => {
                    debug!(slot, hero = %hero, via, "resolved hero after pass");
                    self.players[slot].hero = hero;
                }
                None => trace!(slot, "hero unresolved after pass"),
            }
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    fn fallback_hero(
        &self,
        slot: usize,
        lookup: &dyn Fn(u64) -> Option<String>,
    ) -> Option<(String, &'static str)> {
        if let Some(handle) = self.hero_handles[slot] {
            let raw = handle as u32;
            let masked = raw & HERO_HANDLE_MASK;

            let found = lookup(handle)
                .as_deref()
                .and_then(hero_name)
                .map(|h| (h.to_string(), "handle lookup"))
                .or_else(|| {
                    self.heroes_by_index
                        .get(&masked)
                        .map(|h| (h.clone(), "masked handle"))
                })
                .or_else(|| {
                    self.heroes_by_index
                        .get(&raw)
                        .map(|h| (h.clone(), "raw handle"))
                })
                .or_else(|| {
                    self.heroes_by_index
                        .iter()
                        .find(|(index, _)| **index & HERO_HANDLE_MASK == masked || **index == masked)
                        .map(|(_, h)| (h.clone(), "hero scan"))
                });
            if found.is_some() {
                return found;
            }
        }

        let ent_index = self.players[slot].ent_index;
        if ent_index == 0 {
            return None;
        }
        self.heroes_by_owner
            .get(&ent_index)
            .map(|h| (h.clone(), "owner index"))
    }
}
