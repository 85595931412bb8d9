//! Recorded event streams.
//!
//! A recorded stream is a JSON-lines file with one decoded event per line.
//! Blank lines and lines starting with `#` are ignored.
//!
//! ```text
//! {"type":"tick","tick":9000}
//! {"type":"game_state","state":5}
//! {"type":"entity","op":"created","class":"CDOTA_Unit_Hero_Axe","index":310,"fields":{"m_iPlayerID":0}}
//! {"type":"packet","kind":"entities","tick":9000,"size":812,"updated_entries":14}
//! {"type":"fault","reason":"insufficient buffer"}
//! ```
//!
//! A `fault` line makes [`RecordedSource::drive`](super::EventSource::drive)
//! fail the way a decoder does on a truncated replay.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::ops::ControlFlow;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EntityOp, EntitySnapshot, EventSink, EventSource, PacketMarker, StreamError, Tick};
use crate::error::{ParserError, Result};

/// Bits of an entity handle that hold the entity index.
pub const HANDLE_INDEX_MASK: u64 = 0x3FFF;

/// A single field value of a recorded entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Non-negative integer.
    Unsigned(u64),
    /// Negative integer.
    Signed(i64),
    /// Floating point number.
    Float(f64),
    /// String.
    Text(String),
}

impl From<u32> for FieldValue {
    fn from(value: u32) -> Self {
        FieldValue::Unsigned(u64::from(value))
    }
}

impl From<u64> for FieldValue {
    fn from(value: u64) -> Self {
        FieldValue::Unsigned(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Signed(i64::from(value))
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(f64::from(value))
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl FieldValue {
    fn as_u64(&self) -> Option<u64> {
        match *self {
            FieldValue::Unsigned(v) => Some(v),
            FieldValue::Signed(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::Unsigned(v) => i64::try_from(v).ok(),
            FieldValue::Signed(v) => Some(v),
            _ => None,
        }
    }
}

/// A recorded entity snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedEntity {
    /// What happened to the entity.
    #[serde(default)]
    pub op: EntityOp,

    /// Server class name.
    pub class: String,

    /// Entity index.
    pub index: u32,

    /// Field values by path.
    #[serde(default)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl RecordedEntity {
    /// Creates an updated-entity snapshot without fields.
    #[must_use]
    pub fn new(class: impl Into<String>, index: u32) -> Self {
        RecordedEntity {
            op: EntityOp::Updated,
            class: class.into(),
            index,
            fields: BTreeMap::new(),
        }
    }

    /// Returns the snapshot with `path` set to `value`.
    #[must_use]
    pub fn with(mut self, path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    /// Returns the snapshot with its operation replaced.
    #[must_use]
    pub fn with_op(mut self, op: EntityOp) -> Self {
        self.op = op;
        self
    }
}

impl EntitySnapshot for RecordedEntity {
    fn class_name(&self) -> &str {
        &self.class
    }

    fn index(&self) -> u32 {
        self.index
    }

    fn get_u32(&self, path: &str) -> Option<u32> {
        u32::try_from(self.fields.get(path)?.as_u64()?).ok()
    }

    fn get_u64(&self, path: &str) -> Option<u64> {
        self.fields.get(path)?.as_u64()
    }

    fn get_i32(&self, path: &str) -> Option<i32> {
        i32::try_from(self.fields.get(path)?.as_i64()?).ok()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    fn get_f32(&self, path: &str) -> Option<f32> {
        match *self.fields.get(path)? {
            FieldValue::Float(v) => Some(v as f32),
            FieldValue::Unsigned(v) => Some(v as f32),
            FieldValue::Signed(v) => Some(v as f32),
            FieldValue::Text(_) => None,
        }
    }

    fn get_str(&self, path: &str) -> Option<&str> {
        match self.fields.get(path)? {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

/// One line of a recorded stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordedEvent {
    /// Tick notification.
    Tick {
        /// The new tick.
        tick: Tick,
    },
    /// Game rules state change.
    GameState {
        /// Numeric state code.
        state: i32,
    },
    /// Entity snapshot.
    Entity(RecordedEntity),
    /// Packet size marker.
    Packet(PacketMarker),
    /// Decoder failure.
    Fault {
        /// Failure message.
        reason: String,
    },
}

/// An [`EventSource`] replaying recorded events.
///
/// Live entities are tracked while driving so that
/// [`class_for_handle`](EventSource::class_for_handle) reflects the entity
/// table at the point the stream ended.
#[derive(Debug, Clone, Default)]
pub struct RecordedSource {
    events: Vec<RecordedEvent>,
    live: BTreeMap<u32, String>,
}

impl RecordedSource {
    /// Creates a source from already parsed events.
    #[must_use]
    pub fn new(events: Vec<RecordedEvent>) -> Self {
        RecordedSource {
            events,
            live: BTreeMap::new(),
        }
    }

    /// Parses a JSON-lines stream.
    ///
    /// # Errors
    ///
    /// - `ParserError::IoError` if reading fails
    /// - `ParserError::InvalidEventRecord` for a line that is not an event
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let event = serde_json::from_str(trimmed).map_err(|e| ParserError::InvalidEventRecord {
                line: i + 1,
                reason: e.to_string(),
            })?;
            events.push(event);
        }

        debug!(events = events.len(), "loaded recorded stream");
        Ok(Self::new(events))
    }

    /// Opens and parses a JSON-lines file.
    ///
    /// # Errors
    ///
    /// See [`RecordedSource::from_reader`].
    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Appends an event.
    pub fn push(&mut self, event: RecordedEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    /// Appends a tick notification.
    pub fn tick(&mut self, tick: Tick) -> &mut Self {
        self.push(RecordedEvent::Tick { tick })
    }

    /// Appends a game rules state change.
    pub fn game_state(&mut self, state: i32) -> &mut Self {
        self.push(RecordedEvent::GameState { state })
    }

    /// Appends an entity snapshot.
    pub fn entity(&mut self, entity: RecordedEntity) -> &mut Self {
        self.push(RecordedEvent::Entity(entity))
    }

    /// Appends a decoder fault.
    pub fn fault(&mut self, reason: impl Into<String>) -> &mut Self {
        self.push(RecordedEvent::Fault {
            reason: reason.into(),
        })
    }

    /// Returns the recorded events.
    #[must_use]
    pub fn events(&self) -> &[RecordedEvent] {
        &self.events
    }
}

impl EventSource for RecordedSource {
    fn drive(&mut self, sink: &mut dyn EventSink) -> std::result::Result<(), StreamError> {
        self.live.clear();

        for event in &self.events {
            match event {
                RecordedEvent::Tick { tick } => {
                    if let ControlFlow::Break(()) = sink.on_tick(*tick)? {
                        return Ok(());
                    }
                }
                RecordedEvent::GameState { state } => sink.on_game_state(*state)?,
                RecordedEvent::Entity(entity) => {
                    if entity.op != EntityOp::Deleted {
                        self.live.insert(entity.index, entity.class.clone());
                    }
                    sink.on_entity(entity, entity.op)?;
                    if entity.op == EntityOp::Deleted {
                        self.live.remove(&entity.index);
                    }
                }
                RecordedEvent::Packet(marker) => sink.on_packet(*marker),
                RecordedEvent::Fault { reason } => return Err(StreamError::Decode(reason.clone())),
            }
        }

        Ok(())
    }

    #[allow(clippy::cast_possible_truncation)]
    fn class_for_handle(&self, handle: u64) -> Option<String> {
        self.live.get(&((handle & HANDLE_INDEX_MASK) as u32)).cloned()
    }
}
