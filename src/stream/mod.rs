//! The boundary to the external demo decoder.
//!
//! Decoding the packet stream into entities is the job of a separate library.
//! The analysis passes only depend on the traits in this module:
//!
//! - [`EntitySnapshot`]: a typed, path-addressed view of one entity
//! - [`EventSink`]: the callbacks a pass implements
//! - [`EventSource`]: something that drives a sink through a whole replay
//!
//! [`RecordedSource`] is an [`EventSource`] over a JSON-lines dump of decoded
//! events, used by the CLI and by the tests.

pub mod recorded;

pub use recorded::{FieldValue, RecordedEntity, RecordedEvent, RecordedSource};

use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ParserError;

/// Simulation tick number.
pub type Tick = u32;

/// What happened to an entity in the current packet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityOp {
    /// The entity was created.
    Created,
    /// One or more fields changed.
    #[default]
    Updated,
    /// The entity was deleted.
    Deleted,
}

/// Typed access to one decoded entity.
///
/// Fields are addressed by dotted paths with zero-padded array indices, e.g.
/// `m_vecPlayerData.0003.m_iPlayerTeam`. Every getter returns `None` when the
/// field is absent or has an incompatible type.
pub trait EntitySnapshot {
    /// Server class name, e.g. `CDOTA_PlayerResource`.
    fn class_name(&self) -> &str;

    /// Entity index.
    fn index(&self) -> u32;

    /// Reads an unsigned 32-bit field.
    fn get_u32(&self, path: &str) -> Option<u32>;

    /// Reads an unsigned 64-bit field.
    fn get_u64(&self, path: &str) -> Option<u64>;

    /// Reads a signed 32-bit field.
    fn get_i32(&self, path: &str) -> Option<i32>;

    /// Reads a float field.
    fn get_f32(&self, path: &str) -> Option<f32>;

    /// Reads a string field.
    fn get_str(&self, path: &str) -> Option<&str>;
}

/// Which decoder message a [`PacketMarker`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PacketKind {
    /// A demo packet command.
    Demo,
    /// A packet entities message inside a demo packet.
    Entities,
}

/// Size information about a packet, kept for failure diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketMarker {
    /// Message kind.
    pub kind: PacketKind,
    /// Tick the packet belongs to.
    pub tick: Tick,
    /// Size of the packet's data buffer in bytes.
    pub size: usize,
    /// Number of updated entries (packet entities only).
    #[serde(default)]
    pub updated_entries: i32,
}

/// Callbacks invoked by an [`EventSource`] in stream order.
pub trait EventSink {
    /// A new simulation tick started. Returning `Break` ends the pass early.
    ///
    /// # Errors
    ///
    /// Any error aborts the pass and is returned by the source.
    fn on_tick(&mut self, tick: Tick) -> Result<ControlFlow<()>, ParserError>;

    /// The game rules state changed to `state`.
    ///
    /// # Errors
    ///
    /// Any error aborts the pass and is returned by the source.
    fn on_game_state(&mut self, state: i32) -> Result<(), ParserError>;

    /// An entity was created, updated or deleted.
    ///
    /// # Errors
    ///
    /// Any error aborts the pass and is returned by the source.
    fn on_entity(&mut self, entity: &dyn EntitySnapshot, op: EntityOp) -> Result<(), ParserError>;

    /// A packet was decoded. Used for diagnostics only.
    fn on_packet(&mut self, _marker: PacketMarker) {}
}

/// Failure while driving an [`EventSink`].
#[derive(Error, Debug)]
pub enum StreamError {
    /// The sink rejected an event.
    #[error(transparent)]
    Sink(#[from] ParserError),

    /// The decoder could not continue, e.g. on a truncated packet.
    #[error("{0}")]
    Decode(String),
}

/// A forward-only stream of decoded replay events.
pub trait EventSource {
    /// Drives `sink` through the stream until it ends, the sink breaks on a
    /// tick, or an error occurs.
    ///
    /// # Errors
    ///
    /// `StreamError::Sink` for errors raised by the sink, `StreamError::Decode`
    /// for decoder faults.
    fn drive(&mut self, sink: &mut dyn EventSink) -> Result<(), StreamError>;

    /// Resolves an entity handle to the class name of the entity it refers
    /// to, if the decoder supports handle lookup.
    fn class_for_handle(&self, _handle: u64) -> Option<String> {
        None
    }
}
