//! Analysis passes over a decoded event stream.
//!
//! Two passes are provided:
//!
//! - [`parse_replay`] reconstructs report actions against one player (or
//!   all players) and returns a [`ParseResult`](crate::report::ParseResult)
//! - [`extract_player_info`] only resolves the ten-slot roster and stops as
//!   soon as every named slot has a hero
//!
//! Both drive their sink through [`drive_pass`], which turns decoder faults
//! and panics raised while consuming the stream into
//! [`ParserError::CorruptStream`].

pub mod players;
pub mod reports;

pub use players::extract_player_info;
pub use reports::parse_replay;

use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{error, warn};

use crate::error::{ParserError, Result};
use crate::stream::{EventSink, EventSource, PacketKind, PacketMarker, StreamError, Tick};

/// Whose reports a pass collects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportTarget {
    /// Every controller is a potential reporter.
    #[default]
    All,
    /// Reports made by anyone except the player in this slot. The SteamID is
    /// learned from the roster.
    Slot(usize),
    /// Reports made by anyone except this player. The slot is learned from
    /// the roster.
    SteamId(u64),
}

impl fmt::Display for ReportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportTarget::All => write!(f, "all players"),
            ReportTarget::Slot(slot) => write!(f, "slot {slot}"),
            ReportTarget::SteamId(steam_id) => write!(f, "SteamID {steam_id}"),
        }
    }
}

/// Packet bookkeeping used to annotate stream failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassDiagnostics {
    /// Most recent tick notification.
    pub current_tick: Tick,
    /// Demo packets seen.
    pub demo_packets: u32,
    /// Packet entities messages seen.
    pub entity_packets: u32,
    /// Last demo packet.
    pub last_demo_packet: Option<PacketMarker>,
    /// Last packet entities message.
    pub last_entity_packet: Option<PacketMarker>,
}

impl PassDiagnostics {
    /// Records a tick notification.
    pub fn observe_tick(&mut self, tick: Tick) {
        self.current_tick = tick;
    }

    /// Records a packet marker, warning about suspicious sizes.
    pub fn observe_packet(&mut self, marker: PacketMarker) {
        match marker.kind {
            PacketKind::Demo => {
                self.demo_packets += 1;
                if marker.size == 0 {
                    warn!(tick = marker.tick, "demo packet has an empty data buffer");
                }
                self.last_demo_packet = Some(marker);
            }
            PacketKind::Entities => {
                self.entity_packets += 1;
                let entries = usize::try_from(marker.updated_entries).unwrap_or(0);
                if entries > 0 {
                    if marker.size == 0 {
                        warn!(
                            tick = marker.tick,
                            updated_entries = entries,
                            "packet entities has updated entries but an empty buffer"
                        );
                    } else if marker.size < entries {
                        warn!(
                            tick = marker.tick,
                            updated_entries = entries,
                            size = marker.size,
                            "packet entities buffer is smaller than its entry count"
                        );
                    }
                }
                self.last_entity_packet = Some(marker);
            }
        }
    }

    /// Describes the last packets seen, for error messages.
    #[must_use]
    pub fn context(&self) -> String {
        let mut parts = Vec::new();
        if let Some(demo) = self.last_demo_packet {
            parts.push(format!(
                "last demo packet: tick={}, size={}",
                demo.tick, demo.size
            ));
        }
        if let Some(entities) = self.last_entity_packet {
            parts.push(format!(
                "last packet entities: tick={}, updated_entries={}, size={}",
                entities.tick, entities.updated_entries, entities.size
            ));
        }
        if parts.is_empty() {
            return "no packet context available".to_string();
        }
        parts.push(format!(
            "demo_packets={}, entity_packets={}",
            self.demo_packets, self.entity_packets
        ));
        parts.join("; ")
    }
}

/// An [`EventSink`] that keeps [`PassDiagnostics`].
pub trait PassSink: EventSink {
    /// Returns the sink's diagnostics.
    fn diagnostics(&self) -> &PassDiagnostics;
}

/// Drives `sink` through `source`.
///
/// Errors raised by the sink are returned unchanged. Decoder faults and
/// panics are returned as [`ParserError::CorruptStream`] annotated with the
/// sink's diagnostics.
///
/// # Errors
///
/// See above.
pub fn drive_pass<S, K>(source: &mut S, sink: &mut K) -> Result<()>
where
    S: EventSource + ?Sized,
    K: PassSink,
{
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| source.drive(sink)));

    let reason = match outcome {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(StreamError::Sink(err))) => return Err(err),
        Ok(Err(StreamError::Decode(reason))) => reason,
        Err(payload) => panic_reason(&*payload),
    };

    let diagnostics = sink.diagnostics();
    let context = diagnostics.context();
    error!(
        tick = diagnostics.current_tick,
        reason = %reason,
        context = %context,
        "event stream failed"
    );
    Err(ParserError::CorruptStream {
        tick: diagnostics.current_tick,
        reason,
        context,
    })
}

fn panic_reason(payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("panic: {message}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::{EntityOp, EntitySnapshot, RecordedSource};
    use std::ops::ControlFlow;

    #[derive(Default)]
    struct TickSink {
        diagnostics: PassDiagnostics,
        panic_at: Option<Tick>,
        fail_at: Option<Tick>,
    }

    impl EventSink for TickSink {
        fn on_tick(&mut self, tick: Tick) -> Result<ControlFlow<()>> {
            self.diagnostics.observe_tick(tick);
            if self.panic_at == Some(tick) {
                panic!("index out of range");
            }
            if self.fail_at == Some(tick) {
                return Err(ParserError::MissingEndTime);
            }
            Ok(ControlFlow::Continue(()))
        }

        fn on_game_state(&mut self, _state: i32) -> Result<()> {
            Ok(())
        }

        fn on_entity(&mut self, _entity: &dyn EntitySnapshot, _op: EntityOp) -> Result<()> {
            Ok(())
        }

        fn on_packet(&mut self, marker: PacketMarker) {
            self.diagnostics.observe_packet(marker);
        }
    }

    impl PassSink for TickSink {
        fn diagnostics(&self) -> &PassDiagnostics {
            &self.diagnostics
        }
    }

    fn marker(kind: PacketKind, tick: Tick, size: usize, updated_entries: i32) -> PacketMarker {
        PacketMarker {
            kind,
            tick,
            size,
            updated_entries,
        }
    }

    #[test]
    fn test_context_without_packets() {
        assert_eq!(
            PassDiagnostics::default().context(),
            "no packet context available"
        );
    }

    #[test]
    fn test_context_with_packets() {
        let mut diagnostics = PassDiagnostics::default();
        diagnostics.observe_packet(marker(PacketKind::Demo, 10, 300, 0));
        diagnostics.observe_packet(marker(PacketKind::Entities, 11, 40, 12));
        diagnostics.observe_packet(marker(PacketKind::Entities, 12, 50, 3));

        assert_eq!(
            diagnostics.context(),
            "last demo packet: tick=10, size=300; \
             last packet entities: tick=12, updated_entries=3, size=50; \
             demo_packets=1, entity_packets=2"
        );
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_small_entity_buffer_warns() {
        let mut diagnostics = PassDiagnostics::default();
        diagnostics.observe_packet(marker(PacketKind::Entities, 5, 4, 9));
        diagnostics.observe_packet(marker(PacketKind::Demo, 6, 0, 0));

        assert!(logs_contain("smaller than its entry count"));
        assert!(logs_contain("empty data buffer"));
    }

    #[test]
    fn test_decode_fault_becomes_corrupt_stream() {
        let mut source = RecordedSource::default();
        source.tick(7).fault("insufficient buffer");
        source.push(crate::stream::RecordedEvent::Packet(marker(PacketKind::Demo, 7, 0, 0)));

        let mut sink = TickSink::default();
        let err = drive_pass(&mut source, &mut sink).unwrap_err();

        match err {
            ParserError::CorruptStream {
                tick,
                reason,
                context,
            } => {
                assert_eq!(tick, 7);
                assert_eq!(reason, "insufficient buffer");
                assert_eq!(context, "no packet context available");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_panic_becomes_corrupt_stream() {
        let mut source = RecordedSource::default();
        source.tick(1).tick(2).tick(3);

        let mut sink = TickSink {
            panic_at: Some(2),
            ..TickSink::default()
        };
        let err = drive_pass(&mut source, &mut sink).unwrap_err();

        assert!(matches!(
            err,
            ParserError::CorruptStream { tick: 2, ref reason, .. } if reason == "panic: index out of range"
        ));
    }

    #[test]
    fn test_sink_error_passes_through() {
        let mut source = RecordedSource::default();
        source.tick(1).tick(2);

        let mut sink = TickSink {
            fail_at: Some(1),
            ..TickSink::default()
        };
        let err = drive_pass(&mut source, &mut sink).unwrap_err();

        assert!(matches!(err, ParserError::MissingEndTime));
    }

    #[test]
    fn test_report_target_display() {
        assert_eq!(ReportTarget::All.to_string(), "all players");
        assert_eq!(ReportTarget::Slot(4).to_string(), "slot 4");
        assert_eq!(ReportTarget::SteamId(9).to_string(), "SteamID 9");
    }
}
