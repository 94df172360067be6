//! Playback scheduling engine for the adlibmate player.
//!
//! Turns a notated score into audible triggers in four stages:
//! traversal (score → note occurrences) → swing transform (off-beat delay)
//! → schedule builder (musical time → wall-clock offsets) → transport
//! (state machine firing triggers into a sound sink against a clock).
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod schedule;
mod sink;
mod swing;
mod transport;
mod traverse;

pub use schedule::{build_schedule, Schedule, ScheduleEntry, ScheduleError};
pub use sink::{NullObserver, PlaybackObserver, SinkError, SoundSink};
pub use swing::{apply_swing, SwingConfig, MIN_SWUNG_DURATION};
pub use transport::{Transport, TransportError, TransportState};
pub use traverse::{traverse, NoteCursor};
