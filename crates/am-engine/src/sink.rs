//! Sound sink and playback observer contracts.
//!
//! The transport is the sole caller of a sink; pause and stop always reach
//! `silence_all`, which is what keeps notes from hanging across state
//! transitions.

use alloc::string::String;
use core::fmt;

use am_score::Pitch;

/// Error from a sink operation. Non-fatal: the transport logs trigger
/// failures and keeps playing; silence failures are logged but never skip
/// the state transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SinkError(pub String);

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink error: {}", self.0)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SinkError {}

/// The audible collaborator the transport drives.
pub trait SoundSink {
    /// Start sounding `pitch` for `duration_seconds`. `at_seconds` is the
    /// logical schedule offset of the trigger; implementations that cannot
    /// schedule ahead treat the call as "sound now". Must not block.
    fn trigger(&mut self, pitch: Pitch, duration_seconds: f64, at_seconds: f64)
        -> Result<(), SinkError>;

    /// Immediately silence everything this sink is sounding.
    fn silence_all(&mut self) -> Result<(), SinkError>;
}

/// Receives playback progress for visual sync (score cursor, UI).
///
/// The transport never depends on an observer succeeding; implementations
/// must not block.
pub trait PlaybackObserver {
    /// A trigger fired: the note's measure index and logical offset.
    fn on_trigger(&mut self, measure: u32, offset_seconds: f64);

    /// The playback position returned to the start (stop or natural
    /// completion); visual cursors reset here.
    fn on_reset(&mut self) {}
}

/// Observer that ignores every notification.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl PlaybackObserver for NullObserver {
    fn on_trigger(&mut self, _measure: u32, _offset_seconds: f64) {}
}
