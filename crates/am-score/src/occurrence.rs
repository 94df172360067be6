//! The flat note record produced by score traversal.

use crate::pitch::Pitch;
use crate::quarter_time::QuarterTime;

/// A single sounding note, detached from the score's document structure.
///
/// Traversal emits these in non-decreasing `time` order; the swing transform
/// and schedule builder consume them. Immutable once produced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoteOccurrence {
    /// Start, in quarters from piece start
    pub time: QuarterTime,
    /// Sounding length in quarters (> 0)
    pub duration: QuarterTime,
    pub pitch: Pitch,
    /// Zero-based index of the measure the note was notated in
    pub measure: u32,
}

impl NoteOccurrence {
    pub const fn new(time: QuarterTime, duration: QuarterTime, pitch: Pitch, measure: u32) -> Self {
        Self { time, duration, pitch, measure }
    }
}
