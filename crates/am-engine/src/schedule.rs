//! Schedule building: musical time → wall-clock trigger offsets.

use alloc::vec::Vec;
use core::fmt;

use am_score::{NoteOccurrence, Pitch};

/// One trigger in a built schedule. Immutable once built.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScheduleEntry {
    /// Seconds from playback start
    pub offset_seconds: f64,
    /// Sounding length in seconds
    pub duration_seconds: f64,
    pub pitch: Pitch,
    /// Measure index carried through for observer/cursor sync
    pub measure: u32,
}

/// A time-sorted sequence of triggers, owned by the transport while loaded.
///
/// Entries are sorted by `offset_seconds`; simultaneous entries keep the
/// order they were built in (the sort is stable).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    entries: Vec<ScheduleEntry>,
}

impl Schedule {
    /// A schedule with nothing to play.
    pub const fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// When the last sounding note ends: the natural-completion horizon.
    pub fn end_seconds(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.offset_seconds + e.duration_seconds)
            .fold(0.0, f64::max)
    }
}

/// Error type for schedule building.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScheduleError {
    /// Tempo was zero, negative, or not finite
    InvalidTempo(f64),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidTempo(bpm) => {
                write!(f, "invalid tempo: {} BPM (must be positive and finite)", bpm)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ScheduleError {}

/// Convert occurrences at `bpm` beats per minute into a sorted schedule.
///
/// Pure: the same occurrences and tempo always produce bit-identical
/// output. The tempo is validated before anything is consumed, so a bad
/// call mutates nothing.
pub fn build_schedule<I>(occurrences: I, bpm: f64) -> Result<Schedule, ScheduleError>
where
    I: Iterator<Item = NoteOccurrence>,
{
    if !bpm.is_finite() || bpm <= 0.0 {
        return Err(ScheduleError::InvalidTempo(bpm));
    }
    let seconds_per_quarter = 60.0 / bpm;

    let mut entries: Vec<ScheduleEntry> = occurrences
        .map(|occ| ScheduleEntry {
            offset_seconds: occ.time.to_seconds(seconds_per_quarter),
            duration_seconds: occ.duration.to_seconds(seconds_per_quarter),
            pitch: occ.pitch,
            measure: occ.measure,
        })
        .collect();

    // Stable: simultaneous notes keep their traversal order. Swing can push
    // a delayed off-beat past an unshifted neighbor; this restores global
    // offset order.
    entries.sort_by(|a, b| a.offset_seconds.total_cmp(&b.offset_seconds));

    Ok(Schedule { entries })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use am_score::{PitchLetter, QuarterTime};

    fn q(hundredths: u64) -> QuarterTime {
        QuarterTime::from_hundredths(hundredths)
    }

    fn occ(time_hundredths: u64, duration_hundredths: u64, letter: PitchLetter) -> NoteOccurrence {
        NoteOccurrence::new(
            q(time_hundredths),
            q(duration_hundredths),
            Pitch::new(letter, 0, 4),
            0,
        )
    }

    #[test]
    fn converts_quarters_to_seconds_at_120_bpm() {
        // 120 BPM → 0.5 s per quarter; quarter 1.0 with duration 0.5
        let schedule =
            build_schedule([occ(100, 50, PitchLetter::C)].into_iter(), 120.0).unwrap();
        assert_eq!(schedule.entries()[0].offset_seconds, 0.5);
        assert_eq!(schedule.entries()[0].duration_seconds, 0.25);
    }

    #[test]
    fn rejects_zero_and_negative_tempo() {
        assert_eq!(
            build_schedule([].into_iter(), 0.0),
            Err(ScheduleError::InvalidTempo(0.0))
        );
        assert_eq!(
            build_schedule([].into_iter(), -10.0),
            Err(ScheduleError::InvalidTempo(-10.0))
        );
    }

    #[test]
    fn rejects_non_finite_tempo() {
        assert!(build_schedule([].into_iter(), f64::NAN).is_err());
        assert!(build_schedule([].into_iter(), f64::INFINITY).is_err());
    }

    #[test]
    fn tempo_is_checked_before_consuming_input() {
        // The iterator is never advanced on a bad tempo.
        let mut pulled = 0usize;
        let probe = core::iter::from_fn(|| {
            pulled += 1;
            Some(occ(0, 50, PitchLetter::C))
        })
        .take(4);
        assert!(build_schedule(probe, -1.0).is_err());
        assert_eq!(pulled, 0);
    }

    #[test]
    fn fractional_tempo_scales_offsets() {
        use approx::assert_relative_eq;
        let schedule = build_schedule([occ(100, 50, PitchLetter::C)].into_iter(), 140.0).unwrap();
        assert_relative_eq!(schedule.entries()[0].offset_seconds, 60.0 / 140.0, epsilon = 1e-12);
        assert_relative_eq!(schedule.entries()[0].duration_seconds, 30.0 / 140.0, epsilon = 1e-12);
    }

    #[test]
    fn output_is_sorted_by_offset() {
        // Swing-displaced input arrives slightly out of order
        let input = vec![
            occ(66, 34, PitchLetter::D),
            occ(60, 40, PitchLetter::E),
            occ(0, 50, PitchLetter::C),
        ];
        let schedule = build_schedule(input.into_iter(), 60.0).unwrap();
        let offsets: Vec<_> = schedule.entries().iter().map(|e| e.offset_seconds).collect();
        assert_eq!(offsets, vec![0.0, 0.6, 0.66]);
    }

    #[test]
    fn simultaneous_entries_keep_input_order() {
        let input = vec![
            occ(0, 100, PitchLetter::C),
            occ(0, 100, PitchLetter::E),
            occ(0, 100, PitchLetter::G),
        ];
        let schedule = build_schedule(input.into_iter(), 90.0).unwrap();
        let letters: Vec<_> = schedule.entries().iter().map(|e| e.pitch.letter).collect();
        assert_eq!(letters, vec![PitchLetter::C, PitchLetter::E, PitchLetter::G]);
    }

    #[test]
    fn build_is_deterministic() {
        let input = vec![
            occ(0, 50, PitchLetter::C),
            occ(50, 50, PitchLetter::D),
            occ(100, 100, PitchLetter::E),
        ];
        let first = build_schedule(input.iter().copied(), 132.5).unwrap();
        let second = build_schedule(input.iter().copied(), 132.5).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn end_seconds_is_last_note_release() {
        let input = vec![occ(0, 400, PitchLetter::C), occ(100, 100, PitchLetter::D)];
        let schedule = build_schedule(input.into_iter(), 60.0).unwrap();
        assert_eq!(schedule.end_seconds(), 4.0);
    }

    #[test]
    fn empty_schedule_ends_at_zero() {
        let schedule = build_schedule([].into_iter(), 120.0).unwrap();
        assert!(schedule.is_empty());
        assert_eq!(schedule.end_seconds(), 0.0);
    }
}
