//! The notated score document model.
//!
//! Format parsers emit this structure; the playback engine's traversal
//! adapter walks it. The model is deliberately flat: measures contain
//! voices, voices contain time-ordered entries, and every entry carries its
//! *absolute* start time and length in quarter-note units, so consumers
//! never re-derive timing from document position.

use alloc::string::String;
use alloc::vec::Vec;

use crate::pitch::Pitch;
use crate::quarter_time::QuarterTime;

/// A loaded, renderable score. Read-only to the playback core.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NotatedScore {
    /// Work or movement title, when the document carries one.
    pub title: Option<String>,
    /// Tempo suggested by the document (`<sound tempo=…>`), if any.
    pub tempo_bpm: Option<f64>,
    pub measures: Vec<Measure>,
}

impl NotatedScore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of pitched note entries (chord members counted
    /// individually).
    pub fn note_count(&self) -> usize {
        self.measures
            .iter()
            .flat_map(|m| &m.voices)
            .flat_map(|v| &v.entries)
            .filter(|e| matches!(e.kind, EntryKind::Note(_)))
            .count()
    }

    /// End of the last sounding or resting entry, in quarters.
    pub fn end_time(&self) -> QuarterTime {
        self.measures
            .iter()
            .flat_map(|m| &m.voices)
            .flat_map(|v| &v.entries)
            .map(|e| e.time.add(e.duration))
            .max()
            .unwrap_or(QuarterTime::zero())
    }
}

/// One measure of the piece, holding its voices in document order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Measure {
    /// Zero-based measure index.
    pub index: u32,
    pub voices: Vec<Voice>,
}

impl Measure {
    pub fn new(index: u32) -> Self {
        Self { index, voices: Vec::new() }
    }
}

/// One voice within a measure: entries ordered by start time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Voice {
    /// Voice number as notated (MusicXML `<voice>`, usually 1-based).
    pub number: u32,
    pub entries: Vec<Entry>,
}

impl Voice {
    pub fn new(number: u32) -> Self {
        Self { number, entries: Vec::new() }
    }
}

/// A single notated entry: a rest, a pitched note, or a note whose pitch
/// could not be resolved (still occupies time, never sounds).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Entry {
    /// Absolute start, in quarters from piece start.
    pub time: QuarterTime,
    /// Notated length in quarters.
    pub duration: QuarterTime,
    pub kind: EntryKind,
}

impl Entry {
    pub const fn rest(time: QuarterTime, duration: QuarterTime) -> Self {
        Self { time, duration, kind: EntryKind::Rest }
    }

    pub const fn note(time: QuarterTime, duration: QuarterTime, pitch: Pitch) -> Self {
        Self { time, duration, kind: EntryKind::Note(pitch) }
    }

    pub const fn unpitched(time: QuarterTime, duration: QuarterTime) -> Self {
        Self { time, duration, kind: EntryKind::Unpitched }
    }
}

/// What an entry notates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EntryKind {
    /// Silence for the entry's duration
    Rest,
    /// A sounding pitch; chord members are separate entries sharing a start
    Note(Pitch),
    /// A note-shaped entry with no resolvable pitch
    Unpitched,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pitch::PitchLetter;

    fn quarter() -> QuarterTime {
        QuarterTime::from_quarters(1)
    }

    #[test]
    fn note_count_skips_rests_and_unpitched() {
        let mut score = NotatedScore::new();
        let mut m = Measure::new(0);
        let mut v = Voice::new(1);
        let c4 = Pitch::new(PitchLetter::C, 0, 4);
        v.entries.push(Entry::note(QuarterTime::zero(), quarter(), c4));
        v.entries.push(Entry::rest(quarter(), quarter()));
        v.entries.push(Entry::unpitched(QuarterTime::from_quarters(2), quarter()));
        m.voices.push(v);
        score.measures.push(m);

        assert_eq!(score.note_count(), 1);
    }

    #[test]
    fn end_time_covers_trailing_rest() {
        let mut score = NotatedScore::new();
        let mut m = Measure::new(0);
        let mut v = Voice::new(1);
        let c4 = Pitch::new(PitchLetter::C, 0, 4);
        v.entries.push(Entry::note(QuarterTime::zero(), quarter(), c4));
        v.entries.push(Entry::rest(quarter(), QuarterTime::from_quarters(3)));
        m.voices.push(v);
        score.measures.push(m);

        assert_eq!(score.end_time(), QuarterTime::from_quarters(4));
    }

    #[test]
    fn empty_score_ends_at_zero() {
        assert_eq!(NotatedScore::new().end_time(), QuarterTime::zero());
    }
}
