//! Score traversal: document model → flat note occurrences.
//!
//! Walks a score's measures in order, merging each measure's voices by
//! start time so the output is non-decreasing in musical time — the same
//! order a rendering engine's playback cursor visits notes. Rests are
//! skipped; entries without a resolvable pitch are dropped silently (their
//! time was already accounted for when the score was built).

use alloc::vec::Vec;

use am_score::{EntryKind, NotatedScore, NoteOccurrence};

/// Begin a traversal of `score`.
///
/// The returned cursor is lazy and restartable: call `traverse` again for a
/// fresh pass; traversal never mutates the score.
pub fn traverse(score: &NotatedScore) -> NoteCursor<'_> {
    NoteCursor { score, measure: 0, voice_pos: Vec::new(), entered: false }
}

/// Lazy iterator over a score's pitched notes in musical order.
pub struct NoteCursor<'a> {
    score: &'a NotatedScore,
    /// Index of the measure currently being merged
    measure: usize,
    /// Per-voice position within the current measure
    voice_pos: Vec<usize>,
    /// Whether voice_pos has been set up for the current measure
    entered: bool,
}

impl<'a> NoteCursor<'a> {
    fn enter_measure(&mut self) {
        let voices = self
            .score
            .measures
            .get(self.measure)
            .map(|m| m.voices.len())
            .unwrap_or(0);
        self.voice_pos.clear();
        self.voice_pos.resize(voices, 0);
        self.entered = true;
    }

    /// Pick the voice whose next entry starts earliest; ties go to the
    /// lowest voice index, which keeps chord members in notated order.
    fn earliest_voice(&self) -> Option<usize> {
        let measure = self.score.measures.get(self.measure)?;
        let mut best: Option<(usize, am_score::QuarterTime)> = None;
        for (vi, voice) in measure.voices.iter().enumerate() {
            if let Some(entry) = voice.entries.get(self.voice_pos[vi]) {
                if best.map_or(true, |(_, t)| entry.time < t) {
                    best = Some((vi, entry.time));
                }
            }
        }
        best.map(|(vi, _)| vi)
    }
}

impl<'a> Iterator for NoteCursor<'a> {
    type Item = NoteOccurrence;

    fn next(&mut self) -> Option<NoteOccurrence> {
        loop {
            if self.measure >= self.score.measures.len() {
                return None;
            }
            if !self.entered {
                self.enter_measure();
            }

            let Some(vi) = self.earliest_voice() else {
                // Measure exhausted
                self.measure += 1;
                self.entered = false;
                continue;
            };

            let measure = &self.score.measures[self.measure];
            let entry = measure.voices[vi].entries[self.voice_pos[vi]];
            self.voice_pos[vi] += 1;

            if let EntryKind::Note(pitch) = entry.kind {
                return Some(NoteOccurrence::new(entry.time, entry.duration, pitch, measure.index));
            }
            // Rests and unpitched entries occupy time but never sound.
        }
    }
}
