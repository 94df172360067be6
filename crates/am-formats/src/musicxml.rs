//! MusicXML (score-partwise) → `NotatedScore`.
//!
//! Reads the subset of MusicXML a generated solo uses: one part, measures
//! with `<divisions>`-based durations, pitched notes, rests, chords,
//! multiple voices with `<backup>`/`<forward>`, and an optional tempo
//! marking. Only the first `<part>` is read — these are solo scores.
//!
//! Timing is resolved while parsing: every emitted entry carries its
//! absolute start in quarters, so downstream consumers never see division
//! units or document order again. Notes whose pitch cannot be resolved
//! become unpitched entries (they occupy time but never sound).

use std::collections::BTreeMap;

use am_score::{Entry, EntryKind, Measure, NotatedScore, Pitch, PitchLetter, QuarterTime, Voice};
use roxmltree::{Document, Node};

use crate::ScoreLoadError;

/// Parse a MusicXML string into a notated score.
pub fn load_musicxml(data: &str) -> Result<NotatedScore, ScoreLoadError> {
    let doc = Document::parse(data).map_err(|e| ScoreLoadError::InvalidXml(e.to_string()))?;
    let root = doc.root_element();
    if root.tag_name().name() != "score-partwise" {
        return Err(ScoreLoadError::UnsupportedDocument);
    }

    let part = root
        .children()
        .find(|n| n.has_tag_name("part"))
        .ok_or(ScoreLoadError::NoParts)?;

    let mut score = NotatedScore::new();
    score.title = find_title(root);

    // Divisions persist across measures until redeclared.
    let mut divisions: u32 = 0;
    let mut measure_start = QuarterTime::zero();

    for (index, measure_node) in part
        .children()
        .filter(|n| n.has_tag_name("measure"))
        .enumerate()
    {
        let index = index as u32;
        let mut builder = MeasureBuilder::new(index, measure_start);

        for element in measure_node.children().filter(Node::is_element) {
            match element.tag_name().name() {
                "attributes" => {
                    if let Some(text) = child_text(element, "divisions") {
                        divisions = parse_number(text, index, "divisions")?;
                    }
                }
                "note" => builder.note(element, divisions)?,
                "backup" => builder.backup(element, divisions)?,
                "forward" => builder.forward(element, divisions)?,
                "direction" | "sound" => {
                    if score.tempo_bpm.is_none() {
                        score.tempo_bpm = find_tempo(element);
                    }
                }
                _ => {}
            }
        }

        let (measure, measure_end) = builder.finish();
        score.measures.push(measure);
        measure_start = measure_end;
    }

    Ok(score)
}

/// Accumulates one measure's voices while tracking the document cursor.
struct MeasureBuilder {
    index: u32,
    /// Current document position, moved by notes/backup/forward
    cursor: QuarterTime,
    /// Furthest position reached; the next measure starts here
    end: QuarterTime,
    /// Start of the most recent non-chord note, shared by chord members
    chord_anchor: QuarterTime,
    voices: BTreeMap<u32, Voice>,
}

impl MeasureBuilder {
    fn new(index: u32, start: QuarterTime) -> Self {
        Self {
            index,
            cursor: start,
            end: start,
            chord_anchor: start,
            voices: BTreeMap::new(),
        }
    }

    fn note(&mut self, element: Node, divisions: u32) -> Result<(), ScoreLoadError> {
        // Grace notes decorate without occupying time; skip them entirely.
        if has_child(element, "grace") {
            return Ok(());
        }
        if divisions == 0 {
            return Err(ScoreLoadError::MissingDivisions { measure: self.index });
        }

        let raw = child_text(element, "duration")
            .ok_or(ScoreLoadError::BadNumber { measure: self.index, element: "duration" })?;
        let amount: u64 = parse_number(raw, self.index, "duration")?;
        let duration = QuarterTime::from_division_units(amount, divisions);

        let is_chord = has_child(element, "chord");
        let start = if is_chord { self.chord_anchor } else { self.cursor };

        let kind = if has_child(element, "rest") {
            EntryKind::Rest
        } else {
            match read_pitch(element) {
                Some(pitch) => EntryKind::Note(pitch),
                None => EntryKind::Unpitched,
            }
        };

        let voice_number = child_text(element, "voice")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(1);
        self.voices
            .entry(voice_number)
            .or_insert_with(|| Voice::new(voice_number))
            .entries
            .push(Entry { time: start, duration, kind });

        if !is_chord {
            self.chord_anchor = start;
            self.cursor = start.add(duration);
            self.end = self.end.max(self.cursor);
        }
        Ok(())
    }

    fn backup(&mut self, element: Node, divisions: u32) -> Result<(), ScoreLoadError> {
        let amount = self.span(element, divisions)?;
        self.cursor = self.cursor.saturating_sub(amount);
        Ok(())
    }

    fn forward(&mut self, element: Node, divisions: u32) -> Result<(), ScoreLoadError> {
        let amount = self.span(element, divisions)?;
        self.cursor = self.cursor.add(amount);
        self.end = self.end.max(self.cursor);
        Ok(())
    }

    fn span(&self, element: Node, divisions: u32) -> Result<QuarterTime, ScoreLoadError> {
        if divisions == 0 {
            return Err(ScoreLoadError::MissingDivisions { measure: self.index });
        }
        let raw = child_text(element, "duration")
            .ok_or(ScoreLoadError::BadNumber { measure: self.index, element: "duration" })?;
        let amount: u64 = parse_number(raw, self.index, "duration")?;
        Ok(QuarterTime::from_division_units(amount, divisions))
    }

    fn finish(self) -> (Measure, QuarterTime) {
        let mut measure = Measure::new(self.index);
        measure.voices = self.voices.into_values().collect();
        (measure, self.end)
    }
}

/// `<pitch><step>B</step><alter>-1</alter><octave>4</octave></pitch>`.
/// Returns None for anything unreadable (including microtonal alters),
/// which the caller records as an unpitched entry.
fn read_pitch(note: Node) -> Option<Pitch> {
    let pitch = note.children().find(|c| c.has_tag_name("pitch"))?;
    let step = child_text(pitch, "step")?.trim().chars().next()?;
    let letter = PitchLetter::from_char(step)?;
    let octave: i8 = child_text(pitch, "octave")?.trim().parse().ok()?;
    let alter: i8 = match child_text(pitch, "alter") {
        Some(text) => text.trim().parse().ok()?,
        None => 0,
    };
    Some(Pitch::new(letter, alter, octave))
}

/// Tempo from a `<sound tempo="…">`, possibly nested in a `<direction>`.
fn find_tempo(element: Node) -> Option<f64> {
    let sound = if element.has_tag_name("sound") {
        element
    } else {
        element.descendants().find(|n| n.has_tag_name("sound"))?
    };
    let tempo: f64 = sound.attribute("tempo")?.trim().parse().ok()?;
    (tempo > 0.0).then_some(tempo)
}

fn find_title(root: Node) -> Option<String> {
    root.children()
        .find(|n| n.has_tag_name("work"))
        .and_then(|w| child_text(w, "work-title"))
        .or_else(|| child_text(root, "movement-title"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children().find(|c| c.has_tag_name(name)).and_then(|c| c.text())
}

fn has_child(node: Node, name: &str) -> bool {
    node.children().any(|c| c.has_tag_name(name))
}

fn parse_number<T: std::str::FromStr>(
    text: &str,
    measure: u32,
    element: &'static str,
) -> Result<T, ScoreLoadError> {
    text.trim()
        .parse()
        .map_err(|_| ScoreLoadError::BadNumber { measure, element })
}
