//! Boundary data model of the solo-generation backend.
//!
//! The backend itself (chord progression in, notated score + explanation
//! out) is an external collaborator; these types mirror its JSON wire
//! shapes so callers can build requests and decode responses. Transporting
//! them over HTTP is outside this workspace.

use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

/// Requested difficulty of the generated solo.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

/// Instrument the solo should be voiced for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoloInstrument {
    #[default]
    Saxophone,
    Trumpet,
    Piano,
}

/// The chords sounding in one measure, e.g. measure 1: ["Dm7", "G7"].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChordMeasure {
    pub measure_number: u32,
    pub chords: Vec<String>,
}

/// Generation knobs sent alongside the progression.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoloConfig {
    pub difficulty: Difficulty,
    pub instrument: SoloInstrument,
    /// Beats per minute
    pub tempo: u32,
}

impl Default for SoloConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Beginner,
            instrument: SoloInstrument::Saxophone,
            tempo: 120,
        }
    }
}

/// Request body of the generate-solo operation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub chords: Vec<ChordMeasure>,
    pub config: SoloConfig,
}

/// Response of the generate-solo operation: a MusicXML document plus an
/// optional natural-language explanation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub music_xml: String,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Response of the analyze-score operation: the chord progression inferred
/// from an uploaded score image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    pub chords: Vec<ChordMeasure>,
}
