//! Core score types for the adlibmate player.
//!
//! This crate defines the data model shared across the workspace: musical
//! time in quarter-note units, scientific pitch, the notated score document
//! that format parsers emit, and the note occurrences the playback engine
//! consumes. It also carries the data shapes of the solo-generation backend
//! boundary.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod occurrence;
mod pitch;
mod quarter_time;
pub mod score;
mod solo;

pub use occurrence::NoteOccurrence;
pub use pitch::{ParsePitchError, Pitch, PitchLetter};
pub use quarter_time::{QuarterTime, SUB_QUARTER_UNIT};
pub use score::{Entry, EntryKind, Measure, NotatedScore, Voice};
pub use solo::{
    AnalysisResponse, ChordMeasure, Difficulty, GenerationRequest, GenerationResponse, SoloConfig,
    SoloInstrument,
};
