//! Score document parsers for the adlibmate player.
//!
//! Parses MusicXML (score-partwise) documents into the `am-score` model.

use std::fmt;

mod musicxml;

pub use musicxml::load_musicxml;

/// Error type for score loading.
///
/// A load failure is surfaced to the caller as-is; there is nothing to
/// retry, and a failed load never disturbs a previously loaded score.
#[derive(Debug)]
pub enum ScoreLoadError {
    /// Document is not well-formed XML
    InvalidXml(String),
    /// Root element is not a `score-partwise` document
    UnsupportedDocument,
    /// Document has no `<part>` to play
    NoParts,
    /// A note appeared before any `<divisions>` declaration
    MissingDivisions { measure: u32 },
    /// A numeric element could not be read
    BadNumber { measure: u32, element: &'static str },
}

impl fmt::Display for ScoreLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreLoadError::InvalidXml(msg) => write!(f, "invalid XML: {}", msg),
            ScoreLoadError::UnsupportedDocument => {
                write!(f, "not a score-partwise MusicXML document")
            }
            ScoreLoadError::NoParts => write!(f, "score contains no parts"),
            ScoreLoadError::MissingDivisions { measure } => {
                write!(f, "measure {}: note before <divisions> was declared", measure + 1)
            }
            ScoreLoadError::BadNumber { measure, element } => {
                write!(f, "measure {}: unreadable <{}> value", measure + 1, element)
            }
        }
    }
}

impl std::error::Error for ScoreLoadError {}
