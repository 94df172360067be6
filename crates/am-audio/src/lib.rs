//! Audio output and software synthesis for the adlibmate player.
//!
//! `SoloSynth` implements the engine's sound-sink contract with a small
//! fixed-capacity voice pool; `CpalOutput` pushes its frames to the default
//! audio device through a ring buffer.

use std::fmt;

mod cpal_backend;
mod synth;
mod voice;

pub use cpal_backend::CpalOutput;
pub use synth::{SoloSynth, MAX_VOICES};

/// One stereo output frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Frame {
    pub left: f32,
    pub right: f32,
}

impl Frame {
    pub const fn silence() -> Self {
        Self { left: 0.0, right: 0.0 }
    }

    pub fn is_silent(self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

/// Error type for audio device operations.
#[derive(Debug)]
pub enum AudioError {
    /// No audio output device available
    NoDevice,
    /// Failed to query or configure the output device
    DeviceInit(String),
    /// Failed to create the audio stream
    StreamCreate(String),
    /// Stream playback error
    Playback(String),
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AudioError::NoDevice => write!(f, "no audio output device available"),
            AudioError::DeviceInit(msg) => write!(f, "device init error: {}", msg),
            AudioError::StreamCreate(msg) => write!(f, "stream create error: {}", msg),
            AudioError::Playback(msg) => write!(f, "playback error: {}", msg),
        }
    }
}

impl std::error::Error for AudioError {}
