//! The software synthesizer behind the transport's sound sink.

use arrayvec::ArrayVec;

use am_engine::{SinkError, SoundSink};
use am_score::Pitch;

use crate::voice::Voice;
use crate::Frame;

/// Fixed voice-pool capacity. When a trigger arrives with the pool full,
/// the oldest voice is stolen — on the audio path nothing allocates.
pub const MAX_VOICES: usize = 24;

/// Per-voice gain: headroom for a full pool before the output clamp.
const VOICE_GAIN: f32 = 0.25;

/// A polyphonic sine synthesizer implementing the sound-sink contract.
///
/// Triggers sound immediately (the transport already fires them at the
/// right wall-clock instant); `silence_all` puts every voice into a short
/// release ramp, so nothing sticks and nothing clicks.
pub struct SoloSynth {
    sample_rate: u32,
    voices: ArrayVec<Voice, MAX_VOICES>,
}

impl SoloSynth {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate, voices: ArrayVec::new() }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Mix the next frame from all live voices.
    pub fn render_frame(&mut self) -> Frame {
        let mut sum = 0.0f32;
        for voice in &mut self.voices {
            sum += voice.render();
        }
        self.voices.retain(|v| !v.is_finished());

        let sample = (sum * VOICE_GAIN).clamp(-1.0, 1.0);
        Frame { left: sample, right: sample }
    }

    /// True once every voice has finished its release.
    pub fn is_silent(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }
}

impl SoundSink for SoloSynth {
    fn trigger(
        &mut self,
        pitch: Pitch,
        duration_seconds: f64,
        _at_seconds: f64,
    ) -> Result<(), SinkError> {
        if !(duration_seconds > 0.0) {
            return Err(SinkError("non-positive trigger duration".into()));
        }
        if self.voices.is_full() {
            self.voices.remove(0);
            log::debug!("voice pool full; stole the oldest voice");
        }
        self.voices
            .push(Voice::new(pitch.frequency_hz(), duration_seconds, self.sample_rate));
        Ok(())
    }

    fn silence_all(&mut self) -> Result<(), SinkError> {
        for voice in &mut self.voices {
            voice.begin_release();
        }
        Ok(())
    }
}
