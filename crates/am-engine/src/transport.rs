//! Transport: the state machine that plays a schedule against a clock.
//!
//! The transport owns the active schedule and a generation counter. It is
//! single-threaded by construction: the owner calls `tick` with the current
//! clock reading (seconds) from whatever thread drives playback, and every
//! state mutation happens there. "Armed timers" are the not-yet-fired
//! entries at and beyond the cursor, stamped with the generation current
//! when playback started; cancellation bumps the generation, so a stale
//! arming can never fire again.

use core::fmt;

use crate::schedule::Schedule;
use crate::sink::{PlaybackObserver, SoundSink};

/// Playback state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransportState::Stopped => "stopped",
            TransportState::Playing => "playing",
            TransportState::Paused => "paused",
        };
        f.write_str(name)
    }
}

/// Error type for illegal state-machine calls.
///
/// Non-fatal: the transport is left exactly as it was; the caller may
/// inspect `Transport::state` and retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportError {
    InvalidTransition {
        from: TransportState,
        action: &'static str,
    },
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::InvalidTransition { from, action } => {
                write!(f, "cannot {} while {}", action, from)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for TransportError {}

/// Drives a schedule's triggers into a sound sink in real time.
pub struct Transport {
    schedule: Schedule,
    state: TransportState,
    /// Bumped on load and on every cancellation (pause/stop); armed
    /// triggers from an older generation are dead.
    generation: u64,
    /// Generation stamped on the armed entries at the last `play`.
    armed_generation: u64,
    /// Elapsed seconds into the schedule, while paused or stopped.
    position: f64,
    /// Clock reading corresponding to schedule offset 0, while playing.
    origin: f64,
    /// Index of the next entry to fire.
    cursor: usize,
}

impl Transport {
    pub fn new() -> Self {
        Self {
            schedule: Schedule::empty(),
            state: TransportState::Stopped,
            generation: 0,
            armed_generation: 0,
            position: 0.0,
            origin: 0.0,
            cursor: 0,
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    /// Current generation; increases on every load and cancellation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Elapsed playback position in seconds at clock reading `now`.
    pub fn position_seconds(&self, now: f64) -> f64 {
        match self.state {
            TransportState::Playing => now - self.origin,
            _ => self.position,
        }
    }

    /// Replace the active schedule. Legal only while stopped; invalidates
    /// every previously armed trigger and rewinds to the start.
    pub fn load(&mut self, schedule: Schedule) -> Result<(), TransportError> {
        if self.state != TransportState::Stopped {
            return Err(TransportError::InvalidTransition { from: self.state, action: "load" });
        }
        self.schedule = schedule;
        self.generation += 1;
        self.position = 0.0;
        self.cursor = 0;
        Ok(())
    }

    /// Start from the beginning (stopped) or resume (paused) at clock
    /// reading `now`. Entries before the held position stay fired and are
    /// never re-triggered.
    pub fn play(&mut self, now: f64) -> Result<(), TransportError> {
        match self.state {
            TransportState::Stopped | TransportState::Paused => {}
            TransportState::Playing => {
                return Err(TransportError::InvalidTransition { from: self.state, action: "play" })
            }
        }
        self.origin = now - self.position;
        self.armed_generation = self.generation;
        self.state = TransportState::Playing;
        Ok(())
    }

    /// Freeze the clock, cancel every armed trigger, and silence the sink.
    /// Legal only while playing.
    ///
    /// The silence call is unconditional: it happens even though the armed
    /// triggers were already cancelled, and a failure is logged without
    /// blocking the transition.
    pub fn pause(&mut self, now: f64, sink: &mut dyn SoundSink) -> Result<(), TransportError> {
        if self.state != TransportState::Playing {
            return Err(TransportError::InvalidTransition { from: self.state, action: "pause" });
        }
        self.position = now - self.origin;
        self.generation += 1;
        self.state = TransportState::Paused;
        if let Err(err) = sink.silence_all() {
            log::warn!("silence-all failed on pause: {}", err);
        }
        Ok(())
    }

    /// Cancel every armed trigger, silence the sink, rewind to the start,
    /// and reset the observer's cursor. Legal from playing or paused.
    pub fn stop(
        &mut self,
        sink: &mut dyn SoundSink,
        observer: &mut dyn PlaybackObserver,
    ) -> Result<(), TransportError> {
        match self.state {
            TransportState::Playing | TransportState::Paused => {}
            TransportState::Stopped => {
                return Err(TransportError::InvalidTransition { from: self.state, action: "stop" })
            }
        }
        self.generation += 1;
        self.position = 0.0;
        self.cursor = 0;
        self.state = TransportState::Stopped;
        if let Err(err) = sink.silence_all() {
            log::warn!("silence-all failed on stop: {}", err);
        }
        observer.on_reset();
        Ok(())
    }

    /// Fire every armed trigger whose offset has elapsed by clock reading
    /// `now`, in offset order. No-op unless playing.
    ///
    /// Trigger failures are logged and playback continues; the sink contract
    /// is fire-and-forget. When the schedule's horizon passes, the transport
    /// completes naturally: back to stopped, position 0, observer reset —
    /// without a silence call, since every note has run out its duration.
    pub fn tick(&mut self, now: f64, sink: &mut dyn SoundSink, observer: &mut dyn PlaybackObserver) {
        if self.state != TransportState::Playing {
            return;
        }
        let elapsed = now - self.origin;

        while self.cursor < self.schedule.len() {
            let entry = self.schedule.entries()[self.cursor];
            if entry.offset_seconds > elapsed {
                break;
            }
            // Dead arming: cancelled or rebuilt since these were armed.
            if self.armed_generation != self.generation {
                return;
            }
            if let Err(err) = sink.trigger(entry.pitch, entry.duration_seconds, entry.offset_seconds)
            {
                log::warn!("trigger failed for {}: {}", entry.pitch, err);
            }
            observer.on_trigger(entry.measure, entry.offset_seconds);
            self.cursor += 1;
        }

        if self.cursor >= self.schedule.len() && elapsed >= self.schedule.end_seconds() {
            self.generation += 1;
            self.position = 0.0;
            self.cursor = 0;
            self.state = TransportState::Stopped;
            observer.on_reset();
        }
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::build_schedule;
    use crate::sink::SinkError;
    use alloc::string::{String, ToString};
    use alloc::vec;
    use alloc::vec::Vec;
    use am_score::{NoteOccurrence, Pitch, PitchLetter, QuarterTime};

    /// Sink that records triggers and counts silence calls.
    #[derive(Default)]
    struct RecordingSink {
        triggers: Vec<(String, f64)>,
        silences: usize,
        fail_triggers: bool,
        fail_silence: bool,
    }

    impl SoundSink for RecordingSink {
        fn trigger(&mut self, pitch: Pitch, _dur: f64, at: f64) -> Result<(), SinkError> {
            if self.fail_triggers {
                return Err(SinkError("injected trigger failure".to_string()));
            }
            self.triggers.push((pitch.to_string(), at));
            Ok(())
        }

        fn silence_all(&mut self) -> Result<(), SinkError> {
            self.silences += 1;
            if self.fail_silence {
                return Err(SinkError("injected silence failure".to_string()));
            }
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingObserver {
        measures: Vec<u32>,
        resets: usize,
    }

    impl PlaybackObserver for RecordingObserver {
        fn on_trigger(&mut self, measure: u32, _offset: f64) {
            self.measures.push(measure);
        }

        fn on_reset(&mut self) {
            self.resets += 1;
        }
    }

    fn q(hundredths: u64) -> QuarterTime {
        QuarterTime::from_hundredths(hundredths)
    }

    fn note(time_hundredths: u64, letter: PitchLetter, measure: u32) -> NoteOccurrence {
        NoteOccurrence::new(q(time_hundredths), q(50), Pitch::new(letter, 0, 4), measure)
    }

    /// Three notes at 0.0 / 0.5 / 1.0 s (60 BPM eighths on beat one).
    fn three_note_schedule() -> Schedule {
        build_schedule(
            [
                note(0, PitchLetter::C, 0),
                note(50, PitchLetter::D, 0),
                note(100, PitchLetter::E, 1),
            ]
            .into_iter(),
            60.0,
        )
        .unwrap()
    }

    fn loaded_transport() -> Transport {
        let mut transport = Transport::new();
        transport.load(three_note_schedule()).unwrap();
        transport
    }

    #[test]
    fn starts_stopped_with_position_zero() {
        let transport = Transport::new();
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position_seconds(123.0), 0.0);
    }

    #[test]
    fn load_is_illegal_while_playing() {
        let mut transport = loaded_transport();
        transport.play(0.0).unwrap();
        let err = transport.load(Schedule::empty()).unwrap_err();
        assert_eq!(
            err,
            TransportError::InvalidTransition { from: TransportState::Playing, action: "load" }
        );
    }

    #[test]
    fn load_increments_generation() {
        let mut transport = Transport::new();
        let before = transport.generation();
        transport.load(three_note_schedule()).unwrap();
        assert_eq!(transport.generation(), before + 1);
    }

    #[test]
    fn tick_fires_entries_as_their_offsets_elapse() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(10.0).unwrap();
        transport.tick(10.0, &mut sink, &mut observer);
        assert_eq!(sink.triggers, vec![("C4".to_string(), 0.0)]);

        transport.tick(10.4, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 1);

        transport.tick(10.6, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 2);
        assert_eq!(sink.triggers[1], ("D4".to_string(), 0.5));
    }

    #[test]
    fn late_tick_fires_everything_due_in_order() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(1.0, &mut sink, &mut observer);

        let fired: Vec<_> = sink.triggers.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(fired, vec!["C4", "D4", "E4"]);
    }

    #[test]
    fn observer_sees_measure_indices() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(1.0, &mut sink, &mut observer);
        assert_eq!(observer.measures, vec![0, 0, 1]);
    }

    #[test]
    fn pause_from_stopped_fails_and_leaves_state_unchanged() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();

        let err = transport.pause(0.0, &mut sink).unwrap_err();
        assert_eq!(
            err,
            TransportError::InvalidTransition { from: TransportState::Stopped, action: "pause" }
        );
        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(sink.silences, 0);
    }

    #[test]
    fn pause_silences_and_cancels_armed_triggers() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(0.0, &mut sink, &mut observer);
        transport.pause(0.3, &mut sink).unwrap();

        assert_eq!(transport.state(), TransportState::Paused);
        assert_eq!(sink.silences, 1);
        assert_eq!(transport.position_seconds(99.0), 0.3);

        // Nothing fires while paused, however late the clock gets.
        transport.tick(100.0, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 1);
    }

    #[test]
    fn resume_continues_without_refiring() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(0.1, &mut sink, &mut observer); // fires C4
        transport.pause(0.3, &mut sink).unwrap();

        // Resume much later on the wall clock; logical position is 0.3.
        transport.play(50.0).unwrap();
        transport.tick(50.1, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 1, "nothing due yet at position 0.4");

        transport.tick(50.3, &mut sink, &mut observer); // position 0.6 → D4
        let fired: Vec<_> = sink.triggers.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(fired, vec!["C4", "D4"]);
    }

    #[test]
    fn stop_from_playing_resets_position_and_silences_once() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(0.1, &mut sink, &mut observer);
        transport.stop(&mut sink, &mut observer).unwrap();

        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position_seconds(7.0), 0.0);
        assert_eq!(sink.silences, 1);
        assert_eq!(observer.resets, 1);
    }

    #[test]
    fn stop_from_paused_resets_position_and_silences_once() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.pause(0.2, &mut sink).unwrap();
        sink.silences = 0;
        transport.stop(&mut sink, &mut observer).unwrap();

        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position_seconds(0.0), 0.0);
        assert_eq!(sink.silences, 1);
        assert_eq!(observer.resets, 1);
    }

    #[test]
    fn stop_from_stopped_fails() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        let err = transport.stop(&mut sink, &mut observer).unwrap_err();
        assert_eq!(
            err,
            TransportError::InvalidTransition { from: TransportState::Stopped, action: "stop" }
        );
        assert_eq!(sink.silences, 0);
    }

    #[test]
    fn replay_after_stop_starts_from_the_top() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(1.0, &mut sink, &mut observer);
        transport.stop(&mut sink, &mut observer).unwrap();

        transport.play(20.0).unwrap();
        transport.tick(20.0, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 4);
        assert_eq!(sink.triggers[3], ("C4".to_string(), 0.0));
    }

    #[test]
    fn rebuild_invalidates_old_arming() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(0.1, &mut sink, &mut observer);
        transport.stop(&mut sink, &mut observer).unwrap();

        // Rebuild with a different score: only the new entries can fire.
        let replacement =
            build_schedule([note(0, PitchLetter::G, 5)].into_iter(), 60.0).unwrap();
        transport.load(replacement).unwrap();
        transport.play(30.0).unwrap();
        transport.tick(31.0, &mut sink, &mut observer);

        assert_eq!(sink.triggers.last().unwrap().0, "G4");
        assert_eq!(observer.measures.last(), Some(&5));
    }

    #[test]
    fn natural_completion_stops_and_resets() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        // Horizon: last note starts at 1.0 s and lasts 0.5 s.
        transport.tick(1.6, &mut sink, &mut observer);

        assert_eq!(transport.state(), TransportState::Stopped);
        assert_eq!(transport.position_seconds(99.0), 0.0);
        assert_eq!(observer.resets, 1);
        // Completion lets notes decay on their own; no forced silence.
        assert_eq!(sink.silences, 0);
    }

    #[test]
    fn completion_waits_for_the_last_duration() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(1.2, &mut sink, &mut observer);
        assert_eq!(sink.triggers.len(), 3, "all triggers fired");
        assert_eq!(transport.state(), TransportState::Playing, "last note still sounding");

        transport.tick(1.5, &mut sink, &mut observer);
        assert_eq!(transport.state(), TransportState::Stopped);
    }

    #[test]
    fn trigger_failure_does_not_halt_playback() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink { fail_triggers: true, ..Default::default() };
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(1.0, &mut sink, &mut observer);

        // All three entries were attempted (observer saw them) despite errors.
        assert_eq!(observer.measures.len(), 3);
        assert_eq!(transport.state(), TransportState::Playing);
    }

    #[test]
    fn silence_failure_still_transitions() {
        let mut transport = loaded_transport();
        let mut sink = RecordingSink { fail_silence: true, ..Default::default() };

        transport.play(0.0).unwrap();
        transport.pause(0.2, &mut sink).unwrap();
        assert_eq!(transport.state(), TransportState::Paused);
        assert_eq!(sink.silences, 1, "silence-all was still attempted");
    }

    #[test]
    fn position_tracks_the_clock_while_playing() {
        let mut transport = loaded_transport();
        transport.play(5.0).unwrap();
        assert_eq!(transport.position_seconds(5.75), 0.75);
    }

    #[test]
    fn empty_schedule_completes_immediately() {
        let mut transport = Transport::new();
        transport.load(Schedule::empty()).unwrap();
        let mut sink = RecordingSink::default();
        let mut observer = RecordingObserver::default();

        transport.play(0.0).unwrap();
        transport.tick(0.0, &mut sink, &mut observer);
        assert_eq!(transport.state(), TransportState::Stopped);
        assert!(sink.triggers.is_empty());
    }
}
