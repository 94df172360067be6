//! Headless playback session for the adlibmate player.
//!
//! `PlaybackSession` owns one session's playback state — the score, the
//! tempo, the swing configuration — and rebuilds the trigger schedule
//! atomically when any of them changes. Real-time playback runs on a
//! dedicated audio thread that owns the synthesizer and the transport;
//! control calls cross to it through a small set of atomics, so every
//! transport mutation still happens on one logical thread.
//!
//! Changes made while playing are deferred: they mark the session dirty
//! and take effect at the next `play` that starts from a stop. A rebuild
//! that fails leaves the previous schedule and the running playback
//! untouched.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use am_audio::{CpalOutput, SoloSynth};
use am_engine::{apply_swing, build_schedule, traverse, NullObserver, PlaybackObserver, Schedule, Transport};
use am_score::NotatedScore;

mod wav;

pub use am_audio::Frame;
pub use am_engine::{ScheduleError, SwingConfig, TransportError, TransportState};
pub use am_formats::ScoreLoadError;
pub use wav::frames_to_wav;

/// Error type for session operations.
#[derive(Debug)]
pub enum SessionError {
    /// No score has been loaded yet
    NoScore,
    /// Schedule rebuild failed; previous state is untouched
    Schedule(ScheduleError),
    /// Illegal play/pause/stop for the current state
    Transport(TransportError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NoScore => write!(f, "no score loaded"),
            SessionError::Schedule(err) => write!(f, "{}", err),
            SessionError::Transport(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<ScheduleError> for SessionError {
    fn from(err: ScheduleError) -> Self {
        SessionError::Schedule(err)
    }
}

impl From<TransportError> for SessionError {
    fn from(err: TransportError) -> Self {
        SessionError::Transport(err)
    }
}

/// One playback session: create it, load a score, play; drop it and
/// everything is cancelled, silenced, and joined.
pub struct PlaybackSession {
    score: Option<NotatedScore>,
    tempo_bpm: f64,
    swing: SwingConfig,
    /// Score/tempo/swing changed since the schedule was last built
    dirty: bool,
    schedule: Option<Schedule>,
    playback: Option<PlaybackHandle>,
}

impl PlaybackSession {
    pub fn new() -> Self {
        Self {
            score: None,
            tempo_bpm: 120.0,
            swing: SwingConfig::straight(),
            dirty: true,
            schedule: None,
            playback: None,
        }
    }

    // --- Score and configuration ---

    /// Parse a MusicXML document and make it the session's score. Stops any
    /// running playback first; adopts the document's tempo marking if it
    /// carries one.
    pub fn load_musicxml(&mut self, xml: &str) -> Result<(), ScoreLoadError> {
        let score = am_formats::load_musicxml(xml)?;
        self.stop_playback();
        if let Some(tempo) = score.tempo_bpm {
            self.tempo_bpm = tempo;
        }
        self.set_score(score);
        Ok(())
    }

    /// Replace the score. While playing, the change is deferred until the
    /// next play from a stop.
    pub fn set_score(&mut self, score: NotatedScore) {
        self.score = Some(score);
        self.dirty = true;
    }

    pub fn score(&self) -> Option<&NotatedScore> {
        self.score.as_ref()
    }

    /// Set the tempo in beats per minute. Rejected before any state
    /// mutation when non-positive or non-finite; otherwise deferred like
    /// every other change.
    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ScheduleError> {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(ScheduleError::InvalidTempo(bpm));
        }
        self.tempo_bpm = bpm;
        self.dirty = true;
        Ok(())
    }

    pub fn tempo(&self) -> f64 {
        self.tempo_bpm
    }

    /// Set the swing configuration; deferred like every other change.
    pub fn set_swing(&mut self, config: SwingConfig) {
        self.swing = config;
        self.dirty = true;
    }

    pub fn swing(&self) -> SwingConfig {
        self.swing
    }

    /// The most recently built schedule, if any.
    pub fn schedule(&self) -> Option<&Schedule> {
        self.schedule.as_ref()
    }

    // --- Real-time playback ---

    /// Start playback, or resume it when paused.
    ///
    /// From a stop this rebuilds the schedule if anything changed and
    /// spawns the audio thread. Resuming from pause continues at the held
    /// position — unless the session is dirty, in which case the rebuilt
    /// schedule starts from the top (its offsets no longer correspond to
    /// the paused position).
    pub fn play(&mut self) -> Result<(), SessionError> {
        match self.state() {
            TransportState::Playing => Err(TransportError::InvalidTransition {
                from: TransportState::Playing,
                action: "play",
            }
            .into()),
            TransportState::Paused if !self.dirty => {
                if let Some(handle) = &self.playback {
                    handle.shared.request(REQ_PLAY);
                }
                Ok(())
            }
            _ => {
                // Rebuild before touching playback: a failed rebuild leaves
                // the paused transport and old schedule exactly as they were.
                let schedule = self.rebuilt_schedule()?;
                self.stop_playback();
                self.spawn(schedule);
                Ok(())
            }
        }
    }

    /// Pause playback, freezing the position and silencing the synth.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        match self.state() {
            TransportState::Playing => {
                if let Some(handle) = &self.playback {
                    handle.shared.request(REQ_PAUSE);
                }
                Ok(())
            }
            from => Err(TransportError::InvalidTransition { from, action: "pause" }.into()),
        }
    }

    /// Stop playback: silence everything, rewind to the start, join the
    /// audio thread.
    pub fn stop(&mut self) -> Result<(), SessionError> {
        match self.state() {
            TransportState::Stopped => {
                Err(TransportError::InvalidTransition { from: TransportState::Stopped, action: "stop" }
                    .into())
            }
            _ => {
                self.stop_playback();
                Ok(())
            }
        }
    }

    /// Current transport state as published by the audio thread.
    pub fn state(&self) -> TransportState {
        match &self.playback {
            Some(handle) if !handle.shared.finished.load(Ordering::Acquire) => {
                decode_state(handle.shared.state.load(Ordering::Acquire))
            }
            _ => TransportState::Stopped,
        }
    }

    /// True while the audio thread is alive (playing or paused).
    pub fn is_active(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| !p.shared.finished.load(Ordering::Acquire))
    }

    /// True once a started playback has run to its end (or been stopped).
    pub fn is_finished(&self) -> bool {
        self.playback
            .as_ref()
            .is_some_and(|p| p.shared.finished.load(Ordering::Acquire))
    }

    /// Elapsed playback position in seconds.
    pub fn position_seconds(&self) -> f64 {
        match &self.playback {
            Some(handle) => handle.shared.position_micros.load(Ordering::Acquire) as f64 / 1e6,
            None => 0.0,
        }
    }

    /// Measure index of the most recently fired note.
    pub fn current_measure(&self) -> u32 {
        match &self.playback {
            Some(handle) => handle.shared.measure.load(Ordering::Acquire),
            None => 0,
        }
    }

    // --- Offline rendering ---

    /// Drive the schedule through the synth with a stepped logical clock:
    /// no audio device, deterministic output. Stops early once playback
    /// completes and the synth has gone silent.
    pub fn render_frames(&mut self, sample_rate: u32, max_frames: usize) -> Result<Vec<Frame>, SessionError> {
        let schedule = self.rebuilt_schedule()?;
        let mut synth = SoloSynth::new(sample_rate);
        let mut transport = Transport::new();
        let mut observer = NullObserver;
        transport.load(schedule)?;
        transport.play(0.0)?;

        let dt = 1.0 / sample_rate as f64;
        let mut frames = Vec::new();
        for i in 0..max_frames {
            transport.tick(i as f64 * dt, &mut synth, &mut observer);
            frames.push(synth.render_frame());
            if transport.state() == TransportState::Stopped && synth.is_silent() {
                break;
            }
        }
        Ok(frames)
    }

    /// Offline-render the session to a 16-bit stereo WAV byte buffer.
    pub fn render_to_wav(&mut self, sample_rate: u32, max_seconds: u32) -> Result<Vec<u8>, SessionError> {
        let max_frames = (sample_rate * max_seconds) as usize;
        let frames = self.render_frames(sample_rate, max_frames)?;
        Ok(wav::frames_to_wav(&frames, sample_rate))
    }

    // --- Internals ---

    /// The current schedule, rebuilt first if score/tempo/swing changed.
    /// Only a successful build replaces the stored schedule.
    fn rebuilt_schedule(&mut self) -> Result<Schedule, SessionError> {
        if !self.dirty {
            if let Some(schedule) = &self.schedule {
                return Ok(schedule.clone());
            }
        }
        let score = self.score.as_ref().ok_or(SessionError::NoScore)?;
        let schedule =
            build_schedule(apply_swing(traverse(score), self.swing), self.tempo_bpm)?;
        log::info!(
            "rebuilt schedule: {} triggers over {:.2}s at {} BPM (swing {})",
            schedule.len(),
            schedule.end_seconds(),
            self.tempo_bpm,
            if self.swing.enabled { "on" } else { "off" },
        );
        self.schedule = Some(schedule.clone());
        self.dirty = false;
        Ok(schedule)
    }

    fn spawn(&mut self, schedule: Schedule) {
        let shared = Arc::new(SharedState::new());
        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::spawn(move || audio_thread(schedule, thread_shared));
        self.playback = Some(PlaybackHandle { shared, thread: Some(thread) });
    }

    fn stop_playback(&mut self) {
        if let Some(mut handle) = self.playback.take() {
            handle.shared.request(REQ_STOP);
            if let Some(thread) = handle.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl Default for PlaybackSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        // Session teardown: cancel, silence, join.
        self.stop_playback();
    }
}

struct PlaybackHandle {
    shared: Arc<SharedState>,
    thread: Option<JoinHandle<()>>,
}

const REQ_NONE: u8 = 0;
const REQ_PLAY: u8 = 1;
const REQ_PAUSE: u8 = 2;
const REQ_STOP: u8 = 3;

/// State the audio thread publishes and the session reads.
struct SharedState {
    /// One-slot control mailbox (last request wins)
    request_slot: AtomicU8,
    state: AtomicU8,
    position_micros: AtomicU64,
    measure: AtomicU32,
    finished: AtomicBool,
}

impl SharedState {
    fn new() -> Self {
        Self {
            request_slot: AtomicU8::new(REQ_NONE),
            state: AtomicU8::new(encode_state(TransportState::Playing)),
            position_micros: AtomicU64::new(0),
            measure: AtomicU32::new(0),
            finished: AtomicBool::new(false),
        }
    }

    fn request(&self, request: u8) {
        self.request_slot.store(request, Ordering::Release);
    }

    fn take_request(&self) -> u8 {
        self.request_slot.swap(REQ_NONE, Ordering::AcqRel)
    }

    fn publish(&self, state: TransportState, position_seconds: f64) {
        self.state.store(encode_state(state), Ordering::Release);
        self.position_micros
            .store((position_seconds.max(0.0) * 1e6) as u64, Ordering::Release);
    }
}

fn encode_state(state: TransportState) -> u8 {
    match state {
        TransportState::Stopped => 0,
        TransportState::Playing => 1,
        TransportState::Paused => 2,
    }
}

fn decode_state(value: u8) -> TransportState {
    match value {
        1 => TransportState::Playing,
        2 => TransportState::Paused,
        _ => TransportState::Stopped,
    }
}

/// Publishes trigger progress for position/measure queries.
struct SharedObserver {
    shared: Arc<SharedState>,
}

impl PlaybackObserver for SharedObserver {
    fn on_trigger(&mut self, measure: u32, _offset_seconds: f64) {
        self.shared.measure.store(measure, Ordering::Relaxed);
    }

    fn on_reset(&mut self) {
        self.shared.measure.store(0, Ordering::Relaxed);
    }
}

/// Frames rendered per control-loop iteration (~1.5 ms at 44.1 kHz).
const RENDER_BLOCK: usize = 64;

/// The audio thread: owns the device, the synth, and the transport. The
/// ring buffer's backpressure paces this loop to the device clock.
fn audio_thread(schedule: Schedule, shared: Arc<SharedState>) {
    let mut output = match CpalOutput::open() {
        Ok(output) => output,
        Err(err) => {
            log::error!("audio output unavailable: {}", err);
            shared.finished.store(true, Ordering::Release);
            return;
        }
    };
    let sample_rate = output.sample_rate();
    let mut synth = SoloSynth::new(sample_rate);
    let mut transport = Transport::new();
    let mut observer = SharedObserver { shared: Arc::clone(&shared) };

    let clock = Instant::now();
    if let Err(err) = transport.load(schedule) {
        log::error!("could not load schedule: {}", err);
        shared.finished.store(true, Ordering::Release);
        return;
    }
    if let Err(err) = transport.play(clock.elapsed().as_secs_f64()) {
        log::error!("could not start playback: {}", err);
        shared.finished.store(true, Ordering::Release);
        return;
    }
    output.start();
    shared.publish(TransportState::Playing, 0.0);

    loop {
        match shared.take_request() {
            REQ_PAUSE => {
                if let Err(err) = transport.pause(clock.elapsed().as_secs_f64(), &mut synth) {
                    log::debug!("pause request ignored: {}", err);
                }
            }
            REQ_PLAY => {
                if let Err(err) = transport.play(clock.elapsed().as_secs_f64()) {
                    log::debug!("play request ignored: {}", err);
                }
            }
            REQ_STOP => {
                if let Err(err) = transport.stop(&mut synth, &mut observer) {
                    log::debug!("stop request ignored: {}", err);
                }
            }
            _ => {}
        }

        let now = clock.elapsed().as_secs_f64();
        transport.tick(now, &mut synth, &mut observer);
        shared.publish(transport.state(), transport.position_seconds(now));

        if transport.state() == TransportState::Stopped && synth.is_silent() {
            break;
        }
        for _ in 0..RENDER_BLOCK {
            output.write_spin(synth.render_frame());
        }
    }

    // Flush a short tail so the last release isn't clipped by the buffer.
    for _ in 0..sample_rate / 10 {
        output.write_spin(Frame::silence());
    }
    output.stop();
    shared.publish(TransportState::Stopped, 0.0);
    shared.finished.store(true, Ordering::Release);
}
