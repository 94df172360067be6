//! The swing transform: delay selected off-beat notes.
//!
//! Swing delays the "and" of each beat pair without touching on-beat notes,
//! approximating triplet-feel eighths. A delayed note is also shortened by
//! the delay so it cannot overlap the following downbeat.

use am_score::{NoteOccurrence, QuarterTime};

/// Floor for a swung note's duration (0.01 quarter). Shrinking stops here so
/// a very short off-beat note never collapses to zero or negative length.
pub const MIN_SWUNG_DURATION: QuarterTime = QuarterTime::from_hundredths(1);

/// Which notes swing and by how much. Read by the schedule rebuild only;
/// changing it mid-schedule has no effect until the next rebuild.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SwingConfig {
    pub enabled: bool,
    /// Beat phase treated as the off-beat (default: 0.5, the "and")
    pub off_beat_phase: QuarterTime,
    /// Half-width of the window around the off-beat phase (default: 0.05)
    pub phase_tolerance: QuarterTime,
    /// How far a matched note is pushed back (default: 0.16 quarter)
    pub delay: QuarterTime,
}

impl SwingConfig {
    /// Swing disabled; the transform is the identity.
    pub const fn straight() -> Self {
        Self {
            enabled: false,
            off_beat_phase: QuarterTime::from_hundredths(50),
            phase_tolerance: QuarterTime::from_hundredths(5),
            delay: QuarterTime::from_hundredths(16),
        }
    }

    /// Swing enabled with the default feel.
    pub const fn swung() -> Self {
        let mut config = Self::straight();
        config.enabled = true;
        config
    }
}

impl Default for SwingConfig {
    fn default() -> Self {
        Self::straight()
    }
}

/// Apply swing to a sequence of occurrences. Pure and lazy: the input
/// iterator is mapped, never collected, and the same input with the same
/// config always yields the same output.
pub fn apply_swing<I>(occurrences: I, config: SwingConfig) -> impl Iterator<Item = NoteOccurrence>
where
    I: Iterator<Item = NoteOccurrence>,
{
    occurrences.map(move |occ| {
        if config.enabled && is_off_beat(occ.time, &config) {
            NoteOccurrence {
                time: occ.time.add(config.delay),
                duration: clamped_shrink(occ.duration, config.delay),
                ..occ
            }
        } else {
            occ
        }
    })
}

/// True when the note's beat phase falls strictly within the tolerance
/// window around the configured off-beat phase.
fn is_off_beat(time: QuarterTime, config: &SwingConfig) -> bool {
    let phase = time.phase();
    let target = config.off_beat_phase.phase();
    let distance = phase.abs_diff(target);
    // Phase is circular: 0.98 is 0.02 away from a target at 0.0.
    let distance = distance.min(am_score::SUB_QUARTER_UNIT - distance);
    distance < config.phase_tolerance.phase()
}

fn clamped_shrink(duration: QuarterTime, delay: QuarterTime) -> QuarterTime {
    duration.saturating_sub(delay).max(MIN_SWUNG_DURATION)
}
