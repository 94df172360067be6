//! Quarter-note-based time representation.
//!
//! `QuarterTime` uses quarter notes as the universal musical-time
//! coordinate: 1.0 equals one quarter note regardless of tempo. Notated
//! scores, swing offsets, and the schedule builder all speak this unit.

/// Subdivisions per quarter note. LCM(1..16) × 5 = 3,603,600: divisible by
/// any tuplet division from 1 to 16 and by 100, so hundredth-of-a-quarter
/// offsets (swing delay, tolerance, duration floor) are exact.
pub const SUB_QUARTER_UNIT: u32 = 3_603_600;

/// A position or span in musical time (whole quarters + fractional part).
///
/// Ordering: quarter is primary, sub is secondary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct QuarterTime {
    /// Whole quarter notes from piece start
    pub quarter: u64,
    /// Fraction of a quarter: 0..SUB_QUARTER_UNIT
    pub sub: u32,
}

impl QuarterTime {
    /// The zero position (piece start).
    pub const fn zero() -> Self {
        Self { quarter: 0, sub: 0 }
    }

    /// A time at an exact quarter boundary.
    pub const fn from_quarters(quarter: u64) -> Self {
        Self { quarter, sub: 0 }
    }

    /// A time expressed in hundredths of a quarter (exact).
    pub const fn from_hundredths(hundredths: u64) -> Self {
        Self::from_units(hundredths * (SUB_QUARTER_UNIT as u64 / 100))
    }

    /// A time from a raw sub-quarter unit count.
    pub const fn from_units(units: u64) -> Self {
        Self {
            quarter: units / SUB_QUARTER_UNIT as u64,
            sub: (units % SUB_QUARTER_UNIT as u64) as u32,
        }
    }

    /// A time from `amount / divisions` quarters, rounded to the nearest
    /// sub-quarter unit. This is how MusicXML `<duration>` values (expressed
    /// in per-part `<divisions>`) enter the model.
    pub const fn from_division_units(amount: u64, divisions: u32) -> Self {
        if divisions == 0 {
            return Self::zero();
        }
        let units = (amount * SUB_QUARTER_UNIT as u64 + divisions as u64 / 2) / divisions as u64;
        Self::from_units(units)
    }

    /// Total sub-quarter units from piece start.
    pub const fn as_units(self) -> u64 {
        self.quarter * SUB_QUARTER_UNIT as u64 + self.sub as u64
    }

    /// True at the zero position.
    pub const fn is_zero(self) -> bool {
        self.quarter == 0 && self.sub == 0
    }

    /// Sum of two times/spans.
    pub const fn add(self, other: Self) -> Self {
        Self::from_units(self.as_units() + other.as_units())
    }

    /// Difference, floored at zero.
    pub const fn saturating_sub(self, other: Self) -> Self {
        Self::from_units(self.as_units().saturating_sub(other.as_units()))
    }

    /// Position within the current quarter (time mod 1), in sub-quarter units.
    pub const fn phase(self) -> u32 {
        self.sub
    }

    /// Convert to seconds at the given tempo expressed as seconds per quarter.
    pub fn to_seconds(self, seconds_per_quarter: f64) -> f64 {
        let quarters = self.quarter as f64 + self.sub as f64 / SUB_QUARTER_UNIT as f64;
        quarters * seconds_per_quarter
    }
}

impl PartialOrd for QuarterTime {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QuarterTime {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.quarter.cmp(&other.quarter).then(self.sub.cmp(&other.sub))
    }
}
