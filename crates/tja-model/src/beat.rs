use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

use serde::{Deserialize, Serialize};

/// Tempo-independent musical position, counted in ticks.
///
/// One quarter-note beat is [`Beat::TICKS_PER_BEAT`] ticks, so every common
/// subdivision down to 1/192 lands on an exact tick count.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Beat {
    pub ticks: i32,
}

impl Beat {
    /// Ticks per quarter-note beat.
    pub const TICKS_PER_BEAT: i32 = 192;

    pub const fn zero() -> Self {
        Self { ticks: 0 }
    }

    pub const fn from_ticks(ticks: i32) -> Self {
        Self { ticks }
    }

    /// Whole quarter-note beats.
    pub const fn from_beats(beats: i32) -> Self {
        Self {
            ticks: beats * Self::TICKS_PER_BEAT,
        }
    }

    /// Fraction of a whole note: `from_bar_fraction(1, 4)` is one quarter beat,
    /// `from_bar_fraction(1, 16)` a sixteenth.
    pub const fn from_bar_fraction(numerator: i32, denominator: i32) -> Self {
        Self {
            ticks: (Self::TICKS_PER_BEAT * 4 / denominator) * numerator,
        }
    }

    pub fn to_beats_f64(self) -> f64 {
        self.ticks as f64 / Self::TICKS_PER_BEAT as f64
    }

    pub fn min(self, other: Self) -> Self {
        if self.ticks <= other.ticks { self } else { other }
    }

    pub fn max(self, other: Self) -> Self {
        if self.ticks >= other.ticks { self } else { other }
    }
}

impl Add for Beat {
    type Output = Beat;
    fn add(self, rhs: Beat) -> Beat {
        Beat::from_ticks(self.ticks + rhs.ticks)
    }
}

impl Sub for Beat {
    type Output = Beat;
    fn sub(self, rhs: Beat) -> Beat {
        Beat::from_ticks(self.ticks - rhs.ticks)
    }
}

impl Neg for Beat {
    type Output = Beat;
    fn neg(self) -> Beat {
        Beat::from_ticks(-self.ticks)
    }
}

impl AddAssign for Beat {
    fn add_assign(&mut self, rhs: Beat) {
        self.ticks += rhs.ticks;
    }
}

impl SubAssign for Beat {
    fn sub_assign(&mut self, rhs: Beat) {
        self.ticks -= rhs.ticks;
    }
}

/// Absolute chart time in seconds (chart space starts at 00:00.000).
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Time {
    pub seconds: f64,
}

impl Time {
    pub const fn zero() -> Self {
        Self { seconds: 0.0 }
    }

    pub const fn from_sec(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn from_ms(milliseconds: f64) -> Self {
        Self {
            seconds: milliseconds / 1000.0,
        }
    }

    pub fn from_min(minutes: f64) -> Self {
        Self {
            seconds: minutes * 60.0,
        }
    }

    pub fn to_ms(self) -> f64 {
        self.seconds * 1000.0
    }
}

impl Add for Time {
    type Output = Time;
    fn add(self, rhs: Time) -> Time {
        Time::from_sec(self.seconds + rhs.seconds)
    }
}

impl Sub for Time {
    type Output = Time;
    fn sub(self, rhs: Time) -> Time {
        Time::from_sec(self.seconds - rhs.seconds)
    }
}

impl Neg for Time {
    type Output = Time;
    fn neg(self) -> Time {
        Time::from_sec(-self.seconds)
    }
}

/// Beats-per-minute governing one Beat↔Time segment.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: f64,
}

impl Tempo {
    /// Used wherever a chart fails to define its own tempo.
    pub const FALLBACK: Tempo = Tempo { bpm: 120.0 };

    pub const fn new(bpm: f64) -> Self {
        Self { bpm }
    }

    /// Seconds spanned by a single tick at this tempo (0 for non-positive BPM).
    pub fn seconds_per_tick(self) -> f64 {
        if self.bpm <= 0.0 {
            return 0.0;
        }
        60.0 / (self.bpm * Beat::TICKS_PER_BEAT as f64)
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Numerator/denominator defining how many beats make up a measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: i32,
    pub denominator: i32,
}

impl TimeSignature {
    pub const fn new(numerator: i32, denominator: i32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub const fn common_time() -> Self {
        Self::new(4, 4)
    }

    pub fn is_valid(self) -> bool {
        // Denominators beyond a whole note's tick count would collapse a beat
        // to zero ticks.
        self.numerator > 0
            && self.denominator > 0
            && (Beat::TICKS_PER_BEAT * 4 / self.denominator) > 0
    }

    /// Length of one signature beat (a 1/denominator note).
    pub fn duration_per_beat(self) -> Beat {
        if !self.is_valid() {
            return Self::common_time().duration_per_beat();
        }
        Beat::from_bar_fraction(1, self.denominator)
    }

    /// Length of one full measure.
    pub fn duration_per_bar(self) -> Beat {
        if !self.is_valid() {
            return Self::common_time().duration_per_bar();
        }
        Beat::from_bar_fraction(self.numerator, self.denominator)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        Self::common_time()
    }
}

/// Approximate equality for chart-scale floating point comparisons.
pub fn approx_same(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
}

/// Scroll-speed value: real part is the usual multiplier, imaginary part a
/// vertical displacement factor (OpenTaiko extension).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Complex {
    pub real: f32,
    pub imag: f32,
}

impl Complex {
    pub const ONE: Complex = Complex {
        real: 1.0,
        imag: 0.0,
    };

    pub const fn new(real: f32, imag: f32) -> Self {
        Self { real, imag }
    }

    pub fn is_real(self) -> bool {
        self.imag == 0.0
    }
}

impl Default for Complex {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Complex {
    /// TJA-style literal: `2`, `0.5+1i`, `-1i`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_real() {
            write!(f, "{}", self.real)
        } else if self.real == 0.0 {
            write!(f, "{}i", self.imag)
        } else if self.imag < 0.0 {
            write!(f, "{}{}i", self.real, self.imag)
        } else {
            write!(f, "{}+{}i", self.real, self.imag)
        }
    }
}
