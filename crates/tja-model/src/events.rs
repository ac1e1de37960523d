use serde::{Deserialize, Serialize};

use crate::beat::{Beat, Complex, Tempo, Time, TimeSignature};
use crate::timeline::HasBeat;

/// Tempo change taking effect at `beat`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub beat: Beat,
    pub tempo: Tempo,
    #[serde(default)]
    pub is_selected: bool,
}

impl TempoChange {
    pub fn new(beat: Beat, tempo: Tempo) -> Self {
        Self {
            beat,
            tempo,
            is_selected: false,
        }
    }
}

impl HasBeat for TempoChange {
    fn beat(&self) -> Beat {
        self.beat
    }
}

/// Time-signature change; only meaningful on a measure boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSignatureChange {
    pub beat: Beat,
    pub signature: TimeSignature,
    #[serde(default)]
    pub is_selected: bool,
}

impl TimeSignatureChange {
    pub fn new(beat: Beat, signature: TimeSignature) -> Self {
        Self {
            beat,
            signature,
            is_selected: false,
        }
    }
}

impl HasBeat for TimeSignatureChange {
    fn beat(&self) -> Beat {
        self.beat
    }
}

/// Scroll interpretation selected by `#NMSCROLL` / `#HBSCROLL` / `#BMSCROLL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScrollMethod {
    #[default]
    Nm,
    Hb,
    Bm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollChange {
    pub beat_time: Beat,
    pub scroll_speed: Complex,
    #[serde(default)]
    pub is_selected: bool,
}

impl ScrollChange {
    pub fn new(beat_time: Beat, scroll_speed: Complex) -> Self {
        Self {
            beat_time,
            scroll_speed,
            is_selected: false,
        }
    }
}

impl HasBeat for ScrollChange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollTypeChange {
    pub beat_time: Beat,
    pub method: ScrollMethod,
    #[serde(default)]
    pub is_selected: bool,
}

impl ScrollTypeChange {
    pub fn new(beat_time: Beat, method: ScrollMethod) -> Self {
        Self {
            beat_time,
            method,
            is_selected: false,
        }
    }
}

impl HasBeat for ScrollTypeChange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}

/// Judgement-position scroll: shifts the hit marker by `movement` over
/// `duration` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JposScrollChange {
    pub beat_time: Beat,
    pub movement: Complex,
    pub duration: f32,
    #[serde(default)]
    pub is_selected: bool,
}

impl JposScrollChange {
    pub fn new(beat_time: Beat, movement: Complex, duration: f32) -> Self {
        Self {
            beat_time,
            movement,
            duration,
            is_selected: false,
        }
    }
}

impl HasBeat for JposScrollChange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarLineChange {
    pub beat_time: Beat,
    pub is_visible: bool,
    #[serde(default)]
    pub is_selected: bool,
}

impl BarLineChange {
    pub fn new(beat_time: Beat, is_visible: bool) -> Self {
        Self {
            beat_time,
            is_visible,
            is_selected: false,
        }
    }
}

impl HasBeat for BarLineChange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}

/// Interval with bonus scoring active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoGoRange {
    pub beat_time: Beat,
    pub beat_duration: Beat,
    #[serde(default)]
    pub is_selected: bool,
}

impl GoGoRange {
    pub fn new(beat_time: Beat, beat_duration: Beat) -> Self {
        Self {
            beat_time,
            beat_duration,
            is_selected: false,
        }
    }

    pub fn start(&self) -> Beat {
        self.beat_time
    }

    pub fn end(&self) -> Beat {
        self.beat_time + self.beat_duration.max(Beat::zero())
    }
}

impl HasBeat for GoGoRange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricChange {
    pub beat_time: Beat,
    pub lyric: String,
    #[serde(default)]
    pub is_selected: bool,
}

impl LyricChange {
    pub fn new(beat_time: Beat, lyric: impl Into<String>) -> Self {
        Self {
            beat_time,
            lyric: lyric.into(),
            is_selected: false,
        }
    }
}

impl HasBeat for LyricChange {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}
