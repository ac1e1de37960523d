use serde::{Deserialize, Serialize};

use crate::beat::{Beat, Time};
use crate::timeline::HasBeat;

/// Kind of a chart note, regular (hit once) or long (spans a duration).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
    // Regular notes
    Don,
    DonBig,
    Ka,
    KaBig,
    // Long notes
    Drumroll,
    DrumrollBig,
    Balloon,
    BalloonSpecial,
    // OpenTaiko notes
    KaDon,
    Bomb,
    Adlib,
    Fuse,
}

impl NoteType {
    pub fn is_don(self) -> bool {
        matches!(self, Self::Don | Self::DonBig)
    }

    pub fn is_ka(self) -> bool {
        matches!(self, Self::Ka | Self::KaBig)
    }

    pub fn is_small(self) -> bool {
        matches!(
            self,
            Self::Don | Self::Ka | Self::Drumroll | Self::Balloon | Self::Fuse
        )
    }

    pub fn is_big(self) -> bool {
        !self.is_small()
    }

    pub fn is_drumroll(self) -> bool {
        matches!(self, Self::Drumroll | Self::DrumrollBig)
    }

    /// Balloon-like rolls carry a pop count (Fuse included).
    pub fn is_balloon(self) -> bool {
        matches!(self, Self::Balloon | Self::BalloonSpecial | Self::Fuse)
    }

    pub fn is_long(self) -> bool {
        self.is_drumroll() || self.is_balloon()
    }

    pub fn is_regular(self) -> bool {
        !self.is_long()
    }
}

/// One of the three parallel per-difficulty note sub-charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BranchType {
    #[default]
    Normal,
    Expert,
    Master,
}

impl BranchType {
    pub const ALL: [BranchType; 3] = [BranchType::Normal, BranchType::Expert, BranchType::Master];
}

/// A single note. Long notes span `beat_duration`; `time_offset` is the
/// `#DELAY` shift applied to the playback instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub beat_time: Beat,
    pub beat_duration: Beat,
    pub time_offset: Time,
    pub note_type: NoteType,
    pub balloon_pop_count: i16,
    #[serde(default)]
    pub is_selected: bool,
}

impl Note {
    pub fn new(beat_time: Beat, note_type: NoteType) -> Self {
        Self {
            beat_time,
            beat_duration: Beat::zero(),
            time_offset: Time::zero(),
            note_type,
            balloon_pop_count: 0,
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

impl HasBeat for Note {
    fn beat(&self) -> Beat {
        self.beat_time
    }
}
