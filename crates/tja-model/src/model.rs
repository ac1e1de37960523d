use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::beat::{Beat, Time};
use crate::events::{
    BarLineChange, GoGoRange, JposScrollChange, LyricChange, ScrollChange, ScrollTypeChange,
};
use crate::note::{BranchType, Note};
use crate::tempo_map::TempoMap;
use crate::timeline::SortedTimeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyType {
    Easy,
    Normal,
    Hard,
    #[default]
    Oni,
    OniUra,
    Tower,
    Dan,
}

impl DifficultyType {
    pub const ALL: [DifficultyType; 7] = [
        DifficultyType::Easy,
        DifficultyType::Normal,
        DifficultyType::Hard,
        DifficultyType::Oni,
        DifficultyType::OniUra,
        DifficultyType::Tower,
        DifficultyType::Dan,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Side {
    #[default]
    Normal,
    Ex,
}

/// Difficulty star rating, clamped to the TJA-meaningful 1..=20 range.
pub const DIFFICULTY_LEVEL_MIN: i32 = 1;
pub const DIFFICULTY_LEVEL_MAX: i32 = 20;

/// Decimal sub-level; -1 means "none specified".
pub const DIFFICULTY_DECIMAL_NONE: i32 = -1;
pub const DIFFICULTY_DECIMAL_MAX: i32 = 9;

pub const TOWER_LIVES_MIN: i32 = 0;
pub const TOWER_LIVES_MAX: i32 = 99999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Base,
    Ja,
    En,
    Cn,
    Tw,
    Ko,
}

impl Language {
    pub const COUNT: usize = 6;
    pub const ALL: [Language; Self::COUNT] = [
        Language::Base,
        Language::Ja,
        Language::En,
        Language::Cn,
        Language::Tw,
        Language::Ko,
    ];
}

/// One string slot per supported locale.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerLanguageString {
    pub slots: [String; Language::COUNT],
}

impl PerLanguageString {
    pub fn base(&self) -> &str {
        &self.slots[Language::Base as usize]
    }
}

impl Index<Language> for PerLanguageString {
    type Output = String;
    fn index(&self, language: Language) -> &String {
        &self.slots[language as usize]
    }
}

impl IndexMut<Language> for PerLanguageString {
    fn index_mut(&mut self, language: Language) -> &mut String {
        &mut self.slots[language as usize]
    }
}

/// One difficulty's worth of chart content: timing, three note branches and
/// the event timelines shared across branches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartCourse {
    pub difficulty_type: DifficultyType,
    pub level: i32,
    pub level_decimal: i32,
    pub course_creator: String,

    pub tempo_map: TempoMap,

    // TODO: per-branch scroll speed changes, pending editor-side support.
    pub notes_normal: SortedTimeline<Note>,
    pub notes_expert: SortedTimeline<Note>,
    pub notes_master: SortedTimeline<Note>,

    pub scroll_changes: SortedTimeline<ScrollChange>,
    pub bar_line_changes: SortedTimeline<BarLineChange>,
    pub gogo_ranges: SortedTimeline<GoGoRange>,
    pub lyrics: SortedTimeline<LyricChange>,
    pub scroll_types: SortedTimeline<ScrollTypeChange>,
    pub jpos_scroll_changes: SortedTimeline<JposScrollChange>,

    pub score_init: i32,
    pub score_diff: i32,

    // Tower specific.
    pub tower_lives: i32,
    pub side: Side,
}

impl Default for ChartCourse {
    fn default() -> Self {
        Self {
            difficulty_type: DifficultyType::Oni,
            level: DIFFICULTY_LEVEL_MIN,
            level_decimal: DIFFICULTY_DECIMAL_NONE,
            course_creator: String::new(),
            tempo_map: TempoMap::default(),
            notes_normal: SortedTimeline::new(),
            notes_expert: SortedTimeline::new(),
            notes_master: SortedTimeline::new(),
            scroll_changes: SortedTimeline::new(),
            bar_line_changes: SortedTimeline::new(),
            gogo_ranges: SortedTimeline::new(),
            lyrics: SortedTimeline::new(),
            scroll_types: SortedTimeline::new(),
            jpos_scroll_changes: SortedTimeline::new(),
            score_init: 0,
            score_diff: 0,
            tower_lives: 5,
            side: Side::Normal,
        }
    }
}

impl ChartCourse {
    pub fn notes(&self, branch: BranchType) -> &SortedTimeline<Note> {
        match branch {
            BranchType::Normal => &self.notes_normal,
            BranchType::Expert => &self.notes_expert,
            BranchType::Master => &self.notes_master,
        }
    }

    pub fn notes_mut(&mut self, branch: BranchType) -> &mut SortedTimeline<Note> {
        match branch {
            BranchType::Normal => &mut self.notes_normal,
            BranchType::Expert => &mut self.notes_expert,
            BranchType::Master => &mut self.notes_master,
        }
    }
}

/// Internal representation of a whole chart file: song metadata plus an owned
/// course per difficulty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartProject {
    pub courses: Vec<ChartCourse>,

    pub chart_duration: Time,
    pub chart_title: PerLanguageString,
    pub chart_subtitle: PerLanguageString,
    pub chart_creator: String,
    pub chart_genre: String,
    pub chart_lyrics_file_name: String,

    pub song_offset: Time,
    pub song_demo_start_time: Time,
    pub song_file_name: String,
    pub song_jacket_file_name: String,

    pub song_volume: f32,
    pub sound_effect_volume: f32,

    pub background_image_file_name: String,
    pub background_movie_file_name: String,
    pub movie_offset: Time,
}

impl Default for ChartProject {
    fn default() -> Self {
        Self {
            courses: Vec::new(),
            chart_duration: Time::zero(),
            chart_title: PerLanguageString::default(),
            chart_subtitle: PerLanguageString::default(),
            chart_creator: String::new(),
            chart_genre: String::new(),
            chart_lyrics_file_name: String::new(),
            song_offset: Time::zero(),
            song_demo_start_time: Time::zero(),
            song_file_name: String::new(),
            song_jacket_file_name: String::new(),
            song_volume: 1.0,
            sound_effect_volume: 1.0,
            background_image_file_name: String::new(),
            background_movie_file_name: String::new(),
            movie_offset: Time::zero(),
        }
    }
}

impl ChartProject {
    /// Nominal duration, defaulting to one minute for charts that never set
    /// one. Export uses this to bound measure-grid generation.
    pub fn duration_or_default(&self) -> Time {
        if self.chart_duration.seconds <= 0.0 {
            Time::from_min(1.0)
        } else {
            self.chart_duration
        }
    }
}

/// Chart space starts at 00:00.000 (internal calculations); song space is
/// shifted by the song offset (user-facing display).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeSpace {
    Chart,
    Song,
}

pub fn convert_time_space(time: Time, from: TimeSpace, to: TimeSpace, song_offset: Time) -> Time {
    let converted = match (from, to) {
        (TimeSpace::Chart, TimeSpace::Song) => time - song_offset,
        (TimeSpace::Song, TimeSpace::Chart) => time + song_offset,
        _ => time,
    };
    // Normalize -0.0 so displayed timestamps never show a negative zero.
    if converted.seconds == 0.0 {
        Time::zero()
    } else {
        converted
    }
}

/// Greatest beat any timeline of the course touches, including roll and go-go
/// tail ends. Scans every entry rather than just the last one in case a
/// duration reaches past a later start.
pub fn find_course_max_used_beat(course: &ChartCourse) -> Beat {
    let mut max_beat = Beat::zero();
    for v in course.tempo_map.tempo.iter() {
        max_beat = max_beat.max(v.beat);
    }
    for v in course.tempo_map.signature.iter() {
        max_beat = max_beat.max(v.beat);
    }
    for branch in BranchType::ALL {
        for v in course.notes(branch).iter() {
            max_beat = max_beat.max(v.beat_time + v.beat_duration.max(Beat::zero()));
        }
    }
    for v in course.gogo_ranges.iter() {
        max_beat = max_beat.max(v.beat_time + v.beat_duration.max(Beat::zero()));
    }
    for v in course.scroll_changes.iter() {
        max_beat = max_beat.max(v.beat_time);
    }
    for v in course.scroll_types.iter() {
        max_beat = max_beat.max(v.beat_time);
    }
    for v in course.jpos_scroll_changes.iter() {
        max_beat = max_beat.max(v.beat_time);
    }
    for v in course.bar_line_changes.iter() {
        max_beat = max_beat.max(v.beat_time);
    }
    for v in course.lyrics.iter() {
        max_beat = max_beat.max(v.beat_time);
    }
    max_beat
}
