//! Uniform (list, index, member) access over every timeline a course owns,
//! so editing, selection and undo code never special-cases timeline kinds.
//!
//! Addressing mistakes (index out of range, member not applicable to the
//! list, value shape mismatch) are ordinary `None`/`false` results.

use crate::beat::{Beat, Complex, Tempo, Time, TimeSignature};
use crate::events::{
    BarLineChange, GoGoRange, JposScrollChange, LyricChange, ScrollChange, ScrollMethod,
    ScrollTypeChange, TempoChange, TimeSignatureChange,
};
use crate::model::ChartCourse;
use crate::note::{Note, NoteType};

/// Timeline kinds, in stable traversal (declaration) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericList {
    TempoChanges,
    SignatureChanges,
    NotesNormal,
    NotesExpert,
    NotesMaster,
    ScrollChanges,
    BarLineChanges,
    GoGoRanges,
    Lyrics,
    ScrollTypes,
    JposScrollChanges,
}

impl GenericList {
    pub const ALL: [GenericList; 11] = [
        GenericList::TempoChanges,
        GenericList::SignatureChanges,
        GenericList::NotesNormal,
        GenericList::NotesExpert,
        GenericList::NotesMaster,
        GenericList::ScrollChanges,
        GenericList::BarLineChanges,
        GenericList::GoGoRanges,
        GenericList::Lyrics,
        GenericList::ScrollTypes,
        GenericList::JposScrollChanges,
    ];

    pub fn is_note_list(self) -> bool {
        matches!(
            self,
            GenericList::NotesNormal | GenericList::NotesExpert | GenericList::NotesMaster
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenericMember {
    IsSelected,
    BarLineVisible,
    BalloonPopCount,
    ScrollSpeed,
    BeatStart,
    BeatDuration,
    TimeOffset,
    NoteType,
    Tempo,
    TimeSignature,
    Lyric,
    ScrollType,
    JposScrollMove,
    JposScrollDuration,
}

pub type GenericMemberFlags = u32;

impl GenericMember {
    pub const COUNT: usize = 14;

    pub const ALL: [GenericMember; Self::COUNT] = [
        GenericMember::IsSelected,
        GenericMember::BarLineVisible,
        GenericMember::BalloonPopCount,
        GenericMember::ScrollSpeed,
        GenericMember::BeatStart,
        GenericMember::BeatDuration,
        GenericMember::TimeOffset,
        GenericMember::NoteType,
        GenericMember::Tempo,
        GenericMember::TimeSignature,
        GenericMember::Lyric,
        GenericMember::ScrollType,
        GenericMember::JposScrollMove,
        GenericMember::JposScrollDuration,
    ];

    pub const fn flag(self) -> GenericMemberFlags {
        1 << self as u32
    }
}

/// Members meaningful for the given list kind.
pub fn available_member_flags(list: GenericList) -> GenericMemberFlags {
    let selected = GenericMember::IsSelected.flag();
    match list {
        GenericList::TempoChanges => {
            selected | GenericMember::BeatStart.flag() | GenericMember::Tempo.flag()
        }
        GenericList::SignatureChanges => {
            selected | GenericMember::BeatStart.flag() | GenericMember::TimeSignature.flag()
        }
        GenericList::NotesNormal | GenericList::NotesExpert | GenericList::NotesMaster => {
            selected
                | GenericMember::BalloonPopCount.flag()
                | GenericMember::BeatStart.flag()
                | GenericMember::BeatDuration.flag()
                | GenericMember::TimeOffset.flag()
                | GenericMember::NoteType.flag()
        }
        GenericList::ScrollChanges => {
            selected | GenericMember::ScrollSpeed.flag() | GenericMember::BeatStart.flag()
        }
        GenericList::BarLineChanges => {
            selected | GenericMember::BarLineVisible.flag() | GenericMember::BeatStart.flag()
        }
        GenericList::GoGoRanges => {
            selected | GenericMember::BeatStart.flag() | GenericMember::BeatDuration.flag()
        }
        GenericList::Lyrics => {
            selected | GenericMember::BeatStart.flag() | GenericMember::Lyric.flag()
        }
        GenericList::ScrollTypes => {
            selected | GenericMember::ScrollType.flag() | GenericMember::BeatStart.flag()
        }
        GenericList::JposScrollChanges => {
            selected
                | GenericMember::JposScrollMove.flag()
                | GenericMember::JposScrollDuration.flag()
                | GenericMember::BeatStart.flag()
        }
    }
}

/// Value currency for single-member access.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericValue {
    Bool(bool),
    I16(i16),
    F32(f32),
    Complex(Complex),
    Beat(Beat),
    Time(Time),
    NoteType(NoteType),
    ScrollMethod(ScrollMethod),
    Tempo(Tempo),
    TimeSignature(TimeSignature),
    Lyric(String),
}

pub fn generic_list_len(course: &ChartCourse, list: GenericList) -> usize {
    match list {
        GenericList::TempoChanges => course.tempo_map.tempo.len(),
        GenericList::SignatureChanges => course.tempo_map.signature.len(),
        GenericList::NotesNormal => course.notes_normal.len(),
        GenericList::NotesExpert => course.notes_expert.len(),
        GenericList::NotesMaster => course.notes_master.len(),
        GenericList::ScrollChanges => course.scroll_changes.len(),
        GenericList::BarLineChanges => course.bar_line_changes.len(),
        GenericList::GoGoRanges => course.gogo_ranges.len(),
        GenericList::Lyrics => course.lyrics.len(),
        GenericList::ScrollTypes => course.scroll_types.len(),
        GenericList::JposScrollChanges => course.jpos_scroll_changes.len(),
    }
}

fn get_note_member(note: &Note, member: GenericMember) -> Option<GenericValue> {
    Some(match member {
        GenericMember::IsSelected => GenericValue::Bool(note.is_selected),
        GenericMember::BalloonPopCount => GenericValue::I16(note.balloon_pop_count),
        GenericMember::BeatStart => GenericValue::Beat(note.beat_time),
        GenericMember::BeatDuration => GenericValue::Beat(note.beat_duration),
        GenericMember::TimeOffset => GenericValue::Time(note.time_offset),
        GenericMember::NoteType => GenericValue::NoteType(note.note_type),
        _ => return None,
    })
}

fn set_note_member(note: &mut Note, member: GenericMember, value: &GenericValue) -> bool {
    match (member, value) {
        (GenericMember::IsSelected, GenericValue::Bool(v)) => note.is_selected = *v,
        (GenericMember::BalloonPopCount, GenericValue::I16(v)) => note.balloon_pop_count = *v,
        (GenericMember::BeatStart, GenericValue::Beat(v)) => note.beat_time = *v,
        (GenericMember::BeatDuration, GenericValue::Beat(v)) => note.beat_duration = *v,
        (GenericMember::TimeOffset, GenericValue::Time(v)) => note.time_offset = *v,
        (GenericMember::NoteType, GenericValue::NoteType(v)) => note.note_type = *v,
        _ => return false,
    }
    true
}

/// Read one member of the item at (list, index). `None` for out-of-range
/// indices and members the list does not carry.
pub fn get_generic(
    course: &ChartCourse,
    list: GenericList,
    index: usize,
    member: GenericMember,
) -> Option<GenericValue> {
    match list {
        GenericList::TempoChanges => {
            let v = course.tempo_map.tempo.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat),
                GenericMember::Tempo => GenericValue::Tempo(v.tempo),
                _ => return None,
            })
        }
        GenericList::SignatureChanges => {
            let v = course.tempo_map.signature.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat),
                GenericMember::TimeSignature => GenericValue::TimeSignature(v.signature),
                _ => return None,
            })
        }
        GenericList::NotesNormal => get_note_member(course.notes_normal.get(index)?, member),
        GenericList::NotesExpert => get_note_member(course.notes_expert.get(index)?, member),
        GenericList::NotesMaster => get_note_member(course.notes_master.get(index)?, member),
        GenericList::ScrollChanges => {
            let v = course.scroll_changes.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::ScrollSpeed => GenericValue::Complex(v.scroll_speed),
                _ => return None,
            })
        }
        GenericList::BarLineChanges => {
            let v = course.bar_line_changes.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::BarLineVisible => GenericValue::Bool(v.is_visible),
                _ => return None,
            })
        }
        GenericList::GoGoRanges => {
            let v = course.gogo_ranges.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::BeatDuration => GenericValue::Beat(v.beat_duration),
                _ => return None,
            })
        }
        GenericList::Lyrics => {
            let v = course.lyrics.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::Lyric => GenericValue::Lyric(v.lyric.clone()),
                _ => return None,
            })
        }
        GenericList::ScrollTypes => {
            let v = course.scroll_types.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::ScrollType => GenericValue::ScrollMethod(v.method),
                _ => return None,
            })
        }
        GenericList::JposScrollChanges => {
            let v = course.jpos_scroll_changes.get(index)?;
            Some(match member {
                GenericMember::IsSelected => GenericValue::Bool(v.is_selected),
                GenericMember::BeatStart => GenericValue::Beat(v.beat_time),
                GenericMember::JposScrollMove => GenericValue::Complex(v.movement),
                GenericMember::JposScrollDuration => GenericValue::F32(v.duration),
                _ => return None,
            })
        }
    }
}

/// Write one member of the item at (list, index). The slot is written in
/// place; moving an item's beat does not re-sort the timeline, callers
/// performing beat edits must re-establish order themselves.
pub fn set_generic(
    course: &mut ChartCourse,
    list: GenericList,
    index: usize,
    member: GenericMember,
    value: &GenericValue,
) -> bool {
    match list {
        GenericList::TempoChanges => {
            let Some(v) = course.tempo_map.tempo.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat = *new,
                (GenericMember::Tempo, GenericValue::Tempo(new)) => v.tempo = *new,
                _ => return false,
            }
            true
        }
        GenericList::SignatureChanges => {
            let Some(v) = course.tempo_map.signature.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat = *new,
                (GenericMember::TimeSignature, GenericValue::TimeSignature(new)) => {
                    v.signature = *new
                }
                _ => return false,
            }
            true
        }
        GenericList::NotesNormal => course
            .notes_normal
            .get_mut(index)
            .is_some_and(|note| set_note_member(note, member, value)),
        GenericList::NotesExpert => course
            .notes_expert
            .get_mut(index)
            .is_some_and(|note| set_note_member(note, member, value)),
        GenericList::NotesMaster => course
            .notes_master
            .get_mut(index)
            .is_some_and(|note| set_note_member(note, member, value)),
        GenericList::ScrollChanges => {
            let Some(v) = course.scroll_changes.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::ScrollSpeed, GenericValue::Complex(new)) => v.scroll_speed = *new,
                _ => return false,
            }
            true
        }
        GenericList::BarLineChanges => {
            let Some(v) = course.bar_line_changes.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::BarLineVisible, GenericValue::Bool(new)) => v.is_visible = *new,
                _ => return false,
            }
            true
        }
        GenericList::GoGoRanges => {
            let Some(v) = course.gogo_ranges.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::BeatDuration, GenericValue::Beat(new)) => v.beat_duration = *new,
                _ => return false,
            }
            true
        }
        GenericList::Lyrics => {
            let Some(v) = course.lyrics.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::Lyric, GenericValue::Lyric(new)) => v.lyric = new.clone(),
                _ => return false,
            }
            true
        }
        GenericList::ScrollTypes => {
            let Some(v) = course.scroll_types.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::ScrollType, GenericValue::ScrollMethod(new)) => v.method = *new,
                _ => return false,
            }
            true
        }
        GenericList::JposScrollChanges => {
            let Some(v) = course.jpos_scroll_changes.get_mut(index) else {
                return false;
            };
            match (member, value) {
                (GenericMember::IsSelected, GenericValue::Bool(new)) => v.is_selected = *new,
                (GenericMember::BeatStart, GenericValue::Beat(new)) => v.beat_time = *new,
                (GenericMember::JposScrollMove, GenericValue::Complex(new)) => v.movement = *new,
                (GenericMember::JposScrollDuration, GenericValue::F32(new)) => v.duration = *new,
                _ => return false,
            }
            true
        }
    }
}

/// Whole-record currency for struct-level operations; one variant per
/// timeline record shape.
#[derive(Debug, Clone, PartialEq)]
pub enum GenericEvent {
    Tempo(TempoChange),
    Signature(TimeSignatureChange),
    Note(Note),
    Scroll(ScrollChange),
    BarLine(BarLineChange),
    GoGo(GoGoRange),
    Lyric(LyricChange),
    ScrollType(ScrollTypeChange),
    JposScroll(JposScrollChange),
}

impl GenericEvent {
    pub fn beat(&self) -> Beat {
        match self {
            GenericEvent::Tempo(v) => v.beat,
            GenericEvent::Signature(v) => v.beat,
            GenericEvent::Note(v) => v.beat_time,
            GenericEvent::Scroll(v) => v.beat_time,
            GenericEvent::BarLine(v) => v.beat_time,
            GenericEvent::GoGo(v) => v.beat_time,
            GenericEvent::Lyric(v) => v.beat_time,
            GenericEvent::ScrollType(v) => v.beat_time,
            GenericEvent::JposScroll(v) => v.beat_time,
        }
    }

    pub fn set_beat(&mut self, beat: Beat) {
        match self {
            GenericEvent::Tempo(v) => v.beat = beat,
            GenericEvent::Signature(v) => v.beat = beat,
            GenericEvent::Note(v) => v.beat_time = beat,
            GenericEvent::Scroll(v) => v.beat_time = beat,
            GenericEvent::BarLine(v) => v.beat_time = beat,
            GenericEvent::GoGo(v) => v.beat_time = beat,
            GenericEvent::Lyric(v) => v.beat_time = beat,
            GenericEvent::ScrollType(v) => v.beat_time = beat,
            GenericEvent::JposScroll(v) => v.beat_time = beat,
        }
    }

    /// Beat span for long events, zero otherwise.
    pub fn beat_duration(&self) -> Beat {
        match self {
            GenericEvent::Note(v) => v.beat_duration,
            GenericEvent::GoGo(v) => v.beat_duration,
            _ => Beat::zero(),
        }
    }

    pub fn set_beat_duration(&mut self, duration: Beat) {
        match self {
            GenericEvent::Note(v) => v.beat_duration = duration,
            GenericEvent::GoGo(v) => v.beat_duration = duration,
            _ => {}
        }
    }

    /// Wall-clock span for events that carry one (JPOS scroll only).
    pub fn time_duration(&self) -> Option<Time> {
        match self {
            GenericEvent::JposScroll(v) => Some(Time::from_sec(v.duration as f64)),
            _ => None,
        }
    }

    /// The list kind this record shape belongs to, for note events the
    /// Normal branch (the caller picks the concrete branch list).
    fn matches_list(&self, list: GenericList) -> bool {
        match self {
            GenericEvent::Tempo(_) => list == GenericList::TempoChanges,
            GenericEvent::Signature(_) => list == GenericList::SignatureChanges,
            GenericEvent::Note(_) => list.is_note_list(),
            GenericEvent::Scroll(_) => list == GenericList::ScrollChanges,
            GenericEvent::BarLine(_) => list == GenericList::BarLineChanges,
            GenericEvent::GoGo(_) => list == GenericList::GoGoRanges,
            GenericEvent::Lyric(_) => list == GenericList::Lyrics,
            GenericEvent::ScrollType(_) => list == GenericList::ScrollTypes,
            GenericEvent::JposScroll(_) => list == GenericList::JposScrollChanges,
        }
    }
}

pub fn get_generic_event(
    course: &ChartCourse,
    list: GenericList,
    index: usize,
) -> Option<GenericEvent> {
    Some(match list {
        GenericList::TempoChanges => GenericEvent::Tempo(*course.tempo_map.tempo.get(index)?),
        GenericList::SignatureChanges => {
            GenericEvent::Signature(*course.tempo_map.signature.get(index)?)
        }
        GenericList::NotesNormal => GenericEvent::Note(*course.notes_normal.get(index)?),
        GenericList::NotesExpert => GenericEvent::Note(*course.notes_expert.get(index)?),
        GenericList::NotesMaster => GenericEvent::Note(*course.notes_master.get(index)?),
        GenericList::ScrollChanges => GenericEvent::Scroll(*course.scroll_changes.get(index)?),
        GenericList::BarLineChanges => GenericEvent::BarLine(*course.bar_line_changes.get(index)?),
        GenericList::GoGoRanges => GenericEvent::GoGo(*course.gogo_ranges.get(index)?),
        GenericList::Lyrics => GenericEvent::Lyric(course.lyrics.get(index)?.clone()),
        GenericList::ScrollTypes => GenericEvent::ScrollType(*course.scroll_types.get(index)?),
        GenericList::JposScrollChanges => {
            GenericEvent::JposScroll(*course.jpos_scroll_changes.get(index)?)
        }
    })
}

/// Overwrite the record at (list, index) in place. Fails on range or shape
/// mismatch.
pub fn set_generic_event(
    course: &mut ChartCourse,
    list: GenericList,
    index: usize,
    event: &GenericEvent,
) -> bool {
    if !event.matches_list(list) {
        return false;
    }
    match (list, event) {
        (GenericList::TempoChanges, GenericEvent::Tempo(new)) => {
            course.tempo_map.tempo.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::SignatureChanges, GenericEvent::Signature(new)) => {
            course.tempo_map.signature.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::NotesNormal, GenericEvent::Note(new)) => {
            course.notes_normal.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::NotesExpert, GenericEvent::Note(new)) => {
            course.notes_expert.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::NotesMaster, GenericEvent::Note(new)) => {
            course.notes_master.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::ScrollChanges, GenericEvent::Scroll(new)) => {
            course.scroll_changes.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::BarLineChanges, GenericEvent::BarLine(new)) => {
            course.bar_line_changes.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::GoGoRanges, GenericEvent::GoGo(new)) => {
            course.gogo_ranges.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::Lyrics, GenericEvent::Lyric(new)) => {
            course.lyrics.get_mut(index).map(|v| *v = new.clone())
        }
        (GenericList::ScrollTypes, GenericEvent::ScrollType(new)) => {
            course.scroll_types.get_mut(index).map(|v| *v = *new)
        }
        (GenericList::JposScrollChanges, GenericEvent::JposScroll(new)) => {
            course.jpos_scroll_changes.get_mut(index).map(|v| *v = *new)
        }
        _ => None,
    }
    .is_some()
}

/// Insert via the owning timeline's upsert; adding at an occupied beat
/// replaces the existing event.
pub fn add_generic_event(course: &mut ChartCourse, list: GenericList, event: GenericEvent) -> bool {
    match (list, event) {
        (GenericList::TempoChanges, GenericEvent::Tempo(v)) => {
            course.tempo_map.tempo.insert_or_update(v)
        }
        (GenericList::SignatureChanges, GenericEvent::Signature(v)) => {
            course.tempo_map.signature.insert_or_update(v)
        }
        (GenericList::NotesNormal, GenericEvent::Note(v)) => {
            course.notes_normal.insert_or_update(v)
        }
        (GenericList::NotesExpert, GenericEvent::Note(v)) => {
            course.notes_expert.insert_or_update(v)
        }
        (GenericList::NotesMaster, GenericEvent::Note(v)) => {
            course.notes_master.insert_or_update(v)
        }
        (GenericList::ScrollChanges, GenericEvent::Scroll(v)) => {
            course.scroll_changes.insert_or_update(v)
        }
        (GenericList::BarLineChanges, GenericEvent::BarLine(v)) => {
            course.bar_line_changes.insert_or_update(v)
        }
        (GenericList::GoGoRanges, GenericEvent::GoGo(v)) => course.gogo_ranges.insert_or_update(v),
        (GenericList::Lyrics, GenericEvent::Lyric(v)) => course.lyrics.insert_or_update(v),
        (GenericList::ScrollTypes, GenericEvent::ScrollType(v)) => {
            course.scroll_types.insert_or_update(v)
        }
        (GenericList::JposScrollChanges, GenericEvent::JposScroll(v)) => {
            course.jpos_scroll_changes.insert_or_update(v)
        }
        _ => return false,
    }
    true
}

/// Remove the event at the given record's beat.
pub fn remove_generic_event(
    course: &mut ChartCourse,
    list: GenericList,
    event: &GenericEvent,
) -> bool {
    event.matches_list(list) && remove_generic_event_at_beat(course, list, event.beat())
}

pub fn remove_generic_event_at_beat(
    course: &mut ChartCourse,
    list: GenericList,
    beat: Beat,
) -> bool {
    match list {
        GenericList::TempoChanges => course.tempo_map.tempo.remove_at_beat(beat),
        GenericList::SignatureChanges => course.tempo_map.signature.remove_at_beat(beat),
        GenericList::NotesNormal => course.notes_normal.remove_at_beat(beat),
        GenericList::NotesExpert => course.notes_expert.remove_at_beat(beat),
        GenericList::NotesMaster => course.notes_master.remove_at_beat(beat),
        GenericList::ScrollChanges => course.scroll_changes.remove_at_beat(beat),
        GenericList::BarLineChanges => course.bar_line_changes.remove_at_beat(beat),
        GenericList::GoGoRanges => course.gogo_ranges.remove_at_beat(beat),
        GenericList::Lyrics => course.lyrics.remove_at_beat(beat),
        GenericList::ScrollTypes => course.scroll_types.remove_at_beat(beat),
        GenericList::JposScrollChanges => course.jpos_scroll_changes.remove_at_beat(beat),
    }
}

/// Stable traversal address: callers rely on list-declaration order, then
/// ascending index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartItem {
    pub list: GenericList,
    pub index: usize,
}

pub fn for_each_chart_item(course: &ChartCourse, mut per_item: impl FnMut(ChartItem)) {
    for list in GenericList::ALL {
        for index in 0..generic_list_len(course, list) {
            per_item(ChartItem { list, index });
        }
    }
}

pub fn for_each_selected_chart_item(course: &ChartCourse, mut per_item: impl FnMut(ChartItem)) {
    for list in GenericList::ALL {
        for index in 0..generic_list_len(course, list) {
            if get_generic(course, list, index, GenericMember::IsSelected)
                == Some(GenericValue::Bool(true))
            {
                per_item(ChartItem { list, index });
            }
        }
    }
}
