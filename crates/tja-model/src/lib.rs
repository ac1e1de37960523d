// Taiko chart data model: timelines, tempo map, TJA conversion, generic accessors

mod accessor;
mod beat;
mod compare;
mod convert;
mod events;
mod model;
mod note;
mod tempo_map;
mod timeline;
mod tja;

pub use accessor::{
    ChartItem, GenericEvent, GenericList, GenericMember, GenericMemberFlags, GenericValue,
    add_generic_event, available_member_flags, for_each_chart_item, for_each_selected_chart_item,
    generic_list_len, get_generic, get_generic_event, remove_generic_event,
    remove_generic_event_at_beat, set_generic, set_generic_event,
};
pub use beat::{Beat, Complex, Tempo, Time, TimeSignature, approx_same};
pub use compare::debug_compare_charts;
pub use convert::{chart_project_from_tja, chart_project_to_tja};
pub use events::{
    BarLineChange, GoGoRange, JposScrollChange, LyricChange, ScrollChange, ScrollMethod,
    ScrollTypeChange, TempoChange, TimeSignatureChange,
};
pub use model::{
    ChartCourse, ChartProject, DifficultyType, Language, PerLanguageString, Side, TimeSpace,
    convert_time_space, find_course_max_used_beat,
};
pub use note::{BranchType, Note, NoteType};
pub use tempo_map::{BeatBarInfo, TempoMap};
pub use timeline::{BeatForwardIterator, HasBeat, SortedTimeline};
pub use tja::{
    CourseMetadata, ParsedBarLineChange, ParsedCourse, ParsedDelayChange, ParsedGoGoChange,
    ParsedJposScroll, ParsedLyricChange, ParsedMeasure, ParsedNote, ParsedScrollChange,
    ParsedScrollType, ParsedTempoChange, ParsedTja, TjaDecoder, TjaEncoder, TjaMetadata,
    TjaNoteType,
};
