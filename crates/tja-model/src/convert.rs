//! Conversions between the parsed TJA document shape and `ChartProject`.

use std::ops::ControlFlow;

use crate::beat::{Beat, Tempo, Time, TimeSignature, approx_same};
use crate::events::{
    BarLineChange, GoGoRange, JposScrollChange, LyricChange, ScrollChange, ScrollTypeChange,
    TempoChange, TimeSignatureChange,
};
use crate::model::{
    ChartCourse, ChartProject, DIFFICULTY_DECIMAL_MAX, DIFFICULTY_DECIMAL_NONE,
    DIFFICULTY_LEVEL_MAX, DIFFICULTY_LEVEL_MIN, DifficultyType, Language, Side, TOWER_LIVES_MAX,
    TOWER_LIVES_MIN, find_course_max_used_beat,
};
use crate::note::{Note, NoteType};
use crate::tempo_map::TempoMap;
use crate::timeline::{BeatForwardIterator, HasBeat, SortedTimeline};
use crate::tja::{
    CourseMetadata, ParsedBarLineChange, ParsedCourse, ParsedDelayChange, ParsedGoGoChange,
    ParsedJposScroll, ParsedLyricChange, ParsedMeasure, ParsedNote, ParsedScrollChange,
    ParsedScrollType, ParsedTempoChange, ParsedTja, TjaMetadata, TjaNoteType,
};

fn note_type_from_tja(tja: TjaNoteType) -> Option<NoteType> {
    Some(match tja {
        TjaNoteType::Don => NoteType::Don,
        TjaNoteType::Ka => NoteType::Ka,
        TjaNoteType::DonBig => NoteType::DonBig,
        TjaNoteType::KaBig => NoteType::KaBig,
        TjaNoteType::DrumrollStart => NoteType::Drumroll,
        TjaNoteType::DrumrollBigStart => NoteType::DrumrollBig,
        TjaNoteType::BalloonStart => NoteType::Balloon,
        TjaNoteType::BalloonSpecialStart => NoteType::BalloonSpecial,
        TjaNoteType::Hidden => NoteType::Adlib,
        TjaNoteType::Bomb => NoteType::Bomb,
        TjaNoteType::KaDon => NoteType::KaDon,
        TjaNoteType::Fuse => NoteType::Fuse,
        TjaNoteType::None
        | TjaNoteType::BalloonOrDrumrollEnd
        | TjaNoteType::DonBigBoth
        | TjaNoteType::KaBigBoth => return None,
    })
}

fn note_type_to_tja(note_type: NoteType) -> TjaNoteType {
    match note_type {
        NoteType::Don => TjaNoteType::Don,
        NoteType::DonBig => TjaNoteType::DonBig,
        NoteType::Ka => TjaNoteType::Ka,
        NoteType::KaBig => TjaNoteType::KaBig,
        NoteType::Drumroll => TjaNoteType::DrumrollStart,
        NoteType::DrumrollBig => TjaNoteType::DrumrollBigStart,
        NoteType::Balloon => TjaNoteType::BalloonStart,
        NoteType::BalloonSpecial => TjaNoteType::BalloonSpecialStart,
        NoteType::KaDon => TjaNoteType::KaDon,
        NoteType::Adlib => TjaNoteType::Hidden,
        NoteType::Fuse => TjaNoteType::Fuse,
        NoteType::Bomb => TjaNoteType::Bomb,
    }
}

fn difficulty_from_raw(raw: i32) -> DifficultyType {
    DifficultyType::ALL[raw.clamp(0, DifficultyType::ALL.len() as i32 - 1) as usize]
}

fn side_from_raw(raw: i32) -> Side {
    if raw == 1 { Side::Ex } else { Side::Normal }
}

/// Delay command resolved to an absolute beat during the import pre-scan.
#[derive(Debug, Clone, Copy)]
struct TimedDelayCommand {
    beat: Beat,
    delay: Time,
}

impl HasBeat for TimedDelayCommand {
    fn beat(&self) -> Beat {
        self.beat
    }
}

/// Build a [`ChartProject`] from a parsed TJA document. Permissive:
/// unconvertible tokens are dropped, never an error.
pub fn chart_project_from_tja(document: &ParsedTja) -> ChartProject {
    let mut project = ChartProject::default();
    let m = &document.metadata;
    project.chart_title[Language::Base] = m.title.clone();
    project.chart_title[Language::Ja] = m.title_ja.clone();
    project.chart_title[Language::En] = m.title_en.clone();
    project.chart_title[Language::Cn] = m.title_cn.clone();
    project.chart_title[Language::Tw] = m.title_tw.clone();
    project.chart_title[Language::Ko] = m.title_ko.clone();
    project.chart_subtitle[Language::Base] = m.subtitle.clone();
    project.chart_subtitle[Language::Ja] = m.subtitle_ja.clone();
    project.chart_subtitle[Language::En] = m.subtitle_en.clone();
    project.chart_subtitle[Language::Cn] = m.subtitle_cn.clone();
    project.chart_subtitle[Language::Tw] = m.subtitle_tw.clone();
    project.chart_subtitle[Language::Ko] = m.subtitle_ko.clone();
    project.chart_creator = m.maker.clone();
    project.chart_genre = m.genre.clone();
    project.chart_lyrics_file_name = m.lyrics_file.clone();
    project.song_offset = m.offset;
    project.song_demo_start_time = m.demo_start;
    project.song_file_name = m.wave.clone();
    project.song_jacket_file_name = m.preimage.clone();
    project.song_volume = m.song_volume;
    project.sound_effect_volume = m.sound_effect_volume;
    project.background_image_file_name = m.bg_image.clone();
    project.background_movie_file_name = m.bg_movie.clone();
    project.movie_offset = m.movie_offset;
    project.chart_duration = Time::zero();

    for parsed_course in &document.courses {
        let course = convert_course(parsed_course, m.bpm);
        if let Some(last_measure) = parsed_course.measures.last() {
            project.chart_duration = Time::from_sec(
                project
                    .chart_duration
                    .seconds
                    .max(course.tempo_map.beat_to_time(last_measure.start_time).seconds),
            );
        }
        project.courses.push(course);
    }

    project
}

fn convert_course(parsed: &ParsedCourse, header_bpm: Tempo) -> ChartCourse {
    let meta = &parsed.metadata;
    let mut course = ChartCourse {
        difficulty_type: difficulty_from_raw(meta.course),
        level: meta.level.clamp(DIFFICULTY_LEVEL_MIN, DIFFICULTY_LEVEL_MAX),
        level_decimal: meta
            .level_decimal
            .clamp(DIFFICULTY_DECIMAL_NONE, DIFFICULTY_DECIMAL_MAX),
        course_creator: meta.notes_designer.clone(),
        score_init: meta.score_init,
        score_diff: meta.score_diff,
        tower_lives: meta.life.clamp(TOWER_LIVES_MIN, TOWER_LIVES_MAX),
        side: side_from_raw(meta.side),
        ..ChartCourse::default()
    };
    course.tempo_map.tempo =
        SortedTimeline::from(vec![TempoChange::new(Beat::zero(), header_bpm)]);
    course.tempo_map.signature = SortedTimeline::from(vec![TimeSignatureChange::new(
        Beat::zero(),
        TimeSignature::common_time(),
    )]);
    let mut last_signature = TimeSignature::common_time();

    let mut balloon_index = 0usize;

    // Delay commands resolve note time offsets via a forward cursor, which
    // is only valid because notes are visited in non-decreasing beat order
    // across the whole course. Pre-scan them all first.
    let mut delay_commands: SortedTimeline<TimedDelayCommand> = SortedTimeline::new();
    for measure in &parsed.measures {
        for delay in &measure.delay_changes {
            delay_commands.insert_or_update(TimedDelayCommand {
                beat: measure.start_time + delay.time_within_measure,
                delay: delay.delay,
            });
        }
    }
    let mut delay_cursor = BeatForwardIterator::new();

    let mut open_gogo_start: Option<Beat> = None;

    for measure in &parsed.measures {
        for parsed_note in &measure.notes {
            let beat = measure.start_time + parsed_note.time_within_measure;

            if parsed_note.note_type == TjaNoteType::BalloonOrDrumrollEnd {
                // Single-token lookback: the end closes the most recently
                // emitted note. Nested long notes are unsupported.
                if let Some(open) = course.notes_normal.last_mut() {
                    open.beat_duration = beat - open.beat_time;
                }
                continue;
            }
            let Some(note_type) = note_type_from_tja(parsed_note.note_type) else {
                continue;
            };

            let mut note = Note::new(beat, note_type);
            note.time_offset = delay_cursor
                .next(&delay_commands, beat)
                .map_or(Time::zero(), |d| d.delay);

            if matches!(
                parsed_note.note_type,
                TjaNoteType::BalloonStart | TjaNoteType::BalloonSpecialStart | TjaNoteType::Fuse
            ) {
                // Positional lookup into the flat BALLOON array, oblivious to
                // note branch. Known simplification, kept for compatibility.
                if let Some(&pop_count) = meta.balloon.get(balloon_index) {
                    note.balloon_pop_count = pop_count;
                }
                balloon_index += 1;
            }

            // TODO: branch commands; until then every note lands in Normal.
            course.notes_normal.insert_or_update(note);
        }

        if measure.time_signature != last_signature {
            course.tempo_map.signature.insert_or_update(TimeSignatureChange::new(
                measure.start_time,
                measure.time_signature,
            ));
            last_signature = measure.time_signature;
        }

        for v in &measure.tempo_changes {
            course.tempo_map.tempo.insert_or_update(TempoChange::new(
                measure.start_time + v.time_within_measure,
                v.tempo,
            ));
        }
        for v in &measure.scroll_changes {
            course.scroll_changes.insert_or_update(ScrollChange::new(
                measure.start_time + v.time_within_measure,
                v.scroll_speed,
            ));
        }
        for v in &measure.scroll_types {
            course.scroll_types.insert_or_update(ScrollTypeChange::new(
                measure.start_time + v.time_within_measure,
                v.method,
            ));
        }
        for v in &measure.jpos_scroll_changes {
            course.jpos_scroll_changes.insert_or_update(JposScrollChange::new(
                measure.start_time + v.time_within_measure,
                v.movement,
                v.duration,
            ));
        }
        for v in &measure.bar_line_changes {
            course.bar_line_changes.insert_or_update(BarLineChange::new(
                measure.start_time + v.time_within_measure,
                v.is_visible,
            ));
        }
        for v in &measure.lyric_changes {
            course.lyrics.insert_or_update(LyricChange::new(
                measure.start_time + v.time_within_measure,
                v.lyric.clone(),
            ));
        }

        for v in &measure.gogo_changes {
            let beat = measure.start_time + v.time_within_measure;
            match (v.is_gogo, open_gogo_start) {
                (true, None) => open_gogo_start = Some(beat),
                (true, Some(_)) => log::debug!("dropping nested #GOGOSTART at {beat:?}"),
                (false, Some(start)) => {
                    course
                        .gogo_ranges
                        .insert_or_update(GoGoRange::new(start, beat - start));
                    open_gogo_start = None;
                }
                (false, None) => log::debug!("dropping unmatched #GOGOEND at {beat:?}"),
            }
        }
    }

    if open_gogo_start.is_some() {
        log::warn!("dropping unterminated go-go range");
    }

    course.tempo_map.rebuild_acceleration_structure();
    course
}

/// Convert a [`ChartProject`] back to the parsed TJA document shape,
/// regenerating the measure grid which the in-memory model does not store.
pub fn chart_project_to_tja(project: &ChartProject) -> ParsedTja {
    const FALLBACK_CHART_TITLE: &str = "Untitled Chart";

    let mut document = ParsedTja::default();
    let m = &mut document.metadata;
    m.title = if project.chart_title.base().is_empty() {
        FALLBACK_CHART_TITLE.to_string()
    } else {
        project.chart_title.base().to_string()
    };
    m.title_ja = project.chart_title[Language::Ja].clone();
    m.title_en = project.chart_title[Language::En].clone();
    m.title_cn = project.chart_title[Language::Cn].clone();
    m.title_tw = project.chart_title[Language::Tw].clone();
    m.title_ko = project.chart_title[Language::Ko].clone();
    m.subtitle = project.chart_subtitle.base().to_string();
    m.subtitle_ja = project.chart_subtitle[Language::Ja].clone();
    m.subtitle_en = project.chart_subtitle[Language::En].clone();
    m.subtitle_cn = project.chart_subtitle[Language::Cn].clone();
    m.subtitle_tw = project.chart_subtitle[Language::Tw].clone();
    m.subtitle_ko = project.chart_subtitle[Language::Ko].clone();
    m.maker = project.chart_creator.clone();
    m.genre = project.chart_genre.clone();
    m.lyrics_file = project.chart_lyrics_file_name.clone();
    m.offset = project.song_offset;
    m.demo_start = project.song_demo_start_time;
    m.wave = project.song_file_name.clone();
    m.preimage = project.song_jacket_file_name.clone();
    m.song_volume = project.song_volume;
    m.sound_effect_volume = project.sound_effect_volume;
    m.bg_image = project.background_image_file_name.clone();
    m.bg_movie = project.background_movie_file_name.clone();
    m.movie_offset = project.movie_offset;

    if let Some(first_course) = project.courses.first()
        && let Some(initial_tempo) = first_course.tempo_map.tempo.try_find_last_at_beat(Beat::zero())
    {
        m.bpm = initial_tempo.tempo;
    }
    let header_bpm = document.metadata.bpm;

    for course in &project.courses {
        document
            .courses
            .push(convert_course_back(project, course, header_bpm));
    }
    document
}

fn convert_course_back(
    project: &ChartProject,
    course: &ChartCourse,
    header_bpm: Tempo,
) -> ParsedCourse {
    let mut out = ParsedCourse {
        metadata: CourseMetadata {
            course: course.difficulty_type as i32,
            level: course.level,
            level_decimal: course.level_decimal,
            balloon: course
                .notes_normal
                .iter()
                .filter(|n| n.note_type.is_balloon())
                .map(|n| n.balloon_pop_count)
                .collect(),
            score_init: course.score_init,
            score_diff: course.score_diff,
            notes_designer: course.course_creator.clone(),
            life: course.tower_lives,
            side: course.side as i32,
        },
        measures: Vec::new(),
    };

    let max_used_beat = find_course_max_used_beat(course);
    let nominal_beat_duration = course.tempo_map.time_to_beat(project.duration_or_default());

    course.tempo_map.for_each_beat_bar(|it| {
        if nominal_beat_duration > max_used_beat && it.beat >= nominal_beat_duration {
            return ControlFlow::Break(());
        }
        if it.is_bar {
            out.measures.push(ParsedMeasure {
                start_time: it.beat,
                time_signature: it.signature,
                ..ParsedMeasure::default()
            });
        }
        if it.beat >= nominal_beat_duration.max(max_used_beat) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    if out.measures.is_empty() {
        out.measures.push(ParsedMeasure {
            start_time: Beat::zero(),
            time_signature: TimeSignature::common_time(),
            ..ParsedMeasure::default()
        });
    }
    let measures = &mut out.measures;

    for (index, tempo_change) in course.tempo_map.tempo.iter().enumerate() {
        // The leading entry is already the document header BPM; repeating it
        // as a command would be redundant.
        if index == 0 && tempo_change.tempo.bpm == header_bpm.bpm {
            continue;
        }
        if let Some(measure) = measure_for_beat(measures, tempo_change.beat) {
            measure.tempo_changes.push(ParsedTempoChange {
                time_within_measure: tempo_change.beat - measure.start_time,
                tempo: tempo_change.tempo,
            });
        }
    }

    let mut last_note_time_offset = Time::zero();
    for note in course.notes_normal.iter() {
        if let Some(measure) = measure_for_beat(measures, note.beat_time) {
            measure.notes.push(ParsedNote {
                time_within_measure: note.beat_time - measure.start_time,
                note_type: note_type_to_tja(note.note_type),
            });
        }

        if note.beat_duration > Beat::zero() {
            let end_beat = note.beat_time + note.beat_duration;
            if let Some(measure) = measure_for_beat(measures, end_beat) {
                measure.notes.push(ParsedNote {
                    time_within_measure: end_beat - measure.start_time,
                    note_type: TjaNoteType::BalloonOrDrumrollEnd,
                });
            }
        }

        // Delay carry-forward suppression: only emit when the offset differs
        // from the previous note's.
        let time_offset = if approx_same(note.time_offset.seconds, 0.0) {
            Time::zero()
        } else {
            note.time_offset
        };
        if time_offset != last_note_time_offset {
            if let Some(measure) = measure_for_beat(measures, note.beat_time) {
                measure.delay_changes.push(ParsedDelayChange {
                    time_within_measure: note.beat_time - measure.start_time,
                    delay: time_offset,
                });
            }
            last_note_time_offset = time_offset;
        }
    }

    for v in course.scroll_changes.iter() {
        if let Some(measure) = measure_for_beat(measures, v.beat_time) {
            measure.scroll_changes.push(ParsedScrollChange {
                time_within_measure: v.beat_time - measure.start_time,
                scroll_speed: v.scroll_speed,
            });
        }
    }
    for v in course.scroll_types.iter() {
        if let Some(measure) = measure_for_beat(measures, v.beat_time) {
            measure.scroll_types.push(ParsedScrollType {
                time_within_measure: v.beat_time - measure.start_time,
                method: v.method,
            });
        }
    }
    for v in course.jpos_scroll_changes.iter() {
        if let Some(measure) = measure_for_beat(measures, v.beat_time) {
            measure.jpos_scroll_changes.push(ParsedJposScroll {
                time_within_measure: v.beat_time - measure.start_time,
                movement: v.movement,
                duration: v.duration,
            });
        }
    }
    for v in course.bar_line_changes.iter() {
        if let Some(measure) = measure_for_beat(measures, v.beat_time) {
            measure.bar_line_changes.push(ParsedBarLineChange {
                time_within_measure: v.beat_time - measure.start_time,
                is_visible: v.is_visible,
            });
        }
    }
    for v in course.lyrics.iter() {
        if let Some(measure) = measure_for_beat(measures, v.beat_time) {
            measure.lyric_changes.push(ParsedLyricChange {
                time_within_measure: v.beat_time - measure.start_time,
                lyric: v.lyric.clone(),
            });
        }
    }

    // Each go-go range splits into a discrete start/end change pair.
    for gogo in course.gogo_ranges.iter() {
        if let Some(measure) = measure_for_beat(measures, gogo.start()) {
            measure.gogo_changes.push(ParsedGoGoChange {
                time_within_measure: gogo.start() - measure.start_time,
                is_gogo: true,
            });
        }
        let end_beat = gogo.end();
        if let Some(measure) = measure_for_beat(measures, end_beat) {
            measure.gogo_changes.push(ParsedGoGoChange {
                time_within_measure: end_beat - measure.start_time,
                is_gogo: false,
            });
        }
    }

    out
}

/// Greatest measure whose start is at or before `beat`. A missing measure is
/// an invariant violation in the regenerated grid: asserted in debug, skipped
/// with a warning in release.
fn measure_for_beat(measures: &mut [ParsedMeasure], beat: Beat) -> Option<&mut ParsedMeasure> {
    let index = measures.partition_point(|m| m.start_time <= beat);
    if index == 0 {
        debug_assert!(false, "no containing measure for beat {beat:?}");
        log::warn!("dropping event at {beat:?}: no containing measure");
        return None;
    }
    Some(&mut measures[index - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tja::TjaDecoder;

    fn import(content: &str) -> ChartProject {
        chart_project_from_tja(&TjaDecoder::decode_str(content))
    }

    #[test]
    fn imports_notes_at_absolute_beats() {
        let project = import("BPM:120\nCOURSE:Oni\n#START\n1011,\n2000,\n#END\n");
        let course = &project.courses[0];
        let notes = &course.notes_normal;
        assert_eq!(notes.len(), 4);
        assert_eq!(notes[0].beat_time, Beat::zero());
        assert_eq!(notes[0].note_type, NoteType::Don);
        assert_eq!(notes[1].beat_time, Beat::from_beats(2));
        assert_eq!(notes[3].beat_time, Beat::from_beats(4));
        assert_eq!(notes[3].note_type, NoteType::Ka);
    }

    #[test]
    fn roll_end_sets_duration_on_open_note() {
        let project = import("BPM:120\n#START\n5008,\n#END\n");
        let notes = &project.courses[0].notes_normal;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].note_type, NoteType::Drumroll);
        assert_eq!(notes[0].beat_duration, Beat::from_beats(3));
    }

    #[test]
    fn balloon_pop_counts_assigned_positionally() {
        let project = import("BPM:120\nBALLOON:5,12\n#START\n7008,\n9008,\n#END\n");
        let notes = &project.courses[0].notes_normal;
        assert_eq!(notes[0].note_type, NoteType::Balloon);
        assert_eq!(notes[0].balloon_pop_count, 5);
        assert_eq!(notes[1].note_type, NoteType::BalloonSpecial);
        assert_eq!(notes[1].balloon_pop_count, 12);
    }

    #[test]
    fn delay_applies_to_following_notes() {
        let project = import("BPM:120\n#START\n#DELAY 0.5\n1010,\n#END\n");
        let notes = &project.courses[0].notes_normal;
        assert_eq!(notes[0].time_offset, Time::from_sec(0.5));
        assert_eq!(notes[1].time_offset, Time::from_sec(0.5));
    }

    #[test]
    fn signature_change_dedup() {
        let project = import("BPM:120\n#START\n#MEASURE 3/4\n111,\n111,\n#MEASURE 4/4\n1111,\n#END\n");
        let signature = &project.courses[0].tempo_map.signature;
        // Seed 4/4 at zero, overwritten by 3/4 at zero, then 4/4 at beat 6;
        // the second 3/4 measure emits nothing.
        assert_eq!(signature.len(), 2);
        assert_eq!(signature[0].signature, TimeSignature::new(3, 4));
        assert_eq!(signature[1].beat, Beat::from_beats(6));
        assert_eq!(signature[1].signature, TimeSignature::common_time());
    }

    #[test]
    fn gogo_changes_pair_into_ranges() {
        let project =
            import("BPM:120\n#START\n1111,\n#GOGOSTART\n1111,\n#GOGOEND\n1111,\n#END\n");
        let gogo = &project.courses[0].gogo_ranges;
        assert_eq!(gogo.len(), 1);
        assert_eq!(gogo[0].beat_time, Beat::from_beats(4));
        assert_eq!(gogo[0].beat_duration, Beat::from_beats(4));
    }

    #[test]
    fn header_bpm_seeds_tempo_timeline() {
        let project = import("BPM:200\n#START\n1,\n#END\n");
        let tempo = &project.courses[0].tempo_map.tempo;
        assert_eq!(tempo.len(), 1);
        assert_eq!(tempo[0].tempo, Tempo::new(200.0));
        // Acceleration structure is rebuilt: one beat at 200 BPM = 0.3s.
        let time = project.courses[0].tempo_map.beat_to_time(Beat::from_beats(1));
        assert!(approx_same(time.seconds, 0.3));
    }

    #[test]
    fn export_elides_leading_header_tempo() {
        let project = import("BPM:120\n#START\n1111,\n#BPMCHANGE 180\n1111,\n#END\n");
        let document = chart_project_to_tja(&project);
        assert_eq!(document.metadata.bpm, Tempo::new(120.0));
        let measures = &document.courses[0].measures;
        assert!(measures[0].tempo_changes.is_empty());
        assert_eq!(measures[1].tempo_changes.len(), 1);
        assert_eq!(measures[1].tempo_changes[0].tempo, Tempo::new(180.0));
    }

    #[test]
    fn export_splits_gogo_ranges() {
        let mut project = import("BPM:120\n#START\n1111,\n1111,\n#END\n");
        project.courses[0]
            .gogo_ranges
            .insert_or_update(GoGoRange::new(Beat::from_beats(4), Beat::from_beats(4)));
        let document = chart_project_to_tja(&project);
        let measures = &document.courses[0].measures;
        let all_gogo: Vec<_> = measures
            .iter()
            .flat_map(|measure| {
                measure
                    .gogo_changes
                    .iter()
                    .map(|g| (measure.start_time + g.time_within_measure, g.is_gogo))
            })
            .collect();
        assert_eq!(
            all_gogo,
            vec![(Beat::from_beats(4), true), (Beat::from_beats(8), false)]
        );
    }

    #[test]
    fn export_emits_roll_end_tokens() {
        let project = import("BPM:120\n#START\n5008,\n#END\n");
        let document = chart_project_to_tja(&project);
        let notes = &document.courses[0].measures[0].notes;
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].note_type, TjaNoteType::DrumrollStart);
        assert_eq!(notes[1].note_type, TjaNoteType::BalloonOrDrumrollEnd);
        assert_eq!(notes[1].time_within_measure, Beat::from_beats(3));
    }

    #[test]
    fn export_degenerate_course_synthesizes_one_measure() {
        let mut project = ChartProject::default();
        project.chart_duration = Time::from_sec(0.0);
        let mut course = ChartCourse::default();
        course.tempo_map.tempo.clear();
        course.tempo_map.signature.clear();
        course.tempo_map.rebuild_acceleration_structure();
        project.courses.push(course);

        let document = chart_project_to_tja(&project);
        assert!(!document.courses[0].measures.is_empty());
        assert_eq!(document.courses[0].measures[0].start_time, Beat::zero());
        assert_eq!(
            document.courses[0].measures[0].time_signature,
            TimeSignature::common_time()
        );
    }

    #[test]
    fn export_balloon_array_from_normal_branch() {
        let project = import("BPM:120\nBALLOON:7,9\n#START\n7008,\nD008,\n#END\n");
        let document = chart_project_to_tja(&project);
        assert_eq!(document.courses[0].metadata.balloon, vec![7, 9]);
    }

    #[test]
    fn delay_carry_forward_suppression() {
        let project = import("BPM:120\n#START\n#DELAY 0.25\n1111,\n1111,\n#END\n");
        let document = chart_project_to_tja(&project);
        let delays: usize = document.courses[0]
            .measures
            .iter()
            .map(|measure| measure.delay_changes.len())
            .sum();
        // One #DELAY covers all eight notes on re-export.
        assert_eq!(delays, 1);
    }

    #[test]
    fn measure_grid_extends_to_max_used_beat() {
        // Chart duration is short but a note sits far out; the grid must
        // still cover it.
        let mut project = import("BPM:120\n#START\n1,\n#END\n");
        project.chart_duration = Time::from_sec(0.1);
        project.courses[0]
            .notes_normal
            .insert_or_update(Note::new(Beat::from_beats(17), NoteType::Don));
        let document = chart_project_to_tja(&project);
        let measures = &document.courses[0].measures;
        let last = measures.last().unwrap();
        assert!(last.start_time <= Beat::from_beats(17));
        let placed: usize = measures.iter().map(|measure| measure.notes.len()).sum();
        assert_eq!(placed, 2);
    }
}
