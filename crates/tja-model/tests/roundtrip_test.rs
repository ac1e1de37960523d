// End-to-end round-trip coverage: TJA text -> model -> TJA text -> model.

use proptest::prelude::*;
use tja_model::{
    Beat, ChartProject, GoGoRange, NoteType, SortedTimeline, Tempo, TempoChange, TempoMap, Time,
    TjaDecoder, TjaEncoder, chart_project_from_tja, chart_project_to_tja, debug_compare_charts,
};

fn reimport(project: &ChartProject) -> ChartProject {
    let document = chart_project_to_tja(project);
    let text = TjaEncoder::encode(&document);
    chart_project_from_tja(&TjaDecoder::decode_str(&text))
}

fn compare(a: &ChartProject, b: &ChartProject) -> Vec<String> {
    let mut messages = Vec::new();
    debug_compare_charts(a, b, |m| messages.push(m.to_string()));
    messages
}

const FULL_CHART: &str = "\
TITLE:Round Trip
SUBTITLE:--integration
BPM:150
WAVE:song.ogg
OFFSET:-2.1
DEMOSTART:33.4

COURSE:Oni
LEVEL:9.5
BALLOON:5,8
SCOREINIT:450
SCOREDIFF:120
NOTESDESIGNER:someone

#START
1020,
#GOGOSTART
1111,
#SCROLL 1.5
2222,
#GOGOEND
#BPMCHANGE 180
1012,
#MEASURE 3/4
#BARLINEOFF
102,
#MEASURE 4/4
#BARLINEON
7008,
9008,
#DELAY 0.5
1111,
#LYRIC somewords
1111,
,
#END
";

#[test]
fn full_chart_round_trip_is_lossless() {
    let original = chart_project_from_tja(&TjaDecoder::decode_str(FULL_CHART));
    let reimported = reimport(&original);
    assert_eq!(compare(&original, &reimported), Vec::<String>::new());
}

#[test]
fn round_trip_is_stable_after_first_pass() {
    // The first export may regrid; a second pass must be a fixed point.
    let first = reimport(&chart_project_from_tja(&TjaDecoder::decode_str(FULL_CHART)));
    let second = reimport(&first);
    assert_eq!(compare(&first, &second), Vec::<String>::new());
}

#[test]
fn don_and_balloon_example() {
    let content = "\
TITLE:Example
BPM:120
BALLOON:5
COURSE:Oni
#START
1070,
0800,
#END
";
    // Don at beat 0, balloon start at beat 2, end marker at beat 5.
    let project = chart_project_from_tja(&TjaDecoder::decode_str(content));
    let reimported = reimport(&project);

    let notes = &reimported.courses[0].notes_normal;
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].note_type, NoteType::Don);
    assert_eq!(notes[0].beat_time, Beat::zero());
    assert_eq!(notes[1].note_type, NoteType::Balloon);
    assert_eq!(notes[1].beat_time, Beat::from_beats(2));
    assert_eq!(notes[1].beat_duration, Beat::from_beats(3));
    assert_eq!(notes[1].balloon_pop_count, 5);
}

#[test]
fn gogo_range_survives_round_trip() {
    let mut project = chart_project_from_tja(&TjaDecoder::decode_str(
        "BPM:120\nCOURSE:Oni\n#START\n1111,\n1111,\n1111,\n#END\n",
    ));
    project.courses[0]
        .gogo_ranges
        .insert_or_update(GoGoRange::new(Beat::from_beats(4), Beat::from_beats(4)));

    let reimported = reimport(&project);
    let gogo = &reimported.courses[0].gogo_ranges;
    assert_eq!(gogo.len(), 1);
    assert_eq!(gogo[0].beat_time, Beat::from_beats(4));
    assert_eq!(gogo[0].beat_duration, Beat::from_beats(4));
}

#[test]
fn time_offsets_round_trip_within_tolerance() {
    let content = "BPM:120\n#START\n#DELAY 0.123\n1111,\n#END\n";
    let project = chart_project_from_tja(&TjaDecoder::decode_str(content));
    let reimported = reimport(&project);
    for (a, b) in project.courses[0]
        .notes_normal
        .iter()
        .zip(reimported.courses[0].notes_normal.iter())
    {
        assert!((a.time_offset.seconds - b.time_offset.seconds).abs() < 1e-6);
    }
}

#[test]
fn comparator_flags_single_balloon_difference() {
    let project = chart_project_from_tja(&TjaDecoder::decode_str(
        "BPM:120\nBALLOON:5\n#START\n7008,\n#END\n",
    ));
    let mut modified = project.clone();
    modified.courses[0].notes_normal[0].balloon_pop_count = 6;

    let messages = compare(&project, &modified);
    assert_eq!(messages, vec!["NotesNormal[0].BalloonPopCount value mismatch"]);
}

proptest! {
    #[test]
    fn beat_time_conversion_inverts(
        bpms in proptest::collection::vec(30.0_f64..600.0, 1..6),
        query_ticks in 0_i32..(192 * 256),
    ) {
        let tempo_changes = bpms
            .iter()
            .enumerate()
            .map(|(i, &bpm)| TempoChange::new(Beat::from_beats(i as i32 * 8), Tempo::new(bpm)))
            .collect::<Vec<_>>();
        let map = TempoMap::new(SortedTimeline::from(tempo_changes), SortedTimeline::new());

        let beat = Beat::from_ticks(query_ticks);
        prop_assert_eq!(map.time_to_beat(map.beat_to_time(beat)), beat);

        let time = map.beat_to_time(beat);
        let round = map.beat_to_time(map.time_to_beat(time));
        prop_assert!((round.seconds - time.seconds).abs() < 1e-9);
    }
}

#[test]
fn encoded_text_parses_with_foreign_defaults() {
    // Exported text should stand alone: no reliance on state carried over
    // from the source document.
    let project = chart_project_from_tja(&TjaDecoder::decode_str(FULL_CHART));
    let text = TjaEncoder::encode(&chart_project_to_tja(&project));
    let document = TjaDecoder::decode_str(&text);
    assert_eq!(document.metadata.title, "Round Trip");
    assert_eq!(document.metadata.bpm, Tempo::new(150.0));
    assert_eq!(document.metadata.offset, Time::from_sec(-2.1));
    assert_eq!(document.courses.len(), 1);
    assert_eq!(document.courses[0].metadata.level, 9);
    assert_eq!(document.courses[0].metadata.level_decimal, 5);
    assert_eq!(document.courses[0].metadata.balloon, vec![5, 8]);
}
