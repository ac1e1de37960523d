//! Parsed TJA document types plus the line-oriented text decoder/encoder.
//!
//! The document keeps each measure's events grouped into per-measure
//! sub-streams with beat offsets relative to the measure start; the model
//! conversions in `convert` translate between this shape and `ChartProject`.

use std::path::Path;

use anyhow::Result;

use crate::beat::{Beat, Complex, Tempo, Time, TimeSignature};
use crate::events::ScrollMethod;

/// TJA note channel characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TjaNoteType {
    None,
    Don,
    Ka,
    DonBig,
    KaBig,
    DrumrollStart,
    DrumrollBigStart,
    BalloonStart,
    BalloonOrDrumrollEnd,
    BalloonSpecialStart,
    DonBigBoth,
    KaBigBoth,
    Bomb,
    Fuse,
    Hidden,
    KaDon,
}

impl TjaNoteType {
    pub fn from_char(c: char) -> Option<TjaNoteType> {
        Some(match c {
            '0' => TjaNoteType::None,
            '1' => TjaNoteType::Don,
            '2' => TjaNoteType::Ka,
            '3' => TjaNoteType::DonBig,
            '4' => TjaNoteType::KaBig,
            '5' => TjaNoteType::DrumrollStart,
            '6' => TjaNoteType::DrumrollBigStart,
            '7' => TjaNoteType::BalloonStart,
            '8' => TjaNoteType::BalloonOrDrumrollEnd,
            '9' => TjaNoteType::BalloonSpecialStart,
            'A' => TjaNoteType::DonBigBoth,
            'B' => TjaNoteType::KaBigBoth,
            'C' => TjaNoteType::Bomb,
            'D' => TjaNoteType::Fuse,
            'F' => TjaNoteType::Hidden,
            'G' => TjaNoteType::KaDon,
            _ => return None,
        })
    }

    pub fn to_char(self) -> char {
        match self {
            TjaNoteType::None => '0',
            TjaNoteType::Don => '1',
            TjaNoteType::Ka => '2',
            TjaNoteType::DonBig => '3',
            TjaNoteType::KaBig => '4',
            TjaNoteType::DrumrollStart => '5',
            TjaNoteType::DrumrollBigStart => '6',
            TjaNoteType::BalloonStart => '7',
            TjaNoteType::BalloonOrDrumrollEnd => '8',
            TjaNoteType::BalloonSpecialStart => '9',
            TjaNoteType::DonBigBoth => 'A',
            TjaNoteType::KaBigBoth => 'B',
            TjaNoteType::Bomb => 'C',
            TjaNoteType::Fuse => 'D',
            TjaNoteType::Hidden => 'F',
            TjaNoteType::KaDon => 'G',
        }
    }
}

/// Song-level header block.
#[derive(Debug, Clone, PartialEq)]
pub struct TjaMetadata {
    pub title: String,
    pub title_ja: String,
    pub title_en: String,
    pub title_cn: String,
    pub title_tw: String,
    pub title_ko: String,
    pub subtitle: String,
    pub subtitle_ja: String,
    pub subtitle_en: String,
    pub subtitle_cn: String,
    pub subtitle_tw: String,
    pub subtitle_ko: String,
    pub bpm: Tempo,
    pub offset: Time,
    pub demo_start: Time,
    pub wave: String,
    pub preimage: String,
    pub song_volume: f32,
    pub sound_effect_volume: f32,
    pub bg_image: String,
    pub bg_movie: String,
    pub movie_offset: Time,
    pub maker: String,
    pub genre: String,
    pub lyrics_file: String,
}

impl Default for TjaMetadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            title_ja: String::new(),
            title_en: String::new(),
            title_cn: String::new(),
            title_tw: String::new(),
            title_ko: String::new(),
            subtitle: String::new(),
            subtitle_ja: String::new(),
            subtitle_en: String::new(),
            subtitle_cn: String::new(),
            subtitle_tw: String::new(),
            subtitle_ko: String::new(),
            bpm: Tempo::FALLBACK,
            offset: Time::zero(),
            demo_start: Time::zero(),
            wave: String::new(),
            preimage: String::new(),
            song_volume: 1.0,
            sound_effect_volume: 1.0,
            bg_image: String::new(),
            bg_movie: String::new(),
            movie_offset: Time::zero(),
            maker: String::new(),
            genre: String::new(),
            lyrics_file: String::new(),
        }
    }
}

/// Per-course metadata block (the key/value lines between `#END` and the
/// next `#START`). Numeric fields stay raw; the model conversion clamps.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseMetadata {
    pub course: i32,
    pub level: i32,
    pub level_decimal: i32,
    pub balloon: Vec<i16>,
    pub score_init: i32,
    pub score_diff: i32,
    pub notes_designer: String,
    pub life: i32,
    pub side: i32,
}

impl Default for CourseMetadata {
    fn default() -> Self {
        Self {
            course: 3, // Oni
            level: 1,
            level_decimal: -1,
            balloon: Vec::new(),
            score_init: 0,
            score_diff: 0,
            notes_designer: String::new(),
            life: 5,
            side: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedNote {
    pub time_within_measure: Beat,
    pub note_type: TjaNoteType,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedTempoChange {
    pub time_within_measure: Beat,
    pub tempo: Tempo,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedScrollChange {
    pub time_within_measure: Beat,
    pub scroll_speed: Complex,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedScrollType {
    pub time_within_measure: Beat,
    pub method: ScrollMethod,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedJposScroll {
    pub time_within_measure: Beat,
    pub movement: Complex,
    pub duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedBarLineChange {
    pub time_within_measure: Beat,
    pub is_visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedDelayChange {
    pub time_within_measure: Beat,
    pub delay: Time,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedGoGoChange {
    pub time_within_measure: Beat,
    pub is_gogo: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLyricChange {
    pub time_within_measure: Beat,
    pub lyric: String,
}

/// One measure of a course body: absolute start beat, active signature and
/// the events inside it, offset-relative.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedMeasure {
    pub start_time: Beat,
    pub time_signature: TimeSignature,
    pub notes: Vec<ParsedNote>,
    pub tempo_changes: Vec<ParsedTempoChange>,
    pub scroll_changes: Vec<ParsedScrollChange>,
    pub scroll_types: Vec<ParsedScrollType>,
    pub jpos_scroll_changes: Vec<ParsedJposScroll>,
    pub bar_line_changes: Vec<ParsedBarLineChange>,
    pub delay_changes: Vec<ParsedDelayChange>,
    pub gogo_changes: Vec<ParsedGoGoChange>,
    pub lyric_changes: Vec<ParsedLyricChange>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedCourse {
    pub metadata: CourseMetadata,
    pub measures: Vec<ParsedMeasure>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedTja {
    pub metadata: TjaMetadata,
    pub courses: Vec<ParsedCourse>,
}

/// TJA file decoder
pub struct TjaDecoder;

/// Command positioned between note tokens, pinned to the index of the
/// following token so measure flushing can compute its beat offset.
#[derive(Debug, Clone)]
enum PendingCommand {
    Tempo(Tempo),
    Scroll(Complex),
    ScrollType(ScrollMethod),
    JposScroll { movement: Complex, duration: f32 },
    BarLine(bool),
    Delay(Time),
    GoGo(bool),
    Lyric(String),
}

/// Accumulates one measure's tokens until the `,` separator flushes it.
#[derive(Default)]
struct PendingMeasure {
    notes: Vec<TjaNoteType>,
    commands: Vec<(usize, PendingCommand)>,
}

impl PendingMeasure {
    fn is_empty(&self) -> bool {
        self.notes.is_empty() && self.commands.is_empty()
    }
}

struct CourseState {
    metadata: CourseMetadata,
    measures: Vec<ParsedMeasure>,
    pending: PendingMeasure,
    signature: TimeSignature,
    next_measure_start: Beat,
}

impl CourseState {
    fn new(metadata: CourseMetadata) -> Self {
        Self {
            metadata,
            measures: Vec::new(),
            pending: PendingMeasure::default(),
            signature: TimeSignature::common_time(),
            next_measure_start: Beat::zero(),
        }
    }

    fn flush_measure(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let bar_length = self.signature.duration_per_bar();
        let slot_count = pending.notes.len().max(1);

        let offset_of = |index: usize| -> Beat {
            let clamped = index.min(slot_count);
            Beat::from_ticks((bar_length.ticks as i64 * clamped as i64 / slot_count as i64) as i32)
        };

        let mut measure = ParsedMeasure {
            start_time: self.next_measure_start,
            time_signature: self.signature,
            ..ParsedMeasure::default()
        };
        for (index, note_type) in pending.notes.into_iter().enumerate() {
            if note_type != TjaNoteType::None {
                measure.notes.push(ParsedNote {
                    time_within_measure: offset_of(index),
                    note_type,
                });
            }
        }
        for (index, command) in pending.commands {
            let time_within_measure = offset_of(index);
            match command {
                PendingCommand::Tempo(tempo) => measure.tempo_changes.push(ParsedTempoChange {
                    time_within_measure,
                    tempo,
                }),
                PendingCommand::Scroll(scroll_speed) => {
                    measure.scroll_changes.push(ParsedScrollChange {
                        time_within_measure,
                        scroll_speed,
                    })
                }
                PendingCommand::ScrollType(method) => measure.scroll_types.push(ParsedScrollType {
                    time_within_measure,
                    method,
                }),
                PendingCommand::JposScroll { movement, duration } => {
                    measure.jpos_scroll_changes.push(ParsedJposScroll {
                        time_within_measure,
                        movement,
                        duration,
                    })
                }
                PendingCommand::BarLine(is_visible) => {
                    measure.bar_line_changes.push(ParsedBarLineChange {
                        time_within_measure,
                        is_visible,
                    })
                }
                PendingCommand::Delay(delay) => measure.delay_changes.push(ParsedDelayChange {
                    time_within_measure,
                    delay,
                }),
                PendingCommand::GoGo(is_gogo) => measure.gogo_changes.push(ParsedGoGoChange {
                    time_within_measure,
                    is_gogo,
                }),
                PendingCommand::Lyric(lyric) => measure.lyric_changes.push(ParsedLyricChange {
                    time_within_measure,
                    lyric,
                }),
            }
        }

        self.next_measure_start += bar_length;
        self.measures.push(measure);
    }
}

impl TjaDecoder {
    pub fn decode(path: &Path) -> Result<ParsedTja> {
        let raw_bytes = std::fs::read(path)?;
        let content = detect_encoding_and_decode(&raw_bytes);
        Ok(Self::decode_str(&content))
    }

    /// Permissive line parser: malformed or unknown content is dropped,
    /// never an error.
    pub fn decode_str(content: &str) -> ParsedTja {
        let mut document = ParsedTja::default();
        let mut course_metadata = CourseMetadata::default();
        let mut body: Option<CourseState> = None;

        for raw_line in content.lines() {
            let line = strip_comment(raw_line).trim();
            if line.is_empty() {
                continue;
            }

            if let Some(rest) = line.strip_prefix('#') {
                let (command, argument) = split_command(rest);
                match command.as_str() {
                    "START" => {
                        // #START P1/P2 double-play markers are ignored.
                        body = Some(CourseState::new(course_metadata.clone()));
                    }
                    "END" => {
                        if let Some(mut state) = body.take() {
                            if !state.pending.is_empty() {
                                state.flush_measure();
                            }
                            document.courses.push(ParsedCourse {
                                metadata: state.metadata,
                                measures: state.measures,
                            });
                        } else {
                            log::warn!("#END without matching #START");
                        }
                        course_metadata = CourseMetadata::default();
                    }
                    _ => {
                        if let Some(state) = body.as_mut() {
                            Self::parse_body_command(state, &command, argument);
                        } else {
                            log::debug!("dropping command outside course body: #{command}");
                        }
                    }
                }
                continue;
            }

            if let Some(state) = body.as_mut() {
                Self::parse_note_row(state, line);
            } else if let Some((key, value)) = line.split_once(':') {
                Self::parse_header_pair(
                    &mut document.metadata,
                    &mut course_metadata,
                    key.trim(),
                    value.trim(),
                );
            } else {
                log::debug!("dropping malformed header line: {line}");
            }
        }

        if let Some(mut state) = body.take() {
            // Unterminated course body; salvage what was parsed.
            log::warn!("#START without matching #END");
            if !state.pending.is_empty() {
                state.flush_measure();
            }
            document.courses.push(ParsedCourse {
                metadata: state.metadata,
                measures: state.measures,
            });
        }

        document
    }

    fn parse_header_pair(
        metadata: &mut TjaMetadata,
        course: &mut CourseMetadata,
        key: &str,
        value: &str,
    ) {
        match key.to_ascii_uppercase().as_str() {
            "TITLE" => metadata.title = value.to_string(),
            "TITLEJA" => metadata.title_ja = value.to_string(),
            "TITLEEN" => metadata.title_en = value.to_string(),
            "TITLECN" => metadata.title_cn = value.to_string(),
            "TITLETW" => metadata.title_tw = value.to_string(),
            "TITLEKO" => metadata.title_ko = value.to_string(),
            "SUBTITLE" => metadata.subtitle = value.to_string(),
            "SUBTITLEJA" => metadata.subtitle_ja = value.to_string(),
            "SUBTITLEEN" => metadata.subtitle_en = value.to_string(),
            "SUBTITLECN" => metadata.subtitle_cn = value.to_string(),
            "SUBTITLETW" => metadata.subtitle_tw = value.to_string(),
            "SUBTITLEKO" => metadata.subtitle_ko = value.to_string(),
            "BPM" => {
                if let Ok(bpm) = value.parse::<f64>() {
                    metadata.bpm = Tempo::new(bpm);
                }
            }
            "OFFSET" => {
                if let Ok(seconds) = value.parse::<f64>() {
                    metadata.offset = Time::from_sec(seconds);
                }
            }
            "DEMOSTART" => {
                if let Ok(seconds) = value.parse::<f64>() {
                    metadata.demo_start = Time::from_sec(seconds);
                }
            }
            "WAVE" => metadata.wave = value.to_string(),
            "PREIMAGE" => metadata.preimage = value.to_string(),
            "SONGVOL" => {
                if let Ok(percent) = value.parse::<f32>() {
                    metadata.song_volume = percent / 100.0;
                }
            }
            "SEVOL" => {
                if let Ok(percent) = value.parse::<f32>() {
                    metadata.sound_effect_volume = percent / 100.0;
                }
            }
            "BGIMAGE" => metadata.bg_image = value.to_string(),
            "BGMOVIE" => metadata.bg_movie = value.to_string(),
            "MOVIEOFFSET" => {
                if let Ok(seconds) = value.parse::<f64>() {
                    metadata.movie_offset = Time::from_sec(seconds);
                }
            }
            "MAKER" => metadata.maker = value.to_string(),
            "GENRE" => metadata.genre = value.to_string(),
            "LYRICS" => metadata.lyrics_file = value.to_string(),
            "COURSE" => course.course = parse_course_name(value),
            "LEVEL" => {
                let (level, decimal) = parse_level(value);
                course.level = level;
                course.level_decimal = decimal;
            }
            "BALLOON" => {
                course.balloon = value
                    .split(',')
                    .filter_map(|v| v.trim().parse::<i16>().ok())
                    .collect();
            }
            "SCOREINIT" => course.score_init = value.parse().unwrap_or(0),
            "SCOREDIFF" => course.score_diff = value.parse().unwrap_or(0),
            "NOTESDESIGNER" => course.notes_designer = value.to_string(),
            "LIFE" => course.life = value.parse().unwrap_or(5),
            "SIDE" => course.side = parse_side_name(value),
            other => log::debug!("dropping unknown header key: {other}"),
        }
    }

    fn parse_body_command(state: &mut CourseState, command: &str, argument: &str) {
        let at = state.pending.notes.len();
        match command {
            "MEASURE" => {
                if let Some((numerator, denominator)) = argument.split_once('/')
                    && let (Ok(n), Ok(d)) =
                        (numerator.trim().parse::<i32>(), denominator.trim().parse::<i32>())
                {
                    let signature = TimeSignature::new(n, d);
                    if signature.is_valid() {
                        state.signature = signature;
                    } else {
                        log::warn!("dropping invalid #MEASURE {argument}");
                    }
                }
            }
            "BPMCHANGE" => {
                if let Ok(bpm) = argument.parse::<f64>() {
                    state
                        .pending
                        .commands
                        .push((at, PendingCommand::Tempo(Tempo::new(bpm))));
                }
            }
            "SCROLL" => {
                if let Some(scroll) = parse_complex(argument) {
                    state.pending.commands.push((at, PendingCommand::Scroll(scroll)));
                }
            }
            "DELAY" => {
                if let Ok(seconds) = argument.parse::<f64>() {
                    state
                        .pending
                        .commands
                        .push((at, PendingCommand::Delay(Time::from_sec(seconds))));
                }
            }
            "GOGOSTART" => state.pending.commands.push((at, PendingCommand::GoGo(true))),
            "GOGOEND" => state.pending.commands.push((at, PendingCommand::GoGo(false))),
            "BARLINEON" => state.pending.commands.push((at, PendingCommand::BarLine(true))),
            "BARLINEOFF" => state.pending.commands.push((at, PendingCommand::BarLine(false))),
            "NMSCROLL" => state
                .pending
                .commands
                .push((at, PendingCommand::ScrollType(ScrollMethod::Nm))),
            "HBSCROLL" => state
                .pending
                .commands
                .push((at, PendingCommand::ScrollType(ScrollMethod::Hb))),
            "BMSCROLL" => state
                .pending
                .commands
                .push((at, PendingCommand::ScrollType(ScrollMethod::Bm))),
            "JPOSSCROLL" => {
                let mut args = argument.split_whitespace();
                let duration = args.next().and_then(|v| v.parse::<f32>().ok());
                let movement = args.next().and_then(parse_complex);
                if let (Some(duration), Some(mut movement)) = (duration, movement) {
                    // Optional third argument: direction 0 moves left.
                    if args.next() == Some("0") {
                        movement = Complex::new(-movement.real, movement.imag);
                    }
                    state
                        .pending
                        .commands
                        .push((at, PendingCommand::JposScroll { movement, duration }));
                }
            }
            "LYRIC" => state
                .pending
                .commands
                .push((at, PendingCommand::Lyric(argument.to_string()))),
            other => log::debug!("dropping unknown chart command: #{other}"),
        }
    }

    fn parse_note_row(state: &mut CourseState, line: &str) {
        for c in line.chars() {
            if c == ',' {
                state.flush_measure();
            } else if let Some(note_type) = TjaNoteType::from_char(c.to_ascii_uppercase()) {
                state.pending.notes.push(note_type);
            } else if !c.is_whitespace() {
                log::debug!("dropping unknown note token: {c}");
            }
        }
    }
}

/// TJA text serializer, the inverse of [`TjaDecoder`].
pub struct TjaEncoder;

impl TjaEncoder {
    pub fn encode(document: &ParsedTja) -> String {
        let mut out = String::new();
        Self::write_metadata(&mut out, &document.metadata);
        for course in &document.courses {
            out.push('\n');
            Self::write_course(&mut out, course);
        }
        out
    }

    pub fn save(document: &ParsedTja, path: &Path) -> Result<()> {
        std::fs::write(path, Self::encode(document))?;
        Ok(())
    }

    fn write_metadata(out: &mut String, m: &TjaMetadata) {
        push_pair(out, "TITLE", &m.title);
        push_pair_nonempty(out, "TITLEJA", &m.title_ja);
        push_pair_nonempty(out, "TITLEEN", &m.title_en);
        push_pair_nonempty(out, "TITLECN", &m.title_cn);
        push_pair_nonempty(out, "TITLETW", &m.title_tw);
        push_pair_nonempty(out, "TITLEKO", &m.title_ko);
        push_pair(out, "SUBTITLE", &m.subtitle);
        push_pair_nonempty(out, "SUBTITLEJA", &m.subtitle_ja);
        push_pair_nonempty(out, "SUBTITLEEN", &m.subtitle_en);
        push_pair_nonempty(out, "SUBTITLECN", &m.subtitle_cn);
        push_pair_nonempty(out, "SUBTITLETW", &m.subtitle_tw);
        push_pair_nonempty(out, "SUBTITLEKO", &m.subtitle_ko);
        push_pair(out, "BPM", &m.bpm.bpm.to_string());
        push_pair(out, "WAVE", &m.wave);
        push_pair_nonempty(out, "PREIMAGE", &m.preimage);
        push_pair(out, "OFFSET", &m.offset.seconds.to_string());
        push_pair(out, "DEMOSTART", &m.demo_start.seconds.to_string());
        if m.song_volume != 1.0 {
            push_pair(out, "SONGVOL", &(m.song_volume * 100.0).to_string());
        }
        if m.sound_effect_volume != 1.0 {
            push_pair(out, "SEVOL", &(m.sound_effect_volume * 100.0).to_string());
        }
        push_pair_nonempty(out, "BGIMAGE", &m.bg_image);
        push_pair_nonempty(out, "BGMOVIE", &m.bg_movie);
        if m.movie_offset != Time::zero() {
            push_pair(out, "MOVIEOFFSET", &m.movie_offset.seconds.to_string());
        }
        push_pair_nonempty(out, "MAKER", &m.maker);
        push_pair_nonempty(out, "GENRE", &m.genre);
        push_pair_nonempty(out, "LYRICS", &m.lyrics_file);
    }

    fn write_course(out: &mut String, course: &ParsedCourse) {
        let m = &course.metadata;
        push_pair(out, "COURSE", &m.course.to_string());
        if m.level_decimal >= 0 {
            push_pair(out, "LEVEL", &format!("{}.{}", m.level, m.level_decimal));
        } else {
            push_pair(out, "LEVEL", &m.level.to_string());
        }
        if !m.balloon.is_empty() {
            let list = m
                .balloon
                .iter()
                .map(|v| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            push_pair(out, "BALLOON", &list);
        }
        if m.score_init != 0 {
            push_pair(out, "SCOREINIT", &m.score_init.to_string());
        }
        if m.score_diff != 0 {
            push_pair(out, "SCOREDIFF", &m.score_diff.to_string());
        }
        push_pair_nonempty(out, "NOTESDESIGNER", &m.notes_designer);
        if m.life != 5 {
            push_pair(out, "LIFE", &m.life.to_string());
        }
        if m.side != 0 {
            push_pair(out, "SIDE", &(m.side + 1).to_string());
        }

        out.push_str("\n#START\n");
        let mut active_signature = TimeSignature::common_time();
        for measure in &course.measures {
            if measure.time_signature != active_signature {
                active_signature = measure.time_signature;
                out.push_str(&format!(
                    "#MEASURE {}/{}\n",
                    active_signature.numerator, active_signature.denominator
                ));
            }
            Self::write_measure(out, measure);
        }
        out.push_str("#END\n");
    }

    /// Merge a measure's sub-streams into note rows with interleaved
    /// commands, on the coarsest grid every event offset lies on.
    fn write_measure(out: &mut String, measure: &ParsedMeasure) {
        let bar_length = measure.time_signature.duration_per_bar();

        let mut grid = bar_length.ticks;
        let mut fold = |ticks: i32| grid = gcd(grid, ticks);
        for v in &measure.notes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.tempo_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.scroll_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.scroll_types {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.jpos_scroll_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.bar_line_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.delay_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.gogo_changes {
            fold(v.time_within_measure.ticks);
        }
        for v in &measure.lyric_changes {
            fold(v.time_within_measure.ticks);
        }
        let grid = grid.max(1);
        let slot_count = (bar_length.ticks / grid).max(1);

        for slot in 0..slot_count {
            let offset = Beat::from_ticks(slot * grid);
            // Commands precede the note occupying the same slot, in a fixed
            // order so re-decoding is deterministic.
            for v in &measure.tempo_changes {
                if v.time_within_measure == offset {
                    out.push_str(&format!("#BPMCHANGE {}\n", v.tempo.bpm));
                }
            }
            for v in &measure.scroll_changes {
                if v.time_within_measure == offset {
                    out.push_str(&format!("#SCROLL {}\n", v.scroll_speed));
                }
            }
            for v in &measure.scroll_types {
                if v.time_within_measure == offset {
                    out.push_str(match v.method {
                        ScrollMethod::Nm => "#NMSCROLL\n",
                        ScrollMethod::Hb => "#HBSCROLL\n",
                        ScrollMethod::Bm => "#BMSCROLL\n",
                    });
                }
            }
            for v in &measure.jpos_scroll_changes {
                if v.time_within_measure == offset {
                    out.push_str(&format!("#JPOSSCROLL {} {}\n", v.duration, v.movement));
                }
            }
            for v in &measure.delay_changes {
                if v.time_within_measure == offset {
                    out.push_str(&format!("#DELAY {}\n", v.delay.seconds));
                }
            }
            for v in &measure.gogo_changes {
                if v.time_within_measure == offset {
                    out.push_str(if v.is_gogo { "#GOGOSTART\n" } else { "#GOGOEND\n" });
                }
            }
            for v in &measure.bar_line_changes {
                if v.time_within_measure == offset {
                    out.push_str(if v.is_visible { "#BARLINEON\n" } else { "#BARLINEOFF\n" });
                }
            }
            for v in &measure.lyric_changes {
                if v.time_within_measure == offset {
                    out.push_str(&format!("#LYRIC {}\n", v.lyric));
                }
            }

            let note = measure
                .notes
                .iter()
                .find(|v| v.time_within_measure == offset)
                .map_or(TjaNoteType::None, |v| v.note_type);
            out.push(note.to_char());
        }
        out.push_str(",\n");
    }
}

fn push_pair(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push(':');
    out.push_str(value);
    out.push('\n');
}

fn push_pair_nonempty(out: &mut String, key: &str, value: &str) {
    if !value.is_empty() {
        push_pair(out, key, value);
    }
}

fn strip_comment(line: &str) -> &str {
    line.split_once("//").map_or(line, |(before, _)| before)
}

/// Split `rest` of a `#...` line into uppercased command name and argument.
fn split_command(rest: &str) -> (String, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((command, argument)) => (command.to_ascii_uppercase(), argument.trim()),
        None => (rest.to_ascii_uppercase(), ""),
    }
}

fn parse_course_name(value: &str) -> i32 {
    if let Ok(number) = value.parse::<i32>() {
        return number.clamp(0, 6);
    }
    match value.to_ascii_uppercase().as_str() {
        "EASY" => 0,
        "NORMAL" => 1,
        "HARD" => 2,
        "ONI" => 3,
        "EDIT" | "URA" => 4,
        "TOWER" => 5,
        "DAN" => 6,
        _ => 3,
    }
}

fn parse_side_name(value: &str) -> i32 {
    match value.to_ascii_uppercase().as_str() {
        "EX" | "2" => 1,
        _ => 0,
    }
}

/// `LEVEL:8.5` carries a decimal sub-level tag; `LEVEL:8` leaves it unset.
fn parse_level(value: &str) -> (i32, i32) {
    if let Some((integer, fraction)) = value.split_once('.') {
        let level = integer.trim().parse().unwrap_or(1);
        let decimal = fraction
            .trim()
            .chars()
            .next()
            .and_then(|c| c.to_digit(10))
            .map_or(-1, |d| d as i32);
        (level, decimal)
    } else {
        (value.parse().unwrap_or(1), -1)
    }
}

/// Scroll literals: `2`, `0.5`, `2i`, `1+0.5i`, `-1.5-2i`.
fn parse_complex(value: &str) -> Option<Complex> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(without_i) = value.strip_suffix(['i', 'I']) {
        // Find the sign separating real and imaginary parts, skipping a
        // leading sign on the real part.
        let split = without_i
            .char_indices()
            .rev()
            .find(|&(i, c)| i > 0 && (c == '+' || c == '-'))
            .map(|(i, _)| i);
        let (real_part, imag_part) = match split {
            Some(i) => (&without_i[..i], &without_i[i..]),
            None => ("", without_i),
        };
        let real = if real_part.is_empty() {
            0.0
        } else {
            real_part.parse::<f32>().ok()?
        };
        let imag = match imag_part {
            "" | "+" => 1.0,
            "-" => -1.0,
            v => v.parse::<f32>().ok()?,
        };
        Some(Complex::new(real, imag))
    } else {
        value.parse::<f32>().ok().map(|real| Complex::new(real, 0.0))
    }
}

fn gcd(a: i32, b: i32) -> i32 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Detect encoding and decode bytes to string
fn detect_encoding_and_decode(raw: &[u8]) -> String {
    // Check for UTF-8 BOM
    if raw.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(&raw[3..]).into_owned();
    }

    // Try UTF-8 first
    if let Ok(s) = std::str::from_utf8(raw) {
        return s.to_string();
    }

    // Fall back to Shift_JIS, lossy on errors; TJA files in the wild are
    // overwhelmingly either UTF-8 or Shift_JIS.
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(raw);
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SIMPLE_CHART: &str = "\
TITLE:Test Song
BPM:160
WAVE:test.ogg
OFFSET:-1.5

COURSE:Oni
LEVEL:8
BALLOON:5

#START
1011,
2022,
#GOGOSTART
1111,
#GOGOEND
7008,
#END
";

    #[test]
    fn decodes_header_metadata() {
        let doc = TjaDecoder::decode_str(SIMPLE_CHART);
        assert_eq!(doc.metadata.title, "Test Song");
        assert_eq!(doc.metadata.bpm, Tempo::new(160.0));
        assert_eq!(doc.metadata.wave, "test.ogg");
        assert_eq!(doc.metadata.offset, Time::from_sec(-1.5));
        assert_eq!(doc.courses.len(), 1);
        let course = &doc.courses[0];
        assert_eq!(course.metadata.course, 3);
        assert_eq!(course.metadata.level, 8);
        assert_eq!(course.metadata.level_decimal, -1);
        assert_eq!(course.metadata.balloon, vec![5]);
    }

    #[test]
    fn decodes_measures_on_grid() {
        let doc = TjaDecoder::decode_str(SIMPLE_CHART);
        let measures = &doc.courses[0].measures;
        assert_eq!(measures.len(), 4);

        // "1011" is a 4-slot grid on a 4/4 bar; slot width is one beat.
        let first = &measures[0];
        assert_eq!(first.start_time, Beat::zero());
        assert_eq!(first.notes.len(), 3);
        assert_eq!(first.notes[0].time_within_measure, Beat::zero());
        assert_eq!(first.notes[0].note_type, TjaNoteType::Don);
        assert_eq!(first.notes[1].time_within_measure, Beat::from_beats(2));
        assert_eq!(first.notes[2].time_within_measure, Beat::from_beats(3));

        assert_eq!(measures[1].start_time, Beat::from_beats(4));
        assert_eq!(measures[2].gogo_changes.len(), 1);
        assert!(measures[2].gogo_changes[0].is_gogo);
        assert_eq!(measures[3].gogo_changes.len(), 1);
        assert!(!measures[3].gogo_changes[0].is_gogo);

        // Balloon start at slot 0, end at slot 3 of the last measure.
        assert_eq!(measures[3].notes[0].note_type, TjaNoteType::BalloonStart);
        assert_eq!(
            measures[3].notes[1].note_type,
            TjaNoteType::BalloonOrDrumrollEnd
        );
        assert_eq!(
            measures[3].notes[1].time_within_measure,
            Beat::from_beats(3)
        );
    }

    #[test]
    fn measure_command_changes_signature() {
        let content = "\
TITLE:x
BPM:120
COURSE:Oni
#START
#MEASURE 3/4
111,
#MEASURE 4/4
1111,
#END
";
        let doc = TjaDecoder::decode_str(content);
        let measures = &doc.courses[0].measures;
        assert_eq!(measures[0].time_signature, TimeSignature::new(3, 4));
        assert_eq!(measures[1].time_signature, TimeSignature::new(4, 4));
        assert_eq!(measures[1].start_time, Beat::from_beats(3));
    }

    #[test]
    fn bpm_change_mid_measure() {
        let content = "\
BPM:120
#START
10
#BPMCHANGE 180
11,
#END
";
        let doc = TjaDecoder::decode_str(content);
        let measure = &doc.courses[0].measures[0];
        assert_eq!(measure.tempo_changes.len(), 1);
        assert_eq!(measure.tempo_changes[0].tempo, Tempo::new(180.0));
        // Command sits before slot 2 of 4.
        assert_eq!(
            measure.tempo_changes[0].time_within_measure,
            Beat::from_beats(2)
        );
    }

    #[test]
    fn empty_measure_is_one_bar_of_rest() {
        let content = "BPM:120\n#START\n,\n1,\n#END\n";
        let doc = TjaDecoder::decode_str(content);
        let measures = &doc.courses[0].measures;
        assert_eq!(measures.len(), 2);
        assert!(measures[0].notes.is_empty());
        assert_eq!(measures[1].start_time, Beat::from_beats(4));
    }

    #[test]
    fn unknown_commands_and_tokens_are_dropped() {
        let content = "BPM:120\nNONSENSE:5\n#START\n#WHATEVER 3\n1x1,\n#END\n";
        let doc = TjaDecoder::decode_str(content);
        let measure = &doc.courses[0].measures[0];
        // "1x1" leaves a 2-slot grid after dropping the unknown token.
        assert_eq!(measure.notes.len(), 2);
        assert_eq!(measure.notes[1].time_within_measure, Beat::from_beats(2));
    }

    #[test]
    fn parse_complex_literals() {
        assert_eq!(parse_complex("2"), Some(Complex::new(2.0, 0.0)));
        assert_eq!(parse_complex("0.5"), Some(Complex::new(0.5, 0.0)));
        assert_eq!(parse_complex("2i"), Some(Complex::new(0.0, 2.0)));
        assert_eq!(parse_complex("i"), Some(Complex::new(0.0, 1.0)));
        assert_eq!(parse_complex("-i"), Some(Complex::new(0.0, -1.0)));
        assert_eq!(parse_complex("1+0.5i"), Some(Complex::new(1.0, 0.5)));
        assert_eq!(parse_complex("-1.5-2i"), Some(Complex::new(-1.5, -2.0)));
        assert_eq!(parse_complex(""), None);
        assert_eq!(parse_complex("abc"), None);
    }

    #[test]
    fn complex_display_round_trips_through_parse() {
        for complex in [
            Complex::new(2.0, 0.0),
            Complex::new(0.5, 1.0),
            Complex::new(0.0, -1.0),
            Complex::new(1.5, -0.5),
        ] {
            assert_eq!(parse_complex(&complex.to_string()), Some(complex));
        }
    }

    #[test]
    fn level_decimal_tag() {
        assert_eq!(parse_level("8"), (8, -1));
        assert_eq!(parse_level("8.5"), (8, 5));
        assert_eq!(parse_level("10.0"), (10, 0));
        assert_eq!(parse_level("junk"), (1, -1));
    }

    #[test]
    fn encode_decode_identity() {
        let doc = TjaDecoder::decode_str(SIMPLE_CHART);
        let encoded = TjaEncoder::encode(&doc);
        let redecoded = TjaDecoder::decode_str(&encoded);
        assert_eq!(doc, redecoded);
    }

    #[test]
    fn encode_emits_measure_commands_on_signature_change() {
        let content = "BPM:120\n#START\n#MEASURE 3/4\n111,\n111,\n#END\n";
        let doc = TjaDecoder::decode_str(content);
        let encoded = TjaEncoder::encode(&doc);
        // One #MEASURE for the change away from 4/4, not one per measure.
        assert_eq!(encoded.matches("#MEASURE 3/4").count(), 1);
        assert_eq!(TjaDecoder::decode_str(&encoded), doc);
    }

    #[test]
    fn decodes_shift_jis_file() {
        let (title_sjis, _, _) = encoding_rs::SHIFT_JIS.encode("タイトル");
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"TITLE:").unwrap();
        file.write_all(&title_sjis).unwrap();
        file.write_all(b"\nBPM:140\n#START\n1,\n#END\n").unwrap();
        file.flush().unwrap();

        let doc = TjaDecoder::decode(file.path()).unwrap();
        assert_eq!(doc.metadata.title, "タイトル");
        assert_eq!(doc.metadata.bpm, Tempo::new(140.0));
    }

    #[test]
    fn save_then_decode_round_trips() {
        let doc = TjaDecoder::decode_str(SIMPLE_CHART);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tja");
        TjaEncoder::save(&doc, &path).unwrap();
        assert_eq!(TjaDecoder::decode(&path).unwrap(), doc);
    }
}
