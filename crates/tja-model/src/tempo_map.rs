use std::ops::ControlFlow;

use serde::{Deserialize, Serialize};

use crate::beat::{Beat, Tempo, Time, TimeSignature};
use crate::events::{TempoChange, TimeSignatureChange};
use crate::timeline::SortedTimeline;

/// Cached segment boundary for O(log n) Beat↔Time conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
struct TempoBreakpoint {
    beat: Beat,
    time: Time,
    seconds_per_tick: f64,
}

/// Position handed to [`TempoMap::for_each_beat_bar`] callbacks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeatBarInfo {
    pub beat: Beat,
    /// True when `beat` starts a measure.
    pub is_bar: bool,
    pub signature: TimeSignature,
}

/// Canonical Beat↔Time bijection over piecewise-constant tempo/signature
/// segments.
///
/// `tempo` and `signature` are freely mutable (the accessor layer writes into
/// them); call [`Self::rebuild_acceleration_structure`] after bulk edits to
/// refresh the cached conversion breakpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TempoMap {
    pub tempo: SortedTimeline<TempoChange>,
    pub signature: SortedTimeline<TimeSignatureChange>,
    #[serde(skip)]
    accel: Vec<TempoBreakpoint>,
}

impl Default for TempoMap {
    fn default() -> Self {
        let mut map = Self {
            tempo: SortedTimeline::from(vec![TempoChange::new(Beat::zero(), Tempo::FALLBACK)]),
            signature: SortedTimeline::from(vec![TimeSignatureChange::new(
                Beat::zero(),
                TimeSignature::common_time(),
            )]),
            accel: Vec::new(),
        };
        map.rebuild_acceleration_structure();
        map
    }
}

impl TempoMap {
    pub fn new(
        tempo: SortedTimeline<TempoChange>,
        signature: SortedTimeline<TimeSignatureChange>,
    ) -> Self {
        let mut map = Self {
            tempo,
            signature,
            accel: Vec::new(),
        };
        map.rebuild_acceleration_structure();
        map
    }

    /// Walk the tempo timeline in order, accumulating absolute time at every
    /// boundary using the previous segment's BPM. Must run after bulk
    /// population and before any conversion query.
    pub fn rebuild_acceleration_structure(&mut self) {
        self.accel.clear();

        let mut cursor_beat = Beat::zero();
        let mut cursor_time = 0.0_f64;
        let mut cursor_spt = Tempo::FALLBACK.seconds_per_tick();

        // Charts are expected to define a tempo at beat zero; synthesize a
        // fallback segment when they don't so conversions stay total.
        if self.tempo.first().is_none_or(|t| t.beat > Beat::zero()) {
            self.accel.push(TempoBreakpoint {
                beat: Beat::zero(),
                time: Time::zero(),
                seconds_per_tick: cursor_spt,
            });
        }

        for change in self.tempo.iter() {
            cursor_time += (change.beat - cursor_beat).ticks as f64 * cursor_spt;
            cursor_beat = change.beat;
            cursor_spt = change.tempo.seconds_per_tick();
            self.accel.push(TempoBreakpoint {
                beat: change.beat,
                time: Time::from_sec(cursor_time),
                seconds_per_tick: cursor_spt,
            });
        }
    }

    fn breakpoint_at_beat(&self, beat: Beat) -> TempoBreakpoint {
        debug_assert!(!self.accel.is_empty(), "conversion before rebuild");
        let index = self.accel.partition_point(|bp| bp.beat <= beat);
        self.accel
            .get(index.saturating_sub(1))
            .copied()
            .unwrap_or(TempoBreakpoint {
                beat: Beat::zero(),
                time: Time::zero(),
                seconds_per_tick: Tempo::FALLBACK.seconds_per_tick(),
            })
    }

    fn breakpoint_at_time(&self, time: Time) -> TempoBreakpoint {
        debug_assert!(!self.accel.is_empty(), "conversion before rebuild");
        let index = self.accel.partition_point(|bp| bp.time <= time);
        self.accel
            .get(index.saturating_sub(1))
            .copied()
            .unwrap_or(TempoBreakpoint {
                beat: Beat::zero(),
                time: Time::zero(),
                seconds_per_tick: Tempo::FALLBACK.seconds_per_tick(),
            })
    }

    pub fn beat_to_time(&self, beat: Beat) -> Time {
        let bp = self.breakpoint_at_beat(beat);
        Time::from_sec(bp.time.seconds + (beat - bp.beat).ticks as f64 * bp.seconds_per_tick)
    }

    pub fn time_to_beat(&self, time: Time) -> Beat {
        let bp = self.breakpoint_at_time(time);
        if bp.seconds_per_tick <= 0.0 {
            return bp.beat;
        }
        let ticks = (time.seconds - bp.time.seconds) / bp.seconds_per_tick;
        bp.beat + Beat::from_ticks(ticks.round() as i32)
    }

    /// Effective tempo at `beat`.
    pub fn tempo_at(&self, beat: Beat) -> Tempo {
        self.tempo
            .try_find_last_at_beat(beat)
            .map_or(Tempo::FALLBACK, |t| t.tempo)
    }

    /// Effective signature at `beat` (invalid entries read as 4/4).
    pub fn signature_at(&self, beat: Beat) -> TimeSignature {
        self.signature
            .try_find_last_at_beat(beat)
            .map(|s| s.signature)
            .filter(|s| s.is_valid())
            .unwrap_or_else(TimeSignature::common_time)
    }

    /// Enumerate beat positions ascending from beat zero, flagging bar
    /// starts, until the callback breaks.
    ///
    /// Each signature change starts a fresh bar grid at its own beat, so a
    /// transition never lands mid-measure: a change inside a bar truncates
    /// that bar and the change's beat becomes a bar start. Emitted positions
    /// are strictly increasing.
    pub fn for_each_beat_bar<F>(&self, mut callback: F)
    where
        F: FnMut(BeatBarInfo) -> ControlFlow<()>,
    {
        // Signature changes at or before beat zero only select the starting
        // signature; iteration begins at zero regardless.
        let mut next_change = self
            .signature
            .iter()
            .position(|s| s.beat > Beat::zero())
            .unwrap_or(self.signature.len());

        let mut segment_start = Beat::zero();
        let mut active = self.signature_at(Beat::zero());

        'segments: loop {
            let segment_end = self.signature.get(next_change).map(|s| s.beat);
            let beat_len = active.duration_per_beat();
            let mut bar_start = segment_start;

            loop {
                for beat_in_bar in 0..active.numerator.max(1) {
                    let beat = bar_start + Beat::from_ticks(beat_len.ticks * beat_in_bar);
                    if let Some(end) = segment_end
                        && beat >= end
                    {
                        segment_start = end;
                        active = self.signature_at(end);
                        next_change += 1;
                        // Later changes may share a grid position; skip any
                        // that are not strictly ahead of the new segment.
                        while self
                            .signature
                            .get(next_change)
                            .is_some_and(|s| s.beat <= segment_start)
                        {
                            next_change += 1;
                        }
                        continue 'segments;
                    }
                    let info = BeatBarInfo {
                        beat,
                        is_bar: beat_in_bar == 0,
                        signature: active,
                    };
                    if callback(info).is_break() {
                        return;
                    }
                }
                bar_start += active.duration_per_bar();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_120_44() -> TempoMap {
        TempoMap::default()
    }

    #[test]
    fn beat_to_time_constant_tempo() {
        let map = map_120_44();
        assert_eq!(map.beat_to_time(Beat::zero()), Time::zero());
        assert!((map.beat_to_time(Beat::from_beats(1)).seconds - 0.5).abs() < 1e-12);
        assert!((map.beat_to_time(Beat::from_beats(4)).seconds - 2.0).abs() < 1e-12);
    }

    #[test]
    fn conversion_across_tempo_change() {
        let tempo = SortedTimeline::from(vec![
            TempoChange::new(Beat::zero(), Tempo::new(120.0)),
            TempoChange::new(Beat::from_beats(4), Tempo::new(240.0)),
        ]);
        let map = TempoMap::new(tempo, SortedTimeline::new());

        // 4 beats at 120 BPM = 2s, then 4 beats at 240 BPM = 1s.
        assert!((map.beat_to_time(Beat::from_beats(4)).seconds - 2.0).abs() < 1e-12);
        assert!((map.beat_to_time(Beat::from_beats(8)).seconds - 3.0).abs() < 1e-12);
        assert_eq!(map.time_to_beat(Time::from_sec(3.0)), Beat::from_beats(8));
        assert_eq!(map.time_to_beat(Time::from_sec(2.0)), Beat::from_beats(4));
    }

    #[test]
    fn beat_time_round_trip() {
        let tempo = SortedTimeline::from(vec![
            TempoChange::new(Beat::zero(), Tempo::new(180.0)),
            TempoChange::new(Beat::from_beats(7), Tempo::new(92.5)),
            TempoChange::new(Beat::from_beats(19), Tempo::new(222.0)),
        ]);
        let map = TempoMap::new(tempo, SortedTimeline::new());
        for ticks in (0..192 * 40).step_by(7) {
            let beat = Beat::from_ticks(ticks);
            assert_eq!(map.time_to_beat(map.beat_to_time(beat)), beat, "ticks {ticks}");
        }
    }

    #[test]
    fn empty_tempo_uses_fallback() {
        let map = TempoMap::new(SortedTimeline::new(), SortedTimeline::new());
        let one_beat = map.beat_to_time(Beat::from_beats(1)).seconds;
        assert!((one_beat - 0.5).abs() < 1e-12); // 120 BPM fallback
    }

    #[test]
    fn bar_enumeration_common_time() {
        let map = map_120_44();
        let mut bars = Vec::new();
        map.for_each_beat_bar(|it| {
            if it.beat > Beat::from_beats(8) {
                return ControlFlow::Break(());
            }
            if it.is_bar {
                bars.push(it.beat);
            }
            ControlFlow::Continue(())
        });
        assert_eq!(bars, vec![Beat::zero(), Beat::from_beats(4), Beat::from_beats(8)]);
    }

    #[test]
    fn bar_enumeration_respects_signature_changes() {
        let signature = SortedTimeline::from(vec![
            TimeSignatureChange::new(Beat::zero(), TimeSignature::new(4, 4)),
            TimeSignatureChange::new(Beat::from_beats(4), TimeSignature::new(3, 4)),
        ]);
        let map = TempoMap::new(SortedTimeline::new(), signature);

        let mut bars = Vec::new();
        map.for_each_beat_bar(|it| {
            if it.beat > Beat::from_beats(10) {
                return ControlFlow::Break(());
            }
            if it.is_bar {
                bars.push((it.beat, it.signature.numerator));
            }
            ControlFlow::Continue(())
        });
        assert_eq!(
            bars,
            vec![
                (Beat::zero(), 4),
                (Beat::from_beats(4), 3),
                (Beat::from_beats(7), 3),
                (Beat::from_beats(10), 3),
            ]
        );
    }

    #[test]
    fn mid_measure_signature_change_starts_new_bar() {
        // Change at beat 6 lands inside the 4/4 bar [4, 8); that bar is
        // truncated and a new grid starts at 6.
        let signature = SortedTimeline::from(vec![
            TimeSignatureChange::new(Beat::zero(), TimeSignature::new(4, 4)),
            TimeSignatureChange::new(Beat::from_beats(6), TimeSignature::new(2, 4)),
        ]);
        let map = TempoMap::new(SortedTimeline::new(), signature);

        let mut bars = Vec::new();
        map.for_each_beat_bar(|it| {
            if it.beat > Beat::from_beats(10) {
                return ControlFlow::Break(());
            }
            if it.is_bar {
                bars.push(it.beat);
            }
            ControlFlow::Continue(())
        });
        assert_eq!(
            bars,
            vec![
                Beat::zero(),
                Beat::from_beats(4),
                Beat::from_beats(6),
                Beat::from_beats(8),
                Beat::from_beats(10),
            ]
        );
    }

    #[test]
    fn beat_enumeration_strictly_increasing() {
        let signature = SortedTimeline::from(vec![
            TimeSignatureChange::new(Beat::zero(), TimeSignature::new(7, 8)),
            TimeSignatureChange::new(Beat::from_ticks(700), TimeSignature::new(5, 4)),
        ]);
        let map = TempoMap::new(SortedTimeline::new(), signature);

        let mut previous: Option<Beat> = None;
        let mut count = 0;
        map.for_each_beat_bar(|it| {
            if let Some(prev) = previous {
                assert!(it.beat > prev, "not strictly increasing at {:?}", it.beat);
            }
            previous = Some(it.beat);
            count += 1;
            if count >= 64 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(count, 64);
    }

    #[test]
    fn invalid_signature_enumerates_as_common_time() {
        let signature = SortedTimeline::from(vec![TimeSignatureChange::new(
            Beat::zero(),
            TimeSignature::new(0, 0),
        )]);
        let map = TempoMap::new(SortedTimeline::new(), signature);

        let mut bars = Vec::new();
        map.for_each_beat_bar(|it| {
            if it.beat > Beat::from_beats(4) {
                return ControlFlow::Break(());
            }
            if it.is_bar {
                bars.push(it.beat);
            }
            ControlFlow::Continue(())
        });
        assert_eq!(bars, vec![Beat::zero(), Beat::from_beats(4)]);
    }
}
