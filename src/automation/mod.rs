//! Recorded CC automation with live blend.
//!
//! While blend is on, a knob moved during playback offsets the recorded
//! curve by how far it has travelled since playback started.

use crate::synth::ParamId;
use crate::timeline::{TickLog, Timed};

pub const MAX_AUTO_POINTS: usize = 256;
pub const NUM_AUTO_PARAMS: usize = 8;

/// Automatable CCs, in slot order
pub const AUTO_CCS: [u8; NUM_AUTO_PARAMS] = [74, 71, 93, 18, 19, 16, 79, 85];

/// Synth parameter each automation slot drives
pub const AUTO_PARAMS: [ParamId; NUM_AUTO_PARAMS] = [
    ParamId::FilterCutoff,
    ParamId::FilterResonance,
    ParamId::AmpAttack,
    ParamId::AmpDecay,
    ParamId::AmpSustain,
    ParamId::AmpRelease,
    ParamId::FilterEnvAmount,
    ParamId::Level,
];

/// Thinning: a point closer than this many ticks...
pub const MIN_RECORD_INTERVAL: u32 = 6;
/// ...and closer than this in value to the previous one is skipped
pub const MIN_VALUE_CHANGE: u8 = 2;

const CC_MAX: i16 = 127;
const CC_CENTER: u8 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoPoint {
    pub tick: u32,
    pub value: u8,
}

impl Timed for AutoPoint {
    fn tick(&self) -> u32 {
        self.tick
    }
}

struct AutoTrack {
    points: TickLog<AutoPoint>,
    last_recorded: AutoPoint,
}

impl AutoTrack {
    fn new() -> Self {
        Self {
            points: TickLog::with_capacity(MAX_AUTO_POINTS),
            last_recorded: AutoPoint {
                tick: 0,
                value: CC_CENTER,
            },
        }
    }

    fn clear(&mut self) {
        self.points.clear();
        self.last_recorded = AutoPoint {
            tick: 0,
            value: CC_CENTER,
        };
    }
}

/// Automation slot for a CC number
pub fn auto_index(cc: u8) -> Option<usize> {
    AUTO_CCS.iter().position(|&c| c == cc)
}

pub fn is_automated(cc: u8) -> bool {
    auto_index(cc).is_some()
}

pub struct Automation {
    tracks: [AutoTrack; NUM_AUTO_PARAMS],
    base_values: [u8; NUM_AUTO_PARAMS],
    current_values: [u8; NUM_AUTO_PARAMS],
    blend: bool,
    last_tick: u32,
}

impl Automation {
    pub fn new() -> Self {
        Self {
            tracks: std::array::from_fn(|_| AutoTrack::new()),
            base_values: [CC_CENTER; NUM_AUTO_PARAMS],
            current_values: [CC_CENTER; NUM_AUTO_PARAMS],
            blend: true,
            last_tick: 0,
        }
    }

    /// Record a CC at `tick`. Non-automated CCs are ignored. The live value
    /// is tracked even when the point is thinned away or the track is full.
    pub fn record_cc(&mut self, tick: u32, cc: u8, value: u8) {
        let Some(idx) = auto_index(cc) else {
            return;
        };
        self.current_values[idx] = value;

        let track = &mut self.tracks[idx];
        if !track.points.is_empty() {
            let tick_diff = tick.wrapping_sub(track.last_recorded.tick);
            let value_diff = value.abs_diff(track.last_recorded.value);
            if tick_diff < MIN_RECORD_INTERVAL && value_diff < MIN_VALUE_CHANGE {
                return;
            }
        }

        let point = AutoPoint { tick, value };
        if track.points.insert(point) {
            track.last_recorded = point;
        }
    }

    /// Track the knob position for blending. Called for every automated CC,
    /// recording or not.
    pub fn update_current_value(&mut self, cc: u8, value: u8) {
        if let Some(idx) = auto_index(cc) {
            self.current_values[idx] = value;
        }
    }

    /// Snapshot the live knob positions as the blend reference
    pub fn capture_base_values(&mut self) {
        self.base_values = self.current_values;
    }

    /// How far the knob has moved since playback started, or 0 with blend off
    fn blend_offset(&self, idx: usize) -> i16 {
        if !self.blend {
            return 0;
        }
        self.current_values[idx] as i16 - self.base_values[idx] as i16
    }

    fn blended(&self, idx: usize, recorded: u8) -> u8 {
        offset_value(recorded, self.blend_offset(idx))
    }

    /// Effective automated value at `tick`: the latest point at or before
    /// `tick`, blended. `None` if the CC is not automated or has no point yet.
    pub fn value_at(&self, tick: u32, cc: u8) -> Option<u8> {
        let idx = auto_index(cc)?;
        let entries = self.tracks[idx].points.entries();
        let n = entries.partition_point(|p| p.tick <= tick);
        let recorded = entries[..n].last()?.value;
        Some(self.blended(idx, recorded))
    }

    /// Replay every point due at `tick` as `(slot, cc, value)`.
    ///
    /// Same loop rule as the sequencer: a tick lower than the last one
    /// restarts every cursor.
    pub fn process(&mut self, tick: u32, mut f: impl FnMut(usize, u8, u8)) {
        if tick < self.last_tick {
            self.reset_playback();
        }
        self.last_tick = tick;

        for idx in 0..NUM_AUTO_PARAMS {
            let offset = self.blend_offset(idx);
            let cc = AUTO_CCS[idx];
            // Points sharing a tick fire in recorded order
            self.tracks[idx]
                .points
                .advance(tick, |p| f(idx, cc, offset_value(p.value, offset)));
        }
    }

    pub fn reset_playback(&mut self) {
        for t in self.tracks.iter_mut() {
            t.points.reset_cursor();
        }
        self.last_tick = 0;
    }

    pub fn clear(&mut self) {
        for t in self.tracks.iter_mut() {
            t.clear();
        }
    }

    pub fn clear_cc(&mut self, cc: u8) {
        if let Some(idx) = auto_index(cc) {
            self.tracks[idx].clear();
        }
    }

    pub fn set_blend(&mut self, enabled: bool) {
        self.blend = enabled;
    }

    pub fn is_blend(&self) -> bool {
        self.blend
    }

    pub fn current_value(&self, cc: u8) -> Option<u8> {
        auto_index(cc).map(|i| self.current_values[i])
    }

    pub fn base_value(&self, cc: u8) -> Option<u8> {
        auto_index(cc).map(|i| self.base_values[i])
    }

    pub fn point_count(&self, cc: u8) -> usize {
        auto_index(cc).map_or(0, |i| self.tracks[i].points.len())
    }

    pub fn total_point_count(&self) -> usize {
        self.tracks.iter().map(|t| t.points.len()).sum()
    }

    pub fn point_counts(&self) -> [u16; NUM_AUTO_PARAMS] {
        std::array::from_fn(|i| self.tracks[i].points.len() as u16)
    }

    pub fn points(&self, cc: u8) -> &[AutoPoint] {
        match auto_index(cc) {
            Some(i) => self.tracks[i].points.entries(),
            None => &[],
        }
    }
}

fn offset_value(recorded: u8, offset: i16) -> u8 {
    (recorded as i16 + offset).clamp(0, CC_MAX) as u8
}

impl Default for Automation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUTOFF: u8 = 74;

    #[test]
    fn blend_offsets_recorded_value() {
        let mut a = Automation::new();
        a.record_cc(100, CUTOFF, 80);
        a.update_current_value(CUTOFF, 40);
        a.capture_base_values();
        a.update_current_value(CUTOFF, 60);
        assert_eq!(a.value_at(100, CUTOFF), Some(100));

        a.set_blend(false);
        assert_eq!(a.value_at(100, CUTOFF), Some(80));
        a.update_current_value(CUTOFF, 0);
        assert_eq!(a.value_at(150, CUTOFF), Some(80));
    }

    #[test]
    fn blend_clamps_to_cc_range() {
        let mut a = Automation::new();
        a.record_cc(0, CUTOFF, 120);
        a.record_cc(50, CUTOFF, 5);
        a.capture_base_values();
        a.update_current_value(CUTOFF, 20);
        assert_eq!(a.value_at(0, CUTOFF), Some(127));
        a.update_current_value(CUTOFF, 127);
        a.capture_base_values();
        a.update_current_value(CUTOFF, 0);
        assert_eq!(a.value_at(60, CUTOFF), Some(0));
    }

    #[test]
    fn thinning_keeps_first_point() {
        let mut a = Automation::new();
        a.record_cc(10, CUTOFF, 50);
        a.record_cc(13, CUTOFF, 51);
        assert_eq!(a.points(CUTOFF), &[AutoPoint { tick: 10, value: 50 }]);
        // Far enough in time
        a.record_cc(16, CUTOFF, 51);
        // Far enough in value
        a.record_cc(17, CUTOFF, 60);
        assert_eq!(a.point_count(CUTOFF), 3);
    }

    #[test]
    fn thinning_skip_still_tracks_live_value() {
        let mut a = Automation::new();
        a.record_cc(10, CUTOFF, 50);
        a.record_cc(11, CUTOFF, 51);
        assert_eq!(a.current_value(CUTOFF), Some(51));
    }

    #[test]
    fn value_at_before_first_point_is_none() {
        let mut a = Automation::new();
        a.record_cc(100, CUTOFF, 80);
        assert_eq!(a.value_at(99, CUTOFF), None);
        assert_eq!(a.value_at(0, 3), None);
    }

    #[test]
    fn overflow_is_dropped() {
        let mut a = Automation::new();
        for i in 0..(MAX_AUTO_POINTS as u32 + 10) {
            a.record_cc(i * 10, CUTOFF, (i % 100) as u8);
        }
        assert_eq!(a.point_count(CUTOFF), MAX_AUTO_POINTS);
    }

    #[test]
    fn process_fires_exact_ticks_and_loops() {
        let mut a = Automation::new();
        a.set_blend(false);
        a.record_cc(0, CUTOFF, 10);
        a.record_cc(20, 85, 90);
        a.record_cc(40, CUTOFF, 30);

        let run = |a: &mut Automation| {
            let mut out = Vec::new();
            for t in 0..64 {
                a.process(t, |slot, cc, v| out.push((t, slot, cc, v)));
            }
            out
        };
        let first = run(&mut a);
        assert_eq!(first, vec![(0, 0, 74, 10), (20, 7, 85, 90), (40, 0, 74, 30)]);
        assert_eq!(run(&mut a), first);
    }

    #[test]
    fn points_on_one_tick_all_fire_in_order() {
        let mut a = Automation::new();
        a.set_blend(false);
        a.record_cc(10, CUTOFF, 20);
        a.record_cc(10, CUTOFF, 60);
        a.record_cc(10, CUTOFF, 40);

        let mut fired = Vec::new();
        for t in 0..16 {
            a.process(t, |_, _, v| fired.push((t, v)));
        }
        assert_eq!(fired, vec![(10, 20), (10, 60), (10, 40)]);
    }

    #[test]
    fn non_automated_ccs_are_ignored() {
        let mut a = Automation::new();
        a.record_cc(0, 76, 10);
        a.update_current_value(76, 10);
        assert_eq!(a.total_point_count(), 0);
        assert_eq!(a.current_value(76), None);
        assert!(!is_automated(76));
        assert!(is_automated(85));
    }

    #[test]
    fn clear_one_or_all() {
        let mut a = Automation::new();
        a.record_cc(0, CUTOFF, 10);
        a.record_cc(0, 71, 10);
        a.clear_cc(CUTOFF);
        assert_eq!(a.point_counts(), [0, 1, 0, 0, 0, 0, 0, 0]);
        a.clear();
        assert_eq!(a.total_point_count(), 0);
    }
}
