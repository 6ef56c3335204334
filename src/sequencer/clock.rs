use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sync::EdgeFlag;

/// Pulses per quarter note
pub const PPQN: u32 = 96;
pub const BEATS_PER_BAR: u32 = 4;
pub const TICKS_PER_BAR: u32 = PPQN * BEATS_PER_BAR;

pub const DEFAULT_BPM: u16 = 120;
pub const MIN_BPM: u16 = 30;
pub const MAX_BPM: u16 = 300;

pub const DEFAULT_BARS: u8 = 4;
pub const MAX_BARS: u8 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Recording,
}

impl TransportState {
    pub fn as_u8(self) -> u8 {
        match self {
            TransportState::Stopped => 0,
            TransportState::Playing => 1,
            TransportState::Recording => 2,
        }
    }

    /// Unknown values read as stopped
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => TransportState::Playing,
            2 => TransportState::Recording,
            _ => TransportState::Stopped,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TransportState::Stopped => "STOP",
            TransportState::Playing => "PLAY",
            TransportState::Recording => "REC",
        }
    }

    /// Playing or recording
    pub fn is_running(&self) -> bool {
        !matches!(self, TransportState::Stopped)
    }
}

/// Musical position, always derived from `tick`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub tick: u32,
    /// 1-based
    pub bar: u32,
    /// 1-based, within the bar
    pub beat: u32,
    /// 0..PPQN, within the beat
    pub pulse: u32,
}

impl Position {
    pub fn from_tick(tick: u32) -> Self {
        Self {
            tick,
            bar: tick / TICKS_PER_BAR + 1,
            beat: (tick % TICKS_PER_BAR) / PPQN + 1,
            pulse: tick % PPQN,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::from_tick(0)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{:02}", self.bar, self.beat, self.pulse)
    }
}

/// Sample-driven musical clock. Lives on the audio thread.
pub struct Transport {
    sample_rate: f64,
    state: TransportState,
    bpm: u16,
    pattern_bars: u8,
    pattern_ticks: u32,
    position: Position,
    accumulator: f64,
    samples_per_tick: f64,
    state_changed: Arc<EdgeFlag>,
    pattern_looped: Arc<EdgeFlag>,
}

impl Transport {
    pub fn new(sample_rate: f32) -> Self {
        let mut transport = Self {
            sample_rate: sample_rate as f64,
            state: TransportState::Stopped,
            bpm: DEFAULT_BPM,
            pattern_bars: DEFAULT_BARS,
            pattern_ticks: DEFAULT_BARS as u32 * TICKS_PER_BAR,
            position: Position::default(),
            accumulator: 0.0,
            samples_per_tick: 0.0,
            state_changed: EdgeFlag::shared(),
            pattern_looped: EdgeFlag::shared(),
        };
        transport.recalculate_timing();
        transport
    }

    fn recalculate_timing(&mut self) {
        // ticks/second = bpm * PPQN / 60
        let ticks_per_second = (self.bpm as f64 * PPQN as f64) / 60.0;
        self.samples_per_tick = self.sample_rate / ticks_per_second;
    }

    /// Called once per sample. Returns true when a new tick begins.
    pub fn process(&mut self) -> bool {
        if self.state == TransportState::Stopped {
            return false;
        }

        self.accumulator += 1.0;
        if self.accumulator < self.samples_per_tick {
            return false;
        }
        self.accumulator -= self.samples_per_tick;

        let mut tick = self.position.tick + 1;
        if tick >= self.pattern_ticks {
            tick = 0;
            self.pattern_looped.raise();
        }
        self.position = Position::from_tick(tick);
        true
    }

    pub fn play(&mut self) {
        if self.state != TransportState::Playing {
            self.state = TransportState::Playing;
            self.state_changed.raise();
        }
    }

    /// Position is kept so play resumes where it left off
    pub fn stop(&mut self) {
        if self.state != TransportState::Stopped {
            self.state = TransportState::Stopped;
            self.state_changed.raise();
        }
    }

    pub fn stop_and_reset(&mut self) {
        self.state = TransportState::Stopped;
        self.state_changed.raise();
        self.position = Position::default();
        self.accumulator = 0.0;
    }

    /// Recording from a stopped transport starts at the top of the pattern
    pub fn record(&mut self) {
        if self.state == TransportState::Recording {
            return;
        }
        if self.state == TransportState::Stopped {
            self.position = Position::default();
            self.accumulator = 0.0;
        }
        self.state = TransportState::Recording;
        self.state_changed.raise();
    }

    /// Recording drops back to playing without stopping; anything else records
    pub fn toggle_record(&mut self) {
        if self.state == TransportState::Recording {
            self.play();
        } else {
            self.record();
        }
    }

    pub fn set_bpm(&mut self, bpm: u16) {
        let bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        if bpm != self.bpm {
            self.bpm = bpm;
            self.state_changed.raise();
            self.recalculate_timing();
        }
    }

    pub fn adjust_bpm(&mut self, delta: i16) {
        let bpm = (self.bpm as i32 + delta as i32).clamp(0, u16::MAX as i32);
        self.set_bpm(bpm as u16);
    }

    /// 1-16 bars; the current position wraps into the new length
    pub fn set_pattern_bars(&mut self, bars: u8) {
        let bars = bars.clamp(1, MAX_BARS);
        self.pattern_bars = bars;
        self.pattern_ticks = bars as u32 * TICKS_PER_BAR;
        if self.position.tick >= self.pattern_ticks {
            self.position = Position::from_tick(self.position.tick % self.pattern_ticks);
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn is_recording(&self) -> bool {
        self.state == TransportState::Recording
    }

    pub fn is_stopped(&self) -> bool {
        self.state == TransportState::Stopped
    }

    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    pub fn pattern_bars(&self) -> u8 {
        self.pattern_bars
    }

    pub fn pattern_ticks(&self) -> u32 {
        self.pattern_ticks
    }

    pub fn samples_per_tick(&self) -> f64 {
        self.samples_per_tick
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn tick(&self) -> u32 {
        self.position.tick
    }

    /// True at tick 0 with nothing accumulated yet: the first tick of a
    /// fresh start has not been played
    pub fn at_fresh_start(&self) -> bool {
        self.position.tick == 0 && self.accumulator == 0.0
    }

    pub fn is_on_beat(&self) -> bool {
        self.position.pulse == 0
    }

    pub fn is_on_bar(&self) -> bool {
        self.is_on_beat() && self.position.beat == 1
    }

    /// Check-and-clear
    pub fn check_state_changed(&self) -> bool {
        self.state_changed.take()
    }

    /// Check-and-clear
    pub fn check_pattern_looped(&self) -> bool {
        self.pattern_looped.take()
    }

    pub fn state_changed_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.state_changed)
    }

    pub fn pattern_looped_flag(&self) -> Arc<EdgeFlag> {
        Arc::clone(&self.pattern_looped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calls_until_tick(t: &mut Transport, max: usize) -> Option<usize> {
        (1..=max).find(|_| t.process())
    }

    #[test]
    fn stopped_transport_never_ticks() {
        let mut t = Transport::new(48000.0);
        assert_eq!(calls_until_tick(&mut t, 1000), None);
    }

    #[test]
    fn boundary_at_exact_samples_per_tick() {
        let mut t = Transport::new(48000.0);
        assert_eq!(t.samples_per_tick(), 250.0);
        t.play();
        for _ in 0..249 {
            assert!(!t.process());
        }
        assert!(t.process());
        assert_eq!(t.tick(), 1);
    }

    #[test]
    fn fractional_interval_carries_remainder() {
        // 44100 / (97 * 96 / 60) = 284.149...
        let mut t = Transport::new(44100.0);
        t.set_bpm(97);
        t.play();
        let spt = t.samples_per_tick();
        assert_eq!(calls_until_tick(&mut t, 1000), Some(spt.ceil() as usize));

        // Over many ticks the average interval matches exactly
        let mut samples = 0usize;
        let mut ticks = 0usize;
        while ticks < 1000 {
            samples += 1;
            if t.process() {
                ticks += 1;
            }
        }
        let expected = spt * 1000.0;
        assert!((samples as f64 - expected).abs() <= 1.0);
    }

    #[test]
    fn wraps_and_flags_loop() {
        let mut t = Transport::new(48000.0);
        t.set_pattern_bars(1);
        t.play();
        let mut last = 0;
        for _ in 0..(TICKS_PER_BAR as usize * 250) {
            if t.process() {
                last = t.tick();
            }
        }
        assert_eq!(last, 0);
        assert!(t.check_pattern_looped());
        assert!(!t.check_pattern_looped());
    }

    #[test]
    fn position_from_tick() {
        let p = Position::from_tick(500);
        assert_eq!((p.bar, p.beat, p.pulse), (2, 2, 20));
        assert_eq!(p.to_string(), "2.2.20");
        let p = Position::from_tick(0);
        assert_eq!((p.bar, p.beat, p.pulse), (1, 1, 0));
    }

    #[test]
    fn state_transitions() {
        let mut t = Transport::new(48000.0);
        t.play();
        for _ in 0..2500 {
            t.process();
        }
        assert_eq!(t.tick(), 10);

        // Playing -> Recording keeps position
        t.toggle_record();
        assert!(t.is_recording());
        assert_eq!(t.tick(), 10);

        // Recording -> Playing keeps position
        t.toggle_record();
        assert!(t.is_playing());
        assert_eq!(t.tick(), 10);

        // Stop keeps position for resume
        t.stop();
        assert!(t.is_stopped());
        assert_eq!(t.tick(), 10);

        // Record from stopped starts over
        t.record();
        assert!(t.is_recording());
        assert_eq!(t.tick(), 0);
        assert!(t.at_fresh_start());

        t.stop_and_reset();
        assert!(t.is_stopped());
        assert_eq!(t.position(), Position::default());
    }

    #[test]
    fn state_changed_is_an_edge() {
        let mut t = Transport::new(48000.0);
        assert!(!t.check_state_changed());
        t.play();
        t.play();
        t.stop();
        assert!(t.check_state_changed());
        assert!(!t.check_state_changed());
        t.stop();
        assert!(!t.check_state_changed());
    }

    #[test]
    fn bpm_is_clamped_and_recomputed() {
        let mut t = Transport::new(48000.0);
        t.set_bpm(1000);
        assert_eq!(t.bpm(), MAX_BPM);
        t.set_bpm(1);
        assert_eq!(t.bpm(), MIN_BPM);
        t.set_bpm(240);
        assert_eq!(t.samples_per_tick(), 125.0);
        t.adjust_bpm(-300);
        assert_eq!(t.bpm(), MIN_BPM);
        t.adjust_bpm(10);
        assert_eq!(t.bpm(), 40);
    }

    #[test]
    fn shrinking_pattern_wraps_position() {
        let mut t = Transport::new(48000.0);
        t.set_bpm(300);
        t.play();
        // Run to tick 500
        while t.tick() != 500 {
            t.process();
        }
        t.set_pattern_bars(1);
        assert_eq!(t.tick(), 500 % TICKS_PER_BAR);
        assert_eq!(t.pattern_ticks(), TICKS_PER_BAR);
        t.set_pattern_bars(0);
        assert_eq!(t.pattern_bars(), 1);
        t.set_pattern_bars(200);
        assert_eq!(t.pattern_bars(), MAX_BARS);
    }

    #[test]
    fn on_beat_and_bar() {
        let mut t = Transport::new(48000.0);
        assert!(t.is_on_bar());
        t.play();
        while t.tick() != PPQN {
            t.process();
        }
        assert!(t.is_on_beat());
        assert!(!t.is_on_bar());
    }
}
