//! Built-in pattern for the binary: a four-on-the-floor beat, a bass line
//! on the synth and a slow filter sweep.

use crate::engine::Engine;
use crate::midi::{MidiEvent, DRUM_CHANNEL, SYNTH_CHANNEL};
use crate::sequencer::{BEATS_PER_BAR, PPQN, TICKS_PER_BAR};

const KICK: u8 = 36;
const SNARE: u8 = 38;
const CLOSED_HAT: u8 = 42;

/// Root note of each bar, cycled
const ROOTS: [u8; 4] = [45, 48, 43, 50];
/// Offsets from the root for the four beats of a bar
const RIFF: [u8; 4] = [0, 12, 7, 12];

const CUTOFF_CC: u8 = 74;
const SWEEP_STEP: u32 = PPQN / 2;

/// Note events for `bars` bars
pub fn demo_pattern(bars: u8) -> Vec<MidiEvent> {
    let mut events = Vec::new();

    for bar in 0..bars.max(1) as u32 {
        let bar_start = bar * TICKS_PER_BAR;
        let root = ROOTS[bar as usize % ROOTS.len()];

        for beat in 0..BEATS_PER_BAR {
            let tick = bar_start + beat * PPQN;

            events.push(MidiEvent::note_on(tick, DRUM_CHANNEL, KICK, 110));
            if beat % 2 == 1 {
                events.push(MidiEvent::note_on(tick, DRUM_CHANNEL, SNARE, 100));
            }
            events.push(MidiEvent::note_on(tick, DRUM_CHANNEL, CLOSED_HAT, 70));
            events.push(MidiEvent::note_on(tick + PPQN / 2, DRUM_CHANNEL, CLOSED_HAT, 50));

            let note = root + RIFF[beat as usize];
            events.push(MidiEvent::note_on(tick, SYNTH_CHANNEL, note, 96));
            events.push(MidiEvent::note_off(tick + PPQN * 3 / 4, SYNTH_CHANNEL, note));
        }
    }

    events
}

/// Cutoff sweep up over the first half of the pattern and back down over
/// the second, as (tick, value) points
pub fn demo_sweep(bars: u8) -> Vec<(u32, u8)> {
    let total = bars.max(1) as u32 * TICKS_PER_BAR;
    let half = total / 2;

    (0..total)
        .step_by(SWEEP_STEP as usize)
        .map(|tick| {
            let distance = if tick < half { tick } else { total - tick };
            let value = 30 + distance * 80 / half.max(1);
            (tick, value.min(127) as u8)
        })
        .collect()
}

/// Load the demo into an engine that has not been started yet
pub fn load_demo(engine: &mut Engine) {
    let bars = engine.transport().pattern_bars();

    let sequencer = engine.sequencer_mut();
    for event in demo_pattern(bars) {
        sequencer.record(event);
    }

    let automation = engine.automation_mut();
    for (tick, value) in demo_sweep(bars) {
        automation.record_cc(tick, CUTOFF_CC, value);
    }

    log::info!(
        "Demo loaded: {} events, {} automation points",
        engine.sequencer().event_count(),
        engine.automation().total_point_count()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::engine::{build, SilentDrums};
    use crate::midi::EventKind;

    #[test]
    fn test_demo_pattern_stays_inside_pattern() {
        let events = demo_pattern(4);
        let limit = 4 * TICKS_PER_BAR;
        assert!(events.iter().all(|e| e.tick < limit));
    }

    #[test]
    fn test_demo_notes_are_balanced() {
        let events = demo_pattern(2);
        let ons = events
            .iter()
            .filter(|e| e.channel() == SYNTH_CHANNEL && e.kind() == EventKind::NoteOn)
            .count();
        let offs = events
            .iter()
            .filter(|e| e.kind() == EventKind::NoteOff)
            .count();
        assert_eq!(ons, offs);
        assert_eq!(ons, 8);
    }

    #[test]
    fn test_demo_sweep_range() {
        let sweep = demo_sweep(4);
        assert_eq!(sweep[0], (0, 30));
        assert!(sweep.iter().all(|&(_, v)| (30..=110).contains(&v)));
        assert!(sweep.iter().any(|&(_, v)| v == 110));
    }

    #[test]
    fn test_load_demo_fills_engine() {
        let (mut engine, _ctl) = build(&EngineConfig::default(), Box::new(SilentDrums));
        load_demo(&mut engine);

        assert_eq!(engine.sequencer().event_count(), demo_pattern(4).len());
        assert_eq!(
            engine.automation().point_count(CUTOFF_CC),
            demo_sweep(4).len()
        );
    }
}
