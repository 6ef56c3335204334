use crate::midi::{pad_index, EventKind, MidiEvent, DRUM_CHANNEL, SYNTH_CHANNEL};
use crate::timeline::TickLog;

pub const MAX_EVENTS_PER_TRACK: usize = 512;
pub const NUM_DRUM_TRACKS: usize = 8;
pub const NUM_SYNTH_TRACKS: usize = 4;
pub const NUM_TRACKS: usize = NUM_DRUM_TRACKS + NUM_SYNTH_TRACKS;

/// Receives events as the sequencer replays them, in tick order
pub trait PlaybackSink {
    fn play(&mut self, event: &MidiEvent);
}

impl<F: FnMut(&MidiEvent)> PlaybackSink for F {
    fn play(&mut self, event: &MidiEvent) {
        self(event)
    }
}

/// Which track an event belongs to.
///
/// Pads on the drum channel get one track each. Synth notes share four
/// tracks by `note % 4`, so unrelated pitches can land on the same track.
pub fn track_for(event: &MidiEvent) -> Option<usize> {
    match event.channel() {
        DRUM_CHANNEL => pad_index(event.data1),
        SYNTH_CHANNEL => match event.kind() {
            EventKind::NoteOn | EventKind::NoteOff => {
                Some(NUM_DRUM_TRACKS + event.data1 as usize % NUM_SYNTH_TRACKS)
            }
            _ => None,
        },
        _ => None,
    }
}

/// Recording MIDI sequencer: 8 drum tracks plus 4 synth tracks
pub struct Sequencer {
    tracks: [TickLog<MidiEvent>; NUM_TRACKS],
    last_tick: u32,
    overdub: bool,
    first_note_in_pass: bool,
}

impl Sequencer {
    pub fn new() -> Self {
        Self {
            tracks: std::array::from_fn(|_| TickLog::with_capacity(MAX_EVENTS_PER_TRACK)),
            last_tick: 0,
            overdub: true,
            first_note_in_pass: false,
        }
    }

    /// Record an event at `tick`. Events with no matching track are ignored,
    /// as are events arriving at a full track.
    ///
    /// In replace mode the first note-on of a record pass wipes its track
    /// before being stored.
    pub fn record(&mut self, event: MidiEvent) {
        let Some(track_idx) = track_for(&event) else {
            return;
        };
        let track = &mut self.tracks[track_idx];

        if !self.overdub && self.first_note_in_pass && event.kind() == EventKind::NoteOn {
            track.clear();
            self.first_note_in_pass = false;
        }

        track.insert(event);
    }

    pub fn record_event(&mut self, tick: u32, status: u8, data1: u8, data2: u8) {
        self.record(MidiEvent::new(tick, status, data1, data2));
    }

    /// Replay everything due at `tick`.
    ///
    /// Call once per transport tick. A tick lower than the previous one means
    /// the pattern wrapped, so every cursor starts over.
    pub fn process(&mut self, tick: u32, sink: &mut impl PlaybackSink) {
        if tick < self.last_tick {
            self.reset_playback();
        }
        self.last_tick = tick;

        for track in self.tracks.iter_mut() {
            track.advance(tick, |ev| {
                let replay = match (ev.channel(), ev.kind()) {
                    // Drum hits are one-shots
                    (DRUM_CHANNEL, EventKind::NoteOn) => true,
                    (SYNTH_CHANNEL, EventKind::NoteOn | EventKind::NoteOff) => true,
                    _ => false,
                };
                if replay {
                    sink.play(ev);
                }
            });
        }
    }

    pub fn reset_playback(&mut self) {
        for track in self.tracks.iter_mut() {
            track.reset_cursor();
        }
        self.last_tick = 0;
    }

    pub fn clear(&mut self) {
        for track in self.tracks.iter_mut() {
            track.clear();
        }
    }

    /// Out-of-range indices are ignored
    pub fn clear_track(&mut self, track: usize) {
        if let Some(t) = self.tracks.get_mut(track) {
            t.clear();
        }
    }

    pub fn set_overdub(&mut self, overdub: bool) {
        self.overdub = overdub;
    }

    pub fn is_overdub(&self) -> bool {
        self.overdub
    }

    /// Arm replace mode for a new pass
    pub fn start_record_pass(&mut self) {
        self.first_note_in_pass = true;
    }

    pub fn event_count(&self) -> usize {
        self.tracks.iter().map(|t| t.len()).sum()
    }

    pub fn drum_event_count(&self) -> usize {
        self.tracks[..NUM_DRUM_TRACKS].iter().map(|t| t.len()).sum()
    }

    pub fn synth_event_count(&self) -> usize {
        self.tracks[NUM_DRUM_TRACKS..].iter().map(|t| t.len()).sum()
    }

    /// 0 for out-of-range indices
    pub fn track_event_count(&self, track: usize) -> usize {
        self.tracks.get(track).map_or(0, |t| t.len())
    }

    pub fn track_events(&self, track: usize) -> &[MidiEvent] {
        match self.tracks.get(track) {
            Some(t) => t.entries(),
            None => &[],
        }
    }
}

impl Default for Sequencer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drum(tick: u32, pad: u8) -> MidiEvent {
        MidiEvent::note_on(tick, DRUM_CHANNEL, 36 + pad, 100)
    }

    fn replay(seq: &mut Sequencer, ticks: std::ops::Range<u32>) -> Vec<MidiEvent> {
        let mut out = Vec::new();
        for t in ticks {
            seq.process(t, &mut |ev: &MidiEvent| out.push(*ev));
        }
        out
    }

    #[test]
    fn routes_to_tracks() {
        assert_eq!(track_for(&drum(0, 0)), Some(0));
        assert_eq!(track_for(&drum(0, 7)), Some(7));
        assert_eq!(track_for(&MidiEvent::note_on(0, DRUM_CHANNEL, 50, 1)), None);
        assert_eq!(track_for(&MidiEvent::note_on(0, 0, 60, 1)), Some(8));
        assert_eq!(track_for(&MidiEvent::note_off(0, 0, 63)), Some(11));
        assert_eq!(track_for(&MidiEvent::new(0, 0xB0, 74, 1)), None);
        assert_eq!(track_for(&MidiEvent::note_on(0, 3, 60, 1)), None);
    }

    #[test]
    fn recorded_events_stay_sorted() {
        let mut seq = Sequencer::new();
        for t in [300, 12, 700, 12, 0, 1535, 96] {
            seq.record(drum(t, 2));
        }
        let ticks: Vec<u32> = seq.track_events(2).iter().map(|e| e.tick).collect();
        assert!(ticks.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(seq.track_event_count(2), 7);
    }

    #[test]
    fn overflow_is_dropped() {
        let mut seq = Sequencer::new();
        for t in 0..(MAX_EVENTS_PER_TRACK as u32 + 20) {
            seq.record(drum(t, 0));
        }
        assert_eq!(seq.track_event_count(0), MAX_EVENTS_PER_TRACK);
        assert_eq!(seq.track_events(0).last().map(|e| e.tick), Some(511));
    }

    #[test]
    fn drum_note_offs_are_not_replayed() {
        let mut seq = Sequencer::new();
        seq.record(drum(4, 1));
        seq.record(MidiEvent::note_off(8, DRUM_CHANNEL, 37));
        seq.record(MidiEvent::note_on(4, 0, 60, 90));
        seq.record(MidiEvent::note_off(8, 0, 60));
        let played = replay(&mut seq, 0..16);
        let kinds: Vec<(u32, u8)> = played.iter().map(|e| (e.tick, e.status)).collect();
        assert_eq!(kinds, vec![(4, 0x99), (4, 0x90), (8, 0x80)]);
    }

    #[test]
    fn two_passes_replay_identically() {
        let mut seq = Sequencer::new();
        for (t, pad) in [(0, 0), (96, 1), (96, 2), (200, 0), (383, 3)] {
            seq.record(drum(t, pad));
        }
        seq.record(MidiEvent::note_on(50, 0, 61, 70));
        seq.record(MidiEvent::note_off(90, 0, 61));
        let first = replay(&mut seq, 0..384);
        let second = replay(&mut seq, 0..384);
        assert_eq!(first.len(), 7);
        assert_eq!(first, second);
    }

    #[test]
    fn replace_mode_clears_on_first_note_of_pass() {
        let mut seq = Sequencer::new();
        seq.record(drum(0, 0));
        seq.record(drum(10, 0));
        seq.set_overdub(false);
        seq.start_record_pass();
        seq.record(drum(20, 0));
        assert_eq!(seq.track_event_count(0), 1);
        // Only the first note of the pass clears
        seq.record(drum(30, 0));
        assert_eq!(seq.track_event_count(0), 2);
    }

    #[test]
    fn overdub_layers() {
        let mut seq = Sequencer::new();
        seq.record(drum(0, 0));
        seq.start_record_pass();
        seq.record(drum(5, 0));
        assert_eq!(seq.track_event_count(0), 2);
    }

    #[test]
    fn replace_punch_in_hits_colliding_synth_notes() {
        let mut seq = Sequencer::new();
        // 60 and 64 both hash to track 8
        seq.record(MidiEvent::note_on(0, 0, 60, 90));
        seq.set_overdub(false);
        seq.start_record_pass();
        seq.record(MidiEvent::note_on(10, 0, 64, 90));
        assert_eq!(seq.track_events(8).len(), 1);
        assert_eq!(seq.track_events(8)[0].data1, 64);
    }

    #[test]
    fn counts_and_clear() {
        let mut seq = Sequencer::new();
        seq.record(drum(0, 0));
        seq.record(drum(0, 5));
        seq.record(MidiEvent::note_on(0, 0, 62, 90));
        assert_eq!(seq.event_count(), 3);
        assert_eq!(seq.drum_event_count(), 2);
        assert_eq!(seq.synth_event_count(), 1);
        seq.clear_track(5);
        seq.clear_track(99);
        assert_eq!(seq.drum_event_count(), 1);
        seq.clear();
        assert_eq!(seq.event_count(), 0);
        assert_eq!(seq.track_event_count(99), 0);
    }
}
