pub mod clock;
pub mod pattern;

pub use clock::{
    Position, Transport, TransportState, BEATS_PER_BAR, DEFAULT_BARS, DEFAULT_BPM, MAX_BARS,
    MAX_BPM, MIN_BPM, PPQN, TICKS_PER_BAR,
};
pub use pattern::{
    track_for, PlaybackSink, Sequencer, MAX_EVENTS_PER_TRACK, NUM_DRUM_TRACKS, NUM_SYNTH_TRACKS,
    NUM_TRACKS,
};
