//! Real-time groovebox core: a tick transport, a recording sequencer, a
//! six-voice subtractive synth, bank-switched controller mapping with fader
//! pickup, and parameter automation.
//!
//! [`engine::build`] wires everything together and returns the audio-side
//! [`engine::Engine`] and the control-side [`engine::Controller`].

pub mod audio;
pub mod automation;
pub mod command;
pub mod config;
pub mod demo;
pub mod engine;
pub mod event;
pub mod mapping;
pub mod midi;
pub mod render;
pub mod sequencer;
pub mod sync;
pub mod synth;
pub mod timeline;

pub use config::EngineConfig;
pub use engine::{build, Controller, DrumSink, Engine, SilentDrums, StatusSnapshot, StereoFrame};
