pub mod engine;
pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod params;
pub mod presets;
pub mod voice;

pub use engine::{soft_clip, SynthEngine, NUM_VOICES};
pub use params::{ParamId, SynthParams, Waveform, PARAM_COUNT};
pub use presets::{preset_name, preset_names, PRESET_COUNT};
pub use voice::VoiceInfo;
