pub mod output;

pub use output::{AudioDevice, AudioOutput};
