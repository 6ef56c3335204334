//! Cross-domain plumbing between the audio callback and the control loop.
//!
//! Nothing in here blocks. The audio side only ever stores, swaps or pushes;
//! the control side loads, clears and pops.

pub mod edge;
pub mod queue;
pub mod shared;

pub use edge::EdgeFlag;
pub use queue::{event_queue, EventConsumer, EventProducer, PlaybackEvent};
pub use shared::{AtomicF32, EngineStatus, SharedParams, SharedState};
