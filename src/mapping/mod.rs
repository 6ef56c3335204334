//! Controller input to parameter targets: bank tables, fader pickup and
//! value conversion.

pub mod bank;
pub mod convert;
pub mod fader;
pub mod mapper;

pub use bank::{Bank, ControlMapping, ParamTarget, ENCODER_CCS, FADER_CCS, NUM_BANKS, NUM_FADERS};
pub use fader::{FaderState, PICKUP_TOLERANCE};
pub use mapper::CcMapper;
