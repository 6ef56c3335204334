pub mod log;

pub use self::log::{Event, EventLog, EventSource, LoggedEvent, DEFAULT_LOG_CAPACITY};
