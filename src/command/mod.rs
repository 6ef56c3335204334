pub mod bus;
pub mod types;

pub use bus::{command_bus, CommandReceiver, CommandSender, SendOutcome, DEFAULT_COMMAND_CAPACITY};
pub use types::{Command, CommandSource};
