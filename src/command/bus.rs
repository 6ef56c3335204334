use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::types::{Command, CommandSource};

pub const DEFAULT_COMMAND_CAPACITY: usize = 256;

type Envelope = (Command, CommandSource);

/// What happened to one send. A full bus never blocks the caller: the
/// command is dropped and counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum SendOutcome {
    Sent,
    /// Bus full; counted in [`CommandSender::dropped`]
    Dropped,
    /// The audio side is gone
    Disconnected,
}

impl SendOutcome {
    pub fn is_sent(self) -> bool {
        self == SendOutcome::Sent
    }
}

/// Create the bounded control-to-audio command bus.
///
/// Senders may be cloned freely and share one drop counter. The receiver is
/// drained by the audio callback at the start of each block.
pub fn command_bus(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    (
        CommandSender {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
        },
        CommandReceiver { rx },
    )
}

#[derive(Clone)]
pub struct CommandSender {
    tx: Sender<Envelope>,
    dropped: Arc<AtomicU64>,
}

impl CommandSender {
    pub fn send(&self, cmd: Command, source: CommandSource) -> SendOutcome {
        match self.tx.try_send((cmd, source)) {
            Ok(()) => SendOutcome::Sent,
            Err(TrySendError::Full((cmd, _))) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                log::warn!(
                    "command bus full, dropped {} ({} dropped so far)",
                    cmd.description(),
                    total
                );
                SendOutcome::Dropped
            }
            Err(TrySendError::Disconnected(_)) => SendOutcome::Disconnected,
        }
    }

    /// Commands lost to a full bus since it was created
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Commands waiting for the next block
    pub fn pending(&self) -> usize {
        self.tx.len()
    }
}

pub struct CommandReceiver {
    rx: Receiver<Envelope>,
}

impl CommandReceiver {
    pub fn try_recv(&self) -> Option<Envelope> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_bus_drops_and_counts() {
        let (tx, rx) = command_bus(2);
        assert_eq!(tx.send(Command::Play, CommandSource::Control), SendOutcome::Sent);
        assert_eq!(tx.send(Command::Stop, CommandSource::Control), SendOutcome::Sent);
        assert_eq!(tx.pending(), 2);
        assert_eq!(
            tx.send(Command::Record, CommandSource::Control),
            SendOutcome::Dropped
        );
        assert_eq!(tx.dropped(), 1);

        assert_eq!(rx.try_recv(), Some((Command::Play, CommandSource::Control)));
        assert_eq!(rx.try_recv(), Some((Command::Stop, CommandSource::Control)));
        assert_eq!(rx.try_recv(), None);
    }

    #[test]
    fn clones_share_the_drop_count() {
        let (tx, _rx) = command_bus(1);
        let other = tx.clone();
        assert!(tx.send(Command::Play, CommandSource::Control).is_sent());
        assert!(!other.send(Command::Stop, CommandSource::LiveInput).is_sent());
        assert_eq!(tx.dropped(), 1);
    }

    #[test]
    fn disconnected_is_not_a_drop() {
        let (tx, rx) = command_bus(4);
        drop(rx);
        assert_eq!(
            tx.send(Command::Play, CommandSource::Control),
            SendOutcome::Disconnected
        );
        assert_eq!(tx.dropped(), 0);
    }
}
