use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rtrb::{Consumer, Producer, RingBuffer};

use crate::midi::MidiEvent;

/// Record carried from the audio callback to the control loop
pub type PlaybackEvent = MidiEvent;

/// Create the bounded single-producer/single-consumer playback event queue.
///
/// The producer half belongs to the audio callback, the consumer half to the
/// control loop. A full queue drops the new record and counts it; it never
/// blocks and never overwrites unread records.
pub fn event_queue(capacity: usize) -> (EventProducer, EventConsumer) {
    let (producer, consumer) = RingBuffer::new(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        EventProducer {
            producer,
            dropped: Arc::clone(&dropped),
        },
        EventConsumer { consumer, dropped },
    )
}

pub struct EventProducer {
    producer: Producer<PlaybackEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventProducer {
    /// Push without blocking. Returns false (and counts a drop) if full.
    pub fn push(&mut self, event: PlaybackEvent) -> bool {
        match self.producer.push(event) {
            Ok(()) => true,
            Err(_) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub struct EventConsumer {
    consumer: Consumer<PlaybackEvent>,
    dropped: Arc<AtomicU64>,
}

impl EventConsumer {
    /// Pop the oldest fully-published record, if any
    pub fn pop(&mut self) -> Option<PlaybackEvent> {
        self.consumer.pop().ok()
    }

    /// Pop everything currently visible, oldest first
    pub fn drain(&mut self) -> impl Iterator<Item = PlaybackEvent> + '_ {
        std::iter::from_fn(move || self.pop())
    }

    /// Records waiting to be read
    pub fn len(&self) -> usize {
        self.consumer.slots()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Total records the producer had to drop because the queue was full
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn ev(tick: u32) -> PlaybackEvent {
        MidiEvent::note_on(tick, 0, 60, 100)
    }

    #[test]
    fn full_queue_drops_and_counts() {
        let (mut tx, mut rx) = event_queue(2);
        assert!(tx.push(ev(1)));
        assert!(tx.push(ev(2)));
        assert!(!tx.push(ev(3)));
        assert!(!tx.push(ev(4)));
        assert_eq!(tx.dropped(), 2);
        assert_eq!(rx.dropped(), 2);

        // Unread records were not overwritten
        let ticks: Vec<u32> = rx.drain().map(|e| e.tick).collect();
        assert_eq!(ticks, vec![1, 2]);
        assert!(rx.is_empty());
    }

    #[test]
    fn order_is_preserved_across_threads() {
        let (mut tx, mut rx) = event_queue(64);
        let producer = thread::spawn(move || {
            let mut sent = 0u32;
            while sent < 1000 {
                if tx.push(ev(sent)) {
                    sent += 1;
                } else {
                    thread::yield_now();
                }
            }
        });

        let mut expected = 0u32;
        while expected < 1000 {
            match rx.pop() {
                Some(e) => {
                    assert_eq!(e.tick, expected);
                    expected += 1;
                }
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();
        assert_eq!(rx.dropped(), 0);
    }
}
