//! Bounded, tick-ordered event storage with a forward-only playback cursor.
//!
//! Both sequencer tracks and automation tracks are a `TickLog`. Storage is
//! allocated once up front; an insert into a full log is refused and the
//! log is left untouched.

use crate::midi::MidiEvent;

/// Anything stamped with a pattern tick
pub trait Timed {
    fn tick(&self) -> u32;
}

impl Timed for MidiEvent {
    fn tick(&self) -> u32 {
        self.tick
    }
}

#[derive(Debug, Clone)]
pub struct TickLog<T> {
    entries: Vec<T>,
    capacity: usize,
    cursor: usize,
}

impl<T: Timed> TickLog<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// Insert in ascending tick order, after any entries with the same tick.
    /// Returns false (and stores nothing) when the log is full.
    pub fn insert(&mut self, entry: T) -> bool {
        if self.entries.len() >= self.capacity {
            return false;
        }
        let tick = entry.tick();
        let pos = self.entries.partition_point(|e| e.tick() <= tick);
        self.entries.insert(pos, entry);
        true
    }

    /// Move the cursor past every entry at or before `tick`, handing the
    /// ones exactly at `tick` to `f`. Entries the cursor skips over were
    /// due earlier in the pass and are not replayed late.
    pub fn advance(&mut self, tick: u32, mut f: impl FnMut(&T)) {
        while let Some(entry) = self.entries.get(self.cursor) {
            let t = entry.tick();
            if t > tick {
                break;
            }
            if t == tick {
                f(entry);
            }
            self.cursor += 1;
        }
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    /// Drop every entry; the allocation is kept
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn entries(&self) -> &[T] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Mark(u32, u8);

    impl Timed for Mark {
        fn tick(&self) -> u32 {
            self.0
        }
    }

    fn ticks(log: &TickLog<Mark>) -> Vec<u32> {
        log.entries().iter().map(|m| m.0).collect()
    }

    #[test]
    fn insert_keeps_ascending_order() {
        let mut log = TickLog::with_capacity(16);
        for t in [50, 10, 30, 10, 0, 49, 51] {
            assert!(log.insert(Mark(t, 0)));
        }
        assert_eq!(ticks(&log), vec![0, 10, 10, 30, 49, 50, 51]);
    }

    #[test]
    fn equal_ticks_keep_arrival_order() {
        let mut log = TickLog::with_capacity(4);
        log.insert(Mark(5, 1));
        log.insert(Mark(5, 2));
        log.insert(Mark(5, 3));
        let ids: Vec<u8> = log.entries().iter().map(|m| m.1).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn full_log_refuses_silently() {
        let mut log = TickLog::with_capacity(2);
        assert!(log.insert(Mark(1, 0)));
        assert!(log.insert(Mark(2, 0)));
        assert!(log.is_full());
        assert!(!log.insert(Mark(0, 9)));
        assert_eq!(ticks(&log), vec![1, 2]);
    }

    #[test]
    fn advance_fires_exact_ticks_only() {
        let mut log = TickLog::with_capacity(8);
        for t in [0, 2, 2, 5] {
            log.insert(Mark(t, 0));
        }
        let mut fired = Vec::new();
        for tick in 0..4 {
            log.advance(tick, |m| fired.push(m.0));
        }
        assert_eq!(fired, vec![0, 2, 2]);
        assert_eq!(log.cursor(), 3);

        // Jumping ahead skips tick 5 without firing it
        log.advance(9, |m| fired.push(m.0));
        assert_eq!(fired.len(), 3);
        assert_eq!(log.cursor(), 4);

        log.reset_cursor();
        log.advance(0, |m| fired.push(m.0));
        assert_eq!(fired, vec![0, 2, 2, 0]);
    }

    #[test]
    fn clear_resets_cursor_and_keeps_capacity() {
        let mut log = TickLog::with_capacity(3);
        log.insert(Mark(0, 0));
        log.advance(0, |_| {});
        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.cursor(), 0);
        assert_eq!(log.capacity(), 3);
    }
}
