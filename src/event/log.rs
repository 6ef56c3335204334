use serde::Serialize;
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::command::Command;
use crate::midi::MidiEvent;

pub const DEFAULT_LOG_CAPACITY: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventSource {
    /// Replayed by the sequencer
    Playback,
    /// Played on the controller
    LiveInput,
    /// Issued through the control handle
    Control,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoggedEvent {
    Midi(MidiEvent),
    Command(Command),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: u64,
    pub timestamp: u64,
    pub source: EventSource,
    pub event: LoggedEvent,
}

impl Event {
    pub fn describe(&self) -> String {
        match &self.event {
            LoggedEvent::Midi(ev) => ev.describe(),
            LoggedEvent::Command(cmd) => cmd.description(),
        }
    }
}

/// Ring buffer of recent events for the monitor and status consumers.
/// Control domain only.
pub struct EventLog {
    events: VecDeque<Event>,
    next_id: u64,
    max_events: usize,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_LOG_CAPACITY)
    }

    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_events),
            next_id: 1,
            max_events: max_events.max(1),
        }
    }

    pub fn log_midi(&mut self, event: MidiEvent, source: EventSource) {
        self.push(source, LoggedEvent::Midi(event));
    }

    /// Log a command as an event
    pub fn log_command(&mut self, command: Command) {
        if !command.is_loggable() {
            return;
        }
        self.push(EventSource::Control, LoggedEvent::Command(command));
    }

    fn push(&mut self, source: EventSource, event: LoggedEvent) {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        self.events.push_back(Event {
            id: self.next_id,
            timestamp,
            source,
            event,
        });
        self.next_id += 1;

        // Trim old events
        while self.events.len() > self.max_events {
            self.events.pop_front();
        }
    }

    /// Get all events since a given ID
    pub fn get_events_since(&self, since_id: u64) -> Vec<Event> {
        self.events
            .iter()
            .filter(|e| e.id > since_id)
            .cloned()
            .collect()
    }

    /// Get the latest event ID
    pub fn latest_id(&self) -> u64 {
        self.events.back().map(|e| e.id).unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
