//! Status and cost reporting.
//!
//! The run reports skipped records, a final summary and the number of produced
//! records (its "cost") through an [`EventSink`]. Sinks are fire-and-forget.
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

pub trait EventSink {
    fn emit_event(&self, message: &str);
    fn emit_cost(&self, cost: usize, incremental: bool);
}

/// Forwards events to `tracing` under the `auto3d_batch::events` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEvents;

impl EventSink for TracingEvents {
    fn emit_event(&self, message: &str) {
        info!(target: "auto3d_batch::events", "{}", message);
    }

    fn emit_cost(&self, cost: usize, incremental: bool) {
        info!(target: "auto3d_batch::events", cost, incremental, "cost");
    }
}

fn timestamp() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// Prints job-manager style lines on stdout:
/// `<timestamp> # INFO -EVENT- <message>` and `<timestamp> # INFO -COST- <cost> <seq>`.
#[derive(Debug, Default)]
pub struct DmLogEvents {
    cost_seq: AtomicUsize,
}

impl DmLogEvents {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for DmLogEvents {
    fn emit_event(&self, message: &str) {
        println!("{} # INFO -EVENT- {}", timestamp(), message);
    }

    fn emit_cost(&self, cost: usize, incremental: bool) {
        let seq = self.cost_seq.fetch_add(1, Ordering::Relaxed) + 1;
        let sign = if incremental { "+" } else { "" };
        println!("{} # INFO -COST- {}{} {}", timestamp(), sign, cost, seq);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Event,
    Cost,
}

#[derive(Debug, Clone)]
pub struct EventEntry {
    pub kind: EventKind,
    pub timestamp: String,
    pub message: String,
    pub cost: Option<usize>,
}

/// Bounded in-memory event buffer for embedders.
#[derive(Debug)]
pub struct EventLog {
    entries: Mutex<VecDeque<EventEntry>>,
    capacity: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(1000)
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    pub fn entries(&self) -> Vec<EventEntry> {
        self.entries
            .lock()
            .map(|buf| buf.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Messages of plain events, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter(|e| e.kind == EventKind::Event)
            .map(|e| e.message)
            .collect()
    }

    pub fn last_cost(&self) -> Option<usize> {
        self.entries().iter().rev().find_map(|e| e.cost)
    }

    fn push(&self, entry: EventEntry) {
        if let Ok(mut buf) = self.entries.lock() {
            buf.push_back(entry);
            while buf.len() > self.capacity {
                buf.pop_front();
            }
        }
    }
}

impl EventSink for EventLog {
    fn emit_event(&self, message: &str) {
        self.push(EventEntry {
            kind: EventKind::Event,
            timestamp: timestamp(),
            message: message.to_string(),
            cost: None,
        });
    }

    fn emit_cost(&self, cost: usize, incremental: bool) {
        let sign = if incremental { "+" } else { "" };
        self.push(EventEntry {
            kind: EventKind::Cost,
            timestamp: timestamp(),
            message: format!("{}{}", sign, cost),
            cost: Some(cost),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_log_keeps_order_and_costs() {
        let log = EventLog::new();
        log.emit_event("first");
        log.emit_cost(3, false);
        log.emit_event("second");
        assert_eq!(log.messages(), vec!["first", "second"]);
        assert_eq!(log.last_cost(), Some(3));
        assert_eq!(log.entries()[1].kind, EventKind::Cost);
    }

    #[test]
    fn event_log_drops_oldest_beyond_capacity() {
        let log = EventLog::with_capacity(2);
        for i in 0..4 {
            log.emit_event(&i.to_string());
        }
        assert_eq!(log.messages(), vec!["2", "3"]);
        log.emit_cost(7, true);
        assert_eq!(log.messages(), vec!["3"]);
        assert_eq!(log.last_cost(), Some(7));
    }

    #[test]
    fn zero_capacity_log_keeps_nothing() {
        let log = EventLog::with_capacity(0);
        log.emit_event("dropped");
        assert!(log.entries().is_empty());
    }
}
