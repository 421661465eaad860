//! System Event Log (SysLog)
//!
//! Records every kernel event (request + response) for audit trail.
//! This is separate from CommitLog - SysLog is for auditing,
//! CommitLog records the mutations each event caused.

use serde::{Deserialize, Serialize};
use simos_core::{Event, EventOutcome, KernelError};

use crate::types::EventId;

/// A system event (kernel request or response).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SysEvent {
    /// Unique event ID (monotonic)
    pub id: EventId,
    /// Event type (request or response)
    pub event_type: SysEventType,
}

/// Type of system event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SysEventType {
    /// Event submitted to the kernel
    Request {
        /// The submitted event
        event: Event,
    },
    /// Kernel answer to a request
    Response {
        /// ID of the request this responds to
        request_id: EventId,
        /// What the kernel returned
        result: Result<EventOutcome, KernelError>,
    },
}

/// Maximum number of events to keep in memory
pub const MAX_SYSLOG_EVENTS: usize = 10_000;

/// System event log for auditing.
///
/// Events are append-only with monotonic IDs. Once the log holds more than
/// [`MAX_SYSLOG_EVENTS`] entries the oldest are dropped; IDs keep counting.
#[derive(Clone, Debug, Default)]
pub struct SysLog {
    /// Event entries (append-only)
    events: Vec<SysEvent>,
    /// Next event ID to assign
    next_id: EventId,
}

impl SysLog {
    /// Create a new empty SysLog.
    pub fn new() -> Self {
        Self {
            events: Vec::new(),
            next_id: 0,
        }
    }

    /// Log a request.
    ///
    /// Returns the event ID for correlating with the response.
    pub fn log_request(&mut self, event: Event) -> EventId {
        self.push(SysEventType::Request { event })
    }

    /// Log the response to `request_id`.
    pub fn log_response(
        &mut self,
        request_id: EventId,
        result: Result<EventOutcome, KernelError>,
    ) -> EventId {
        self.push(SysEventType::Response { request_id, result })
    }

    fn push(&mut self, event_type: SysEventType) -> EventId {
        let id = self.next_id;
        self.next_id += 1;

        self.events.push(SysEvent { id, event_type });
        self.trim_if_needed();
        id
    }

    /// Get all retained events.
    pub fn events(&self) -> &[SysEvent] {
        &self.events
    }

    /// Get events with `start_id <= id < end_id`.
    pub fn get_range(&self, start_id: EventId, end_id: EventId) -> Vec<&SysEvent> {
        self.events
            .iter()
            .filter(|e| e.id >= start_id && e.id < end_id)
            .collect()
    }

    /// Get the most recent N events, newest first.
    pub fn get_recent(&self, count: usize) -> Vec<&SysEvent> {
        self.events.iter().rev().take(count).collect()
    }

    /// ID of the oldest retained event
    pub fn first_id(&self) -> Option<EventId> {
        self.events.first().map(|e| e.id)
    }

    /// Get the number of retained events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Get the next event ID.
    pub fn next_id(&self) -> EventId {
        self.next_id
    }

    /// Trim old events if exceeding max capacity.
    fn trim_if_needed(&mut self) {
        if self.events.len() > MAX_SYSLOG_EVENTS {
            let drain_count = self.events.len() - MAX_SYSLOG_EVENTS;
            self.events.drain(0..drain_count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simos_core::ProcessId;

    #[test]
    fn test_syslog_creation() {
        let log = SysLog::new();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
        assert_eq!(log.next_id(), 0);
        assert_eq!(log.first_id(), None);
    }

    #[test]
    fn test_syslog_request_response() {
        let mut log = SysLog::new();

        let req_id = log.log_request(Event::NewProcess);
        assert_eq!(req_id, 0);

        let resp_id = log.log_response(
            req_id,
            Ok(EventOutcome::Created { pid: ProcessId(1) }),
        );
        assert_eq!(resp_id, 1);
        assert_eq!(log.len(), 2);

        let events = log.events();
        assert_eq!(
            events[0].event_type,
            SysEventType::Request {
                event: Event::NewProcess
            }
        );
        assert!(matches!(
            events[1].event_type,
            SysEventType::Response {
                request_id: 0,
                result: Ok(_)
            }
        ));
    }

    #[test]
    fn test_syslog_get_recent() {
        let mut log = SysLog::new();

        for _ in 0..10 {
            log.log_request(Event::TimerInterrupt);
        }

        let recent = log.get_recent(3);
        assert_eq!(recent.len(), 3);
        // Most recent first
        assert_eq!(recent[0].id, 9);
        assert_eq!(recent[1].id, 8);
        assert_eq!(recent[2].id, 7);
    }

    #[test]
    fn test_syslog_get_range() {
        let mut log = SysLog::new();

        for _ in 0..10 {
            log.log_request(Event::SimFork);
        }

        let range = log.get_range(3, 7);
        assert_eq!(range.len(), 4);
        assert_eq!(range[0].id, 3);
        assert_eq!(range[3].id, 6);
    }

    #[test]
    fn test_syslog_trims_oldest() {
        let mut log = SysLog::new();

        for _ in 0..MAX_SYSLOG_EVENTS + 5 {
            log.log_request(Event::TimerInterrupt);
        }

        assert_eq!(log.len(), MAX_SYSLOG_EVENTS);
        assert_eq!(log.first_id(), Some(5));
        assert_eq!(log.next_id(), (MAX_SYSLOG_EVENTS + 5) as u64);
    }

    #[test]
    fn test_sysevent_json_shape() {
        let mut log = SysLog::new();
        log.log_request(Event::DiskJobCompleted { disk: 1 });

        let json = serde_json::to_value(&log.events()[0]).unwrap();
        assert_eq!(json["id"], 0);
        assert_eq!(json["event_type"]["request"]["event"]["op"], "disk_job_completed");
        assert_eq!(json["event_type"]["request"]["event"]["disk"], 1);
    }
}
