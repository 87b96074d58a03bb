use crate::models::{Event, EventKind};

/// Append-only, chronologically ordered record of a session's events.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, time_ms: u64, kind: EventKind, detail: impl Into<String>) {
        debug_assert!(
            self.events.last().map_or(true, |last| last.time_ms <= time_ms),
            "event log must stay chronological"
        );
        self.events.push(Event::new(time_ms, kind, detail));
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn count(&self, kind: EventKind) -> usize {
        count_kind(&self.events, kind)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

pub fn count_kind(events: &[Event], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_append_order_and_counts() {
        let mut log = EventLog::new();
        log.append(0, EventKind::MultipleFaces, "Multiple faces detected");
        log.append(400, EventKind::Object, "book: 71%");
        log.append(400, EventKind::Object, "book: 72%");
        log.append(10_200, EventKind::NoFace, "No face detected > 10s");

        let kinds: Vec<EventKind> = log.events().iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::MultipleFaces,
                EventKind::Object,
                EventKind::Object,
                EventKind::NoFace
            ]
        );
        assert_eq!(log.count(EventKind::Object), 2);
        assert_eq!(log.count(EventKind::FocusLost), 0);
        assert_eq!(log.len(), 4);
    }
}
