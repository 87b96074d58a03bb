use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    FocusLost,
    NoFace,
    MultipleFaces,
    Object,
    /// Bookkeeping: pause/resume/stop markers and operator annotations.
    Meta,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::FocusLost,
        EventKind::NoFace,
        EventKind::MultipleFaces,
        EventKind::Object,
        EventKind::Meta,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::FocusLost => "FOCUS_LOST",
            EventKind::NoFace => "NO_FACE",
            EventKind::MultipleFaces => "MULTIPLE_FACES",
            EventKind::Object => "OBJECT",
            EventKind::Meta => "META",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| format!("unknown event type '{value}'"))
    }
}

/// One entry of the event log. `time_ms` is measured from session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub time_ms: u64,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub detail: String,
}

impl Event {
    pub fn new(time_ms: u64, kind: EventKind, detail: impl Into<String>) -> Self {
        Self {
            time_ms,
            kind,
            detail: detail.into(),
        }
    }
}

/// An event the debounce engine decided to emit, not yet stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: EventKind,
    pub detail: String,
}

impl Detection {
    pub fn new(kind: EventKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_parse_back() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
        }
        assert!("BLINK".parse::<EventKind>().is_err());
    }

    #[test]
    fn event_serializes_with_wire_type_names() {
        let event = Event::new(1200, EventKind::MultipleFaces, "Multiple faces detected");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "MULTIPLE_FACES");
        assert_eq!(json["timeMs"], 1200);
    }
}
