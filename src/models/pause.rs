use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One pause window of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pause {
    pub id: String,
    pub session_id: String,
    /// Active-clock offset at which the pause began.
    pub paused_at_ms: u64,
    pub pause_started_at: DateTime<Utc>,
    pub pause_ended_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<u64>,
}

impl Pause {
    pub fn open(session_id: &str, paused_at_ms: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id: session_id.to_string(),
            paused_at_ms,
            pause_started_at: started_at,
            pause_ended_at: None,
            duration_ms: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.pause_ended_at.is_none()
    }

    pub fn close(&mut self, ended_at: DateTime<Utc>, duration_ms: u64) {
        self.pause_ended_at = Some(ended_at);
        self.duration_ms = Some(duration_ms);
    }
}
