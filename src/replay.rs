//! Offline replay of recorded samples through the detection pipeline.
//!
//! A replay script is a JSON document listing what the providers saw on each
//! tick. Ticks are spaced `intervalMs` apart on a synthetic clock, so a replay
//! produces the same events a live session would have produced at that
//! cadence.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::detection::SessionPipeline;
use crate::events::EventLog;
use crate::models::{Event, EventKind, FrameSize, Sample};
use crate::providers::Coverage;
use crate::scoring::{summarize, SessionSummary, CANDIDATE_PREFIX};
use crate::session::state::ENDED_DETAIL;
use crate::settings::MonitorSettings;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayScript {
    pub frame: FrameSize,
    /// Defaults to the configured sample interval.
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub candidate: Option<String>,
    /// Providers that were available; both when omitted.
    #[serde(default)]
    pub coverage: Option<Coverage>,
    pub steps: Vec<ReplayStep>,
}

/// One sample held for `repeat` consecutive ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayStep {
    #[serde(flatten)]
    pub sample: Sample,
    #[serde(default = "one")]
    pub repeat: u32,
}

fn one() -> u32 {
    1
}

impl ReplayScript {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read replay script at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse replay script at {}", path.display()))
    }

    pub fn tick_count(&self) -> u64 {
        self.steps.iter().map(|step| u64::from(step.repeat)).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayOutcome {
    pub ticks: u64,
    pub events: Vec<Event>,
    pub summary: SessionSummary,
}

pub fn replay(script: &ReplayScript, settings: &MonitorSettings) -> ReplayOutcome {
    let interval_ms = script
        .interval_ms
        .unwrap_or(settings.sampling.sample_interval_ms)
        .max(1);
    let mut pipeline = SessionPipeline::new(
        settings.detection.clone(),
        script.coverage.unwrap_or_else(Coverage::full),
    );
    let mut log = EventLog::new();
    if let Some(name) = &script.candidate {
        log.append(0, EventKind::Meta, format!("{CANDIDATE_PREFIX}{}", name.trim()));
    }

    let mut now_ms = 0;
    for step in &script.steps {
        for _ in 0..step.repeat {
            let report = pipeline.process(&step.sample, script.frame, now_ms);
            for detection in report.detections {
                log.append(now_ms, detection.kind, detection.detail);
            }
            now_ms += interval_ms;
        }
    }
    log.append(now_ms, EventKind::Meta, ENDED_DETAIL);

    let events = log.into_events();
    let summary = summarize(&events, now_ms, 0, &settings.scoring);
    ReplayOutcome {
        ticks: script.tick_count(),
        events,
        summary,
    }
}
