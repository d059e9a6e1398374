//! JSONL history of phase changes and climaxes for offline inspection.
use std::{
    fs::{create_dir_all, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use bevy::{log::warn, prelude::*};
use serde::Serialize;

use super::coordinator::{ClimaxKind, CoordinatorState};

const DEFAULT_INTERACTION_TELEMETRY_LOG_PATH: &str = "logs/interaction_history.jsonl";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionTelemetryRecord {
    pub occurred_at_seconds: f64,
    pub event: InteractionTelemetryEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum InteractionTelemetryEvent {
    PhaseChanged {
        old: CoordinatorState,
        new: CoordinatorState,
    },
    Climax {
        kind: ClimaxKind,
        orgasm_count: u32,
    },
}

/// Buffered writer for interaction telemetry, flushed once per frame.
#[derive(Resource, Debug)]
pub struct InteractionTelemetryLog {
    output_path: PathBuf,
    pending: Vec<InteractionTelemetryRecord>,
}

impl InteractionTelemetryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: path.into(),
            pending: Vec::new(),
        }
    }

    pub fn push(&mut self, record: InteractionTelemetryRecord) {
        self.pending.push(record);
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.output_path.parent() {
            create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)?;

        for record in std::mem::take(&mut self.pending) {
            serde_json::to_writer(&mut file, &record)?;
            file.write_all(b"\n")?;
        }

        file.flush()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.output_path
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for InteractionTelemetryLog {
    fn default() -> Self {
        Self::new(DEFAULT_INTERACTION_TELEMETRY_LOG_PATH)
    }
}

/// Flushes pending records, logging a warning if persistence fails.
pub fn flush_interaction_telemetry_log(mut log: ResMut<InteractionTelemetryLog>) {
    if let Err(err) = log.flush() {
        warn!(
            "Failed to persist interaction telemetry to {:?}: {}",
            log.path(),
            err
        );
    }
}
