//! Orchestrator status wire model
//!
//! The full snapshot arrives on the one-shot status fetch; stream updates
//! carry only the orchestrator sub-object, which is merged into the last
//! full snapshot wholesale.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Full status snapshot as returned by the data-only status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusSnapshot {
    pub message: String,
    pub description: String,
    pub version: String,
    pub clients: HashMap<String, String>,
    pub service: HashMap<String, String>,
    pub endpoints: Vec<String>,
    pub orchestrator: Orchestrator,
}

impl StatusSnapshot {
    /// Apply a stream update: only the orchestrator sub-object is replaced,
    /// every outer field persists from the last full fetch.
    pub fn apply(&mut self, update: Orchestrator) {
        self.orchestrator = update;
    }
}

/// Coarse orchestrator state. Unrecognized or absent wire values decode as
/// `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrchestratorState {
    Idle,
    CleaningUp,
    Busy,
    #[default]
    Unknown,
}

impl OrchestratorState {
    fn from_wire(value: &str) -> Self {
        match value {
            "idle" => OrchestratorState::Idle,
            "cleaning up" => OrchestratorState::CleaningUp,
            "busy" => OrchestratorState::Busy,
            _ => OrchestratorState::Unknown,
        }
    }
}

fn orchestrator_state<'de, D>(deserializer: D) -> Result<OrchestratorState, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .as_deref()
        .map(OrchestratorState::from_wire)
        .unwrap_or_default())
}

#[derive(Debug, Clone, Deserialize)]
pub struct Orchestrator {
    #[serde(rename = "status", default, deserialize_with = "orchestrator_state")]
    pub state: OrchestratorState,
    #[serde(default)]
    pub message: Option<String>,
    pub jobs: Vec<Job>,
    pub tasks: Vec<Task>,
}

/// A scheduled orchestrator job with its run history.
#[derive(Debug, Clone, Deserialize)]
pub struct Job {
    pub id: String,
    #[serde(rename = "lastRunAt", default, deserialize_with = "epoch_millis")]
    pub last_run: Option<DateTime<Utc>>,
    #[serde(rename = "nextRunAt", default, deserialize_with = "epoch_millis")]
    pub next_run: Option<DateTime<Utc>>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TaskState {
    Created,
    Pending,
    Running,
    Finished,
    Error,
    #[default]
    Unknown,
}

impl TaskState {
    fn from_wire(value: &str) -> Self {
        match value {
            "created" => TaskState::Created,
            "pending" => TaskState::Pending,
            "running" => TaskState::Running,
            "finished" => TaskState::Finished,
            "error" => TaskState::Error,
            _ => TaskState::Unknown,
        }
    }
}

fn task_state<'de, D>(deserializer: D) -> Result<TaskState, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(TaskState::from_wire).unwrap_or_default())
}

/// A currently tracked orchestrator task.
#[derive(Debug, Clone, Deserialize)]
pub struct Task {
    pub id: String,
    #[serde(rename = "status", default, deserialize_with = "task_state")]
    pub state: TaskState,
    #[serde(rename = "startedAt", default, deserialize_with = "epoch_millis")]
    pub started_at: Option<DateTime<Utc>>,
    /// Fraction in [0, 1] when the task reports progress.
    #[serde(default)]
    pub progress: Option<f32>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Timestamps arrive as fractional epoch milliseconds.
fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let millis = Option::<f64>::deserialize(deserializer)?;
    Ok(millis.and_then(|ms| DateTime::<Utc>::from_timestamp_millis(ms as i64)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"{
        "message": "All clear",
        "description": "Mirror service",
        "version": "1.4.2",
        "clients": {"web": "2"},
        "service": {"uptime": "3600"},
        "endpoints": ["/my/course", "/file"],
        "orchestrator": {
            "status": "busy",
            "message": "Reindexing",
            "jobs": [{"id": "job.reindex", "lastRunAt": 1631318400000.0, "message": "ok"}],
            "tasks": [{"id": "task.42", "status": "running", "startedAt": 1631318460000.0, "progress": 0.25}]
        }
    }"#;

    #[test]
    fn test_decode_full_snapshot() {
        let snapshot: StatusSnapshot = serde_json::from_str(FULL).unwrap();
        assert_eq!(snapshot.version, "1.4.2");
        assert_eq!(snapshot.orchestrator.state, OrchestratorState::Busy);
        let job = &snapshot.orchestrator.jobs[0];
        assert_eq!(job.last_run.unwrap().timestamp(), 1_631_318_400);
        assert!(job.next_run.is_none());
        let task = &snapshot.orchestrator.tasks[0];
        assert_eq!(task.state, TaskState::Running);
        assert_eq!(task.progress, Some(0.25));
    }

    #[test]
    fn test_unknown_states_fall_back() {
        let orchestrator: Orchestrator = serde_json::from_str(
            r#"{"status": "meditating", "jobs": [], "tasks": [{"id": "t", "status": "paused"}]}"#,
        )
        .unwrap();
        assert_eq!(orchestrator.state, OrchestratorState::Unknown);
        assert_eq!(orchestrator.tasks[0].state, TaskState::Unknown);
    }

    #[test]
    fn test_cleaning_up_wire_value_has_a_space() {
        let orchestrator: Orchestrator =
            serde_json::from_str(r#"{"status": "cleaning up", "jobs": [], "tasks": []}"#).unwrap();
        assert_eq!(orchestrator.state, OrchestratorState::CleaningUp);
    }

    #[test]
    fn test_apply_replaces_only_orchestrator() {
        let mut snapshot: StatusSnapshot = serde_json::from_str(FULL).unwrap();
        let update: Orchestrator =
            serde_json::from_str(r#"{"status": "idle", "jobs": [], "tasks": []}"#).unwrap();
        snapshot.apply(update);
        assert_eq!(snapshot.orchestrator.state, OrchestratorState::Idle);
        assert!(snapshot.orchestrator.tasks.is_empty());
        assert_eq!(snapshot.message, "All clear");
        assert_eq!(snapshot.version, "1.4.2");
    }
}
