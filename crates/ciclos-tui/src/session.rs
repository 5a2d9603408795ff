use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cycles::{Cycle, CycleStore};

/// Everything worth carrying across runs: the cycle history plus the pane
/// scroll positions. Saved after each cycle transition and on exit.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub cycles: Vec<Cycle>,
    pub active_cycle_id: Option<String>,
    #[serde(default)]
    pub history_scroll: usize,
    #[serde(default)]
    pub log_scroll: usize,
}

impl SessionState {
    pub fn into_store(self) -> (CycleStore, usize, usize) {
        (
            CycleStore::from_parts(self.cycles, self.active_cycle_id),
            self.history_scroll,
            self.log_scroll,
        )
    }
}

pub fn resolve_session_id() -> String {
    if let Some(value) = env_override("CICLOS_TUI_SESSION_ID") {
        return value;
    }
    let now = Utc::now().timestamp_millis();
    format!("session-{now}-{}", std::process::id())
}

pub fn resolve_state_path() -> PathBuf {
    if let Some(value) = env_override("CICLOS_TUI_STATE_PATH") {
        return PathBuf::from(value);
    }
    Path::new(".cache").join("ciclos").join("cycles-state.json")
}

pub fn resolve_event_log_dir() -> PathBuf {
    if let Some(value) = env_override("CICLOS_TUI_EVENT_LOG_DIR") {
        return PathBuf::from(value);
    }
    Path::new(".cache").join("ciclos").join("session-logs")
}

fn env_override(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn load_state(state_path: &Path) -> Option<SessionState> {
    let body = fs::read_to_string(state_path).ok()?;
    serde_json::from_str::<SessionState>(&body).ok()
}

pub fn save_state(state_path: &Path, state: &SessionState) {
    if let Some(parent) = state_path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(body) = serde_json::to_string_pretty(state) {
        let _ = fs::write(state_path, body);
    }
}

/// Append-only JSONL record of cycle transitions, one file per session.
/// A failure to open the file disables logging rather than the app.
pub struct SessionLog {
    session_id: String,
    file: Option<fs::File>,
}

impl SessionLog {
    pub fn open(log_dir: &Path, session_id: &str) -> Self {
        let _ = fs::create_dir_all(log_dir);
        let path = log_dir.join(format!("{session_id}.events.jsonl"));
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok();
        Self {
            session_id: session_id.to_string(),
            file,
        }
    }

    #[cfg(test)]
    pub(crate) fn disabled(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            file: None,
        }
    }

    pub fn record(&mut self, event: &str, cycle: &Cycle) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let line = json!({
            "schemaVersion": 1,
            "sessionId": self.session_id,
            "ts": Utc::now().to_rfc3339(),
            "event": event,
            "cycleId": cycle.id,
            "task": cycle.task,
            "minutesAmount": cycle.minutes_amount,
        });
        let _ = writeln!(file, "{line}");
        let _ = file.flush();
    }
}
