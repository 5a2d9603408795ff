use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MIN_MINUTES: u32 = 1;
pub const MAX_MINUTES: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    #[error("já existe um ciclo em andamento")]
    CycleAlreadyActive,
    #[error("nenhum ciclo em andamento")]
    NoActiveCycle,
}

/// One countdown session tied to a task and a duration. A cycle is active
/// while it carries neither terminal date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cycle {
    pub id: String,
    pub task: String,
    pub minutes_amount: u32,
    pub start: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interrupted_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Cycle {
    pub fn total_seconds(&self) -> i64 {
        i64::from(self.minutes_amount) * 60
    }

    pub fn is_active(&self) -> bool {
        self.interrupted_at.is_none() && self.finished_at.is_none()
    }

    pub fn status_label(&self) -> &'static str {
        if self.finished_at.is_some() {
            "concluído"
        } else if self.interrupted_at.is_some() {
            "interrompido"
        } else {
            "em andamento"
        }
    }
}

/// Append-only sequence of cycles plus the id of the one currently running.
/// Cycles are never removed; terminal dates are the only mutation.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct CycleStore {
    cycles: Vec<Cycle>,
    active_cycle_id: Option<String>,
}

impl CycleStore {
    pub fn from_parts(cycles: Vec<Cycle>, active_cycle_id: Option<String>) -> Self {
        let active_cycle_id = active_cycle_id
            .filter(|id| cycles.iter().any(|cycle| cycle.id == *id && cycle.is_active()));
        Self {
            cycles,
            active_cycle_id,
        }
    }

    pub fn cycles(&self) -> &[Cycle] {
        &self.cycles
    }

    pub fn active_cycle_id(&self) -> Option<&str> {
        self.active_cycle_id.as_deref()
    }

    pub fn active_cycle(&self) -> Option<&Cycle> {
        let id = self.active_cycle_id.as_deref()?;
        self.cycles.iter().find(|cycle| cycle.id == id)
    }

    pub fn create_new_cycle(&mut self, task: &str, minutes_amount: u32) -> Result<&Cycle, CycleError> {
        if self.active_cycle_id.is_some() {
            return Err(CycleError::CycleAlreadyActive);
        }
        let start = Utc::now();
        let cycle = Cycle {
            id: format!("cycle-{}-{}", start.timestamp_millis(), self.cycles.len()),
            task: task.to_string(),
            minutes_amount,
            start,
            interrupted_at: None,
            finished_at: None,
        };
        self.active_cycle_id = Some(cycle.id.clone());
        self.cycles.push(cycle);
        Ok(self.cycles.last().expect("cycle was just pushed"))
    }

    pub fn interrupt_current_cycle(&mut self) -> Result<&Cycle, CycleError> {
        self.close_active_cycle(|cycle, now| cycle.interrupted_at = Some(now))
    }

    pub fn finish_current_cycle(&mut self) -> Result<&Cycle, CycleError> {
        self.close_active_cycle(|cycle, now| cycle.finished_at = Some(now))
    }

    #[cfg(test)]
    pub(crate) fn cycles_mut(&mut self) -> &mut [Cycle] {
        &mut self.cycles
    }

    fn close_active_cycle<F>(&mut self, apply: F) -> Result<&Cycle, CycleError>
    where
        F: FnOnce(&mut Cycle, DateTime<Utc>),
    {
        let id = self.active_cycle_id.take().ok_or(CycleError::NoActiveCycle)?;
        let cycle = self
            .cycles
            .iter_mut()
            .find(|cycle| cycle.id == id)
            .ok_or(CycleError::NoActiveCycle)?;
        apply(cycle, Utc::now());
        Ok(cycle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn create_new_cycle_marks_it_active() {
        let mut store = CycleStore::default();
        let before = Utc::now();
        let cycle = store
            .create_new_cycle("Study", 25)
            .expect("create cycle")
            .clone();
        let after = Utc::now();

        assert_eq!(cycle.task, "Study");
        assert_eq!(cycle.minutes_amount, 25);
        assert!(cycle.start >= before && cycle.start <= after);
        assert!(cycle.is_active());
        assert_eq!(store.active_cycle().map(|active| active.id.clone()), Some(cycle.id));
    }

    #[test]
    fn create_is_rejected_while_a_cycle_is_active() {
        let mut store = CycleStore::default();
        store.create_new_cycle("Study", 25).expect("create cycle");
        let result = store.create_new_cycle("Another", 10);
        assert_eq!(result.err(), Some(CycleError::CycleAlreadyActive));
        assert_eq!(store.cycles().len(), 1);
    }

    #[test]
    fn interrupt_sets_terminal_date_and_clears_active() {
        let mut store = CycleStore::default();
        store.create_new_cycle("Study", 25).expect("create cycle");
        let interrupted = store
            .interrupt_current_cycle()
            .expect("interrupt cycle")
            .clone();

        assert!(interrupted.interrupted_at.is_some());
        assert!(interrupted.finished_at.is_none());
        assert_eq!(interrupted.status_label(), "interrompido");
        assert!(store.active_cycle().is_none());
    }

    #[test]
    fn interrupt_without_active_cycle_fails() {
        let mut store = CycleStore::default();
        assert_eq!(store.interrupt_current_cycle().err(), Some(CycleError::NoActiveCycle));
    }

    #[test]
    fn finish_sets_terminal_date_and_allows_a_new_cycle() {
        let mut store = CycleStore::default();
        store.create_new_cycle("Study", 1).expect("create cycle");
        let finished = store.finish_current_cycle().expect("finish cycle").clone();

        assert!(finished.finished_at.is_some());
        assert_eq!(finished.status_label(), "concluído");
        assert!(store.active_cycle().is_none());
        store.create_new_cycle("Next", 5).expect("create after finish");
        assert_eq!(store.cycles().len(), 2);
    }

    #[test]
    fn from_parts_drops_stale_active_id() {
        let mut store = CycleStore::default();
        store.create_new_cycle("Study", 25).expect("create cycle");
        store.interrupt_current_cycle().expect("interrupt cycle");
        let cycles = store.cycles().to_vec();
        let stale_id = cycles[0].id.clone();

        let restored = CycleStore::from_parts(cycles.clone(), Some(stale_id));
        assert!(restored.active_cycle().is_none());

        let restored = CycleStore::from_parts(cycles, Some("cycle-missing".to_string()));
        assert!(restored.active_cycle().is_none());
    }

    #[test]
    fn restored_running_cycle_stays_active() {
        let mut store = CycleStore::default();
        let id = store
            .create_new_cycle("Study", 25)
            .expect("create cycle")
            .id
            .clone();
        let mut cycles = store.cycles().to_vec();
        cycles[0].start = cycles[0].start - Duration::seconds(30);

        let restored = CycleStore::from_parts(cycles, Some(id.clone()));
        assert_eq!(restored.active_cycle_id(), Some(id.as_str()));
    }
}
