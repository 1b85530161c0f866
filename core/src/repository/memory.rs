// passage/src/repository/memory.rs

//! In-memory reference implementation of the staging repository.
//!
//! Keeps a committed store next to a list of staged changes; `flush` plays
//! the role of the caller's durable transaction. This is what the crate's own
//! tests and the demo worker run against, and it doubles as the executable
//! specification of the staging contract: nothing the executor does is
//! visible in the store until the caller flushes.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{event, Level};

use crate::plugin::StepTypeKey;
use crate::process::{ProcessId, ProcessStep, ProcessStepId, StepStatus};
use crate::repository::{ProcessStepRepository, StepDiff};

enum StagedChange<S: StepTypeKey> {
  Create(ProcessStep<S>),
  Modify(ProcessStepId, StepDiff<S>),
}

struct Inner<S: StepTypeKey> {
  // Committed records in creation order; loads preserve this order, which is
  // what makes the "first by creation order" authoritative pick observable.
  committed: Vec<ProcessStep<S>>,
  staged: Vec<StagedChange<S>>,
}

pub struct InMemoryStepRepository<S: StepTypeKey> {
  inner: Mutex<Inner<S>>,
}

impl<S: StepTypeKey> InMemoryStepRepository<S> {
  pub fn new() -> Self {
    InMemoryStepRepository {
      inner: Mutex::new(Inner {
        committed: Vec::new(),
        staged: Vec::new(),
      }),
    }
  }

  /// Inserts records directly into the committed store, bypassing staging.
  /// Intended for arranging pre-existing process state.
  pub fn seed(&self, steps: impl IntoIterator<Item = ProcessStep<S>>) {
    self.inner.lock().committed.extend(steps);
  }

  /// Applies all staged changes to the committed store, in staging order.
  /// Returns the number of changes applied; a staged mutation whose target
  /// record does not exist is dropped with a warning.
  pub fn flush(&self) -> usize {
    let mut inner = self.inner.lock();
    let staged = std::mem::take(&mut inner.staged);
    let mut applied = 0;
    for change in staged {
      match change {
        StagedChange::Create(step) => {
          inner.committed.push(step);
          applied += 1;
        }
        StagedChange::Modify(step_id, apply) => {
          match inner.committed.iter().position(|step| step.id == step_id) {
            Some(index) => {
              let prior = inner.committed[index].clone();
              inner.committed[index] = apply(prior);
              applied += 1;
            }
            None => {
              event!(Level::WARN, %step_id, "dropping staged mutation for unknown step");
            }
          }
        }
      }
    }
    applied
  }

  /// Drops all staged changes without applying them. Returns how many were
  /// discarded.
  pub fn discard_staged(&self) -> usize {
    let mut inner = self.inner.lock();
    let staged = std::mem::take(&mut inner.staged);
    staged.len()
  }

  pub fn staged_len(&self) -> usize {
    self.inner.lock().staged.len()
  }

  /// The committed record for a step, if any.
  pub fn step(&self, step_id: ProcessStepId) -> Option<ProcessStep<S>> {
    self.inner.lock().committed.iter().find(|step| step.id == step_id).cloned()
  }

  /// All committed records of a process, in creation order.
  pub fn steps_for_process(&self, process_id: ProcessId) -> Vec<ProcessStep<S>> {
    self
      .inner
      .lock()
      .committed
      .iter()
      .filter(|step| step.process_id == process_id)
      .cloned()
      .collect()
  }
}

impl<S: StepTypeKey> Default for InMemoryStepRepository<S> {
  fn default() -> Self {
    Self::new()
  }
}

#[async_trait]
impl<S: StepTypeKey> ProcessStepRepository<S> for InMemoryStepRepository<S> {
  async fn step_data(&self, process_id: ProcessId) -> anyhow::Result<Vec<(ProcessStepId, S)>> {
    Ok(
      self
        .inner
        .lock()
        .committed
        .iter()
        .filter(|step| step.process_id == process_id && step.status == StepStatus::Todo)
        .map(|step| (step.id, step.step_type))
        .collect(),
    )
  }

  fn create_step_range(&self, steps: Vec<(S, StepStatus, ProcessId)>) -> Vec<ProcessStep<S>> {
    let records: Vec<ProcessStep<S>> = steps
      .into_iter()
      .map(|(step_type, status, process_id)| ProcessStep::new(step_type, status, process_id))
      .collect();
    let mut inner = self.inner.lock();
    inner
      .staged
      .extend(records.iter().cloned().map(StagedChange::Create));
    records
  }

  fn attach_and_modify_step(&self, step_id: ProcessStepId, apply: StepDiff<S>) {
    self.inner.lock().staged.push(StagedChange::Modify(step_id, apply));
  }
}
