// passage/src/repository/mod.rs

//! The step repository contract. The executor treats it as a unit-of-work
//! style staging area: creations and mutations are staged, never committed —
//! the driving caller performs the durable flush whenever the run emits
//! [`SaveRequested`](crate::process::ExecutionSignal::SaveRequested).

pub mod memory;

use async_trait::async_trait;

use crate::plugin::StepTypeKey;
use crate::process::{ProcessId, ProcessStep, ProcessStepId, StepStatus};

pub use memory::InMemoryStepRepository;

/// A staged step mutation, expressed as a pure prior-record to new-record
/// diff. The repository applies it against the step's last known values when
/// the staged change is materialized.
pub type StepDiff<S> = Box<dyn FnOnce(ProcessStep<S>) -> ProcessStep<S> + Send>;

#[async_trait]
pub trait ProcessStepRepository<S: StepTypeKey>: Send + Sync {
  /// Loads the (step id, step type) pairs of the process's pending (`Todo`)
  /// steps, in creation order. Terminal steps are excluded; beyond that,
  /// statuses are not needed: grouping operates on types, not records.
  async fn step_data(&self, process_id: ProcessId) -> anyhow::Result<Vec<(ProcessStepId, S)>>;

  /// Stages creation of one new step per entry, minting identifiers and
  /// creation timestamps. Returns the staged records.
  fn create_step_range(&self, steps: Vec<(S, StepStatus, ProcessId)>) -> Vec<ProcessStep<S>>;

  /// Stages a mutation of an existing step by id.
  fn attach_and_modify_step(&self, step_id: ProcessStepId, apply: StepDiff<S>);
}
