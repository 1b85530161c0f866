// passage/src/process/step.rs

//! The step data model: process/step identifiers, the `ProcessStep` record,
//! and the finite step status set with its transition rules.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::plugin::StepTypeKey;

/// Opaque identifier of a workflow instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(Uuid);

impl ProcessId {
  pub fn new() -> Self {
    ProcessId(Uuid::new_v4())
  }

  pub const fn from_uuid(id: Uuid) -> Self {
    ProcessId(id)
  }

  pub const fn as_uuid(&self) -> &Uuid {
    &self.0
  }
}

impl Default for ProcessId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for ProcessId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// Opaque identifier of a single step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessStepId(Uuid);

impl ProcessStepId {
  pub fn new() -> Self {
    ProcessStepId(Uuid::new_v4())
  }

  pub const fn from_uuid(id: Uuid) -> Self {
    ProcessStepId(id)
  }

  pub const fn as_uuid(&self) -> &Uuid {
    &self.0
  }
}

impl Default for ProcessStepId {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Display for ProcessStepId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.0.fmt(f)
  }
}

/// The finite status set a step can occupy. `Todo` is the only non-terminal
/// status; every other status is written at most once per step and never
/// left again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepStatus {
  /// Pending execution; initial status of every newly created step.
  Todo,
  /// The plugin reported successful completion.
  Done,
  /// Another step's outcome made this pending step unnecessary.
  Skipped,
  /// A redundant co-type instance of a step that was executed to completion
  /// in the same pass.
  Duplicate,
  /// The plugin execution raised a recoverable error.
  Failed,
}

impl StepStatus {
  pub fn is_terminal(self) -> bool {
    !matches!(self, StepStatus::Todo)
  }

  /// Transition rule: only a pending step may move, and only to a terminal
  /// status. Terminal statuses are never re-entered.
  pub fn can_transition_to(self, next: StepStatus) -> bool {
    !self.is_terminal() && next.is_terminal()
  }
}

impl fmt::Display for StepStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      StepStatus::Todo => "TODO",
      StepStatus::Done => "DONE",
      StepStatus::Skipped => "SKIPPED",
      StepStatus::Duplicate => "DUPLICATE",
      StepStatus::Failed => "FAILED",
    };
    f.write_str(name)
  }
}

/// One unit of work belonging to a process, typed by the domain's step-type
/// identifier `S`. A step belongs to exactly one process and is never shared.
#[derive(Debug, Clone)]
pub struct ProcessStep<S: StepTypeKey> {
  pub id: ProcessStepId,
  pub step_type: S,
  pub status: StepStatus,
  pub process_id: ProcessId,
  pub created_at: DateTime<Utc>,
  pub last_changed_at: Option<DateTime<Utc>>,
  /// Free text populated on failure or informational outcomes.
  pub message: Option<String>,
}

impl<S: StepTypeKey> ProcessStep<S> {
  pub fn new(step_type: S, status: StepStatus, process_id: ProcessId) -> Self {
    ProcessStep {
      id: ProcessStepId::new(),
      step_type,
      status,
      process_id,
      created_at: Utc::now(),
      last_changed_at: None,
      message: None,
    }
  }

  /// Applies a terminal transition to this record, stamping the change time.
  ///
  /// Returns `false` and leaves the record untouched when the transition is
  /// not legal (the step is already terminal, or `status` is not terminal).
  pub fn finalize(&mut self, status: StepStatus, message: Option<String>) -> bool {
    if !self.status.can_transition_to(status) {
      return false;
    }
    self.status = status;
    self.message = message;
    self.last_changed_at = Some(Utc::now());
    true
  }
}
