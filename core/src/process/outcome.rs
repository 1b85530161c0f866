// passage/src/process/outcome.rs

//! The control signals produced by a run and the outcome types process-type
//! plugins report back to the executor.

use crate::plugin::StepTypeKey;
use crate::process::step::StepStatus;

/// Signal emitted by the executor after each completed phase of a pass.
///
/// The boundary contract: every `SaveRequested` must be followed by the
/// caller performing a durable flush before pulling the next signal, and
/// every `LockRequested` must be followed by the caller holding (or
/// re-confirming) the external coordination lock for the remainder of that
/// group's processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionSignal {
  /// No step record was staged for the phase that just completed.
  Unmodified,
  /// Staged changes exist; flush them before asking for the next signal.
  SaveRequested,
  /// The next step-type group requires the external coordination lock before
  /// any of its work is performed.
  LockRequested,
}

/// Reported by [`initialize_process`](crate::plugin::ProcessTypeExecutor::initialize_process)
/// before the main loop of a pass.
#[derive(Debug, Clone)]
pub struct InitializationResult<S: StepTypeKey> {
  /// Whether the plugin itself staged changes during initialization.
  pub modified: bool,
  /// Step types to seed as fresh `Todo` steps.
  pub schedule_step_types: Option<Vec<S>>,
}

impl<S: StepTypeKey> InitializationResult<S> {
  pub fn new(modified: bool, schedule_step_types: Option<Vec<S>>) -> Self {
    InitializationResult {
      modified,
      schedule_step_types,
    }
  }

  /// Nothing staged, nothing scheduled.
  pub fn unchanged() -> Self {
    Self::new(false, None)
  }
}

/// Reported by [`execute_process_step`](crate::plugin::ProcessTypeExecutor::execute_process_step)
/// for one logical unit of work.
#[derive(Debug, Clone)]
pub struct StepExecutionResult<S: StepTypeKey> {
  /// Whether the plugin itself staged changes while executing.
  pub modified: bool,
  /// Resulting status of the authoritative step: `Done` finalizes the group,
  /// `Todo` means "still pending, try again next pass".
  pub status: StepStatus,
  /// Step types to schedule as fresh `Todo` steps, processed later in the
  /// same pass.
  pub schedule_step_types: Option<Vec<S>>,
  /// Step types whose pending steps are now moot and should be skipped.
  pub skip_step_types: Option<Vec<S>>,
  /// Optional human-readable message recorded on the authoritative step.
  pub message: Option<String>,
}

impl<S: StepTypeKey> StepExecutionResult<S> {
  /// Successful completion with no side effects.
  pub fn done() -> Self {
    StepExecutionResult {
      modified: false,
      status: StepStatus::Done,
      schedule_step_types: None,
      skip_step_types: None,
      message: None,
    }
  }

  /// Continuation: the step stays pending for a future pass.
  pub fn pending() -> Self {
    StepExecutionResult {
      status: StepStatus::Todo,
      ..Self::done()
    }
  }

  pub fn with_modified(mut self, modified: bool) -> Self {
    self.modified = modified;
    self
  }

  pub fn with_schedule(mut self, step_types: impl Into<Vec<S>>) -> Self {
    self.schedule_step_types = Some(step_types.into());
    self
  }

  pub fn with_skip(mut self, step_types: impl Into<Vec<S>>) -> Self {
    self.skip_step_types = Some(step_types.into());
    self
  }

  pub fn with_message(mut self, message: impl Into<String>) -> Self {
    self.message = Some(message.into());
    self
  }
}
