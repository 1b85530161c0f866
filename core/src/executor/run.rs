// passage/src/executor/run.rs

//! Contains `ProcessRun`, the lazy signal sequence produced for one
//! invocation of [`ProcessExecutor::execute_process`](crate::executor::ProcessExecutor::execute_process).
//!
//! The run is a pull-based state machine: each `next()` call performs at most
//! one phase of work (initialization, or one step-type group) and yields the
//! signal for it. Nothing runs ahead of the caller, so a durable flush can
//! happen between any two signals.

use tokio_util::sync::CancellationToken;
use tracing::{event, instrument, Level};

use crate::error::{EngineError, ExecutionError};
use crate::executor::context::ProcessContext;
use crate::plugin::{ProcessTypeExecutor, ProcessTypeKey, StepTypeKey};
use crate::process::{ExecutionSignal, ProcessId};
use crate::repository::ProcessStepRepository;

#[derive(Debug, Clone, Copy)]
enum RunState<S> {
  /// Load step records, initialize the process, yield the phase signal.
  Initialize,
  /// Pop the next group from the work-list.
  NextGroup,
  /// `LockRequested` was yielded for this group; execute it on the next pull.
  Execute(S),
  Drained,
}

/// One in-flight pass over a process. Produced by
/// [`ProcessExecutor::execute_process`](crate::executor::ProcessExecutor::execute_process).
pub struct ProcessRun<'a, P: ProcessTypeKey, S: StepTypeKey> {
  process_id: ProcessId,
  plugin: &'a dyn ProcessTypeExecutor<P, S>,
  repository: &'a dyn ProcessStepRepository<S>,
  cancellation: CancellationToken,
  context: ProcessContext<S>,
  state: RunState<S>,
}

impl<'a, P: ProcessTypeKey, S: StepTypeKey> ProcessRun<'a, P, S> {
  pub(crate) fn new(
    process_id: ProcessId,
    plugin: &'a dyn ProcessTypeExecutor<P, S>,
    repository: &'a dyn ProcessStepRepository<S>,
    cancellation: CancellationToken,
  ) -> Self {
    ProcessRun {
      process_id,
      plugin,
      repository,
      cancellation,
      context: ProcessContext::new(process_id),
      state: RunState::Initialize,
    }
  }

  /// Produces the next execution signal, performing the work that backs it.
  ///
  /// Returns `None` once the work-list is drained. A fatal condition is
  /// yielded as `Some(Err(..))`; the run is drained afterwards and every
  /// later call returns `None`.
  #[instrument(name = "ProcessRun::next", skip_all, fields(process_id = %self.process_id))]
  pub async fn next(&mut self) -> Option<Result<ExecutionSignal, EngineError>> {
    match self.advance().await {
      Ok(signal) => signal.map(Ok),
      Err(error) => {
        self.state = RunState::Drained;
        Some(Err(error))
      }
    }
  }

  async fn advance(&mut self) -> Result<Option<ExecutionSignal>, EngineError> {
    match self.state {
      RunState::Initialize => {
        let signal = self.initialize().await?;
        self.state = RunState::NextGroup;
        Ok(Some(signal))
      }
      RunState::NextGroup => {
        let Some(step_type) = self.context.next_executable() else {
          event!(Level::DEBUG, "work-list drained");
          self.state = RunState::Drained;
          return Ok(None);
        };
        if self.plugin.is_lock_requested(step_type) {
          event!(Level::DEBUG, ?step_type, "requesting coordination lock");
          self.state = RunState::Execute(step_type);
          return Ok(Some(ExecutionSignal::LockRequested));
        }
        Ok(Some(self.execute_group(step_type).await?))
      }
      RunState::Execute(step_type) => {
        self.state = RunState::NextGroup;
        Ok(Some(self.execute_group(step_type).await?))
      }
      RunState::Drained => Ok(None),
    }
  }

  async fn initialize(&mut self) -> Result<ExecutionSignal, EngineError> {
    let plugin = self.plugin;
    let step_data = self
      .repository
      .step_data(self.process_id)
      .await
      .map_err(|source| EngineError::StepDataUnavailable {
        process_id: self.process_id,
        source,
      })?;
    event!(Level::DEBUG, count = step_data.len(), "loaded step records");
    self
      .context
      .load_steps(step_data, |step_type| plugin.is_executable_step_type_id(step_type));

    let existing = self.context.step_type_ids();
    let init = plugin
      .initialize_process(self.process_id, &existing)
      .await
      .map_err(|error| EngineError::InitializationFailed {
        process_id: self.process_id,
        source: error.into(),
      })?;

    let mut modified = init.modified;
    if let Some(schedule) = init.schedule_step_types.as_deref() {
      modified |= self.context.schedule_step_types(
        self.repository,
        |step_type| plugin.is_executable_step_type_id(step_type),
        schedule,
      );
    }
    Ok(save_or_unmodified(modified))
  }

  async fn execute_group(&mut self, step_type: S) -> Result<ExecutionSignal, EngineError> {
    let plugin = self.plugin;
    let step_types = self.context.step_type_ids();
    event!(Level::DEBUG, ?step_type, "executing step group");

    match plugin
      .execute_process_step(step_type, &step_types, self.cancellation.clone())
      .await
    {
      Ok(outcome) => {
        let mut modified = outcome.modified;
        modified |= self
          .context
          .apply_status(self.repository, step_type, outcome.status, outcome.message);
        if let Some(skip) = outcome.skip_step_types.as_deref() {
          modified |= self.context.skip_step_types(self.repository, skip);
        }
        if let Some(schedule) = outcome.schedule_step_types.as_deref() {
          modified |= self.context.schedule_step_types(
            self.repository,
            |step_type| plugin.is_executable_step_type_id(step_type),
            schedule,
          );
        }
        Ok(save_or_unmodified(modified))
      }
      Err(ExecutionError::Recoverable { source }) => {
        event!(Level::WARN, ?step_type, error = %source, "step execution failed; recording FAILED");
        let modified = self
          .context
          .record_failure(self.repository, step_type, source.to_string());
        Ok(save_or_unmodified(modified))
      }
      Err(ExecutionError::Fatal { source }) => {
        event!(Level::ERROR, ?step_type, error = %source, "fatal fault; aborting run");
        Err(EngineError::Fatal {
          process_id: self.process_id,
          source,
        })
      }
    }
  }
}

fn save_or_unmodified(modified: bool) -> ExecutionSignal {
  if modified {
    ExecutionSignal::SaveRequested
  } else {
    ExecutionSignal::Unmodified
  }
}
