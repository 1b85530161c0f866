// passage/src/executor/registry.rs

//! Defines `ProcessExecutor<P, S>`, the process-type plugin registry and the
//! entry point for driving one pass over a process.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{event, Level};

use crate::error::EngineError;
use crate::executor::run::ProcessRun;
use crate::plugin::{ProcessTypeExecutor, ProcessTypeKey, StepTypeKey};
use crate::process::ProcessId;
use crate::repository::ProcessStepRepository;

/// Holds one plugin per process type, supplied at construction, plus the
/// repository collaborator the runs stage their mutations through.
pub struct ProcessExecutor<P: ProcessTypeKey, S: StepTypeKey> {
  executors: HashMap<P, Arc<dyn ProcessTypeExecutor<P, S>>>,
  repository: Arc<dyn ProcessStepRepository<S>>,
}

impl<P: ProcessTypeKey, S: StepTypeKey> ProcessExecutor<P, S> {
  /// Builds the registry. A later plugin claiming an already registered
  /// process type replaces the earlier one.
  pub fn new(
    executors: impl IntoIterator<Item = Arc<dyn ProcessTypeExecutor<P, S>>>,
    repository: Arc<dyn ProcessStepRepository<S>>,
  ) -> Self {
    let mut registry: HashMap<P, Arc<dyn ProcessTypeExecutor<P, S>>> = HashMap::new();
    for executor in executors {
      let process_type = executor.process_type_id();
      event!(Level::DEBUG, ?process_type, "registering process type plugin");
      if registry.insert(process_type, executor).is_some() {
        event!(Level::WARN, ?process_type, "replacing previously registered plugin");
      }
    }
    ProcessExecutor {
      executors: registry,
      repository,
    }
  }

  /// The process types currently pluggable. Never fails, no side effects.
  pub fn registered_process_type_ids(&self) -> impl Iterator<Item = P> + '_ {
    self.executors.keys().copied()
  }

  /// Starts one pass over `process_id`, returning the lazy signal sequence.
  ///
  /// An unregistered process type fails here, before any repository access:
  /// asking for it is a programming error of the caller, not a transient
  /// condition.
  pub fn execute_process(
    &self,
    process_id: ProcessId,
    process_type: P,
    cancellation: CancellationToken,
  ) -> Result<ProcessRun<'_, P, S>, EngineError> {
    let plugin = self.executors.get(&process_type).ok_or_else(|| {
      event!(Level::ERROR, ?process_type, "no plugin registered for process type");
      EngineError::ProcessTypeNotRegistered {
        process_type: format!("{process_type:?}"),
      }
    })?;
    event!(Level::DEBUG, %process_id, ?process_type, "starting process run");
    Ok(ProcessRun::new(
      process_id,
      plugin.as_ref(),
      self.repository.as_ref(),
      cancellation,
    ))
  }
}
