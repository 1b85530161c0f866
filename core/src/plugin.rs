// passage/src/plugin.rs

//! The process-type plugin contract consumed by the executor, plus the marker
//! traits identifier types must satisfy.
//!
//! A plugin governs exactly one process type: it knows which step types are
//! meaningful, which require the caller to hold a coordination lock, how to
//! seed a process with its initial steps, and how to execute one logical unit
//! of work per step type. What a step actually *does* is entirely the
//! plugin's business; the executor only applies the reported outcome.

use std::fmt;
use std::hash::Hash;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ExecutionError;
use crate::process::{InitializationResult, ProcessId, StepExecutionResult};

/// Marker for process-type identifiers. Domain enums satisfy this
/// automatically through the blanket impl.
pub trait ProcessTypeKey: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> ProcessTypeKey for T where T: Copy + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Marker for step-type identifiers. `Ord` supplies the ascending processing
/// order the executor guarantees within one pass.
pub trait StepTypeKey: Copy + Ord + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> StepTypeKey for T where T: Copy + Ord + Hash + fmt::Debug + Send + Sync + 'static {}

/// Implemented by collaborators plugged into the
/// [`ProcessExecutor`](crate::executor::ProcessExecutor), one instance per
/// process type.
#[async_trait]
pub trait ProcessTypeExecutor<P: ProcessTypeKey, S: StepTypeKey>: Send + Sync {
  /// The process type this plugin governs.
  fn process_type_id(&self) -> P;

  /// Whether this step type is meaningful to this plugin. Non-executable
  /// step types are fully inert to the executor: no lock signal, no execution
  /// attempt, no stream entry.
  fn is_executable_step_type_id(&self, step_type: S) -> bool;

  /// Whether the caller must hold the external coordination lock before any
  /// work for this step type. Pure predicate, queried once per group.
  fn is_lock_requested(&self, step_type: S) -> bool;

  /// Called once per pass before the main loop, to seed a process with its
  /// initial steps or react to externally-added state. `existing_step_types`
  /// holds the distinct step types currently present in the process.
  async fn initialize_process(
    &self,
    process_id: ProcessId,
    existing_step_types: &[S],
  ) -> Result<InitializationResult<S>, ExecutionError>;

  /// Executes exactly one logical unit of work for the given step type.
  /// `process_step_types` holds the distinct step types currently pending in
  /// the process.
  ///
  /// The executor forwards `cancellation` without interpreting it. A plugin
  /// that stops because the token fired should return
  /// [`ExecutionError::Fatal`], so the interrupted step stays pending and is
  /// retried on the next pass instead of being recorded as failed.
  async fn execute_process_step(
    &self,
    step_type: S,
    process_step_types: &[S],
    cancellation: CancellationToken,
  ) -> Result<StepExecutionResult<S>, ExecutionError>;
}
