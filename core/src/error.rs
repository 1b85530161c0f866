// passage/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::process::ProcessId;

/// Errors surfaced through the signal sequence itself. Any of these ends the
/// run; no further signals are produced afterwards.
#[derive(Debug, Error)]
pub enum EngineError {
  /// The requested process type has no registered plugin. This is a caller
  /// programming error, surfaced before any repository access.
  #[error("process type {process_type} is not a registered executable process type")]
  ProcessTypeNotRegistered { process_type: String },

  /// Loading the current step records for the process failed.
  #[error("failed to load step records for process {process_id}")]
  StepDataUnavailable {
    process_id: ProcessId,
    #[source]
    source: AnyhowError,
  },

  /// Process initialization failed. There is no step record to attribute the
  /// failure to, so it is not folded into the FAILED step taxonomy.
  #[error("initialization of process {process_id} failed")]
  InitializationFailed {
    process_id: ProcessId,
    #[source]
    source: AnyhowError,
  },

  /// A plugin raised a fatal fault. No step was modified for the faulting
  /// group and no further groups are attempted in this pass.
  #[error("fatal fault while executing process {process_id}")]
  Fatal {
    process_id: ProcessId,
    #[source]
    source: AnyhowError,
  },
}

/// Error raised across the plugin boundary by `initialize_process` and
/// `execute_process_step`.
///
/// The two variants replace an exception-hierarchy split: anything transient
/// (network hiccup, rejected request, bad remote data) is `Recoverable`; a
/// fault that makes the process untrustworthy to continue is `Fatal`.
/// Cooperative cancellation falls on the `Fatal` side so that an interrupted
/// step is retried on the next pass instead of being recorded as failed.
#[derive(Debug, Error)]
pub enum ExecutionError {
  /// The attempt failed but a later pass may succeed. The executor records
  /// the authoritative step as `Failed` carrying this error's display message
  /// and continues with the next step-type group.
  #[error("{source}")]
  Recoverable {
    #[source]
    source: AnyhowError,
  },

  /// The process is not trustworthy to continue. The executor performs no
  /// step mutation for the faulting group and ends the signal sequence.
  #[error("{source}")]
  Fatal {
    #[source]
    source: AnyhowError,
  },
}

impl ExecutionError {
  pub fn recoverable(source: impl Into<AnyhowError>) -> Self {
    ExecutionError::Recoverable { source: source.into() }
  }

  pub fn fatal(source: impl Into<AnyhowError>) -> Self {
    ExecutionError::Fatal { source: source.into() }
  }
}

// Plain `?` on an anyhow error inside a plugin lands on the recoverable side:
// only faults a plugin explicitly classifies as fatal abort the pass.
impl From<AnyhowError> for ExecutionError {
  fn from(source: AnyhowError) -> Self {
    ExecutionError::Recoverable { source }
  }
}

pub type EngineResult<T, E = EngineError> = std::result::Result<T, E>;
