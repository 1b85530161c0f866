// passage/src/lib.rs

//! Passage: a restart-safe, pluggable process-step execution engine.
//!
//! Passage drives long-lived workflow instances ("processes") composed of
//! typed, independently retryable steps, one execution increment at a time:
//!  - Process-type plugins supply the step semantics; the engine only applies
//!    outcomes (completion, scheduling, skipping, duplicate collapsing).
//!  - Each pass yields a lazy sequence of control signals telling the driving
//!    caller when to acquire a coordination lock and when to durably flush
//!    staged state.
//!  - Step-type groups are processed in ascending identifier order, so
//!    re-entrant executions converge on the same processing order.
//!  - Failures are two-tier: recoverable errors become durable `FAILED` step
//!    history and the pass continues; fatal faults abort the sequence.

pub mod error;
pub mod executor;
pub mod plugin;
pub mod process;
pub mod repository;

// --- Re-exports for the Public API ---

pub use crate::error::{EngineError, EngineResult, ExecutionError};
pub use crate::executor::{ProcessExecutor, ProcessRun};
pub use crate::plugin::{ProcessTypeExecutor, ProcessTypeKey, StepTypeKey};
pub use crate::process::{
  ExecutionSignal, InitializationResult, ProcessId, ProcessStep, ProcessStepId,
  StepExecutionResult, StepStatus,
};
pub use crate::repository::{InMemoryStepRepository, ProcessStepRepository, StepDiff};

// The cancellation token threaded through plugin execution calls.
pub use tokio_util::sync::CancellationToken;
