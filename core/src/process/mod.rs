// passage/src/process/mod.rs

pub mod outcome;
pub mod step;

pub use outcome::{ExecutionSignal, InitializationResult, StepExecutionResult};
pub use step::{ProcessId, ProcessStep, ProcessStepId, StepStatus};
