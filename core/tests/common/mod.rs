// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use tracing::Level;

use passage::{
  CancellationToken, EngineError, ExecutionError, ExecutionSignal, InitializationResult,
  InMemoryStepRepository, ProcessExecutor, ProcessId, ProcessStep, ProcessStepId,
  ProcessStepRepository, ProcessTypeExecutor, StepDiff, StepExecutionResult, StepStatus,
};

// --- Domain identifiers used across the tests ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessType {
  Onboarding,
  Registration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StepType {
  Alpha,
  Beta,
  Gamma,
  Delta,
  Epsilon,
}

// --- Scripted plugin ---

/// What the scripted plugin reports for one `execute_process_step` call.
/// Scripts are replayable: the last entry of a queue repeats forever, so the
/// same plugin can drive several identical passes.
#[derive(Debug, Clone)]
pub enum StepScript {
  Finish {
    modified: bool,
    status: StepStatus,
    schedule: Vec<StepType>,
    skip: Vec<StepType>,
    message: Option<String>,
  },
  Fail(String),
  Fault(String),
}

impl StepScript {
  pub fn done() -> Self {
    StepScript::Finish {
      modified: false,
      status: StepStatus::Done,
      schedule: vec![],
      skip: vec![],
      message: None,
    }
  }

  pub fn pending() -> Self {
    StepScript::Finish {
      modified: false,
      status: StepStatus::Todo,
      schedule: vec![],
      skip: vec![],
      message: None,
    }
  }

  pub fn schedule(mut self, step_types: &[StepType]) -> Self {
    if let StepScript::Finish { schedule, .. } = &mut self {
      schedule.extend_from_slice(step_types);
    }
    self
  }

  pub fn skip(mut self, step_types: &[StepType]) -> Self {
    if let StepScript::Finish { skip, .. } = &mut self {
      skip.extend_from_slice(step_types);
    }
    self
  }

  pub fn modified(mut self) -> Self {
    if let StepScript::Finish { modified, .. } = &mut self {
      *modified = true;
    }
    self
  }
}

#[derive(Debug, Clone)]
pub enum InitScript {
  Result { modified: bool, schedule: Vec<StepType> },
  Fail(String),
}

/// One recorded `execute_process_step` invocation.
#[derive(Debug, Clone)]
pub struct ExecutedCall {
  pub step_type: StepType,
  pub process_step_types: Vec<StepType>,
  pub cancellation_requested: bool,
}

/// Configurable fake plugin: outcomes are scripted up front, every call is
/// recorded for assertions.
pub struct ScriptedPlugin {
  process_type: ProcessType,
  executable: Option<Vec<StepType>>, // None = every step type is executable
  lock_requested: bool,
  init: Mutex<InitScript>,
  scripts: Mutex<HashMap<StepType, VecDeque<StepScript>>>,
  pub executed: Mutex<Vec<ExecutedCall>>,
  pub init_calls: Mutex<Vec<(ProcessId, Vec<StepType>)>>,
}

impl ScriptedPlugin {
  pub fn new(process_type: ProcessType) -> Self {
    ScriptedPlugin {
      process_type,
      executable: None,
      lock_requested: false,
      init: Mutex::new(InitScript::Result {
        modified: false,
        schedule: vec![],
      }),
      scripts: Mutex::new(HashMap::new()),
      executed: Mutex::new(Vec::new()),
      init_calls: Mutex::new(Vec::new()),
    }
  }

  pub fn executable_only(mut self, step_types: &[StepType]) -> Self {
    self.executable = Some(step_types.to_vec());
    self
  }

  pub fn lock_all(mut self) -> Self {
    self.lock_requested = true;
    self
  }

  pub fn on_init(self, script: InitScript) -> Self {
    *self.init.lock() = script;
    self
  }

  pub fn on_step(self, step_type: StepType, script: StepScript) -> Self {
    self.scripts.lock().entry(step_type).or_default().push_back(script);
    self
  }

  pub fn executed_types(&self) -> Vec<StepType> {
    self.executed.lock().iter().map(|call| call.step_type).collect()
  }

  pub fn executed_count(&self) -> usize {
    self.executed.lock().len()
  }

  fn next_script(&self, step_type: StepType) -> StepScript {
    let mut scripts = self.scripts.lock();
    let queue = scripts.entry(step_type).or_default();
    match queue.len() {
      // Unscripted step types stay pending so nothing mutates by accident.
      0 => StepScript::pending(),
      1 => queue.front().cloned().unwrap_or_else(StepScript::pending),
      _ => queue.pop_front().unwrap_or_else(StepScript::pending),
    }
  }
}

#[async_trait]
impl ProcessTypeExecutor<ProcessType, StepType> for ScriptedPlugin {
  fn process_type_id(&self) -> ProcessType {
    self.process_type
  }

  fn is_executable_step_type_id(&self, step_type: StepType) -> bool {
    match &self.executable {
      None => true,
      Some(types) => types.contains(&step_type),
    }
  }

  fn is_lock_requested(&self, _step_type: StepType) -> bool {
    self.lock_requested
  }

  async fn initialize_process(
    &self,
    process_id: ProcessId,
    existing_step_types: &[StepType],
  ) -> Result<InitializationResult<StepType>, ExecutionError> {
    self
      .init_calls
      .lock()
      .push((process_id, existing_step_types.to_vec()));
    match self.init.lock().clone() {
      InitScript::Result { modified, schedule } => Ok(InitializationResult::new(
        modified,
        if schedule.is_empty() { None } else { Some(schedule) },
      )),
      InitScript::Fail(message) => Err(ExecutionError::recoverable(anyhow::anyhow!(message))),
    }
  }

  async fn execute_process_step(
    &self,
    step_type: StepType,
    process_step_types: &[StepType],
    cancellation: CancellationToken,
  ) -> Result<StepExecutionResult<StepType>, ExecutionError> {
    self.executed.lock().push(ExecutedCall {
      step_type,
      process_step_types: process_step_types.to_vec(),
      cancellation_requested: cancellation.is_cancelled(),
    });
    match self.next_script(step_type) {
      StepScript::Finish {
        modified,
        status,
        schedule,
        skip,
        message,
      } => {
        let mut result = StepExecutionResult::pending().with_modified(modified);
        result.status = status;
        if !schedule.is_empty() {
          result = result.with_schedule(schedule);
        }
        if !skip.is_empty() {
          result = result.with_skip(skip);
        }
        if let Some(message) = message {
          result = result.with_message(message);
        }
        Ok(result)
      }
      StepScript::Fail(message) => Err(ExecutionError::recoverable(anyhow::anyhow!(message))),
      StepScript::Fault(message) => Err(ExecutionError::fatal(anyhow::anyhow!(message))),
    }
  }
}

// --- Repository instrumentation ---

/// Delegating repository that counts collaborator calls, for asserting that
/// certain paths never touch the store.
pub struct CountingRepository {
  pub inner: InMemoryStepRepository<StepType>,
  pub load_calls: AtomicUsize,
  pub create_calls: AtomicUsize,
  pub modify_calls: AtomicUsize,
}

impl CountingRepository {
  pub fn new() -> Self {
    CountingRepository {
      inner: InMemoryStepRepository::new(),
      load_calls: AtomicUsize::new(0),
      create_calls: AtomicUsize::new(0),
      modify_calls: AtomicUsize::new(0),
    }
  }

  pub fn loads(&self) -> usize {
    self.load_calls.load(Ordering::SeqCst)
  }

  pub fn creates(&self) -> usize {
    self.create_calls.load(Ordering::SeqCst)
  }

  pub fn modifies(&self) -> usize {
    self.modify_calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl ProcessStepRepository<StepType> for CountingRepository {
  async fn step_data(
    &self,
    process_id: ProcessId,
  ) -> anyhow::Result<Vec<(ProcessStepId, StepType)>> {
    self.load_calls.fetch_add(1, Ordering::SeqCst);
    self.inner.step_data(process_id).await
  }

  fn create_step_range(
    &self,
    steps: Vec<(StepType, StepStatus, ProcessId)>,
  ) -> Vec<ProcessStep<StepType>> {
    self.create_calls.fetch_add(1, Ordering::SeqCst);
    self.inner.create_step_range(steps)
  }

  fn attach_and_modify_step(&self, step_id: ProcessStepId, apply: StepDiff<StepType>) {
    self.modify_calls.fetch_add(1, Ordering::SeqCst);
    self.inner.attach_and_modify_step(step_id, apply)
  }
}

// --- Helpers ---

pub fn build_executor(
  plugin: Arc<ScriptedPlugin>,
  repository: Arc<InMemoryStepRepository<StepType>>,
) -> ProcessExecutor<ProcessType, StepType> {
  ProcessExecutor::new(
    [plugin as Arc<dyn ProcessTypeExecutor<ProcessType, StepType>>],
    repository as Arc<dyn ProcessStepRepository<StepType>>,
  )
}

/// Seeds one pending step per listed type, preserving order. Returns the
/// minted step ids in the same order.
pub fn seed_steps(
  repository: &InMemoryStepRepository<StepType>,
  process_id: ProcessId,
  step_types: &[StepType],
) -> Vec<ProcessStepId> {
  let steps: Vec<ProcessStep<StepType>> = step_types
    .iter()
    .map(|&step_type| ProcessStep::new(step_type, StepStatus::Todo, process_id))
    .collect();
  let ids = steps.iter().map(|step| step.id).collect();
  repository.seed(steps);
  ids
}

/// Drives a run to completion, flushing the repository after every
/// `SaveRequested` as the boundary contract requires. Returns the collected
/// signals and the terminating error, if any.
pub async fn run_to_end(
  executor: &ProcessExecutor<ProcessType, StepType>,
  repository: &InMemoryStepRepository<StepType>,
  process_id: ProcessId,
  process_type: ProcessType,
) -> (Vec<ExecutionSignal>, Option<EngineError>) {
  let mut run = match executor.execute_process(process_id, process_type, CancellationToken::new()) {
    Ok(run) => run,
    Err(error) => return (vec![], Some(error)),
  };
  let mut signals = Vec::new();
  while let Some(item) = run.next().await {
    match item {
      Ok(signal) => {
        if signal == ExecutionSignal::SaveRequested {
          repository.flush();
        }
        signals.push(signal);
      }
      Err(error) => return (signals, Some(error)),
    }
  }
  (signals, None)
}

/// Convenience lookup: the committed status of a step.
pub fn status_of(
  repository: &InMemoryStepRepository<StepType>,
  step_id: ProcessStepId,
) -> Option<StepStatus> {
  repository.step(step_id).map(|step| step.status)
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
