// demos/onboarding/src/main.rs

// Declare modules for the demo worker
mod checklist;

use std::sync::Arc;

use tracing::{info, Level};
use tracing_subscriber::fmt::format::FmtSpan;

use passage::{
  CancellationToken, ExecutionSignal, InMemoryStepRepository, ProcessExecutor, ProcessId,
  ProcessStepRepository, ProcessTypeExecutor,
};

use crate::checklist::{ChecklistPlugin, ChecklistStep, OnboardingProcessType};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialize tracing subscriber for logging
  tracing_subscriber::fmt()
    .with_max_level(Level::INFO) // Default level
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env()) // Allow RUST_LOG override
    .with_span_events(FmtSpan::CLOSE) // Log when spans close, showing duration
    .init();

  info!("Starting onboarding checklist worker...");

  let repository = Arc::new(InMemoryStepRepository::<ChecklistStep>::new());
  let executor = ProcessExecutor::new(
    [Arc::new(ChecklistPlugin::new()) as Arc<dyn ProcessTypeExecutor<OnboardingProcessType, ChecklistStep>>],
    repository.clone() as Arc<dyn ProcessStepRepository<ChecklistStep>>,
  );

  let process_id = ProcessId::new();
  info!(%process_id, "picked up checklist process");

  // First pass: seeds verification and drives the checklist to activation.
  drive_pass(&executor, &repository, process_id).await?;
  // Second pass: everything is terminal already, so the run is a no-op.
  // Running it anyway shows that a completed process is safe to re-enter.
  drive_pass(&executor, &repository, process_id).await?;

  info!("final step records:");
  for step in repository.steps_for_process(process_id) {
    info!(
      step_type = ?step.step_type,
      status = %step.status,
      message = step.message.as_deref().unwrap_or("-"),
      "  step"
    );
  }
  Ok(())
}

/// Drives one pass over the process, honoring the boundary contract: flush
/// on `SaveRequested`, take the coordination lock on `LockRequested`.
async fn drive_pass(
  executor: &ProcessExecutor<OnboardingProcessType, ChecklistStep>,
  repository: &InMemoryStepRepository<ChecklistStep>,
  process_id: ProcessId,
) -> anyhow::Result<()> {
  let mut run = executor.execute_process(
    process_id,
    OnboardingProcessType::ApplicationChecklist,
    CancellationToken::new(),
  )?;

  // Stands in for a checklist lease in a shared store.
  let mut lock_held = false;
  while let Some(signal) = run.next().await {
    match signal? {
      ExecutionSignal::Unmodified => {}
      ExecutionSignal::SaveRequested => {
        let applied = repository.flush();
        info!(applied, "flushed staged changes");
        if lock_held {
          lock_held = false;
          info!("released coordination lock");
        }
      }
      ExecutionSignal::LockRequested => {
        lock_held = true;
        info!("acquired coordination lock");
      }
    }
  }
  if repository.staged_len() > 0 {
    let discarded = repository.discard_staged();
    info!(discarded, "discarded staged changes from aborted pass");
  }
  Ok(())
}
