// demos/onboarding/src/checklist.rs

//! The application-checklist plugin: a small company-onboarding workflow
//! driven through the engine. Verification runs first; on success it fans
//! out wallet and business-partner provisioning, and activation closes the
//! checklist once both are through.

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{info, warn};

use passage::{
  CancellationToken, ExecutionError, InitializationResult, ProcessId, ProcessTypeExecutor,
  StepExecutionResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OnboardingProcessType {
  ApplicationChecklist,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChecklistStep {
  VerifyRegistration,
  CreateBusinessPartner,
  CreateIdentityWallet,
  ActivateApplication,
}

/// Simulated downstream state for one checklist run. The real system keeps
/// this in the registration database; the demo worker drives one process at
/// a time, so plain flags are enough.
#[derive(Default)]
struct ChecklistState {
  verified: bool,
  business_partner_assigned: bool,
  wallet_created: bool,
}

pub struct ChecklistPlugin {
  state: Mutex<ChecklistState>,
}

impl ChecklistPlugin {
  pub fn new() -> Self {
    ChecklistPlugin {
      state: Mutex::new(ChecklistState::default()),
    }
  }
}

#[async_trait]
impl ProcessTypeExecutor<OnboardingProcessType, ChecklistStep> for ChecklistPlugin {
  fn process_type_id(&self) -> OnboardingProcessType {
    OnboardingProcessType::ApplicationChecklist
  }

  fn is_executable_step_type_id(&self, _step_type: ChecklistStep) -> bool {
    true
  }

  fn is_lock_requested(&self, step_type: ChecklistStep) -> bool {
    // Partner provisioning talks to a shared registry and must not run
    // concurrently with another worker touching the same directory.
    matches!(step_type, ChecklistStep::CreateBusinessPartner)
  }

  async fn initialize_process(
    &self,
    process_id: ProcessId,
    existing_step_types: &[ChecklistStep],
  ) -> Result<InitializationResult<ChecklistStep>, ExecutionError> {
    // A checklist counts as fresh only before verification ran; a completed
    // process re-entering the worker must stay a no-op.
    if existing_step_types.is_empty() && !self.state.lock().verified {
      info!(%process_id, "fresh checklist, seeding verification");
      return Ok(InitializationResult::new(
        false,
        Some(vec![ChecklistStep::VerifyRegistration]),
      ));
    }
    Ok(InitializationResult::unchanged())
  }

  async fn execute_process_step(
    &self,
    step_type: ChecklistStep,
    _process_step_types: &[ChecklistStep],
    cancellation: CancellationToken,
  ) -> Result<StepExecutionResult<ChecklistStep>, ExecutionError> {
    if cancellation.is_cancelled() {
      return Err(ExecutionError::fatal(anyhow::anyhow!(
        "worker shutdown requested"
      )));
    }

    // All downstream calls are simulated against the shared state flags.
    let mut state = self.state.lock();
    match step_type {
      ChecklistStep::VerifyRegistration => {
        state.verified = true;
        info!("registration data verified");
        Ok(
          StepExecutionResult::done().with_schedule(vec![
            ChecklistStep::CreateBusinessPartner,
            ChecklistStep::CreateIdentityWallet,
          ]),
        )
      }
      ChecklistStep::CreateBusinessPartner => {
        state.business_partner_assigned = true;
        info!("business partner number assigned");
        Ok(StepExecutionResult::done().with_schedule(vec![ChecklistStep::ActivateApplication]))
      }
      ChecklistStep::CreateIdentityWallet => {
        state.wallet_created = true;
        info!("identity wallet created");
        Ok(StepExecutionResult::done())
      }
      ChecklistStep::ActivateApplication => {
        if !(state.verified && state.business_partner_assigned && state.wallet_created) {
          warn!("activation attempted before provisioning finished, retrying next pass");
          return Ok(StepExecutionResult::pending());
        }
        info!("application activated");
        Ok(StepExecutionResult::done().with_message("checklist complete"))
      }
    }
  }
}
