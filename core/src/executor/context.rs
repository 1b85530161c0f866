// passage/src/executor/context.rs

//! Per-invocation bookkeeping for one pass over a process: the pending step
//! records grouped by step type, the work-list of executable groups, and the
//! outcome-application helpers that stage mutations through the repository.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{event, Level};

use crate::plugin::StepTypeKey;
use crate::process::{ProcessId, ProcessStepId, StepStatus};
use crate::repository::ProcessStepRepository;

pub(crate) struct ProcessContext<S: StepTypeKey> {
  process_id: ProcessId,
  /// Pending step ids grouped by step type. Within a group, load order is
  /// preserved; the first entry is the authoritative instance. A finalized
  /// group leaves the map, which is what enforces the write-once invariant.
  steps: BTreeMap<S, Vec<ProcessStepId>>,
  /// Executable step types awaiting processing this pass, ascending.
  worklist: BTreeSet<S>,
}

impl<S: StepTypeKey> ProcessContext<S> {
  pub(crate) fn new(process_id: ProcessId) -> Self {
    ProcessContext {
      process_id,
      steps: BTreeMap::new(),
      worklist: BTreeSet::new(),
    }
  }

  pub(crate) fn load_steps(
    &mut self,
    step_data: Vec<(ProcessStepId, S)>,
    is_executable: impl Fn(S) -> bool,
  ) {
    for (step_id, step_type) in step_data {
      self.steps.entry(step_type).or_default().push(step_id);
    }
    self.worklist = self
      .steps
      .keys()
      .copied()
      .filter(|&step_type| is_executable(step_type))
      .collect();
  }

  /// The distinct step types currently pending, ascending.
  pub(crate) fn step_type_ids(&self) -> Vec<S> {
    self.steps.keys().copied().collect()
  }

  /// Pops the smallest unprocessed executable step type.
  pub(crate) fn next_executable(&mut self) -> Option<S> {
    self.worklist.pop_first()
  }

  /// Applies the authoritative result status to a group. A terminal status
  /// finalizes the group: the authoritative instance takes `status` (and the
  /// message), every other co-type instance becomes `Duplicate`, and the type
  /// leaves the pending set. A `Todo` continuation rewrites nothing.
  pub(crate) fn apply_status(
    &mut self,
    repository: &dyn ProcessStepRepository<S>,
    step_type: S,
    status: StepStatus,
    message: Option<String>,
  ) -> bool {
    if !status.is_terminal() {
      return false;
    }
    let Some(step_ids) = self.steps.remove(&step_type) else {
      return false;
    };
    let mut ids = step_ids.into_iter();
    let Some(authoritative) = ids.next() else {
      return false;
    };
    event!(Level::DEBUG, ?step_type, %status, step_id = %authoritative, "finalizing step group");
    stage_finalize(repository, authoritative, status, message);
    for duplicate in ids {
      stage_finalize(repository, duplicate, StepStatus::Duplicate, None);
    }
    true
  }

  /// Records a recoverable failure against the authoritative instance only.
  /// Co-type duplicates stay pending: the failure is attributed to the
  /// attempt, not to the group.
  pub(crate) fn record_failure(
    &mut self,
    repository: &dyn ProcessStepRepository<S>,
    step_type: S,
    message: String,
  ) -> bool {
    let Some(step_ids) = self.steps.get_mut(&step_type) else {
      return false;
    };
    if step_ids.is_empty() {
      self.steps.remove(&step_type);
      return false;
    }
    let authoritative = step_ids.remove(0);
    if step_ids.is_empty() {
      self.steps.remove(&step_type);
    }
    stage_finalize(repository, authoritative, StepStatus::Failed, Some(message));
    true
  }

  /// Marks every pending step of the listed types `Skipped` and removes the
  /// types from the remaining work-list.
  pub(crate) fn skip_step_types(
    &mut self,
    repository: &dyn ProcessStepRepository<S>,
    step_types: &[S],
  ) -> bool {
    let mut modified = false;
    for &step_type in step_types {
      let Some(step_ids) = self.steps.remove(&step_type) else {
        continue;
      };
      self.worklist.remove(&step_type);
      event!(Level::DEBUG, ?step_type, count = step_ids.len(), "skipping pending steps");
      for step_id in step_ids {
        stage_finalize(repository, step_id, StepStatus::Skipped, None);
        modified = true;
      }
    }
    modified
  }

  /// Stages one fresh `Todo` step per listed type that has no pending step
  /// yet, and appends executable ones to the work-list so they are processed
  /// later in the same pass.
  pub(crate) fn schedule_step_types(
    &mut self,
    repository: &dyn ProcessStepRepository<S>,
    is_executable: impl Fn(S) -> bool,
    step_types: &[S],
  ) -> bool {
    let mut new_step_types: Vec<S> = Vec::new();
    for &step_type in step_types {
      // A type with a pending step already covers the request.
      if self.steps.contains_key(&step_type) || new_step_types.contains(&step_type) {
        continue;
      }
      new_step_types.push(step_type);
    }
    if new_step_types.is_empty() {
      return false;
    }
    let created = repository.create_step_range(
      new_step_types
        .iter()
        .map(|&step_type| (step_type, StepStatus::Todo, self.process_id))
        .collect(),
    );
    for step in &created {
      self.steps.entry(step.step_type).or_default().push(step.id);
      if is_executable(step.step_type) {
        self.worklist.insert(step.step_type);
      }
    }
    event!(Level::DEBUG, count = created.len(), "scheduled new steps");
    true
  }
}

fn stage_finalize<S: StepTypeKey>(
  repository: &dyn ProcessStepRepository<S>,
  step_id: ProcessStepId,
  status: StepStatus,
  message: Option<String>,
) {
  repository.attach_and_modify_step(
    step_id,
    Box::new(move |mut step| {
      step.finalize(status, message);
      step
    }),
  );
}
