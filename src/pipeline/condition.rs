use tracing::warn;

use crate::protocol::BatchCond;

/// What happened to an earlier step of the same batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed,
    Skipped,
}

/// Decide whether a batch step runs, given the outcomes of the steps before it.
///
/// Step indexes are positions within the batch. A reference to a step that has not run yet,
/// does not exist, or was skipped satisfies neither `ok` nor `error`. Every branch of
/// `and`/`or` is evaluated. There is no transaction mode, so `is_autocommit` always holds.
#[must_use]
pub fn evaluate(cond: &BatchCond, outcomes: &[StepOutcome]) -> bool {
    match cond {
        BatchCond::Ok { step } => outcomes.get(*step) == Some(&StepOutcome::Succeeded),
        BatchCond::Error { step } => outcomes.get(*step) == Some(&StepOutcome::Failed),
        BatchCond::Not { cond } => !evaluate(cond, outcomes),
        BatchCond::And { conds } => conds
            .iter()
            .fold(true, |all, cond| evaluate(cond, outcomes) & all),
        BatchCond::Or { conds } => conds
            .iter()
            .fold(false, |any, cond| evaluate(cond, outcomes) | any),
        BatchCond::IsAutocommit => true,
        BatchCond::Unknown => {
            warn!("unrecognized batch condition; running the step");
            true
        }
    }
}
