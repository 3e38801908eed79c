use crate::error::Result;
use crate::store::Persister;

/// What the guard decided for a week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// No aggregate exists yet; run the pipeline.
    Proceed,
    /// An aggregate row exists; skip the run.
    AlreadySynced,
    /// Aggregates exist but the caller asked to rebuild them.
    Forced,
}

/// Existence check on `weekly_aggregate`. Any row for the week counts as
/// done, even if an earlier run stopped halfway through writing aggregates.
/// Not a lock: two concurrent runs can both pass.
pub fn check(persister: &Persister<'_>, week_key: &str, force: bool) -> Result<GuardDecision> {
    let exists = persister.has_aggregate(week_key)?;
    let decision = match (exists, force) {
        (false, _) => GuardDecision::Proceed,
        (true, false) => GuardDecision::AlreadySynced,
        (true, true) => GuardDecision::Forced,
    };
    log::info!("{week_key}: guard decision {decision:?}");
    Ok(decision)
}
