//! Deactivation reconciler (C7): closes jobs a provider stopped listing.
//!
//! Guarded per provider kind by "at least one successful fetch this run" —
//! a kind with zero successful sources this run contributes no
//! `still_present` ids, and running deactivation against an empty set
//! would incorrectly close every job of that kind.

use std::collections::HashMap;

use sqlx::PgPool;

use crate::error::AppError;
use crate::models::job::Job;
use crate::models::source::ProviderKind;

/// Per-kind accumulator the orchestrator feeds as each source finishes.
#[derive(Debug, Default)]
pub struct ReconciliationLedger {
    still_present: HashMap<ProviderKind, Vec<String>>,
    had_success: HashMap<ProviderKind, bool>,
}

impl ReconciliationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one source's successful fetch: every posting id it returned
    /// stays alive, and that kind is now eligible for deactivation.
    pub fn record_success(&mut self, kind: ProviderKind, posting_ids: impl IntoIterator<Item = String>) {
        self.still_present.entry(kind).or_default().extend(posting_ids);
        self.had_success.insert(kind, true);
    }

    /// Close every `ACTIVE` job for each kind that had at least one
    /// successful fetch this run, against the ids that kind's sources
    /// actually returned. Returns the number of jobs closed per kind.
    pub async fn reconcile(&self, pool: &PgPool) -> Result<HashMap<ProviderKind, u64>, AppError> {
        let mut closed = HashMap::new();
        for (kind, had_success) in &self.had_success {
            if !had_success {
                continue;
            }
            let ids = self.still_present.get(kind).cloned().unwrap_or_default();
            let count = Job::deactivate_missing(pool, *kind, &ids).await?;
            closed.insert(*kind, count);
        }
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_with_no_success_is_not_eligible() {
        let ledger = ReconciliationLedger::new();
        assert!(ledger.had_success.is_empty());
    }

    #[test]
    fn record_success_accumulates_ids_across_sources() {
        let mut ledger = ReconciliationLedger::new();
        ledger.record_success(ProviderKind::Greenhouse, vec!["1".to_string(), "2".to_string()]);
        ledger.record_success(ProviderKind::Greenhouse, vec!["3".to_string()]);
        assert_eq!(ledger.still_present[&ProviderKind::Greenhouse].len(), 3);
        assert!(ledger.had_success[&ProviderKind::Greenhouse]);
    }
}
