//! Funding ledger: the backend mirror of per-project contribution state.
//!
//! The chain is the authority on raised funds; this ledger exists for
//! fast reads and fee reporting. Writes come only from the reconciler,
//! which serializes per receipt under the ledger lock, so `funds_raised`
//! is monotonically non-decreasing and the `Funded` transition fires
//! exactly once per project.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info};

use innofund_common::amount::Amount;
use innofund_common::error::{ReconcileError, ValidationError};
use innofund_common::fee::FeeBreakdown;
use innofund_common::types::{Address, ProjectId};

// ════════════════════════════════════════════════════════════════════════════
// PROJECT
// ════════════════════════════════════════════════════════════════════════════

/// Registry status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Open for contributions until the deadline.
    Active,
    /// Goal reached. Terminal for fundability, contributions already
    /// committed on-chain still reconcile.
    Funded,
    /// Withdrawn from the registry.
    Inactive,
}

/// Mirror entry for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Project {
    pub id: ProjectId,
    pub creator: Address,
    /// Immutable once created.
    pub goal_amount: Amount,
    /// Unix seconds; contributions past this are rejected at preparation.
    pub deadline: u64,
    pub funds_raised: Amount,
    pub platform_fees_collected: Amount,
    pub status: ProjectStatus,
}

/// Outcome of applying one contribution receipt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionApplied {
    pub funds_raised: Amount,
    pub platform_fees_collected: Amount,
    /// True only on the application that crossed the goal.
    pub newly_funded: bool,
    pub funded: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// FUNDING LEDGER
// ════════════════════════════════════════════════════════════════════════════

/// Thread-safe project registry and contribution mirror.
///
/// ## Guarantees
///
/// - `funds_raised` never decreases.
/// - The Active → Funded flip happens at most once, under the write lock
///   that applied the crossing contribution.
/// - Reads return snapshots; no lock is held across caller code.
pub struct FundingLedger {
    projects: RwLock<HashMap<ProjectId, Project>>,
    next_id: AtomicU64,
}

impl FundingLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a project and return its identifier.
    pub fn create_project(&self, creator: Address, goal_amount: Amount, deadline: u64) -> ProjectId {
        let id = ProjectId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let project = Project {
            id,
            creator,
            goal_amount,
            deadline,
            funds_raised: Amount(0),
            platform_fees_collected: Amount(0),
            status: ProjectStatus::Active,
        };
        self.projects.write().insert(id, project);
        info!(project = %id, goal = %goal_amount, "project registered");
        id
    }

    /// Withdraw a project from the registry. Already-confirmed
    /// contributions still reconcile; new intents are rejected.
    pub fn deactivate(&self, id: ProjectId) -> Result<(), ValidationError> {
        let mut projects = self.projects.write();
        let project = projects
            .get_mut(&id)
            .ok_or_else(|| ValidationError::NotFound(format!("project {id}")))?;
        project.status = ProjectStatus::Inactive;
        info!(project = %id, "project deactivated");
        Ok(())
    }

    /// Snapshot of one project.
    #[must_use]
    pub fn project(&self, id: ProjectId) -> Option<Project> {
        self.projects.read().get(&id).cloned()
    }

    /// List all projects, unordered.
    #[must_use]
    pub fn projects(&self) -> Vec<Project> {
        self.projects.read().values().cloned().collect()
    }

    /// Read-only fundability check used by intent preparation.
    ///
    /// Terminal rejections: inactive, already funded, past deadline.
    pub fn check_fundable(&self, id: ProjectId, now: u64) -> Result<(), ValidationError> {
        let projects = self.projects.read();
        let project = projects
            .get(&id)
            .ok_or_else(|| ValidationError::NotFound(format!("project {id}")))?;
        let reason = match project.status {
            ProjectStatus::Inactive => Some("project is inactive"),
            ProjectStatus::Funded => Some("project is already fully funded"),
            ProjectStatus::Active if now > project.deadline => Some("project deadline has passed"),
            ProjectStatus::Active => None,
        };
        match reason {
            Some(reason) => Err(ValidationError::ProjectNotFundable {
                project: id,
                reason: reason.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Apply a confirmed contribution to the mirror.
    ///
    /// Fundability is NOT rechecked here: the chain already accepted the
    /// transaction, and the mirror must follow truth even when a single
    /// contribution overshoots the goal.
    pub fn apply_contribution(
        &self,
        id: ProjectId,
        fees: &FeeBreakdown,
    ) -> Result<ContributionApplied, ReconcileError> {
        let mut projects = self.projects.write();
        let project = projects
            .get_mut(&id)
            .ok_or(ReconcileError::ProjectNotFound(id))?;

        project.funds_raised = Amount(project.funds_raised.0.saturating_add(fees.base_amount.0));
        project.platform_fees_collected =
            Amount(project.platform_fees_collected.0.saturating_add(fees.platform_fee.0));

        let newly_funded = project.status == ProjectStatus::Active
            && project.funds_raised >= project.goal_amount;
        if newly_funded {
            project.status = ProjectStatus::Funded;
            info!(project = %id, total = %project.funds_raised, "project funded");
        }
        debug!(
            project = %id,
            raised = %project.funds_raised,
            fees = %project.platform_fees_collected,
            "contribution applied"
        );

        Ok(ContributionApplied {
            funds_raised: project.funds_raised,
            platform_fees_collected: project.platform_fees_collected,
            newly_funded,
            funded: project.status == ProjectStatus::Funded,
        })
    }
}

impl Default for FundingLedger {
    fn default() -> Self {
        Self::new()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn ledger_with_project(goal: u128) -> (FundingLedger, ProjectId) {
        let ledger = FundingLedger::new();
        let id = ledger.create_project(Address([0x01; 20]), Amount(goal), NOW + 86_400);
        (ledger, id)
    }

    fn fees(base: u128, fee: u128) -> FeeBreakdown {
        FeeBreakdown {
            base_amount: Amount(base),
            platform_fee: Amount(fee),
            total_amount: Amount(base + fee),
        }
    }

    #[test]
    fn test_contribution_increments_both_fields() {
        let (ledger, id) = ledger_with_project(100);
        let applied = ledger.apply_contribution(id, &fees(10, 2)).unwrap();
        assert_eq!(applied.funds_raised, Amount(10));
        assert_eq!(applied.platform_fees_collected, Amount(2));
        assert!(!applied.funded);
    }

    #[test]
    fn test_funds_raised_monotonic() {
        let (ledger, id) = ledger_with_project(1_000);
        let mut last = 0u128;
        for _ in 0..5 {
            let applied = ledger.apply_contribution(id, &fees(7, 1)).unwrap();
            assert!(applied.funds_raised.0 > last);
            last = applied.funds_raised.0;
        }
        assert_eq!(last, 35);
    }

    #[test]
    fn test_funded_transition_fires_once() {
        let (ledger, id) = ledger_with_project(20);
        let first = ledger.apply_contribution(id, &fees(25, 0)).unwrap();
        assert!(first.newly_funded);
        // overshoot by a single contribution is allowed, later receipts
        // still apply but never re-fire the transition
        let second = ledger.apply_contribution(id, &fees(5, 0)).unwrap();
        assert!(!second.newly_funded);
        assert!(second.funded);
        assert_eq!(second.funds_raised, Amount(30));
    }

    #[test]
    fn test_funded_project_not_fundable() {
        let (ledger, id) = ledger_with_project(10);
        ledger.apply_contribution(id, &fees(10, 0)).unwrap();
        let err = ledger.check_fundable(id, NOW).unwrap_err();
        assert!(matches!(err, ValidationError::ProjectNotFundable { .. }));
    }

    #[test]
    fn test_deadline_rejection() {
        let (ledger, id) = ledger_with_project(100);
        assert!(ledger.check_fundable(id, NOW).is_ok());
        let err = ledger.check_fundable(id, NOW + 200_000).unwrap_err();
        assert!(matches!(err, ValidationError::ProjectNotFundable { .. }));
    }

    #[test]
    fn test_deactivated_project_rejected() {
        let (ledger, id) = ledger_with_project(100);
        ledger.deactivate(id).unwrap();
        let err = ledger.check_fundable(id, NOW).unwrap_err();
        assert!(matches!(err, ValidationError::ProjectNotFundable { .. }));
    }

    #[test]
    fn test_unknown_project() {
        let ledger = FundingLedger::new();
        assert!(matches!(
            ledger.check_fundable(ProjectId(99), NOW),
            Err(ValidationError::NotFound(_))
        ));
        assert_eq!(
            ledger.apply_contribution(ProjectId(99), &fees(1, 0)),
            Err(ReconcileError::ProjectNotFound(ProjectId(99)))
        );
    }
}
