//! Governance mirror: proposals, vote tallies and the lifecycle
//! state machine.
//!
//! ## Lifecycle
//!
//! ```text
//! Pending --(voting_start reached)--> Active
//! Active  --(voting_end, for > against, quorum met)--> Succeeded
//! Active  --(voting_end, otherwise)--> Defeated
//! Pending | Active --(cancel)--> Canceled
//! Succeeded --(queue)--> Queued --(execute)--> Executed
//! Queued --(execution window elapsed)--> Expired
//! ```
//!
//! Time-driven transitions are evaluated lazily: at every read and at
//! every reconciled vote, never by a background timer. Votes are keyed
//! by (proposal, voter); a second vote from the same address is a
//! `DuplicateVote` rejection, and votability is rechecked at reconcile
//! time because the window may have closed since preparation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use innofund_common::config::GovernanceConfig;
use innofund_common::error::ReconcileError;
use innofund_common::types::{Address, ProjectId, ProposalId};
use innofund_common::vote::VoteSupport;

// ════════════════════════════════════════════════════════════════════════════
// STATES AND TALLIES
// ════════════════════════════════════════════════════════════════════════════

/// Proposal lifecycle states, Governor convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalState {
    Pending,
    Active,
    Canceled,
    Defeated,
    Succeeded,
    Queued,
    Expired,
    Executed,
}

impl ProposalState {
    /// Terminal states never transition again.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ProposalState::Canceled
                | ProposalState::Defeated
                | ProposalState::Expired
                | ProposalState::Executed
        )
    }
}

/// Vote counts per support option. One unit per voter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoteTally {
    pub for_votes: u64,
    pub against_votes: u64,
    pub abstain_votes: u64,
}

impl VoteTally {
    /// Total participation, all three options count toward quorum.
    #[must_use]
    pub fn participation(&self) -> u64 {
        self.for_votes + self.against_votes + self.abstain_votes
    }

    fn record(&mut self, support: VoteSupport) {
        match support {
            VoteSupport::Against => self.against_votes += 1,
            VoteSupport::For => self.for_votes += 1,
            VoteSupport::Abstain => self.abstain_votes += 1,
        }
    }
}

/// Read snapshot of a proposal after lazy evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProposalView {
    pub id: ProposalId,
    pub project: ProjectId,
    pub state: ProposalState,
    pub tally: VoteTally,
    pub voting_start: u64,
    pub voting_end: u64,
}

/// Outcome of one reconciled vote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteApplied {
    /// State after the post-vote evaluation; may already be closed.
    pub state: ProposalState,
    pub tally: VoteTally,
}

/// Administrative transition failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("proposal {0} not found")]
    NotFound(ProposalId),

    #[error("proposal {proposal} cannot {action} from state {state:?}")]
    Illegal {
        proposal: ProposalId,
        state: ProposalState,
        action: &'static str,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// GOVERNANCE STORE
// ════════════════════════════════════════════════════════════════════════════

struct ProposalRecord {
    id: ProposalId,
    project: ProjectId,
    state: ProposalState,
    tally: VoteTally,
    voters: HashMap<Address, VoteSupport>,
    voting_start: u64,
    voting_end: u64,
    queued_at: u64,
}

/// Thread-safe proposal store.
///
/// All vote and transition paths take the write lock for the whole
/// check-then-mutate sequence, so the one-vote-per-address invariant
/// and the lazy evaluation always observe a consistent tally.
pub struct GovernanceStore {
    proposals: RwLock<HashMap<ProposalId, ProposalRecord>>,
    config: GovernanceConfig,
    next_id: AtomicU64,
}

impl GovernanceStore {
    #[must_use]
    pub fn new(config: GovernanceConfig) -> Self {
        Self {
            proposals: RwLock::new(HashMap::new()),
            config,
            next_id: AtomicU64::new(1),
        }
    }

    /// Open a proposal for a project. Voting starts after the
    /// configured delay and runs for the configured period.
    pub fn create_proposal(&self, project: ProjectId, now: u64) -> ProposalId {
        let id = ProposalId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let voting_start = now + self.config.voting_delay_secs;
        let record = ProposalRecord {
            id,
            project,
            state: ProposalState::Pending,
            tally: VoteTally::default(),
            voters: HashMap::new(),
            voting_start,
            voting_end: voting_start + self.config.voting_period_secs,
            queued_at: 0,
        };
        self.proposals.write().insert(id, record);
        info!(proposal = %id, project = %project, "proposal created");
        id
    }

    /// Snapshot after evaluating time-driven transitions at `now`.
    #[must_use]
    pub fn proposal(&self, id: ProposalId, now: u64) -> Option<ProposalView> {
        let mut proposals = self.proposals.write();
        let record = proposals.get_mut(&id)?;
        self.evaluate(record, now);
        Some(ProposalView {
            id: record.id,
            project: record.project,
            state: record.state,
            tally: record.tally,
            voting_start: record.voting_start,
            voting_end: record.voting_end,
        })
    }

    /// Apply a reconciled vote.
    ///
    /// Votability is rechecked here even though preparation checked it:
    /// time may have advanced between preparation and confirmation. A
    /// rejected vote leaves the tally untouched.
    pub fn cast_vote(
        &self,
        id: ProposalId,
        voter: Address,
        support: VoteSupport,
        now: u64,
    ) -> Result<VoteApplied, ReconcileError> {
        let mut proposals = self.proposals.write();
        let record = proposals
            .get_mut(&id)
            .ok_or(ReconcileError::ProposalNotFound(id))?;

        self.evaluate(record, now);
        if record.state != ProposalState::Active {
            return Err(ReconcileError::ProposalNotVotable(id));
        }
        if record.voters.contains_key(&voter) {
            return Err(ReconcileError::DuplicateVote {
                proposal: id,
                voter,
            });
        }

        record.voters.insert(voter, support);
        record.tally.record(support);
        debug!(
            proposal = %id,
            for_votes = record.tally.for_votes,
            against_votes = record.tally.against_votes,
            abstain_votes = record.tally.abstain_votes,
            "vote tallied"
        );
        // the vote itself may close the window
        self.evaluate(record, now);

        Ok(VoteApplied {
            state: record.state,
            tally: record.tally,
        })
    }

    /// Administrative cancellation, allowed from Pending or Active.
    pub fn cancel(&self, id: ProposalId, now: u64) -> Result<ProposalState, TransitionError> {
        self.transition(id, now, "cancel", |state| {
            matches!(state, ProposalState::Pending | ProposalState::Active)
                .then_some(ProposalState::Canceled)
        })
    }

    /// Queue a succeeded proposal for execution. The execution window
    /// opens at `now`.
    pub fn queue(&self, id: ProposalId, now: u64) -> Result<ProposalState, TransitionError> {
        let mut proposals = self.proposals.write();
        let record = proposals
            .get_mut(&id)
            .ok_or(TransitionError::NotFound(id))?;
        self.evaluate(record, now);
        if record.state != ProposalState::Succeeded {
            return Err(TransitionError::Illegal {
                proposal: id,
                state: record.state,
                action: "queue",
            });
        }
        record.state = ProposalState::Queued;
        record.queued_at = now;
        info!(proposal = %id, "proposal queued");
        Ok(ProposalState::Queued)
    }

    /// Execute a queued proposal within its execution window.
    pub fn execute(&self, id: ProposalId, now: u64) -> Result<ProposalState, TransitionError> {
        self.transition(id, now, "execute", |state| {
            (state == ProposalState::Queued).then_some(ProposalState::Executed)
        })
    }

    fn transition(
        &self,
        id: ProposalId,
        now: u64,
        action: &'static str,
        next: impl Fn(ProposalState) -> Option<ProposalState>,
    ) -> Result<ProposalState, TransitionError> {
        let mut proposals = self.proposals.write();
        let record = proposals
            .get_mut(&id)
            .ok_or(TransitionError::NotFound(id))?;
        self.evaluate(record, now);
        match next(record.state) {
            Some(state) => {
                info!(proposal = %id, from = ?record.state, to = ?state, "proposal transition");
                record.state = state;
                Ok(state)
            }
            None => Err(TransitionError::Illegal {
                proposal: id,
                state: record.state,
                action,
            }),
        }
    }

    /// Time-driven transitions, applied in place.
    fn evaluate(&self, record: &mut ProposalRecord, now: u64) {
        match record.state {
            ProposalState::Pending if now >= record.voting_start => {
                record.state = ProposalState::Active;
                info!(proposal = %record.id, "voting opened");
                // voting may already be over as well
                self.evaluate(record, now);
            }
            ProposalState::Active if now >= record.voting_end => {
                let quorum_met = record.tally.participation() >= self.config.quorum_votes;
                let passed = record.tally.for_votes > record.tally.against_votes;
                record.state = if quorum_met && passed {
                    ProposalState::Succeeded
                } else {
                    ProposalState::Defeated
                };
                info!(proposal = %record.id, state = ?record.state, "voting closed");
            }
            ProposalState::Queued
                if now >= record.queued_at + self.config.execution_window_secs =>
            {
                record.state = ProposalState::Expired;
                info!(proposal = %record.id, "execution window elapsed");
            }
            _ => {}
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: u64 = 1_700_000_000;

    fn config() -> GovernanceConfig {
        GovernanceConfig {
            voting_delay_secs: 100,
            voting_period_secs: 1_000,
            quorum_votes: 4,
            execution_window_secs: 500,
        }
    }

    fn store_with_active_proposal() -> (GovernanceStore, ProposalId, u64) {
        let store = GovernanceStore::new(config());
        let id = store.create_proposal(ProjectId(1), NOW);
        // voting_start = NOW + 100, voting_end = NOW + 1100
        (store, id, NOW + 100)
    }

    fn voter(n: u8) -> Address {
        Address([n; 20])
    }

    #[test]
    fn test_pending_until_voting_start() {
        let (store, id, open) = store_with_active_proposal();
        assert_eq!(store.proposal(id, open - 1).unwrap().state, ProposalState::Pending);
        assert_eq!(store.proposal(id, open).unwrap().state, ProposalState::Active);
    }

    #[test]
    fn test_one_vote_per_address() {
        let (store, id, open) = store_with_active_proposal();
        store.cast_vote(id, voter(1), VoteSupport::For, open).unwrap();
        let err = store.cast_vote(id, voter(1), VoteSupport::Against, open).unwrap_err();
        assert_eq!(err, ReconcileError::DuplicateVote { proposal: id, voter: voter(1) });
        // tally untouched by the rejection
        let view = store.proposal(id, open).unwrap();
        assert_eq!(view.tally, VoteTally { for_votes: 1, against_votes: 0, abstain_votes: 0 });
    }

    #[test]
    fn test_succeeds_with_quorum_and_majority() {
        let (store, id, open) = store_with_active_proposal();
        for n in 1..=3 {
            store.cast_vote(id, voter(n), VoteSupport::For, open).unwrap();
        }
        store.cast_vote(id, voter(4), VoteSupport::Abstain, open).unwrap();
        // lazy evaluation at read time after the window closes
        let view = store.proposal(id, open + 2_000).unwrap();
        assert_eq!(view.state, ProposalState::Succeeded);
    }

    #[test]
    fn test_defeated_without_quorum() {
        let (store, id, open) = store_with_active_proposal();
        store.cast_vote(id, voter(1), VoteSupport::For, open).unwrap();
        let view = store.proposal(id, open + 2_000).unwrap();
        assert_eq!(view.state, ProposalState::Defeated);
    }

    #[test]
    fn test_tie_is_defeated() {
        let (store, id, open) = store_with_active_proposal();
        store.cast_vote(id, voter(1), VoteSupport::For, open).unwrap();
        store.cast_vote(id, voter(2), VoteSupport::For, open).unwrap();
        store.cast_vote(id, voter(3), VoteSupport::Against, open).unwrap();
        store.cast_vote(id, voter(4), VoteSupport::Against, open).unwrap();
        let view = store.proposal(id, open + 2_000).unwrap();
        assert_eq!(view.state, ProposalState::Defeated);
    }

    #[test]
    fn test_abstain_counts_toward_quorum_only() {
        let (store, id, open) = store_with_active_proposal();
        store.cast_vote(id, voter(1), VoteSupport::For, open).unwrap();
        for n in 2..=4 {
            store.cast_vote(id, voter(n), VoteSupport::Abstain, open).unwrap();
        }
        let view = store.proposal(id, open + 2_000).unwrap();
        assert_eq!(view.state, ProposalState::Succeeded);
    }

    #[test]
    fn test_vote_after_window_rejected_tally_unchanged() {
        let (store, id, open) = store_with_active_proposal();
        store.cast_vote(id, voter(1), VoteSupport::For, open).unwrap();
        let err = store
            .cast_vote(id, voter(2), VoteSupport::For, open + 2_000)
            .unwrap_err();
        assert_eq!(err, ReconcileError::ProposalNotVotable(id));
        let view = store.proposal(id, open + 2_000).unwrap();
        assert_eq!(view.tally.for_votes, 1);
    }

    #[test]
    fn test_cancel_from_pending_and_active_only() {
        let store = GovernanceStore::new(config());
        let a = store.create_proposal(ProjectId(1), NOW);
        assert_eq!(store.cancel(a, NOW).unwrap(), ProposalState::Canceled);

        let b = store.create_proposal(ProjectId(1), NOW);
        // window closed with no votes: Defeated, cancel is illegal
        let err = store.cancel(b, NOW + 5_000).unwrap_err();
        assert!(matches!(err, TransitionError::Illegal { .. }));
    }

    #[test]
    fn test_queue_execute_path() {
        let (store, id, open) = store_with_active_proposal();
        for n in 1..=4 {
            store.cast_vote(id, voter(n), VoteSupport::For, open).unwrap();
        }
        let closed = open + 2_000;
        assert_eq!(store.queue(id, closed).unwrap(), ProposalState::Queued);
        assert_eq!(store.execute(id, closed + 100).unwrap(), ProposalState::Executed);
    }

    #[test]
    fn test_queued_expires_unexecuted() {
        let (store, id, open) = store_with_active_proposal();
        for n in 1..=4 {
            store.cast_vote(id, voter(n), VoteSupport::For, open).unwrap();
        }
        let closed = open + 2_000;
        store.queue(id, closed).unwrap();
        // execution window is 500s
        let err = store.execute(id, closed + 600).unwrap_err();
        assert_eq!(
            err,
            TransitionError::Illegal { proposal: id, state: ProposalState::Expired, action: "execute" }
        );
    }

    #[test]
    fn test_closing_vote_flips_state_immediately() {
        let store = GovernanceStore::new(config());
        let id = store.create_proposal(ProjectId(1), NOW);
        let open = NOW + 100;
        for n in 1..=3 {
            store.cast_vote(id, voter(n), VoteSupport::For, open).unwrap();
        }
        // last vote lands at the final votable second; the post-vote
        // evaluation still sees now < voting_end, so it stays Active
        let last = store
            .cast_vote(id, voter(4), VoteSupport::For, NOW + 1_099)
            .unwrap();
        assert_eq!(last.state, ProposalState::Active);
        assert_eq!(store.proposal(id, NOW + 1_100).unwrap().state, ProposalState::Succeeded);
    }
}
