//! Per-project reputation voting.
//!
//! Lightweight up/down signal, distinct from governance voting: here a
//! repeated identical vote clears the prior one and an opposite vote
//! switches it. One live vote per (project, user) at any time.

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::debug;

use innofund_common::types::{Address, ProjectId};
use innofund_common::vote::ReputationVote;

/// Current reputation standing of one project, from one user's view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReputationSummary {
    pub upvotes: u64,
    pub downvotes: u64,
    /// The asking user's live vote, if any.
    pub user_vote: Option<ReputationVote>,
}

/// Thread-safe reputation board.
pub struct ReputationBoard {
    votes: RwLock<HashMap<ProjectId, HashMap<Address, ReputationVote>>>,
}

impl ReputationBoard {
    #[must_use]
    pub fn new() -> Self {
        Self {
            votes: RwLock::new(HashMap::new()),
        }
    }

    /// Toggle `user`'s vote on `project` and return the new standing.
    pub fn vote(
        &self,
        project: ProjectId,
        user: Address,
        vote: ReputationVote,
    ) -> ReputationSummary {
        let mut votes = self.votes.write();
        let board = votes.entry(project).or_default();
        match board.get(&user) {
            Some(prior) if *prior == vote => {
                board.remove(&user);
                debug!(project = %project, user = %user, "reputation vote cleared");
            }
            _ => {
                board.insert(user, vote);
                debug!(project = %project, user = %user, ?vote, "reputation vote recorded");
            }
        }
        Self::summarize(board, &user)
    }

    /// Read the standing without mutating it.
    #[must_use]
    pub fn summary(&self, project: ProjectId, user: &Address) -> ReputationSummary {
        let votes = self.votes.read();
        match votes.get(&project) {
            Some(board) => Self::summarize(board, user),
            None => ReputationSummary {
                upvotes: 0,
                downvotes: 0,
                user_vote: None,
            },
        }
    }

    fn summarize(board: &HashMap<Address, ReputationVote>, user: &Address) -> ReputationSummary {
        let upvotes = board
            .values()
            .filter(|v| **v == ReputationVote::Upvote)
            .count() as u64;
        ReputationSummary {
            upvotes,
            downvotes: board.len() as u64 - upvotes,
            user_vote: board.get(user).copied(),
        }
    }
}

impl Default for ReputationBoard {
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

    fn user(n: u8) -> Address {
        Address([n; 20])
    }

    #[test]
    fn test_first_vote_counts() {
        let board = ReputationBoard::new();
        let s = board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        assert_eq!(s.upvotes, 1);
        assert_eq!(s.downvotes, 0);
        assert_eq!(s.user_vote, Some(ReputationVote::Upvote));
    }

    #[test]
    fn test_same_vote_toggles_off() {
        let board = ReputationBoard::new();
        board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        let s = board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        assert_eq!(s.upvotes, 0);
        assert_eq!(s.user_vote, None);
    }

    #[test]
    fn test_opposite_vote_switches() {
        let board = ReputationBoard::new();
        board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        let s = board.vote(ProjectId(1), user(1), ReputationVote::Downvote);
        assert_eq!(s.upvotes, 0);
        assert_eq!(s.downvotes, 1);
        assert_eq!(s.user_vote, Some(ReputationVote::Downvote));
    }

    #[test]
    fn test_votes_are_per_project() {
        let board = ReputationBoard::new();
        board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        let s = board.summary(ProjectId(2), &user(1));
        assert_eq!(s.upvotes, 0);
        assert_eq!(s.user_vote, None);
    }

    #[test]
    fn test_counts_across_users() {
        let board = ReputationBoard::new();
        board.vote(ProjectId(1), user(1), ReputationVote::Upvote);
        board.vote(ProjectId(1), user(2), ReputationVote::Upvote);
        board.vote(ProjectId(1), user(3), ReputationVote::Downvote);
        let s = board.summary(ProjectId(1), &user(9));
        assert_eq!((s.upvotes, s.downvotes, s.user_vote), (2, 1, None));
    }
}
