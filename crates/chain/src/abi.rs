//! Minimal ABI encoding for the two contract calls this backend
//! prepares. Selectors are the first four bytes of the Keccak-256 hash
//! of the canonical signature; arguments are 32-byte big-endian words.

use sha3::{Digest, Keccak256};

use innofund_common::types::{ProjectId, ProposalId};
use innofund_common::vote::VoteSupport;

/// `contribute(uint256)` on the funding contract. The contribution
/// amount rides in the transaction value, not the calldata.
#[must_use]
pub fn encode_contribute(project: ProjectId) -> Vec<u8> {
    let mut data = selector("contribute(uint256)").to_vec();
    data.extend_from_slice(&word(project.0 as u128));
    data
}

/// `castVote(uint256,uint8)` on the DAO contract.
#[must_use]
pub fn encode_cast_vote(proposal: ProposalId, support: VoteSupport) -> Vec<u8> {
    let mut data = selector("castVote(uint256,uint8)").to_vec();
    data.extend_from_slice(&word(proposal.0 as u128));
    data.extend_from_slice(&word(support.as_u8() as u128));
    data
}

fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    [digest[0], digest[1], digest[2], digest[3]]
}

fn word(v: u128) -> [u8; 32] {
    let mut out = [0u8; 32];
    out[16..].copy_from_slice(&v.to_be_bytes());
    out
}
