//! HTTP surface of the coordinator.
//!
//! | Endpoint | Method | Description |
//! |----------|--------|-------------|
//! | `/api/projects` | POST | Register a project |
//! | `/api/projects` | GET | List projects |
//! | `/api/projects/{id}` | GET | Project snapshot |
//! | `/api/projects/{id}/deactivate` | POST | Withdraw a project |
//! | `/api/proposals` | POST | Open a governance proposal |
//! | `/api/proposals/{id}` | GET | Lazily evaluated proposal view |
//! | `/api/donate/{id}` | POST | Prepare a contribution intent |
//! | `/api/donate/{id}/confirm` | POST | Reconcile a confirmed contribution |
//! | `/vote/{id}` | POST | Reconcile a confirmed governance vote |
//! | `/api/vote/{id}` | POST | Toggle a reputation vote |
//! | `/status` | GET | Reconciliation counters |
//!
//! Handlers are thin: parse, call into the library, map errors to
//! status codes. The wallet executes transactions client-side, so the
//! donate and vote flows meet the backend twice: once to prepare, once
//! to confirm.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use innofund_common::amount::{format_wei, Amount};
use innofund_common::config::Config;
use innofund_common::error::{ReconcileError, ValidationError};
use innofund_common::events::{ChainEvent, EventBus};
use innofund_common::fee::FeeBreakdown;
use innofund_common::receipt::{Receipt, ReceiptPayload};
use innofund_common::time::unix_now;
use innofund_common::types::{Address, HexParseError, ProjectId, ProposalId, TxHash};
use innofund_common::vote::{ReputationVote, VoteSupport};
use innofund_ledger::{
    FundingLedger, GovernanceStore, MemoryStore, Reconciler, ReputationBoard,
};

use crate::preparer::{Intent, IntentAction, IntentPreparer};

// ════════════════════════════════════════════════════════════════════════════
// APP STATE
// ════════════════════════════════════════════════════════════════════════════

/// Shared state behind every handler.
pub struct AppState {
    pub config: Config,
    pub funding: Arc<FundingLedger>,
    pub governance: Arc<GovernanceStore>,
    pub reputation: ReputationBoard,
    pub reconciler: Arc<Reconciler>,
    pub preparer: IntentPreparer,
    pub events: Arc<EventBus>,
}

impl AppState {
    /// Wire the full backend from configuration.
    pub fn from_config(config: Config) -> Result<Self, HexParseError> {
        let funding = Arc::new(FundingLedger::new());
        let governance = Arc::new(GovernanceStore::new(config.governance.clone()));
        let events = Arc::new(EventBus::new());
        let store = MemoryStore::new(funding.clone(), governance.clone());
        let reconciler = Arc::new(Reconciler::new(Arc::new(store), events.clone()));
        let preparer = IntentPreparer::from_config(&config, funding.clone(), governance.clone())?;
        Ok(Self {
            config,
            funding,
            governance,
            reputation: ReputationBoard::new(),
            reconciler,
            preparer,
            events,
        })
    }
}

/// Assemble the router over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/projects", post(create_project_handler).get(list_projects_handler))
        .route("/api/projects/:id", get(get_project_handler))
        .route("/api/projects/:id/deactivate", post(deactivate_project_handler))
        .route("/api/proposals", post(create_proposal_handler))
        .route("/api/proposals/:id", get(get_proposal_handler))
        .route("/api/donate/:id", post(prepare_donation_handler))
        .route("/api/donate/:id/confirm", post(confirm_donation_handler))
        .route("/vote/:id", post(confirm_governance_vote_handler))
        .route("/api/vote/:id", post(reputation_vote_handler))
        .route("/status", get(status_handler))
        .with_state(state)
}

// ════════════════════════════════════════════════════════════════════════════
// REQUEST TYPES
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct CreateProjectReq {
    pub creator: String,
    pub goal_amount: Amount,
    /// Unix seconds.
    pub deadline: u64,
}

#[derive(Debug, Deserialize)]
pub struct CreateProposalReq {
    pub project_id: u64,
}

#[derive(Debug, Deserialize)]
pub struct DonateReq {
    /// Decimal token amount, string or number.
    pub amount: Amount,
}

/// Confirmation body mirrors the prepare response so the client echoes
/// the fee breakdown it actually submitted.
#[derive(Debug, Deserialize)]
pub struct ConfirmDonationReq {
    pub transaction_hash: String,
    pub contributor: String,
    pub amount: Amount,
    pub platform_fees: Amount,
    pub total_amount: Amount,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmVoteReq {
    pub transaction_hash: String,
    pub voter: String,
    pub support: VoteSupport,
}

#[derive(Debug, Deserialize)]
pub struct ReputationVoteReq {
    pub user: String,
    pub vote_type: ReputationVote,
}

// ════════════════════════════════════════════════════════════════════════════
// ERROR MAPPING
// ════════════════════════════════════════════════════════════════════════════

fn validation_response(e: &ValidationError) -> (StatusCode, Json<Value>) {
    let status = match e {
        ValidationError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_REQUEST,
    };
    (status, Json(json!({"error": e.to_string()})))
}

fn reconcile_response(e: &ReconcileError) -> (StatusCode, Json<Value>) {
    let status = match e {
        ReconcileError::DuplicateVote { .. } | ReconcileError::ProposalNotVotable(_) => {
            StatusCode::CONFLICT
        }
        ReconcileError::ProjectNotFound(_) | ReconcileError::ProposalNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        // committed on-chain, mirror catching up; the retry loop owns it
        ReconcileError::Pending { .. } => StatusCode::SERVICE_UNAVAILABLE,
    };
    (
        status,
        Json(json!({"error": e.to_string(), "retrying": e.must_retry()})),
    )
}

fn bad_request(msg: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({"error": msg.to_string()})))
}

/// Validate a client-echoed fee breakdown. The preparer always hands out
/// `total = amount + fee`; a confirm body that breaks that identity is
/// rejected before it reaches the mirror.
fn checked_breakdown(
    base_amount: Amount,
    platform_fee: Amount,
    total_amount: Amount,
) -> Option<FeeBreakdown> {
    let expected = base_amount.wei().checked_add(platform_fee.wei())?;
    if expected != total_amount.wei() {
        return None;
    }
    Some(FeeBreakdown {
        base_amount,
        platform_fee,
        total_amount,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// PROJECT HANDLERS
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/projects - Register a project
pub async fn create_project_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProjectReq>,
) -> (StatusCode, Json<Value>) {
    let creator = match Address::from_hex(&payload.creator) {
        Ok(a) => a,
        Err(e) => return bad_request(e),
    };
    let id = state
        .funding
        .create_project(creator, payload.goal_amount, payload.deadline);
    state.events.publish(ChainEvent::ProjectCreated {
        project_id: id,
        creator,
        goal_amount: payload.goal_amount,
    });
    (StatusCode::CREATED, Json(json!({"project_id": id.0})))
}

/// GET /api/projects - List projects
pub async fn list_projects_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let projects = state.funding.projects();
    Json(json!(projects))
}

/// GET /api/projects/{id} - Project snapshot
pub async fn get_project_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<Value>) {
    match state.funding.project(ProjectId(id)) {
        Some(project) => {
            let val = serde_json::to_value(&project).unwrap_or_else(|_| json!({}));
            (StatusCode::OK, Json(val))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "project not found", "project_id": id})),
        ),
    }
}

/// POST /api/projects/{id}/deactivate - Withdraw a project
pub async fn deactivate_project_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<Value>) {
    match state.funding.deactivate(ProjectId(id)) {
        Ok(()) => (StatusCode::OK, Json(json!({"ok": true, "project_id": id}))),
        Err(e) => validation_response(&e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PROPOSAL HANDLERS
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/proposals - Open a governance proposal
pub async fn create_proposal_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProposalReq>,
) -> (StatusCode, Json<Value>) {
    let project = ProjectId(payload.project_id);
    if state.funding.project(project).is_none() {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "project not found", "project_id": project.0})),
        );
    }
    let id = state.governance.create_proposal(project, unix_now());
    state.events.publish(ChainEvent::ProposalCreated {
        proposal_id: id,
        project_id: project,
    });
    (StatusCode::CREATED, Json(json!({"proposal_id": id.0})))
}

/// GET /api/proposals/{id} - Lazily evaluated proposal view
pub async fn get_proposal_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<Value>) {
    match state.governance.proposal(ProposalId(id), unix_now()) {
        Some(view) => {
            let val = serde_json::to_value(&view).unwrap_or_else(|_| json!({}));
            (StatusCode::OK, Json(val))
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "proposal not found", "proposal_id": id})),
        ),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DONATION FLOW
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/donate/{id} - Prepare a contribution intent
pub async fn prepare_donation_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DonateReq>,
) -> (StatusCode, Json<Value>) {
    let raw = format_wei(payload.amount.0);
    match state
        .preparer
        .prepare_contribution(ProjectId(id), &raw, unix_now())
    {
        Ok(intent) => (StatusCode::OK, Json(intent_response(&intent))),
        Err(e) => validation_response(&e),
    }
}

/// POST /api/donate/{id}/confirm - Reconcile a confirmed contribution
pub async fn confirm_donation_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmDonationReq>,
) -> (StatusCode, Json<Value>) {
    let tx_hash = match TxHash::from_hex(&payload.transaction_hash) {
        Ok(h) => h,
        Err(e) => return bad_request(e),
    };
    let contributor = match Address::from_hex(&payload.contributor) {
        Ok(a) => a,
        Err(e) => return bad_request(e),
    };
    let fees = match checked_breakdown(payload.amount, payload.platform_fees, payload.total_amount)
    {
        Some(f) => f,
        None => return bad_request("total_amount does not equal amount plus platform_fees"),
    };
    let receipt = Receipt {
        tx_hash,
        payload: ReceiptPayload::Contribute {
            project: ProjectId(id),
            contributor,
            fees,
        },
        confirmed_at: unix_now(),
    };
    match state.reconciler.reconcile(&receipt, unix_now()) {
        Ok(result) => {
            let val = serde_json::to_value(&result).unwrap_or_else(|_| json!({}));
            (StatusCode::OK, Json(json!({"success": true, "result": val})))
        }
        Err(e) => reconcile_response(&e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VOTE HANDLERS
// ════════════════════════════════════════════════════════════════════════════

/// POST /vote/{id} - Reconcile a confirmed governance vote
pub async fn confirm_governance_vote_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ConfirmVoteReq>,
) -> (StatusCode, Json<Value>) {
    let tx_hash = match TxHash::from_hex(&payload.transaction_hash) {
        Ok(h) => h,
        Err(e) => return bad_request(e),
    };
    let voter = match Address::from_hex(&payload.voter) {
        Ok(a) => a,
        Err(e) => return bad_request(e),
    };
    let receipt = Receipt {
        tx_hash,
        payload: ReceiptPayload::CastVote {
            proposal: ProposalId(id),
            voter,
            support: payload.support,
        },
        confirmed_at: unix_now(),
    };
    match state.reconciler.reconcile(&receipt, unix_now()) {
        Ok(result) => {
            let val = serde_json::to_value(&result).unwrap_or_else(|_| json!({}));
            (StatusCode::OK, Json(json!({"success": true, "result": val})))
        }
        Err(e) => reconcile_response(&e),
    }
}

/// POST /api/vote/{id} - Toggle a reputation vote
pub async fn reputation_vote_handler(
    Path(id): Path<u64>,
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReputationVoteReq>,
) -> (StatusCode, Json<Value>) {
    let user = match Address::from_hex(&payload.user) {
        Ok(a) => a,
        Err(e) => return bad_request(e),
    };
    let summary = state
        .reputation
        .vote(ProjectId(id), user, payload.vote_type);
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "upvotes": summary.upvotes,
            "downvotes": summary.downvotes,
            "user_vote": summary.user_vote,
        })),
    )
}

// ════════════════════════════════════════════════════════════════════════════
// STATUS
// ════════════════════════════════════════════════════════════════════════════

/// GET /status - Reconciliation counters
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "reconciled": state.reconciler.reconciled_count(),
        "duplicates": state.reconciler.duplicate_count(),
        "pending": state.reconciler.pending_count(),
        "events_published": state.events.published_count(),
        "chain_id": state.config.network.chain_id,
    }))
}

// ════════════════════════════════════════════════════════════════════════════
// RESPONSE ASSEMBLY
// ════════════════════════════════════════════════════════════════════════════

/// Wire shape the wallet-side script consumes for submission.
fn intent_response(intent: &Intent) -> Value {
    let fees = match &intent.action {
        IntentAction::Contribute { fees, .. } => *fees,
        IntentAction::CastVote { .. } => FeeBreakdown {
            base_amount: Amount(0),
            platform_fee: Amount(0),
            total_amount: Amount(0),
        },
    };
    json!({
        "transaction": {
            "to": intent.call.to.to_string(),
            "data": format!("0x{}", hex::encode(&intent.call.data)),
            "value": intent.call.value.0.to_string(),
            "gas": intent.call.gas_limit,
            "chainId": intent.call.chain_id.as_hex(),
        },
        "amount": format_wei(fees.base_amount.0),
        "platform_fees": format_wei(fees.platform_fee.0),
        "total_amount": format_wei(fees.total_amount.0),
        "issued_at": intent.issued_at,
    })
}

// ════════════════════════════════════════════════════════════════════════════
// TESTS
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_breakdown_accepts_consistent_body() {
        let fees = checked_breakdown(Amount(10_000), Amount(200), Amount(10_200)).unwrap();
        assert_eq!(fees.base_amount, Amount(10_000));
        assert_eq!(fees.platform_fee, Amount(200));
        assert_eq!(fees.total_amount, Amount(10_200));
    }

    #[test]
    fn test_checked_breakdown_rejects_mismatched_total() {
        // an understated fee never reaches the mirror
        assert!(checked_breakdown(Amount(10_000), Amount(200), Amount(10_000)).is_none());
        assert!(checked_breakdown(Amount(10_000), Amount(0), Amount(10_200)).is_none());
    }

    #[test]
    fn test_checked_breakdown_rejects_overflowing_sum() {
        assert!(checked_breakdown(Amount(u128::MAX), Amount(1), Amount(u128::MAX)).is_none());
    }
}
