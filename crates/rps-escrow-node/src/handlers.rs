//! HTTP API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rps_escrow_core::{
    Address, Amount, Commitment, LedgerError, Move, Outcome, Round, RoundError, RoundEvent,
    RoundId, Salt,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::{AppState, Contract};

// ============ Errors ============

pub enum AppError {
    Round(RoundError),
    Ledger(LedgerError),
    BadRequest(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Round(err) => round_error_status(err),
            AppError::Ledger(LedgerError::Overflow(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Ledger(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

fn round_error_status(err: &RoundError) -> StatusCode {
    match err {
        RoundError::RoundDoesNotExist(_) => StatusCode::NOT_FOUND,
        RoundError::NotAParticipant { .. } | RoundError::EscrowCannotPlay { .. } => {
            StatusCode::FORBIDDEN
        }
        RoundError::CommitmentMismatch { .. } | RoundError::PotOverflow(_) => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        RoundError::TokenTransferFailed { .. } => StatusCode::PAYMENT_REQUIRED,
        RoundError::RoundAlreadyExists(_)
        | RoundError::RoundFull(_)
        | RoundError::AlreadyParticipant { .. }
        | RoundError::AwaitingOpponent(_)
        | RoundError::AlreadyCommitted { .. }
        | RoundError::CommitmentsPending(_)
        | RoundError::AlreadyRevealed { .. }
        | RoundError::RoundAlreadyResolved(_)
        | RoundError::RoundNotResolved(_) => StatusCode::CONFLICT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::Round(err) => err.to_string(),
            AppError::Ledger(err) => err.to_string(),
            AppError::BadRequest(msg) => msg,
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RoundError> for AppError {
    fn from(err: RoundError) -> Self {
        AppError::Round(err)
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err)
    }
}

fn parse_address(raw: &str) -> Result<Address, AppError> {
    raw.parse()
        .map_err(|e| AppError::BadRequest(format!("Invalid address {raw}: {e}")))
}

// ============ Request/Response types ============

#[derive(Serialize)]
pub struct ContractResponse {
    pub token: Address,
    pub escrow: Address,
    pub rounds: usize,
    /// Sum of pots still held for unresolved rounds
    pub escrowed_total: Amount,
    /// Ledger balance of the escrow account
    pub escrow_balance: Amount,
}

#[derive(Deserialize)]
pub struct MintRequest {
    pub account: Address,
    pub amount: Amount,
}

#[derive(Deserialize)]
pub struct ApproveRequest {
    pub owner: Address,
    /// Defaults to the contract's escrow account
    pub spender: Option<Address>,
    pub amount: Amount,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub address: Address,
    pub balance: Amount,
}

#[derive(Serialize)]
pub struct AllowanceResponse {
    pub owner: Address,
    pub spender: Address,
    pub allowance: Amount,
}

#[derive(Deserialize)]
pub struct CreateRoundRequest {
    pub round_id: RoundId,
    pub wager: Amount,
    pub creator: Address,
}

#[derive(Deserialize)]
pub struct JoinRequest {
    pub player: Address,
}

#[derive(Deserialize)]
pub struct CommitRequest {
    pub player: Address,
    pub commitment: Commitment,
}

#[derive(Deserialize)]
pub struct RevealRequest {
    pub player: Address,
    #[serde(rename = "move")]
    pub mv: Move,
    pub salt: Salt,
}

#[derive(Serialize)]
pub struct RoundResponse {
    pub round: Round,
    pub winner: Option<Address>,
}

impl From<Round> for RoundResponse {
    fn from(round: Round) -> Self {
        Self {
            winner: round.winner(),
            round,
        }
    }
}

/// Result of a state-changing call: the round afterwards and the events it emitted
#[derive(Serialize)]
pub struct ActionResponse {
    pub round: RoundResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    pub events: Vec<RoundEvent>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    pub round_id: Option<u64>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<RoundEvent>,
}

/// Run one contract call and collect the events it emitted.
fn transact<T>(
    contract: &mut Contract,
    call: impl FnOnce(&mut Contract) -> Result<T, RoundError>,
) -> Result<(T, Vec<RoundEvent>), AppError> {
    let before = contract.events().len();
    let value = call(contract).map_err(|err| {
        warn!("Rejected call on round {}: {}", err.round_id(), err);
        AppError::Round(err)
    })?;
    Ok((value, contract.events()[before..].to_vec()))
}

fn action(
    contract: &Contract,
    round_id: RoundId,
    outcome: Option<Outcome>,
    events: Vec<RoundEvent>,
) -> Result<Json<ActionResponse>, AppError> {
    let round = contract.lookup(round_id)?.clone();
    Ok(Json(ActionResponse {
        round: round.into(),
        outcome,
        events,
    }))
}

// ============ System handlers ============

pub async fn health() -> &'static str {
    "ok"
}

pub async fn get_contract(State(state): State<AppState>) -> Result<Json<ContractResponse>, AppError> {
    let contract = state.contract();
    Ok(Json(ContractResponse {
        token: contract.token(),
        escrow: contract.escrow(),
        rounds: contract.registry().len(),
        escrowed_total: contract.registry().escrowed_total(),
        escrow_balance: contract.escrow_balance()?,
    }))
}

pub async fn get_events(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
) -> Json<EventsResponse> {
    let contract = state.contract();
    let events = contract
        .events()
        .iter()
        .filter(|e| query.round_id.map_or(true, |id| e.round_id() == RoundId::new(id)))
        .cloned()
        .collect();
    Json(EventsResponse { events })
}

// ============ Token handlers ============

pub async fn mint(
    State(state): State<AppState>,
    Json(req): Json<MintRequest>,
) -> Result<Json<BalanceResponse>, AppError> {
    let contract = state.contract();
    let ledger = contract.ledger();
    ledger.mint(&req.account, req.amount)?;
    Ok(Json(BalanceResponse {
        address: req.account,
        balance: ledger.balance(&req.account),
    }))
}

pub async fn approve(
    State(state): State<AppState>,
    Json(req): Json<ApproveRequest>,
) -> Json<AllowanceResponse> {
    let contract = state.contract();
    let ledger = contract.ledger();
    let spender = req.spender.unwrap_or_else(|| contract.escrow());
    ledger.approve(&req.owner, &spender, req.amount);
    Json(AllowanceResponse {
        owner: req.owner,
        spender,
        allowance: ledger.allowance(&req.owner, &spender),
    })
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<Json<BalanceResponse>, AppError> {
    let address = parse_address(&address)?;
    Ok(Json(BalanceResponse {
        address,
        balance: state.contract().ledger().balance(&address),
    }))
}

// ============ Round handlers ============

pub async fn create_round(
    State(state): State<AppState>,
    Json(req): Json<CreateRoundRequest>,
) -> Result<(StatusCode, Json<ActionResponse>), AppError> {
    let mut contract = state.contract();
    let ((), events) = transact(&mut contract, |c| {
        c.create(req.round_id, req.wager, req.creator)
    })?;
    Ok((
        StatusCode::CREATED,
        action(&contract, req.round_id, None, events)?,
    ))
}

pub async fn get_round(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
) -> Result<Json<RoundResponse>, AppError> {
    let contract = state.contract();
    let round = contract.lookup(RoundId::new(round_id))?.clone();
    Ok(Json(round.into()))
}

pub async fn join_round(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let round_id = RoundId::new(round_id);
    let mut contract = state.contract();
    let ((), events) = transact(&mut contract, |c| c.join(round_id, req.player))?;
    action(&contract, round_id, None, events)
}

pub async fn commit_move(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
    Json(req): Json<CommitRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let round_id = RoundId::new(round_id);
    let mut contract = state.contract();
    let ((), events) = transact(&mut contract, |c| {
        c.submit_commitment(round_id, req.player, req.commitment)
    })?;
    action(&contract, round_id, None, events)
}

pub async fn reveal_move(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
    Json(req): Json<RevealRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    let round_id = RoundId::new(round_id);
    let mut contract = state.contract();
    let (outcome, events) = transact(&mut contract, |c| {
        c.reveal(round_id, req.player, req.mv, req.salt)
    })?;
    action(&contract, round_id, outcome, events)
}

pub async fn archive_round(
    State(state): State<AppState>,
    Path(round_id): Path<u64>,
) -> Result<Json<RoundResponse>, AppError> {
    let mut contract = state.contract();
    let (round, _) = transact(&mut contract, |c| c.archive(RoundId::new(round_id)))?;
    Ok(Json(round.into()))
}
