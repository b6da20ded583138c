//! Axum REST API handlers.
//!
//! Mutating endpoints drive the full pipeline (gate check, pending flag,
//! allowance/approval, simulate, submit, confirm) and answer only once the
//! transaction reached a terminal state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use launch_core::{
    is_action_enabled, is_valid_amount, to_base_units, ActionKind, FlagKey, PendingFlags, Phase,
    ProjectId, WEUSD_DECIMALS,
};

use crate::config::Config;
use crate::contracts::{Factory, Gla, Market, PresetProfile};
use crate::errors::DashboardError;
use crate::pipeline::{self, FailReason, MutationCall, PipelineError, Spending};
use crate::projects::{self, CreateProjectRequest, ProjectConfigPayload, ProjectRecord};
use crate::rpc::EvmClient;

pub struct AppState {
    pub client: EvmClient,
    pub config: Config,
    pub flags: Arc<PendingFlags>,
    /// Set while a listing refresh is in flight; disables every action gate.
    pub refreshing: AtomicBool,
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ProjectsResponse {
    pub count: usize,
    pub projects: Vec<ProjectRecord>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionResponse {
    pub tx_hash: B256,
    /// Whether an approval transaction was confirmed before the action.
    pub approved: bool,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<FailReason>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    pub amount: Option<String>,
    pub address: Option<String>,
}

fn error_body(e: &DashboardError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match e {
        DashboardError::AmountRequired
        | DashboardError::AddressRequired
        | DashboardError::InvalidAddress(_)
        | DashboardError::Amount(_) => StatusCode::BAD_REQUEST,
        DashboardError::ProjectNotFound(_) => StatusCode::NOT_FOUND,
        DashboardError::Phase(_) => StatusCode::CONFLICT,
        DashboardError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_GATEWAY,
    };
    (
        status,
        Json(ErrorResponse {
            error: e.to_string(),
            reason: None,
        }),
    )
}

fn pipeline_body(e: &PipelineError) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::BAD_GATEWAY,
        Json(ErrorResponse {
            error: e.to_string(),
            reason: Some(e.reason),
        }),
    )
}

fn conflict(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::CONFLICT,
        Json(ErrorResponse {
            error: message.into(),
            reason: None,
        }),
    )
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /projects`
///
/// Rebuilds the listing from chain state. While the refresh runs every
/// action gate reports disabled.
pub async fn get_projects(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.refreshing.store(true, Ordering::SeqCst);
    let result = projects::list_projects(
        &state.client,
        state.config.factory_address,
        state.config.page_size,
    )
    .await;
    state.refreshing.store(false, Ordering::SeqCst);

    match result {
        Ok(projects) => (
            StatusCode::OK,
            Json(ProjectsResponse {
                count: projects.len(),
                projects,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("project refresh failed: {e}");
            error_body(&e).into_response()
        }
    }
}

/// `POST /projects`
///
/// Encodes the creation form and runs it through the pipeline (no token
/// spending, so the allowance steps are skipped).
pub async fn create_project(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let (name, config) = match request.into_call() {
        Ok(parts) => parts,
        Err(e) => return error_body(&e).into_response(),
    };

    info!("creating project {name:?}");
    let call = MutationCall {
        to: state.config.factory_address,
        data: Factory::create_project_data(name, config),
    };
    match pipeline::execute(&state.client, state.config.operator_address, None, call).await {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(ActionResponse {
                tx_hash: outcome.tx_hash,
                approved: outcome.approved,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!("project creation failed: {e}");
            pipeline_body(&e).into_response()
        }
    }
}

/// `GET /presets/:profile`
///
/// Fetches a factory preset and renders it in the form shape, GLA amounts
/// as decimal strings, so the client can prefill and edit it.
pub async fn get_preset(
    State(state): State<Arc<AppState>>,
    Path(profile): Path<String>,
) -> impl IntoResponse {
    let Some(profile) = PresetProfile::parse(&profile) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown preset profile: {profile}"),
                reason: None,
            }),
        )
            .into_response();
    };

    let factory = Factory {
        client: &state.client,
        address: state.config.factory_address,
    };
    let config = match factory.preset_config(profile).await {
        Ok(config) => config,
        Err(e) => return error_body(&e).into_response(),
    };
    match ProjectConfigPayload::from_config(config, WEUSD_DECIMALS) {
        Ok(payload) => (StatusCode::OK, Json(payload)).into_response(),
        Err(e) => error_body(&e).into_response(),
    }
}

/// `POST /projects/:id/actions/:action`
///
/// Validates the action's input, checks the gate against the project's
/// current phase, takes the pending flag, and runs the mutation pipeline.
pub async fn run_action(
    State(state): State<Arc<AppState>>,
    Path((id, action)): Path<(u64, String)>,
    body: Option<Json<ActionRequest>>,
) -> impl IntoResponse {
    let Some(action) = ActionKind::parse(&action) else {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("unknown action: {action}"),
                reason: None,
            }),
        )
            .into_response();
    };
    let request = body.map(|Json(b)| b).unwrap_or_default();

    match execute_action(&state, ProjectId(id), action, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(ActionFailure::Rejected(status, body)) => (status, body).into_response(),
        Err(ActionFailure::Chain(e)) => {
            warn!("{action} on project {id} failed: {e}");
            pipeline_body(&e).into_response()
        }
    }
}

enum ActionFailure {
    Rejected(StatusCode, Json<ErrorResponse>),
    Chain(PipelineError),
}

impl From<DashboardError> for ActionFailure {
    fn from(e: DashboardError) -> Self {
        let (status, body) = error_body(&e);
        ActionFailure::Rejected(status, body)
    }
}

async fn execute_action(
    state: &Arc<AppState>,
    project: ProjectId,
    action: ActionKind,
    request: ActionRequest,
) -> Result<ActionResponse, ActionFailure> {
    let record = projects::find_project(
        &state.client,
        state.config.factory_address,
        state.config.page_size,
        project.0,
    )
    .await?;

    let Some(phase) = record.phase else {
        return Err(ActionFailure::Rejected(
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("project {project} reported an unknown phase"),
                reason: None,
            }),
        ));
    };

    let input = parse_input(action, &request)?;
    let input_str = match &input {
        ActionInput::Amount { raw, .. } => Some(raw.as_str()),
        ActionInput::Address { raw, .. } => Some(raw.as_str()),
        ActionInput::None => None,
    };

    let enabled = is_action_enabled(
        action,
        phase,
        project,
        &state.flags,
        state.refreshing.load(Ordering::SeqCst),
        input_str,
    );
    if !enabled {
        let (status, body) = conflict(format!(
            "{action} is not available for project {project} in {phase}"
        ));
        return Err(ActionFailure::Rejected(status, body));
    }

    let key = FlagKey { project, action };
    let Some(_guard) = state.flags.begin(key) else {
        let (status, body) = conflict(format!("{action} already in flight for project {project}"));
        return Err(ActionFailure::Rejected(status, body));
    };

    let (spending, call) = build_call(&state.config, &record, action, input);
    info!("running {action} on project {project}");
    let outcome = pipeline::execute(&state.client, state.config.operator_address, spending, call)
        .await
        .map_err(ActionFailure::Chain)?;

    info!(
        "{action} on project {project} confirmed in {}",
        outcome.tx_hash
    );
    Ok(ActionResponse {
        tx_hash: outcome.tx_hash,
        approved: outcome.approved,
    })
}

enum ActionInput {
    None,
    Amount { raw: String, base_units: U256 },
    Address { raw: String, parsed: Address },
}

fn parse_input(action: ActionKind, request: &ActionRequest) -> Result<ActionInput, DashboardError> {
    match action.input() {
        launch_core::InputKind::None => Ok(ActionInput::None),
        launch_core::InputKind::Amount => {
            let raw = request
                .amount
                .clone()
                .ok_or(DashboardError::AmountRequired)?;
            if !is_valid_amount(&raw, WEUSD_DECIMALS) {
                return Err(launch_core::AmountError::InvalidFormat(raw).into());
            }
            let base_units = to_base_units(&raw, WEUSD_DECIMALS)?;
            Ok(ActionInput::Amount { raw, base_units })
        }
        launch_core::InputKind::Address => {
            let raw = request
                .address
                .clone()
                .ok_or(DashboardError::AddressRequired)?;
            let parsed = projects::parse_address(&raw)?;
            Ok(ActionInput::Address { raw, parsed })
        }
    }
}

/// Map an action to its spending half (which token must have approved whom)
/// and the target calldata.
fn build_call(
    config: &Config,
    record: &ProjectRecord,
    action: ActionKind,
    input: ActionInput,
) -> (Option<Spending>, MutationCall) {
    let amount = match &input {
        ActionInput::Amount { base_units, .. } => *base_units,
        _ => U256::ZERO,
    };

    match action {
        ActionKind::AddWhitelist => {
            let users = match input {
                ActionInput::Address { parsed, .. } => vec![parsed],
                _ => Vec::new(),
            };
            (
                None,
                MutationCall {
                    to: record.gla_contract,
                    data: Gla::add_whitelist_data(users),
                },
            )
        }
        ActionKind::WhitelistBuy => (
            Some(Spending {
                token: config.weusd_address,
                spender: record.gla_contract,
                amount,
            }),
            MutationCall {
                to: record.gla_contract,
                data: Gla::whitelist_buy_data(amount),
            },
        ),
        ActionKind::PublicOfferingBuy => (
            Some(Spending {
                token: config.weusd_address,
                spender: record.gla_contract,
                amount,
            }),
            MutationCall {
                to: record.gla_contract,
                data: Gla::public_offering_buy_data(amount),
            },
        ),
        ActionKind::Initialize => (
            None,
            MutationCall {
                to: record.gla_contract,
                data: Gla::initialize_data(),
            },
        ),
        ActionKind::Withdraw => (
            None,
            MutationCall {
                to: record.gla_contract,
                data: Gla::withdraw_data(),
            },
        ),
        ActionKind::Claim => (
            None,
            MutationCall {
                to: record.gla_contract,
                data: Gla::claim_data(),
            },
        ),
        ActionKind::Buy => (
            Some(Spending {
                token: config.weusd_address,
                spender: record.market_contract,
                amount,
            }),
            MutationCall {
                to: record.market_contract,
                data: Market::buy_data(record.rwa_token, amount),
            },
        ),
        // Selling moves the RWA token, so the market needs approval on it.
        ActionKind::Sell => (
            Some(Spending {
                token: record.rwa_token,
                spender: record.market_contract,
                amount,
            }),
            MutationCall {
                to: record.market_contract,
                data: Market::sell_data(record.rwa_token, amount),
            },
        ),
    }
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
