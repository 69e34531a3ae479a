use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use rxl_ledger::ValidationReport;
use rxl_types::{Block, Payload};

use crate::error::{ServerError, ServerResult};
use crate::state::AppState;

/// A submitted supply-chain transaction.
///
/// Absent fields deserialize as empty strings so that they are reported
/// through the same missing-fields error as blank ones.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct TransactionForm {
    pub drug_id: String,
    pub action: String,
    pub manufacturer: String,
}

impl TransactionForm {
    /// Check that every field is non-blank and build the record payload.
    pub fn into_payload(self) -> ServerResult<Payload> {
        let fields = [
            ("drug_id", self.drug_id.trim()),
            ("action", self.action.trim()),
            ("manufacturer", self.manufacturer.trim()),
        ];

        let missing: Vec<&'static str> = fields
            .iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(ServerError::MissingFields { fields: missing });
        }

        Ok(Payload::record(fields))
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,
    pub message: &'static str,
    pub failure: Option<String>,
    pub report: ValidationReport,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub drug_id: String,
    pub transactions: Vec<Block>,
}

pub async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn info_handler(State(state): State<AppState>) -> Json<Value> {
    let ledger = state.ledger.lock().await;
    Json(json!({
        "name": "rxl-server",
        "version": env!("CARGO_PKG_VERSION"),
        "blocks": ledger.len(),
        "drugs": ledger.provenance().drug_count(),
        "store": ledger.store().location(),
    }))
}

/// The store write (fsync and rename for the JSON document) runs on the
/// blocking pool. The ledger lock is held across it, so writers stay
/// serialized.
pub async fn add_transaction(
    State(state): State<AppState>,
    Json(form): Json<TransactionForm>,
) -> ServerResult<(StatusCode, Json<Block>)> {
    let payload = form.into_payload()?;
    let mut ledger = state.ledger.clone().lock_owned().await;
    let block = tokio::task::spawn_blocking(move || ledger.append(payload))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok((StatusCode::CREATED, Json(block)))
}

pub async fn list_transactions(State(state): State<AppState>) -> Json<Vec<Block>> {
    Json(state.ledger.lock().await.chain().to_vec())
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(index): Path<u64>,
) -> ServerResult<Json<Block>> {
    let ledger = state.ledger.lock().await;
    ledger
        .get(index)
        .cloned()
        .map(Json)
        .ok_or(ServerError::BlockNotFound(index))
}

/// `valid` is the verdict of the full audit, genesis included, the same rule
/// `rxl verify` applies.
pub async fn verify_transactions(State(state): State<AppState>) -> Json<VerifyResponse> {
    let report = state.ledger.lock().await.audit();
    let valid = report.is_valid();
    Json(VerifyResponse {
        valid,
        message: if valid {
            "All transactions are valid"
        } else {
            "Blockchain integrity check failed!"
        },
        failure: report
            .first_failure()
            .map(|v| format!("index {}: {}", v.index, v.description)),
        report,
    })
}

pub async fn list_drugs(State(state): State<AppState>) -> Json<Vec<String>> {
    let ledger = state.ledger.lock().await;
    Json(ledger.provenance().drugs().map(str::to_string).collect())
}

pub async fn drug_history(
    State(state): State<AppState>,
    Path(drug_id): Path<String>,
) -> Json<HistoryResponse> {
    let ledger = state.ledger.lock().await;
    let transactions = ledger.history(&drug_id).into_iter().cloned().collect();
    Json(HistoryResponse {
        drug_id,
        transactions,
    })
}
