use crate::analytics::{build_report, AnalyticsReport};
use crate::budget::{self, IntegrityReport};
use crate::errors::{AppError, BudgetError};
use crate::history::{close_month as close_month_record, parse_month};
use crate::models::{
    BudgetData, CloseMonthResponse, ProcessedRecurringResponse, SuccessResponse,
    TransactionRequest, TransactionResponse,
};
use crate::recurring::process_due;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Json,
};
use chrono::Local;
use tracing::{info, warn};

pub async fn get_data(State(state): State<AppState>) -> Json<BudgetData> {
    let data = state.data.lock().await;
    Json(data.clone())
}

/// Replaces the whole record. Drift between category totals and the
/// transaction log is logged but accepted as sent.
pub async fn save_data(
    State(state): State<AppState>,
    payload: Result<Json<BudgetData>, JsonRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Json(payload) = payload?;
    let report = budget::integrity_report(&payload);
    if !report.is_consistent() {
        warn!(
            drifts = report.drifts.len(),
            orphans = report.orphaned_transactions.len(),
            "saved record has inconsistent category totals"
        );
    }

    state
        .mutate(|data| {
            *data = payload;
            Ok::<_, BudgetError>(())
        })
        .await?;
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, AppError> {
    let Json(payload) = payload?;
    let today = Local::now().date_naive();
    let transaction = state
        .mutate(|data| budget::add_transaction(data, payload, today))
        .await?;

    info!(id = transaction.id, category = %transaction.category, "added transaction");
    Ok(Json(TransactionResponse {
        success: true,
        transaction,
    }))
}

pub async fn update_transaction(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<TransactionRequest>, JsonRejection>,
) -> Result<Json<TransactionResponse>, AppError> {
    let Path(id) = id?;
    let Json(payload) = payload?;
    let transaction = state
        .mutate(|data| budget::edit_transaction(data, id, payload))
        .await?;

    info!(id, category = %transaction.category, "updated transaction");
    Ok(Json(TransactionResponse {
        success: true,
        transaction,
    }))
}

pub async fn delete_transaction(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<SuccessResponse>, AppError> {
    let Path(id) = id?;
    state
        .mutate(|data| budget::delete_transaction(data, id))
        .await?;

    info!(id, "deleted transaction");
    Ok(Json(SuccessResponse { success: true }))
}

pub async fn get_analytics(State(state): State<AppState>) -> Json<AnalyticsReport> {
    let data = state.data.lock().await;
    Json(build_report(&data))
}

pub async fn get_integrity(State(state): State<AppState>) -> Json<IntegrityReport> {
    let data = state.data.lock().await;
    Json(budget::integrity_report(&data))
}

pub async fn process_recurring(
    State(state): State<AppState>,
) -> Result<Json<ProcessedRecurringResponse>, AppError> {
    let today = Local::now().date_naive();
    let transactions = state
        .mutate(|data| Ok::<_, BudgetError>(process_due(data, today)))
        .await?;

    Ok(Json(ProcessedRecurringResponse {
        success: true,
        transactions,
    }))
}

pub async fn close_month(
    State(state): State<AppState>,
    month: Result<Path<String>, PathRejection>,
) -> Result<Json<CloseMonthResponse>, AppError> {
    let Path(month) = month?;
    let month = parse_month(&month)
        .ok_or_else(|| AppError::bad_request(format!("'{month}' is not a YYYY-MM month")))?;
    let snapshot = state
        .mutate(|data| close_month_record(data, month))
        .await?;

    Ok(Json(CloseMonthResponse {
        success: true,
        snapshot,
    }))
}
