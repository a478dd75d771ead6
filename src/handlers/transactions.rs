//! Transaction handlers

use axum::{extract::State, http::StatusCode, Json};

use super::extract::{ValidatedJson, ValidatedQuery};
use crate::error::ApiError;
use crate::middleware::{AdminScope, UserScope};
use crate::models::{Document, Resource};
use crate::state::AppState;
use crate::transaction::{DepositRequest, ListTransactionsQuery, TransactionAttributes};

/// GET /v1/transactions
pub async fn list_transactions(
    State(state): State<AppState>,
    _admin: AdminScope,
    ValidatedQuery(query): ValidatedQuery<ListTransactionsQuery>,
) -> Result<Json<Document<Vec<Resource<TransactionAttributes>>>>, ApiError> {
    let transactions = state.transaction_service.list_transactions(&query).await?;
    let data = transactions
        .into_iter()
        .map(|t| t.into_resource(&state.base_url))
        .collect();
    Ok(Json(Document::new(data, state.url("/v1/transactions"))))
}

/// POST /v1/transactions - Deposit to the caller's balance
pub async fn deposit(
    State(state): State<AppState>,
    scope: UserScope,
    ValidatedJson(req): ValidatedJson<DepositRequest>,
) -> Result<(StatusCode, Json<Document<Resource<TransactionAttributes>>>), ApiError> {
    let deposit = state
        .transaction_service
        .deposit(scope.user_id, req)
        .await?;
    let link = state.url(&format!("/v1/transactions/{}", deposit.transaction.id));
    let resource = deposit
        .transaction
        .into_resource_with_balance(&state.base_url, Some(deposit.balance));
    Ok((StatusCode::CREATED, Json(Document::new(resource, link))))
}
