//! Ledger transaction models and request DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError};

use crate::models::{Relationship, Resource, SortDirection};

pub const RESOURCE_TYPE: &str = "transactions";

pub const TRANSACTION_COLUMNS: &str = "id, user_id, amount, transaction_type, \
    transaction_description, trip_id, meta_data, created_at, updated_at";

/// Largest amount a `NUMERIC(10, 2)` column holds
const MAX_AMOUNT_CENTS: i64 = 99_999_999_99;

/// Kind of balance change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Trip,
    Deposit,
    Refund,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Trip => "trip",
            TransactionType::Deposit => "deposit",
            TransactionType::Refund => "refund",
        }
    }
}

/// Transaction row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub amount: Decimal,
    pub transaction_type: String,
    pub transaction_description: Option<String>,
    pub trip_id: Option<i64>,
    pub meta_data: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TransactionAttributes {
    pub amount: Decimal,
    pub transaction_type: String,
    pub transaction_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Balance right after a deposit
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_balance: Option<Decimal>,
}

impl Transaction {
    pub fn into_resource(self, base_url: &str) -> Resource<TransactionAttributes> {
        self.into_resource_with_balance(base_url, None)
    }

    pub fn into_resource_with_balance(
        self,
        base_url: &str,
        user_balance: Option<Decimal>,
    ) -> Resource<TransactionAttributes> {
        let mut resource = Resource::new(
            RESOURCE_TYPE,
            self.id,
            TransactionAttributes {
                amount: self.amount,
                transaction_type: self.transaction_type,
                transaction_description: self.transaction_description,
                created_at: self.created_at,
                updated_at: self.updated_at,
                user_balance,
            },
        )
        .with_relationship(
            "user",
            Relationship::to_one("users", self.user_id)
                .with_link(format!("{}/v1/users/{}", base_url, self.user_id)),
        );

        if let Some(trip_id) = self.trip_id {
            resource = resource.with_relationship(
                "trip",
                Relationship::to_one("trips", trip_id)
                    .with_link(format!("{}/v1/trips/{}", base_url, trip_id)),
            );
        }

        resource.with_link(format!("{}/v1/transactions/{}", base_url, self.id))
    }
}

/// Deposits must be positive and fit the currency column
pub fn validate_amount(amount: &Decimal) -> Result<(), ValidationError> {
    let message = if amount <= &Decimal::ZERO {
        Some("must be greater than 0")
    } else if amount.normalize().scale() > 2 {
        Some("must have at most two decimal places")
    } else if amount > &Decimal::new(MAX_AMOUNT_CENTS, 2) {
        Some("is too large")
    } else {
        None
    };

    match message {
        None => Ok(()),
        Some(message) => {
            let mut err = ValidationError::new("amount");
            err.message = Some(message.into());
            Err(err)
        }
    }
}

/// `POST /v1/transactions`: top up the caller's balance
#[derive(Debug, Deserialize, Validate)]
pub struct DepositRequest {
    #[validate(custom = "validate_amount")]
    pub amount: Decimal,
    #[validate(length(max = 255))]
    pub transaction_description: Option<String>,
}

/// Result of a deposit
#[derive(Debug, Clone)]
pub struct Deposit {
    pub transaction: Transaction,
    pub balance: Decimal,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionSortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Amount,
    TransactionType,
}

impl TransactionSortField {
    pub fn column(&self) -> &'static str {
        match self {
            TransactionSortField::CreatedAt => "created_at",
            TransactionSortField::UpdatedAt => "updated_at",
            TransactionSortField::Amount => "amount",
            TransactionSortField::TransactionType => "transaction_type",
        }
    }
}

/// Query parameters for listing transactions
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct ListTransactionsQuery {
    pub user_id: Option<i64>,
    pub amount_gt: Option<Decimal>,
    pub amount_lt: Option<Decimal>,
    pub transaction_type: Option<TransactionType>,
    pub created_at_gt: Option<DateTime<Utc>>,
    pub created_at_lt: Option<DateTime<Utc>>,
    pub updated_at_gt: Option<DateTime<Utc>>,
    pub updated_at_lt: Option<DateTime<Utc>>,
    pub order_by: Option<TransactionSortField>,
    pub order_direction: Option<SortDirection>,
    #[validate(range(min = 1))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}
