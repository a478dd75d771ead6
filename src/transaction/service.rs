//! Transaction service layer - ledger reads and deposits

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::model::{
    Deposit, DepositRequest, ListTransactionsQuery, Transaction, TransactionType,
    TRANSACTION_COLUMNS,
};
use crate::error::{ApiError, ApiResult};
use crate::models::{push_order_and_page, push_time_range};

const DEFAULT_PAGE_SIZE: i64 = 1000;

#[derive(Clone)]
pub struct TransactionService {
    db_pool: PgPool,
}

impl TransactionService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_transactions(
        &self,
        query: &ListTransactionsQuery,
    ) -> ApiResult<Vec<Transaction>> {
        let transactions = build_list_query(query)
            .build_query_as::<Transaction>()
            .fetch_all(&self.db_pool)
            .await?;
        Ok(transactions)
    }

    /// Credit a user's balance and record the deposit atomically
    pub async fn deposit(&self, user_id: i64, request: DepositRequest) -> ApiResult<Deposit> {
        let mut tx = self.db_pool.begin().await?;

        let balance = sqlx::query_scalar::<_, Decimal>(
            r#"
            UPDATE users SET balance = balance + $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING balance
            "#,
        )
        .bind(user_id)
        .bind(request.amount)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("User with ID {} not found", user_id)))?;

        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            INSERT INTO transactions (user_id, amount, transaction_type, transaction_description)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            TRANSACTION_COLUMNS
        ))
        .bind(user_id)
        .bind(request.amount)
        .bind(TransactionType::Deposit.as_str())
        .bind(
            request
                .transaction_description
                .unwrap_or_else(|| "Deposit".to_string()),
        )
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            user_id,
            transaction_id = transaction.id,
            amount = %transaction.amount,
            balance = %balance,
            "Deposit recorded"
        );

        Ok(Deposit {
            transaction,
            balance,
        })
    }
}

fn build_list_query(query: &ListTransactionsQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
        "SELECT {} FROM transactions WHERE 1=1",
        TRANSACTION_COLUMNS
    ));

    if let Some(user_id) = query.user_id {
        builder.push(" AND user_id = ");
        builder.push_bind(user_id);
    }
    if let Some(gt) = query.amount_gt {
        builder.push(" AND amount > ");
        builder.push_bind(gt);
    }
    if let Some(lt) = query.amount_lt {
        builder.push(" AND amount < ");
        builder.push_bind(lt);
    }
    if let Some(kind) = query.transaction_type {
        builder.push(" AND transaction_type = ");
        builder.push_bind(kind.as_str());
    }
    push_time_range(&mut builder, "created_at", query.created_at_gt, query.created_at_lt);
    push_time_range(&mut builder, "updated_at", query.updated_at_gt, query.updated_at_lt);

    push_order_and_page(
        &mut builder,
        query.order_by.unwrap_or_default().column(),
        query.order_direction.unwrap_or_default(),
        query.limit,
        query.offset,
        DEFAULT_PAGE_SIZE,
    );

    builder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_filters() {
        let query = ListTransactionsQuery {
            user_id: Some(3),
            transaction_type: Some(TransactionType::Trip),
            amount_gt: Some(Decimal::new(10, 0)),
            ..Default::default()
        };
        let builder = build_list_query(&query);
        let sql = builder.sql();

        assert!(sql.contains(" AND user_id = $1 AND amount > $2 AND transaction_type = $3"));
        assert!(sql.ends_with("ORDER BY created_at DESC, id DESC LIMIT $4 OFFSET $5"));
    }
}
