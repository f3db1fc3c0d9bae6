// src/db/log_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::logs::{LogEntry, LogQuery, NewLogEntry},
};

const LOG_COLUMNS: &str = "id, tenant_id, text, log_type, created_by, metadata, order_id, customer_id, \
     cashier_id, pathname, route_name, currency, created_at";

#[derive(Clone, Default)]
pub struct LogRepository;

impl LogRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(&self, executor: E, tenant_id: Uuid, entry: &NewLogEntry) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO logs (tenant_id, text, log_type, created_by, metadata, order_id, customer_id,
                              cashier_id, pathname, route_name, currency)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(tenant_id)
        .bind(&entry.text)
        .bind(entry.log_type)
        .bind(entry.created_by)
        .bind(&entry.metadata)
        .bind(entry.order_id)
        .bind(entry.customer_id)
        .bind(entry.cashier_id)
        .bind(&entry.pathname)
        .bind(&entry.route_name)
        .bind(entry.currency)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn list<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        query: &LogQuery,
    ) -> Result<Vec<LogEntry>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, LogEntry>(&format!(
            r#"
            SELECT {LOG_COLUMNS} FROM logs
            WHERE tenant_id = $1
              AND ($2::uuid IS NULL OR order_id = $2)
              AND ($3::uuid IS NULL OR customer_id = $3)
              AND ($4::log_type IS NULL OR log_type = $4)
            ORDER BY created_at DESC
            LIMIT $5
            "#
        ))
        .bind(tenant_id)
        .bind(query.order_id)
        .bind(query.customer_id)
        .bind(query.log_type)
        .bind(query.effective_limit())
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
