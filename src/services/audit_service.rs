// src/services/audit_service.rs

use sqlx::{Connection, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LogRepository,
    models::logs::{LogEntry, LogQuery, NewLogEntry},
};

#[derive(Clone)]
pub struct AuditService {
    repo: LogRepository,
}

impl AuditService {
    pub fn new(repo: LogRepository) -> Self {
        Self { repo }
    }

    /// Grava o log num SAVEPOINT da transação de quem chamou.
    ///
    /// Se a inserção falhar, só o savepoint é desfeito: a operação principal
    /// segue e o problema fica no tracing. O log só persiste se a transação
    /// externa fizer commit.
    pub async fn record(&self, conn: &mut PgConnection, tenant_id: Uuid, entry: NewLogEntry) {
        let result = async {
            let mut savepoint = conn.begin().await?;
            self.repo.insert(&mut *savepoint, tenant_id, &entry).await?;
            savepoint.commit().await?;
            Ok::<(), AppError>(())
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(
                tenant_id = %tenant_id,
                order_id = ?entry.order_id,
                "Falha ao gravar log de auditoria ({}): {}",
                entry.text,
                e
            );
        }
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
        self.repo.list(executor, tenant_id, query).await
    }
}
