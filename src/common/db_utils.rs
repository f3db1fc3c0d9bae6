use std::time::Duration;

use sqlx::{pool::PoolConnection, postgres::PgPoolOptions, PgConnection, Postgres};

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::TenantContext;

const SET_RLS_SQL: &str =
    "SELECT set_config('app.tenant_id', $1, false), set_config('app.user_id', $2, false)";

const CLEAR_RLS_SQL: &str =
    "SELECT set_config('app.tenant_id', '', false), set_config('app.user_id', '', false)";

/// Pool da aplicação. As variáveis RLS têm escopo de sessão, então toda
/// conexão devolvida à pool é limpa; se a limpeza falhar, ela é descartada.
pub(crate) fn pool_options(max_connections: u32, acquire_timeout: Duration) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(acquire_timeout)
        .after_release(|conn, _meta| Box::pin(async move { Ok(clear_rls_settings(conn).await.is_ok()) }))
}

pub(crate) async fn clear_rls_settings(conn: &mut PgConnection) -> Result<(), sqlx::Error> {
    sqlx::query(CLEAR_RLS_SQL).execute(conn).await?;
    Ok(())
}

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e define as variáveis RLS da requisição.
/// Essa conexão é o handle do tenant: os services a recebem explicitamente.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    tenant_ctx: &TenantContext,
    user: &AuthenticatedUser,
) -> Result<PoolConnection<Postgres>, AppError> {
    let mut conn = app_state.db_pool.acquire().await?;

    // Valem até a conexão voltar para a pool (ver `pool_options`)
    sqlx::query(SET_RLS_SQL)
        .bind(tenant_ctx.0.to_string())
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support;

    async fn current_tenant_setting(conn: &mut PgConnection) -> String {
        sqlx::query_scalar::<_, String>("SELECT coalesce(current_setting('app.tenant_id', true), '')")
            .fetch_one(conn)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn released_connection_does_not_keep_the_tenant() {
        let Some(url) = test_support::database_url() else {
            return;
        };
        let pool = pool_options(1, Duration::from_secs(5)).connect(&url).await.unwrap();
        let tenant_id = uuid::Uuid::new_v4().to_string();

        let mut conn = pool.acquire().await.unwrap();
        sqlx::query(SET_RLS_SQL)
            .bind(&tenant_id)
            .bind(uuid::Uuid::new_v4().to_string())
            .execute(&mut *conn)
            .await
            .unwrap();
        assert_eq!(current_tenant_setting(&mut conn).await, tenant_id);
        drop(conn);

        // Pool de uma conexão: a próxima é a mesma, já limpa
        let mut conn = pool.acquire().await.unwrap();
        assert_eq!(current_tenant_setting(&mut conn).await, "");
    }
}
