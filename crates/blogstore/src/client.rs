//! Generic client trait the post statements run against.

use crate::error::{StoreError, StoreResult};
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;

/// Tracing target for statement events.
pub const SQL_TARGET: &str = "blogstore.sql";

/// A trait that unifies plain and pooled database clients.
///
/// The functions in [`crate::posts`] accept any `GenericClient`, so the same statement
/// code runs against a `tokio_postgres::Client` or a connection checked out of a
/// `deadpool_postgres::Pool`.
pub trait GenericClient: Send + Sync {
    /// Execute a query and return all rows.
    fn query(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send;

    /// Execute a statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<u64>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Semantics:
    /// - 0 rows: returns `Ok(None)`
    /// - 1 row: returns `Ok(Some(row))`
    /// - multiple rows: returns `Ok(Some(first_row))` (does **not** error)
    fn query_opt(
        &self,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a query and return all rows, tracing it under `tag`.
    ///
    /// The statement is logged at `debug` before it is sent; a failure is logged at
    /// `error` and then returned unchanged.
    fn query_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<Vec<Row>>> + Send {
        async move {
            trace_statement(tag, sql, params.len());
            self.query(sql, params)
                .await
                .inspect_err(|e| trace_failure(tag, e))
        }
    }

    /// Execute a query and return the first row, if any, tracing it under `tag`.
    ///
    /// Semantics match [`GenericClient::query_opt`].
    fn query_opt_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<Option<Row>>> + Send {
        async move {
            trace_statement(tag, sql, params.len());
            self.query_opt(sql, params)
                .await
                .inspect_err(|e| trace_failure(tag, e))
        }
    }

    /// Execute a statement and return the affected row count, tracing it under `tag`.
    fn execute_tagged(
        &self,
        tag: &str,
        sql: &str,
        params: &[&(dyn ToSql + Sync)],
    ) -> impl std::future::Future<Output = StoreResult<u64>> + Send {
        async move {
            trace_statement(tag, sql, params.len());
            let affected = self
                .execute(sql, params)
                .await
                .inspect_err(|e| trace_failure(tag, e))?;
            tracing::debug!(target: SQL_TARGET, tag, affected, "statement complete");
            Ok(affected)
        }
    }
}

fn trace_statement(tag: &str, sql: &str, param_count: usize) {
    tracing::debug!(target: SQL_TARGET, tag, param_count, sql = %sql);
}

fn trace_failure(tag: &str, err: &StoreError) {
    tracing::error!(
        target: SQL_TARGET,
        tag,
        sql_state = err.sql_state().unwrap_or("-"),
        error = err as &(dyn std::error::Error + 'static),
        "statement failed"
    );
}

impl GenericClient for tokio_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        Ok(tokio_postgres::Client::query(self, sql, params).await?)
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        Ok(tokio_postgres::Client::execute(self, sql, params).await?)
    }
}

// ===== deadpool-postgres support =====

impl GenericClient for deadpool_postgres::ClientWrapper {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}

impl GenericClient for deadpool_postgres::Client {
    async fn query(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<Vec<Row>> {
        // Delegate to the deref target (ClientWrapper / tokio_postgres::Client).
        GenericClient::query(&**self, sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> StoreResult<u64> {
        GenericClient::execute(&**self, sql, params).await
    }
}
