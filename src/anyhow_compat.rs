use super::context::Transaction;
use super::executor::{run_nested, run_scoped};
use super::handle::{Store, TxHandle};
use super::manager::TransactionManager;
use std::future::Future;
use std::pin::Pin;

/// Executes a function within a transaction, using anyhow::Error for error handling.
///
/// This is a convenience wrapper around [`with_transaction`](crate::with_transaction)
/// that accepts closures returning `anyhow::Result<T>`. If the rollback after a
/// failed closure fails too, the rollback error is attached as context.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{with_transaction_anyhow, Accessor, TransactionManager};
///
/// # async fn example() -> anyhow::Result<()> {
/// # let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
///
/// with_transaction_anyhow(&manager, |tx| {
///     Box::pin(async move {
///         tx.external_tokens()?
///             .execute("DELETE FROM external_tokens WHERE identity_id = 1")
///             .await?;
///         Ok(())
///     })
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_transaction_anyhow<S, F, T>(
    manager: &TransactionManager<S>,
    f: F,
) -> anyhow::Result<T>
where
    S: Store,
    F: for<'a> FnOnce(
        &'a mut Transaction<S::Tx>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>,
    T: Send,
{
    run_scoped(manager, f, |e: anyhow::Error, rollback| e.context(rollback)).await
}

/// Executes a nested transaction using savepoints, with anyhow::Error for error handling.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{
///     with_nested_transaction_anyhow, with_transaction_anyhow, Accessor, TransactionManager,
/// };
///
/// # async fn example() -> anyhow::Result<()> {
/// # let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
///
/// with_transaction_anyhow(&manager, |tx| {
///     Box::pin(async move {
///         tx.resources()?
///             .execute("INSERT INTO resource (name) VALUES ('space')")
///             .await?;
///
///         with_nested_transaction_anyhow(tx, |nested| {
///             Box::pin(async move {
///                 nested.space_resources()?
///                     .execute("INSERT INTO space_resources (resource_id) VALUES (1)")
///                     .await?;
///                 Ok(())
///             })
///         }).await?;
///
///         Ok(())
///     })
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_nested_transaction_anyhow<H, F, T>(
    tx: &mut Transaction<H>,
    f: F,
) -> anyhow::Result<T>
where
    H: TxHandle,
    F: for<'a> FnOnce(
        &'a mut Transaction<H>,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<T>> + Send + 'a>>,
    T: Send,
{
    run_nested(tx, f, |e: anyhow::Error, rollback| e.context(rollback)).await
}
