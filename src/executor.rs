use std::future::Future;
use std::pin::Pin;

use crate::accessor::Accessor;
use crate::context::Transaction;
use crate::error::Error;
use crate::handle::{Store, TxHandle};
use crate::manager::TransactionManager;

/// Executes a function within a transaction begun from `manager`.
///
/// - Begins a transaction at the manager's configured isolation level
/// - Executes the provided function
/// - Commits on success
/// - Rolls back on error
///
/// A failed commit is returned as [`Error::CommitFailed`]; it is not
/// followed by a rollback. If the function fails and the rollback fails too,
/// both are returned in [`Error::RollbackAfterFailure`].
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{with_transaction, Accessor, TransactionManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
///
/// with_transaction(&manager, |tx| {
///     Box::pin(async move {
///         tx.identities()?
///             .execute("INSERT INTO identities (username) VALUES ('alice')")
///             .await?;
///         tx.users()?
///             .execute("INSERT INTO users (email) VALUES ('alice@example.com')")
///             .await?;
///         Ok(())
///     })
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_transaction<S, F, T>(manager: &TransactionManager<S>, f: F) -> crate::Result<T>
where
    S: Store,
    F: for<'a> FnOnce(
        &'a mut Transaction<S::Tx>,
    ) -> Pin<Box<dyn Future<Output = crate::Result<T>> + Send + 'a>>,
    T: Send,
{
    run_scoped(manager, f, rollback_after_failure).await
}

/// Executes a nested unit of work inside `tx` using a savepoint.
///
/// Opens `SAVEPOINT sp_<depth>`; on success the savepoint is released, on
/// error the transaction is rolled back to it and the outer transaction stays
/// usable.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{
///     with_nested_transaction, with_transaction, Accessor, TransactionManager,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
///
/// with_transaction(&manager, |tx| {
///     Box::pin(async move {
///         tx.invitations()?
///             .execute("INSERT INTO invitation (identity_id) VALUES (1)")
///             .await?;
///
///         // A failed role grant only undoes the grant.
///         let _ = with_nested_transaction(tx, |nested| {
///             Box::pin(async move {
///                 nested.identity_roles()?
///                     .execute("INSERT INTO identity_role VALUES (1, 7)")
///                     .await?;
///                 Ok(())
///             })
///         }).await;
///
///         Ok(())
///     })
/// }).await?;
/// # Ok(())
/// # }
/// ```
pub async fn with_nested_transaction<H, F, T>(tx: &mut Transaction<H>, f: F) -> crate::Result<T>
where
    H: TxHandle,
    F: for<'a> FnOnce(
        &'a mut Transaction<H>,
    ) -> Pin<Box<dyn Future<Output = crate::Result<T>> + Send + 'a>>,
    T: Send,
{
    run_nested(tx, f, rollback_after_failure).await
}

fn rollback_after_failure(error: Error, rollback: Error) -> Error {
    Error::RollbackAfterFailure {
        error: Box::new(error),
        rollback: Box::new(rollback),
    }
}

/// Begin, run `f`, then commit or roll back.
///
/// `combine` merges the error of `f` with a failed rollback.
pub(crate) async fn run_scoped<S, F, T, E>(
    manager: &TransactionManager<S>,
    f: F,
    combine: fn(E, Error) -> E,
) -> Result<T, E>
where
    S: Store,
    F: for<'a> FnOnce(
        &'a mut Transaction<S::Tx>,
    ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    T: Send,
    E: From<Error> + Send,
{
    let mut tx = manager.begin_transaction().await?;

    match f(&mut tx).await {
        Ok(result) => {
            // The closure may have finished the transaction itself.
            if tx.is_active() {
                tx.commit().await?;
            }
            Ok(result)
        }
        Err(e) if !tx.is_active() => Err(e),
        Err(e) => match tx.rollback().await {
            Ok(()) => Err(e),
            Err(rollback) => Err(combine(e, rollback)),
        },
    }
}

/// Run `f` inside a savepoint, releasing it on success and rolling back to it on error.
pub(crate) async fn run_nested<H, F, T, E>(
    tx: &mut Transaction<H>,
    f: F,
    combine: fn(E, Error) -> E,
) -> Result<T, E>
where
    H: TxHandle,
    F: for<'a> FnOnce(
        &'a mut Transaction<H>,
    ) -> Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>,
    T: Send,
    E: From<Error> + Send,
{
    let savepoint = open_savepoint(tx).await?;

    let outcome = f(tx).await;
    let finished = if outcome.is_ok() {
        exec_in(tx, &format!("RELEASE SAVEPOINT {savepoint}")).await
    } else {
        exec_in(tx, &format!("ROLLBACK TO SAVEPOINT {savepoint}")).await
    };
    tx.leave_savepoint();

    match (outcome, finished) {
        (Ok(result), Ok(())) => Ok(result),
        (Ok(_), Err(e)) => Err(e.into()),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(rollback)) => Err(combine(e, rollback)),
    }
}

async fn open_savepoint<H: TxHandle>(tx: &mut Transaction<H>) -> crate::Result<String> {
    let savepoint = tx.enter_savepoint();
    if let Err(e) = exec_in(tx, &format!("SAVEPOINT {savepoint}")).await {
        tx.leave_savepoint();
        return Err(e);
    }
    tracing::debug!(%savepoint, "savepoint opened");
    Ok(savepoint)
}

async fn exec_in<H: TxHandle>(tx: &mut Transaction<H>, statement: &str) -> crate::Result<()> {
    tx.handle()?.exec(statement).await?;
    Ok(())
}
