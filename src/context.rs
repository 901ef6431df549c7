use crate::accessor::Accessor;
use crate::error::{Error, Result};
use crate::handle::TxHandle;
use crate::isolation::IsolationLevel;

/// Lifecycle state of a [`Transaction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
    /// A commit was attempted and the store did not confirm it.
    Failed,
}

/// A unit of work bound to its own transactional handle.
///
/// Created by [`TransactionManager::begin_transaction`]. Repositories obtained
/// through [`Accessor`] operate against this transaction's handle, never the
/// manager's ambient one. `commit()` and `rollback()` are each legal once;
/// afterwards the handle is cleared and every accessor, `commit()` and
/// `rollback()` fail with [`Error::AlreadyConsumed`] without reaching the store.
///
/// If dropped while active, the handle is dropped too; SQLx rolls the
/// transaction back when the connection returns to the pool.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{Accessor, TransactionManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// # let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
/// let mut tx = manager.begin_transaction().await?;
///
/// let outcome = tx.roles()?
///     .execute("UPDATE role SET name = 'admin' WHERE id = 1")
///     .await;
///
/// match outcome {
///     Ok(_) => tx.commit().await?,
///     Err(_) => tx.rollback().await?,
/// }
/// # Ok(())
/// # }
/// ```
///
/// [`TransactionManager::begin_transaction`]: crate::TransactionManager::begin_transaction
pub struct Transaction<H: TxHandle> {
    handle: Option<H>,
    state: TransactionState,
    isolation: IsolationLevel,
    savepoint_depth: usize,
}

impl<H: TxHandle> Transaction<H> {
    pub(crate) fn new(handle: H, isolation: IsolationLevel) -> Self {
        Self {
            handle: Some(handle),
            state: TransactionState::Active,
            isolation,
            savepoint_depth: 0,
        }
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Isolation level in effect when the transaction began.
    pub fn isolation_level(&self) -> IsolationLevel {
        self.isolation
    }

    /// Commits the transaction.
    ///
    /// The handle is cleared whether or not the store accepts the commit, so
    /// a failed commit is terminal; retry with a new transaction. The state
    /// reads [`TransactionState::Failed`] until the store confirms the commit,
    /// including when this future is dropped before completing.
    ///
    /// # Errors
    ///
    /// - [`Error::CommitFailed`] wrapping the store error. No rollback is issued.
    /// - [`Error::AlreadyConsumed`] if the transaction already finished.
    pub async fn commit(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(Error::AlreadyConsumed)?;
        self.state = TransactionState::Failed;

        match handle.commit().await {
            Ok(()) => {
                self.state = TransactionState::Committed;
                tracing::debug!(isolation = %self.isolation, "transaction committed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    isolation = %self.isolation,
                    error = %e,
                    "transaction commit failed"
                );
                Err(Error::CommitFailed(e))
            }
        }
    }

    /// Rolls back the transaction.
    ///
    /// Safe to call after statements inside the transaction have failed.
    ///
    /// # Errors
    ///
    /// - [`Error::RollbackFailed`] wrapping the store error; the transaction
    ///   is still rolled back from this layer's point of view.
    /// - [`Error::AlreadyConsumed`] if the transaction already finished.
    pub async fn rollback(&mut self) -> Result<()> {
        let handle = self.handle.take().ok_or(Error::AlreadyConsumed)?;
        self.state = TransactionState::RolledBack;

        match handle.rollback().await {
            Ok(()) => {
                tracing::debug!(isolation = %self.isolation, "transaction rolled back");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    isolation = %self.isolation,
                    error = %e,
                    "transaction rollback failed"
                );
                Err(Error::RollbackFailed(e))
            }
        }
    }

    /// Consumes the transaction and returns the underlying handle.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyConsumed`] if the transaction already finished.
    pub fn into_inner(mut self) -> Result<H> {
        self.handle.take().ok_or(Error::AlreadyConsumed)
    }

    pub(crate) fn enter_savepoint(&mut self) -> String {
        self.savepoint_depth += 1;
        format!("sp_{}", self.savepoint_depth)
    }

    pub(crate) fn leave_savepoint(&mut self) {
        self.savepoint_depth = self.savepoint_depth.saturating_sub(1);
    }
}

impl<H: TxHandle> Accessor for Transaction<H> {
    type Handle = H;

    fn handle(&mut self) -> Result<&mut H> {
        self.handle.as_mut().ok_or(Error::AlreadyConsumed)
    }
}

impl<H: TxHandle> Drop for Transaction<H> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            tracing::warn!(
                isolation = %self.isolation,
                "transaction dropped while active; the driver will roll it back"
            );
        }
    }
}

impl<H: TxHandle> std::fmt::Debug for Transaction<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transaction")
            .field("state", &self.state)
            .field("isolation", &self.isolation)
            .field("savepoint_depth", &self.savepoint_depth)
            .finish_non_exhaustive()
    }
}
