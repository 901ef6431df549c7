//! Connection handle contracts consumed from the store driver.
//!
//! A [`Store`] is the ambient, non-transactional handle (typically a pool).
//! [`Store::begin`] yields a [`TxHandle`] bound to one open server-side
//! transaction. Both execute statements through [`Handle::exec`].

use async_trait::async_trait;

/// A live binding to the store through which statements are executed.
#[async_trait]
pub trait Handle: Send {
    /// Executes `statement` verbatim and returns the number of rows affected.
    async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error>;
}

/// A handle bound to an open transaction.
///
/// Finishing consumes the handle, so a committed or rolled back handle
/// cannot issue further statements.
#[async_trait]
pub trait TxHandle: Handle + Sized {
    async fn commit(self) -> Result<(), sqlx::Error>;

    async fn rollback(self) -> Result<(), sqlx::Error>;
}

/// The ambient handle, able to open transactions.
///
/// Clones share the underlying connections; each [`Store::begin`] call
/// obtains an independent transactional handle.
#[async_trait]
pub trait Store: Handle + Clone + Sync {
    type Tx: TxHandle;

    async fn begin(&self) -> Result<Self::Tx, sqlx::Error>;
}
