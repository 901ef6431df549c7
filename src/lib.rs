//! # sqlx-unit-of-work
//!
//! A unit-of-work transaction manager for SQLx with isolation-level control
//! and repositories bound to the right connection handle.
//!
//! ## Features
//!
//! - **Isolation Levels**: Configure `READ COMMITTED`, `REPEATABLE READ` or
//!   `SERIALIZABLE` once; every transaction begun afterwards applies it
//! - **Handle-Bound Repositories**: Repositories obtained from a transaction always
//!   run against that transaction, never the ambient pool
//! - **Explicit Lifecycle**: `commit()` and `rollback()` are each legal once; a finished
//!   transaction rejects further use with a typed error instead of touching the store
//! - **Structured Errors**: Every store failure is wrapped with its cause and classified by kind
//! - **Nested Transactions**: Support for savepoints to simulate nested transactions
//!
//! ## Quick Start
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! sqlx = { version = "0.8", features = ["postgres", "runtime-tokio"] }
//! sqlx-unit-of-work = "0.1"
//! ```
//!
//! ## Examples
//!
//! ### Manual Transaction Control
//!
//! ```rust,no_run
//! use sqlx::PgPool;
//! use sqlx_unit_of_work::{Accessor, IsolationLevel, TransactionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgres://localhost/test").await?;
//! let manager = TransactionManager::new(pool)
//!     .with_isolation_level(IsolationLevel::RepeatableRead)?;
//!
//! let mut tx = manager.begin_transaction().await?;
//!
//! tx.identities()?
//!     .execute("INSERT INTO identities (username) VALUES ('eve')")
//!     .await?;
//!
//! // Explicitly commit
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Scoped Transaction
//!
//! ```rust,no_run
//! use sqlx::PgPool;
//! use sqlx_unit_of_work::{with_transaction, Accessor, TransactionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = PgPool::connect("postgres://localhost/test").await?;
//! let manager = TransactionManager::new(pool);
//!
//! with_transaction(&manager, |tx| {
//!     Box::pin(async move {
//!         tx.roles()?
//!             .execute("INSERT INTO role (name) VALUES ('viewer')")
//!             .await?;
//!         Ok(())
//!     })
//! }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Handling Failures
//!
//! Commit failures are terminal for the transaction object; retry the whole
//! unit of work with a new transaction:
//!
//! ```rust,no_run
//! use sqlx::PgPool;
//! use sqlx_unit_of_work::{ErrorKind, IsolationLevel, TransactionManager};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # let pool = PgPool::connect("postgres://localhost/test").await?;
//! let manager = TransactionManager::new(pool);
//! manager.set_transaction_isolation_level(IsolationLevel::Serializable)?;
//!
//! let mut tx = manager.begin_transaction().await?;
//! if let Err(e) = tx.commit().await {
//!     assert_eq!(e.kind(), ErrorKind::CommitFailed);
//!     println!("serialization conflict: {:?}", e.store_error());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## How It Works
//!
//! 1. **TransactionManager**: Owns the ambient store and the configured isolation level
//! 2. **Transaction**: Owns its own transactional handle taken from `begin`
//! 3. **Accessor**: Shared repository factory both delegate to their own handle
//! 4. **Automatic Cleanup**: A transaction dropped while active is rolled back by SQLx
//!
//! ## License
//!
//! Licensed under either of Apache License, Version 2.0 or MIT license at your option.

pub mod accessor;
pub mod backend;
pub mod context;
pub mod error;
pub mod executor;
pub mod handle;
pub mod isolation;
pub mod manager;

#[cfg(feature = "anyhow")]
pub mod anyhow_compat;

pub use accessor::{Accessor, DomainService, Entity, EntityRepository, Repository, Service};
pub use context::{Transaction, TransactionState};
pub use error::{Error, ErrorKind, Result};
pub use executor::{with_nested_transaction, with_transaction};
pub use handle::{Handle, Store, TxHandle};
pub use isolation::{IntoIsolationLevel, IsolationLevel};
pub use manager::TransactionManager;

#[cfg(feature = "anyhow")]
pub use anyhow_compat::{with_nested_transaction_anyhow, with_transaction_anyhow};

/// Convenience re-exports for common use cases
pub mod prelude {
    pub use crate::accessor::Accessor;
    pub use crate::context::{Transaction, TransactionState};
    pub use crate::error::{Error, ErrorKind, Result};
    pub use crate::executor::{with_nested_transaction, with_transaction};
    pub use crate::isolation::IsolationLevel;
    pub use crate::manager::TransactionManager;
}
