//! SQLx implementations of the handle contracts.
//!
//! Pools act as the ambient [`Store`]; `sqlx::Transaction<'static, DB>` is the
//! transactional handle. An unfinished `sqlx::Transaction` that is dropped is
//! rolled back by SQLx when its connection returns to the pool.

#[cfg(any(feature = "postgres", feature = "mysql"))]
use crate::handle::{Handle, Store, TxHandle};
#[cfg(any(feature = "postgres", feature = "mysql"))]
use async_trait::async_trait;
#[cfg(any(feature = "postgres", feature = "mysql"))]
use std::ops::DerefMut;

#[cfg(feature = "postgres")]
mod postgres {
    use super::*;
    use sqlx::{PgPool, Postgres};

    #[async_trait]
    impl Handle for PgPool {
        async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
            let pool: &PgPool = self;
            let result = sqlx::query(statement).execute(pool).await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl Store for PgPool {
        type Tx = sqlx::Transaction<'static, Postgres>;

        async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
            PgPool::begin(self).await
        }
    }

    #[async_trait]
    impl Handle for sqlx::Transaction<'static, Postgres> {
        async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
            let result = sqlx::query(statement).execute(self.deref_mut()).await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl TxHandle for sqlx::Transaction<'static, Postgres> {
        async fn commit(self) -> Result<(), sqlx::Error> {
            sqlx::Transaction::commit(self).await
        }

        async fn rollback(self) -> Result<(), sqlx::Error> {
            sqlx::Transaction::rollback(self).await
        }
    }
}

#[cfg(feature = "mysql")]
mod mysql {
    use super::*;
    use sqlx::{MySql, MySqlPool};

    #[async_trait]
    impl Handle for MySqlPool {
        async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
            let pool: &MySqlPool = self;
            let result = sqlx::query(statement).execute(pool).await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl Store for MySqlPool {
        type Tx = sqlx::Transaction<'static, MySql>;

        async fn begin(&self) -> Result<Self::Tx, sqlx::Error> {
            MySqlPool::begin(self).await
        }
    }

    // MySQL rejects `set transaction isolation level` once a transaction is
    // in progress, so non-default levels surface as `IsolationSetFailed`.
    #[async_trait]
    impl Handle for sqlx::Transaction<'static, MySql> {
        async fn exec(&mut self, statement: &str) -> Result<u64, sqlx::Error> {
            let result = sqlx::query(statement).execute(self.deref_mut()).await?;
            Ok(result.rows_affected())
        }
    }

    #[async_trait]
    impl TxHandle for sqlx::Transaction<'static, MySql> {
        async fn commit(self) -> Result<(), sqlx::Error> {
            sqlx::Transaction::commit(self).await
        }

        async fn rollback(self) -> Result<(), sqlx::Error> {
            sqlx::Transaction::rollback(self).await
        }
    }
}
