use std::sync::Arc;

use parking_lot::RwLock;

use crate::accessor::{
    Accessor, InvitationService, OrganizationService, PermissionService, RoleManagementService,
    Service,
};
use crate::context::Transaction;
use crate::error::{Error, Result};
use crate::handle::{Handle, Store};
use crate::isolation::{IntoIsolationLevel, IsolationLevel};

/// Entry point for units of work.
///
/// Owns the ambient store handle and the isolation level applied to every
/// transaction begun afterwards. Construct one at start-up and hand clones to
/// the collaborators that need it; clones share the store and the configured
/// isolation level.
///
/// # Examples
///
/// ```rust,no_run
/// use sqlx::PgPool;
/// use sqlx_unit_of_work::{Accessor, IsolationLevel, TransactionManager};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = PgPool::connect("postgres://localhost/test").await?;
/// let manager = TransactionManager::new(pool);
/// manager.set_transaction_isolation_level(IsolationLevel::Serializable)?;
///
/// let mut tx = manager.begin_transaction().await?;
/// tx.users()?
///     .execute("INSERT INTO users (name) VALUES ('alice')")
///     .await?;
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct TransactionManager<S> {
    store: S,
    isolation: Arc<RwLock<IsolationLevel>>,
}

impl<S: Store> TransactionManager<S> {
    /// Wraps the ambient store with the default isolation level.
    pub fn new(store: S) -> Self {
        Self {
            store,
            isolation: Arc::new(RwLock::new(IsolationLevel::Default)),
        }
    }

    /// Builder form of [`set_transaction_isolation_level`](Self::set_transaction_isolation_level)
    /// for start-up configuration.
    pub fn with_isolation_level(self, level: impl IntoIsolationLevel) -> Result<Self> {
        self.set_transaction_isolation_level(level)?;
        Ok(self)
    }

    /// Sets the isolation level for transactions begun after this call.
    ///
    /// Already open transactions are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidIsolationLevel`] if `level` is outside the
    /// enumeration; the configured level is left unchanged.
    pub fn set_transaction_isolation_level(&self, level: impl IntoIsolationLevel) -> Result<()> {
        let level = level.into_isolation_level()?;
        *self.isolation.write() = level;
        tracing::debug!(%level, "transaction isolation level configured");
        Ok(())
    }

    pub fn isolation_level(&self) -> IsolationLevel {
        *self.isolation.read()
    }

    /// The configured level text, empty for [`IsolationLevel::Default`].
    ///
    /// This is the text only; [`IsolationLevel::directive`] builds the full statement.
    pub fn isolation_level_text(&self) -> &'static str {
        self.isolation_level().level_text().unwrap_or("")
    }

    /// Begins a new transaction on an independent handle.
    ///
    /// A non-default isolation level is applied with
    /// `set transaction isolation level <LEVEL>` before the transaction is returned.
    ///
    /// # Errors
    ///
    /// - [`Error::BeginFailed`] if the store cannot open a transaction.
    /// - [`Error::IsolationSetFailed`] if the store rejects the isolation
    ///   directive. No rollback is issued; the handle is released and the
    ///   unit of work must be treated as failed.
    pub async fn begin_transaction(&self) -> Result<Transaction<S::Tx>> {
        let level = self.isolation_level();

        let mut handle = self.store.begin().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to begin transaction");
            Error::BeginFailed(e)
        })?;

        if let Some(directive) = level.directive() {
            if let Err(source) = handle.exec(&directive).await {
                tracing::warn!(%level, error = %source, "store rejected isolation level");
                return Err(Error::IsolationSetFailed { level, source });
            }
        }

        tracing::debug!(%level, "transaction begun");
        Ok(Transaction::new(handle, level))
    }

    /// Constructs any service implementing [`Service`] around a clone of this manager.
    pub fn service<T: Service<S>>(&self) -> T {
        T::new(self.clone())
    }

    pub fn invitation_service(&self) -> InvitationService<S> {
        self.service()
    }

    pub fn organization_service(&self) -> OrganizationService<S> {
        self.service()
    }

    pub fn permission_service(&self) -> PermissionService<S> {
        self.service()
    }

    pub fn role_management_service(&self) -> RoleManagementService<S> {
        self.service()
    }

    /// The ambient store.
    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: Store> Accessor for TransactionManager<S> {
    type Handle = S;

    fn handle(&mut self) -> Result<&mut S> {
        Ok(&mut self.store)
    }
}
