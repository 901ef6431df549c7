//! Repository and service construction bound to a connection handle.
//!
//! [`Accessor`] is the capability shared by [`TransactionManager`] (bound to
//! the ambient store) and [`Transaction`] (bound to its transactional handle).
//! Each accessor call constructs a fresh repository; nothing is cached, and no
//! I/O happens until the repository issues a statement.
//!
//! Entity repositories plug in through [`Repository`]. The named accessors
//! return an [`EntityRepository`], a thin handle-bound repository keyed by an
//! [`Entity`] marker, which concrete repositories can wrap.
//!
//! [`TransactionManager`]: crate::TransactionManager
//! [`Transaction`]: crate::Transaction

use std::marker::PhantomData;

use crate::error::Result;
use crate::handle::{Handle, Store};
use crate::manager::TransactionManager;

/// Construction contract for repositories bound to a handle.
pub trait Repository<'c, H: Handle + ?Sized>: Sized {
    fn bind(handle: &'c mut H) -> Self;
}

/// Construction contract for domain services.
///
/// Services receive the manager itself, so they can read through the
/// ambient handle and begin their own transactions.
pub trait Service<S: Store>: Sized {
    fn new(manager: TransactionManager<S>) -> Self;
}

/// Marker for an entity with a backing table.
pub trait Entity {
    const TABLE: &'static str;
}

macro_rules! entities {
    ($($(#[$meta:meta])* $name:ident => $table:literal,)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl Entity for $name {
                const TABLE: &'static str = $table;
            }
        )*
    };
}

entities! {
    /// User identities, one per account or linked provider.
    Identity => "identities",
    User => "users",
    OauthStateReference => "oauth_state_references",
    ExternalToken => "external_tokens",
    VerificationCode => "verification_codes",
    Invitation => "invitation",
    Resource => "resource",
    ResourceType => "resource_type",
    ResourceTypeScope => "resource_type_scope",
    Role => "role",
    /// Role assignments of identities on resources.
    IdentityRole => "identity_role",
    SpaceResource => "space_resources",
}

/// A repository for entity `E` bound to handle `H` for `'c`.
pub struct EntityRepository<'c, H: ?Sized, E> {
    handle: &'c mut H,
    _entity: PhantomData<E>,
}

impl<'c, H: Handle + ?Sized, E: Entity> EntityRepository<'c, H, E> {
    /// Table backing the entity.
    pub fn table(&self) -> &'static str {
        E::TABLE
    }

    /// Executes a statement against the bound handle.
    pub async fn execute(&mut self, statement: &str) -> Result<u64> {
        Ok(self.handle.exec(statement).await?)
    }

    /// The handle this repository operates against.
    pub fn handle(&mut self) -> &mut H {
        &mut *self.handle
    }
}

impl<'c, H: Handle + ?Sized, E: Entity> Repository<'c, H> for EntityRepository<'c, H, E> {
    fn bind(handle: &'c mut H) -> Self {
        Self {
            handle,
            _entity: PhantomData,
        }
    }
}

/// Handle-bound repository and factory methods.
///
/// Implementors only supply [`Accessor::handle`]; it fails with
/// [`Error::AlreadyConsumed`](crate::Error::AlreadyConsumed) once the
/// underlying handle is gone.
pub trait Accessor {
    type Handle: Handle;

    /// The handle repositories are bound to.
    fn handle(&mut self) -> Result<&mut Self::Handle>;

    /// Constructs any repository implementing [`Repository`].
    fn repository<'c, R>(&'c mut self) -> Result<R>
    where
        R: Repository<'c, Self::Handle>,
    {
        Ok(R::bind(self.handle()?))
    }

    fn identities(&mut self) -> Result<EntityRepository<'_, Self::Handle, Identity>> {
        self.repository()
    }

    fn users(&mut self) -> Result<EntityRepository<'_, Self::Handle, User>> {
        self.repository()
    }

    fn oauth_states(&mut self) -> Result<EntityRepository<'_, Self::Handle, OauthStateReference>> {
        self.repository()
    }

    fn external_tokens(&mut self) -> Result<EntityRepository<'_, Self::Handle, ExternalToken>> {
        self.repository()
    }

    fn verification_codes(
        &mut self,
    ) -> Result<EntityRepository<'_, Self::Handle, VerificationCode>> {
        self.repository()
    }

    fn invitations(&mut self) -> Result<EntityRepository<'_, Self::Handle, Invitation>> {
        self.repository()
    }

    fn resources(&mut self) -> Result<EntityRepository<'_, Self::Handle, Resource>> {
        self.repository()
    }

    fn resource_types(&mut self) -> Result<EntityRepository<'_, Self::Handle, ResourceType>> {
        self.repository()
    }

    fn resource_type_scopes(
        &mut self,
    ) -> Result<EntityRepository<'_, Self::Handle, ResourceTypeScope>> {
        self.repository()
    }

    fn roles(&mut self) -> Result<EntityRepository<'_, Self::Handle, Role>> {
        self.repository()
    }

    fn identity_roles(&mut self) -> Result<EntityRepository<'_, Self::Handle, IdentityRole>> {
        self.repository()
    }

    fn space_resources(&mut self) -> Result<EntityRepository<'_, Self::Handle, SpaceResource>> {
        self.repository()
    }
}

/// Marker for a domain service family.
pub trait ServiceKind {
    const NAME: &'static str;
}

macro_rules! service_kinds {
    ($($name:ident => $label:literal,)*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            pub struct $name;

            impl ServiceKind for $name {
                const NAME: &'static str = $label;
            }
        )*
    };
}

service_kinds! {
    InvitationServiceKind => "invitation",
    OrganizationServiceKind => "organization",
    PermissionServiceKind => "permission",
    RoleManagementServiceKind => "role_management",
}

/// A domain service of kind `K` holding its own manager.
pub struct DomainService<S: Store, K> {
    manager: TransactionManager<S>,
    _kind: PhantomData<K>,
}

impl<S: Store, K: ServiceKind> DomainService<S, K> {
    pub fn name(&self) -> &'static str {
        K::NAME
    }

    /// Manager for ambient reads and for beginning transactions.
    pub fn manager(&mut self) -> &mut TransactionManager<S> {
        &mut self.manager
    }
}

impl<S: Store, K: ServiceKind> Service<S> for DomainService<S, K> {
    fn new(manager: TransactionManager<S>) -> Self {
        Self {
            manager,
            _kind: PhantomData,
        }
    }
}

pub type InvitationService<S> = DomainService<S, InvitationServiceKind>;
pub type OrganizationService<S> = DomainService<S, OrganizationServiceKind>;
pub type PermissionService<S> = DomainService<S, PermissionServiceKind>;
pub type RoleManagementService<S> = DomainService<S, RoleManagementServiceKind>;
