//! Storage ports.
//!
//! Each table is a narrow `async_trait` port so services depend only on the
//! operations they call. [`Store`] bundles them for the application state.
//! Two adapters exist: [`memory::MemoryStore`] and [`postgres::PgStore`].
//!
//! Membership and registration changes are single conditional operations
//! (add-to-set), never read-then-write sequences.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::auth::PasswordResetTicket;
use crate::models::collection::{Collection, CollectionPatch, MembershipChange};
use crate::models::event::{Event, EventPatch, Registration};
use crate::models::identity::{Identity, IdentityPatch, NewIdentity};
use crate::models::log::LogEntry;
use crate::models::resource::{Resource, ResourcePatch};
use crate::query::{Filter, ListQuery, Page};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal store error: {0}")]
    Internal(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<Identity>>;

    /// Lookup is case-insensitive.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;

    /// Insert a new identity. Fails with `Conflict` if the email is taken.
    async fn create_user(&self, new: NewIdentity) -> StoreResult<Identity>;

    async fn update_user(&self, id: &str, patch: IdentityPatch) -> StoreResult<Option<Identity>>;

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<Identity>>;

    async fn count_users(&self, filter: &Filter) -> StoreResult<u64>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert_ticket(&self, ticket: PasswordResetTicket) -> StoreResult<()>;

    /// Atomically mark a usable ticket as used and return its user id.
    ///
    /// Returns `None` if the token is unknown, already used, or expired.
    async fn consume_ticket(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn insert_resource(&self, resource: Resource) -> StoreResult<Resource>;

    async fn find_resource(&self, id: &str) -> StoreResult<Option<Resource>>;

    /// Increment the view counter and return the updated resource.
    async fn record_resource_view(&self, id: &str) -> StoreResult<Option<Resource>>;

    async fn update_resource(&self, id: &str, patch: ResourcePatch) -> StoreResult<Option<Resource>>;

    /// Delete a resource and drop it from every collection. Returns whether it existed.
    async fn delete_resource(&self, id: &str) -> StoreResult<bool>;

    async fn list_resources(&self, query: &ListQuery) -> StoreResult<Page<Resource>>;

    async fn count_resources(&self, filter: &Filter) -> StoreResult<u64>;
}

#[async_trait]
pub trait CollectionStore: Send + Sync {
    async fn insert_collection(&self, collection: Collection) -> StoreResult<Collection>;

    async fn find_collection(&self, id: &str) -> StoreResult<Option<Collection>>;

    async fn find_collection_by_share_token(&self, token: &str) -> StoreResult<Option<Collection>>;

    async fn update_collection(
        &self,
        id: &str,
        patch: CollectionPatch,
    ) -> StoreResult<Option<Collection>>;

    async fn delete_collection(&self, id: &str) -> StoreResult<bool>;

    async fn list_collections(&self, query: &ListQuery) -> StoreResult<Page<Collection>>;

    /// Add a resource id unless already present.
    async fn add_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<MembershipChange>;

    /// Remove a resource id. Removing an absent id is not an error.
    async fn remove_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<Option<Collection>>;

    /// Set the share token to `candidate` if none is set yet; return the
    /// token now in effect.
    async fn ensure_share_token(&self, id: &str, candidate: &str) -> StoreResult<Option<String>>;
}

#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert_event(&self, event: Event) -> StoreResult<Event>;

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>>;

    async fn update_event(&self, id: &str, patch: EventPatch) -> StoreResult<Option<Event>>;

    async fn delete_event(&self, id: &str) -> StoreResult<bool>;

    async fn list_events(&self, query: &ListQuery) -> StoreResult<Page<Event>>;

    async fn count_events(&self, filter: &Filter) -> StoreResult<u64>;

    /// Register a user if not already registered and capacity allows.
    async fn register_for_event(&self, id: &str, user_id: &str) -> StoreResult<Registration>;

    async fn unregister_from_event(&self, id: &str, user_id: &str) -> StoreResult<Option<Event>>;
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn append_log(&self, entry: LogEntry) -> StoreResult<()>;

    async fn list_logs(&self, query: &ListQuery) -> StoreResult<Page<LogEntry>>;
}

/// Every port the API needs, behind one trait object.
pub trait Store:
    IdentityStore + TicketStore + ResourceStore + CollectionStore + EventStore + LogStore
{
    /// Backend name reported by the health endpoint.
    fn backend(&self) -> &'static str;
}
