//! In-memory store.
//!
//! Used when no database is configured and by the test suites. Each table is
//! a map behind its own `RwLock`; conditional updates happen under the write
//! guard so they are atomic with respect to other callers.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    CollectionStore, EventStore, IdentityStore, LogStore, ResourceStore, Store, StoreError,
    StoreResult, TicketStore,
};
use crate::models::auth::PasswordResetTicket;
use crate::models::collection::{Collection, CollectionPatch, MembershipChange};
use crate::models::event::{Event, EventPatch, Registration};
use crate::models::identity::{Identity, IdentityPatch, NewIdentity, normalize_email};
use crate::models::log::LogEntry;
use crate::models::resource::{Resource, ResourcePatch};
use crate::query::{Document, Filter, ListQuery, Page};
use crate::uuid::new_id;

/// Oldest entries are dropped beyond this many.
const MAX_LOG_ENTRIES: usize = 10_000;

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, Identity>>,
    tickets: RwLock<HashMap<String, PasswordResetTicket>>,
    resources: RwLock<HashMap<String, Resource>>,
    collections: RwLock<HashMap<String, Collection>>,
    events: RwLock<HashMap<String, Event>>,
    logs: RwLock<VecDeque<LogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Filter, sort, then window a set of documents.
fn page_of<'a, T>(docs: impl Iterator<Item = &'a T>, query: &ListQuery) -> Page<T>
where
    T: Document + Clone + 'a,
{
    let mut matched: Vec<&T> = docs.filter(|d| query.filter.matches(*d)).collect();
    matched.sort_by(|a, b| query.sort.compare(*a, *b));
    let total = matched.len() as u64;
    let skip = usize::try_from(query.pagination.skip).unwrap_or(usize::MAX);
    let take = usize::try_from(query.pagination.limit).unwrap_or(usize::MAX);
    let items = matched.into_iter().skip(skip).take(take).cloned().collect();
    Page { items, total }
}

fn count_of<'a, T>(docs: impl Iterator<Item = &'a T>, filter: &Filter) -> u64
where
    T: Document + 'a,
{
    docs.filter(|d| filter.matches(*d)).count() as u64
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<Identity>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let email = normalize_email(email);
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, new: NewIdentity) -> StoreResult<Identity> {
        let email = normalize_email(&new.email);
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == email) {
            return Err(StoreError::Conflict(format!("email already registered: {email}")));
        }
        let now = Utc::now();
        let identity = Identity {
            id: new_id(),
            name: new.name,
            email,
            password_hash: new.password_hash,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        users.insert(identity.id.clone(), identity.clone());
        Ok(identity)
    }

    async fn update_user(&self, id: &str, patch: IdentityPatch) -> StoreResult<Option<Identity>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            user.name = name;
        }
        if let Some(hash) = patch.password_hash {
            user.password_hash = hash;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(active) = patch.is_active {
            user.is_active = active;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<Identity>> {
        Ok(page_of(self.users.read().await.values(), query))
    }

    async fn count_users(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(count_of(self.users.read().await.values(), filter))
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn insert_ticket(&self, ticket: PasswordResetTicket) -> StoreResult<()> {
        self.tickets.write().await.insert(ticket.token.clone(), ticket);
        Ok(())
    }

    async fn consume_ticket(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<String>> {
        let mut tickets = self.tickets.write().await;
        match tickets.get_mut(token) {
            Some(ticket) if ticket.is_usable(now) => {
                ticket.used = true;
                Ok(Some(ticket.user_id.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ResourceStore for MemoryStore {
    async fn insert_resource(&self, resource: Resource) -> StoreResult<Resource> {
        self.resources
            .write()
            .await
            .insert(resource.id.clone(), resource.clone());
        Ok(resource)
    }

    async fn find_resource(&self, id: &str) -> StoreResult<Option<Resource>> {
        Ok(self.resources.read().await.get(id).cloned())
    }

    async fn record_resource_view(&self, id: &str) -> StoreResult<Option<Resource>> {
        let mut resources = self.resources.write().await;
        Ok(resources.get_mut(id).map(|r| {
            r.views += 1;
            r.clone()
        }))
    }

    async fn update_resource(&self, id: &str, patch: ResourcePatch) -> StoreResult<Option<Resource>> {
        let mut resources = self.resources.write().await;
        Ok(resources.get_mut(id).map(|r| {
            patch.apply(r);
            r.updated_at = Utc::now();
            r.clone()
        }))
    }

    async fn delete_resource(&self, id: &str) -> StoreResult<bool> {
        let removed = self.resources.write().await.remove(id).is_some();
        if removed {
            for collection in self.collections.write().await.values_mut() {
                collection.resource_ids.retain(|r| r != id);
            }
        }
        Ok(removed)
    }

    async fn list_resources(&self, query: &ListQuery) -> StoreResult<Page<Resource>> {
        Ok(page_of(self.resources.read().await.values(), query))
    }

    async fn count_resources(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(count_of(self.resources.read().await.values(), filter))
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn insert_collection(&self, collection: Collection) -> StoreResult<Collection> {
        self.collections
            .write()
            .await
            .insert(collection.id.clone(), collection.clone());
        Ok(collection)
    }

    async fn find_collection(&self, id: &str) -> StoreResult<Option<Collection>> {
        Ok(self.collections.read().await.get(id).cloned())
    }

    async fn find_collection_by_share_token(&self, token: &str) -> StoreResult<Option<Collection>> {
        let collections = self.collections.read().await;
        Ok(collections
            .values()
            .find(|c| c.share_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update_collection(
        &self,
        id: &str,
        patch: CollectionPatch,
    ) -> StoreResult<Option<Collection>> {
        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(id).map(|c| {
            patch.apply(c);
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn delete_collection(&self, id: &str) -> StoreResult<bool> {
        Ok(self.collections.write().await.remove(id).is_some())
    }

    async fn list_collections(&self, query: &ListQuery) -> StoreResult<Page<Collection>> {
        Ok(page_of(self.collections.read().await.values(), query))
    }

    async fn add_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<MembershipChange> {
        let mut collections = self.collections.write().await;
        let Some(collection) = collections.get_mut(id) else {
            return Ok(MembershipChange::CollectionMissing);
        };
        if collection.resource_ids.iter().any(|r| r == resource_id) {
            return Ok(MembershipChange::AlreadyPresent);
        }
        collection.resource_ids.push(resource_id.to_string());
        collection.updated_at = Utc::now();
        Ok(MembershipChange::Added(collection.clone()))
    }

    async fn remove_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<Option<Collection>> {
        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(id).map(|c| {
            c.resource_ids.retain(|r| r != resource_id);
            c.updated_at = Utc::now();
            c.clone()
        }))
    }

    async fn ensure_share_token(&self, id: &str, candidate: &str) -> StoreResult<Option<String>> {
        let mut collections = self.collections.write().await;
        Ok(collections.get_mut(id).map(|c| {
            c.share_token
                .get_or_insert_with(|| candidate.to_string())
                .clone()
        }))
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_event(&self, event: Event) -> StoreResult<Event> {
        self.events
            .write()
            .await
            .insert(event.id.clone(), event.clone());
        Ok(event)
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self.events.read().await.get(id).cloned())
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> StoreResult<Option<Event>> {
        let mut events = self.events.write().await;
        Ok(events.get_mut(id).map(|e| {
            patch.apply(e);
            e.updated_at = Utc::now();
            e.clone()
        }))
    }

    async fn delete_event(&self, id: &str) -> StoreResult<bool> {
        Ok(self.events.write().await.remove(id).is_some())
    }

    async fn list_events(&self, query: &ListQuery) -> StoreResult<Page<Event>> {
        Ok(page_of(self.events.read().await.values(), query))
    }

    async fn count_events(&self, filter: &Filter) -> StoreResult<u64> {
        Ok(count_of(self.events.read().await.values(), filter))
    }

    async fn register_for_event(&self, id: &str, user_id: &str) -> StoreResult<Registration> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(id) else {
            return Ok(Registration::EventMissing);
        };
        if event.registered_users.iter().any(|u| u == user_id) {
            return Ok(Registration::AlreadyRegistered);
        }
        if event.is_full() {
            return Ok(Registration::Full);
        }
        event.registered_users.push(user_id.to_string());
        event.updated_at = Utc::now();
        Ok(Registration::Registered(event.clone()))
    }

    async fn unregister_from_event(&self, id: &str, user_id: &str) -> StoreResult<Option<Event>> {
        let mut events = self.events.write().await;
        Ok(events.get_mut(id).map(|e| {
            e.registered_users.retain(|u| u != user_id);
            e.updated_at = Utc::now();
            e.clone()
        }))
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        let mut logs = self.logs.write().await;
        if logs.len() >= MAX_LOG_ENTRIES {
            logs.pop_front();
        }
        logs.push_back(entry);
        Ok(())
    }

    async fn list_logs(&self, query: &ListQuery) -> StoreResult<Page<LogEntry>> {
        Ok(page_of(self.logs.read().await.iter(), query))
    }
}

impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }
}
