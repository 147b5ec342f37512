//! PgStore tests against a real PostgreSQL server.
//!
//! Each test creates and migrates a throwaway database on the server named by
//! `OCEAN_TEST_DATABASE_URL`, and drops it afterwards. Without that variable
//! the tests return early.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{Duration, Utc};
use ocean_core::auth::tickets::new_reset_ticket;
use ocean_core::models::collection::{Collection, MembershipChange};
use ocean_core::models::event::{Event, Registration};
use ocean_core::models::identity::{Identity, NewIdentity, Role};
use ocean_core::models::resource::{
    GradeLevel, RESOURCE_SEARCH_FILTERS, Resource, ResourcePatch, ResourceType,
};
use ocean_core::query::{Filter, ListQuery, Pagination, SortOrder, build_filter};
use ocean_core::store::{
    CollectionStore, EventStore, IdentityStore, PgStore, ResourceStore, TicketStore,
};
use ocean_core::uuid::new_id;
use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPoolOptions};

const TEST_DATABASE_URL: &str = "OCEAN_TEST_DATABASE_URL";

struct TestDb {
    server: PgConnectOptions,
    name: String,
    store: Arc<PgStore>,
}

impl TestDb {
    async fn create() -> Option<Self> {
        let Ok(url) = std::env::var(TEST_DATABASE_URL) else {
            eprintln!("{TEST_DATABASE_URL} not set; skipping");
            return None;
        };
        let server = PgConnectOptions::from_str(&url).expect("parse database url");
        let name = format!("ocean_test_{}", new_id().replace('-', ""));

        let mut conn = PgConnection::connect_with(&server).await.expect("connect");
        sqlx::raw_sql(&format!(r#"CREATE DATABASE "{name}""#))
            .execute(&mut conn)
            .await
            .expect("create database");
        conn.close().await.expect("close");

        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect_with(server.clone().database(&name))
            .await
            .expect("connect to test database");
        ocean_core::migrate::migrate(&pool).await.expect("migrate");

        Some(Self {
            server,
            name,
            store: Arc::new(PgStore::new(pool)),
        })
    }

    async fn destroy(self) {
        self.store.pool().close().await;
        let mut conn = PgConnection::connect_with(&self.server).await.expect("connect");
        sqlx::raw_sql(&format!(r#"DROP DATABASE IF EXISTS "{}""#, self.name))
            .execute(&mut conn)
            .await
            .expect("drop database");
    }
}

async fn user(store: &PgStore, email: &str) -> Identity {
    store
        .create_user(NewIdentity {
            name: "Ada".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        })
        .await
        .expect("create user")
}

fn resource(author: &str, title: &str, tags: &[&str], grade: GradeLevel) -> Resource {
    let now = Utc::now();
    Resource {
        id: new_id(),
        title: title.into(),
        description: "A description of the resource".into(),
        content: "Some lesson content".into(),
        resource_type: ResourceType::Lesson,
        grade_level: grade,
        subject: "Biology".into(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        media_url: None,
        thumbnail_url: None,
        author_id: author.into(),
        views: 0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

fn collection(owner: &str) -> Collection {
    let now = Utc::now();
    Collection {
        id: new_id(),
        owner_id: owner.into(),
        title: "Field trip".into(),
        description: None,
        resource_ids: Vec::new(),
        is_public: false,
        share_token: None,
        created_at: now,
        updated_at: now,
    }
}

fn event(creator: &str, max: Option<u32>) -> Event {
    let now = Utc::now();
    Event {
        id: new_id(),
        title: "Beach clean-up".into(),
        description: "Bring gloves and a reusable bag".into(),
        start_date: now + Duration::days(7),
        end_date: None,
        location: "Bondi".into(),
        external_link: None,
        live_stream_link: None,
        event_image: None,
        created_by: creator.into(),
        registered_users: Vec::new(),
        max_participants: max,
        created_at: now,
        updated_at: now,
    }
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn all(filter: Filter) -> ListQuery {
    ListQuery::new(filter, SortOrder::newest(), Pagination::first(100))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn reset_ticket_is_consumed_exactly_once() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let owner = user(&db.store, "ticket@x.com").await;
    let now = Utc::now();

    let ticket = new_reset_ticket(&owner.id, now);
    let token = ticket.token.clone();
    db.store.insert_ticket(ticket).await.unwrap();
    assert_eq!(
        db.store.consume_ticket(&token, now).await.unwrap(),
        Some(owner.id.clone())
    );
    assert_eq!(db.store.consume_ticket(&token, now).await.unwrap(), None);

    let expired = new_reset_ticket(&owner.id, now);
    let token = expired.token.clone();
    db.store.insert_ticket(expired).await.unwrap();
    let later = now + Duration::hours(2);
    assert_eq!(db.store.consume_ticket(&token, later).await.unwrap(), None);

    let contested = new_reset_ticket(&owner.id, now);
    let token = contested.token.clone();
    db.store.insert_ticket(contested).await.unwrap();
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&db.store);
            let token = token.clone();
            tokio::spawn(async move { store.consume_ticket(&token, now).await })
        })
        .collect();
    let mut consumed = 0;
    for h in handles {
        if h.await.unwrap().unwrap().is_some() {
            consumed += 1;
        }
    }
    assert_eq!(consumed, 1);

    db.destroy().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_collection_adds_keep_one_membership() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let owner = user(&db.store, "owner@x.com").await;
    let r = db
        .store
        .insert_resource(resource(&owner.id, "Rock pools", &["tides"], GradeLevel::General))
        .await
        .unwrap();
    let c = db.store.insert_collection(collection(&owner.id)).await.unwrap();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = Arc::clone(&db.store);
            let (cid, rid) = (c.id.clone(), r.id.clone());
            tokio::spawn(async move { store.add_collection_resource(&cid, &rid).await })
        })
        .collect();
    let (mut added, mut present) = (0, 0);
    for h in handles {
        match h.await.unwrap().unwrap() {
            MembershipChange::Added(_) => added += 1,
            MembershipChange::AlreadyPresent => present += 1,
            MembershipChange::CollectionMissing => panic!("collection vanished"),
        }
    }
    assert_eq!((added, present), (1, 15));
    let stored = db.store.find_collection(&c.id).await.unwrap().unwrap();
    assert_eq!(stored.resource_ids, [r.id.clone()]);

    assert!(matches!(
        db.store.add_collection_resource(&new_id(), &r.id).await.unwrap(),
        MembershipChange::CollectionMissing
    ));

    // Deleting the resource also drops it from the collection.
    assert!(db.store.delete_resource(&r.id).await.unwrap());
    let stored = db.store.find_collection(&c.id).await.unwrap().unwrap();
    assert!(stored.resource_ids.is_empty());

    db.destroy().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registrations_respect_capacity() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let host = user(&db.store, "host@x.com").await;
    let e = db.store.insert_event(event(&host.id, Some(2))).await.unwrap();

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&db.store);
            let eid = e.id.clone();
            tokio::spawn(async move { store.register_for_event(&eid, &new_id()).await })
        })
        .collect();
    let (mut registered, mut full) = (0, 0);
    for h in handles {
        match h.await.unwrap().unwrap() {
            Registration::Registered(_) => registered += 1,
            Registration::Full => full += 1,
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
    assert_eq!((registered, full), (2, 8));

    let stored = db.store.find_event(&e.id).await.unwrap().unwrap();
    assert_eq!(stored.registered_users.len(), 2);
    let first = stored.registered_users[0].clone();
    assert!(matches!(
        db.store.register_for_event(&e.id, &first).await.unwrap(),
        Registration::AlreadyRegistered
    ));
    assert!(matches!(
        db.store.register_for_event(&new_id(), &first).await.unwrap(),
        Registration::EventMissing
    ));

    let left = db.store.unregister_from_event(&e.id, &first).await.unwrap().unwrap();
    assert_eq!(left.registered_users.len(), 1);

    db.destroy().await;
}

#[tokio::test]
async fn search_and_equality_filters_run_as_sql() {
    let Some(db) = TestDb::create().await else {
        return;
    };
    let author = user(&db.store, "author@x.com").await;
    let coral = db
        .store
        .insert_resource(resource(&author.id, "Coral reef basics", &["reef"], GradeLevel::G6To8))
        .await
        .unwrap();
    db.store
        .insert_resource(resource(&author.id, "Kelp forests", &["kelp"], GradeLevel::G9To12))
        .await
        .unwrap();
    db.store
        .insert_resource(resource(&author.id, "100% plankton", &["PLANKTON"], GradeLevel::G6To8))
        .await
        .unwrap();

    let titles = |page: Vec<Resource>| {
        let mut sorted: Vec<String> = page.into_iter().map(|r| r.title).collect();
        sorted.sort();
        sorted
    };

    // Any term matches, case-insensitively, across title and tags.
    let filter = build_filter(&params(&[("query", "CORAL plankton")]), RESOURCE_SEARCH_FILTERS);
    let page = db.store.list_resources(&all(filter)).await.unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(titles(page.items), ["100% plankton", "Coral reef basics"]);

    // LIKE metacharacters are literal.
    let filter = build_filter(&params(&[("query", "%")]), RESOURCE_SEARCH_FILTERS);
    assert_eq!(db.store.count_resources(&filter).await.unwrap(), 1);

    // Array membership and enum text equality.
    let filter = build_filter(&params(&[("tag", "kelp")]), RESOURCE_SEARCH_FILTERS);
    let page = db.store.list_resources(&all(filter)).await.unwrap();
    assert_eq!(titles(page.items), ["Kelp forests"]);
    let filter = build_filter(&params(&[("grade", "6-8")]), RESOURCE_SEARCH_FILTERS);
    assert_eq!(db.store.count_resources(&filter).await.unwrap(), 2);

    // UUID columns compare by their text form.
    let mine = db.store.insert_collection(collection(&author.id)).await.unwrap();
    let other = user(&db.store, "other@x.com").await;
    db.store.insert_collection(collection(&other.id)).await.unwrap();
    let page = db
        .store
        .list_collections(&all(Filter::new().eq("userId", author.id.as_str())))
        .await
        .unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].id, mine.id);

    // Flags and role equality.
    db.store
        .update_resource(&coral.id, ResourcePatch::publish(false))
        .await
        .unwrap();
    let published = Filter::new().flag("isPublished", true);
    assert_eq!(db.store.count_resources(&published).await.unwrap(), 2);
    assert_eq!(
        db.store.count_users(&Filter::new().eq("role", "User")).await.unwrap(),
        2
    );
    assert_eq!(
        db.store.count_users(&Filter::new().eq("role", "Admin")).await.unwrap(),
        0
    );

    db.destroy().await;
}
