//! PostgreSQL store.
//!
//! Filters and orderings are translated into SQL through `QueryBuilder`
//! against a per-table map of API field names to columns. Ids are UUID
//! columns; a malformed id is treated as "not found".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

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
use crate::query::{Direction, Filter, ListQuery, Page, Predicate, SortOrder};
use crate::uuid::uuidv7;

/// An API field backed by a column.
struct Column {
    field: &'static str,
    column: &'static str,
    array: bool,
}

const fn col(field: &'static str, column: &'static str) -> Column {
    Column {
        field,
        column,
        array: false,
    }
}

const fn array_col(field: &'static str, column: &'static str) -> Column {
    Column {
        field,
        column,
        array: true,
    }
}

struct Table {
    name: &'static str,
    select: &'static str,
    columns: &'static [Column],
}

impl Table {
    fn column(&self, field: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.field == field)
    }
}

const USERS: Table = Table {
    name: "users",
    select: "id, name, email, password_hash, role, is_active, created_at, updated_at",
    columns: &[
        col("name", "name"),
        col("email", "email"),
        col("role", "role"),
        col("isActive", "is_active"),
        col("createdAt", "created_at"),
        col("updatedAt", "updated_at"),
    ],
};

const RESOURCES: Table = Table {
    name: "resources",
    select: "id, title, description, content, resource_type, grade_level, subject, tags, \
             media_url, thumbnail_url, author_id, views, is_published, created_at, updated_at",
    columns: &[
        col("title", "title"),
        col("description", "description"),
        col("content", "content"),
        col("type", "resource_type"),
        col("gradeLevel", "grade_level"),
        col("subject", "subject"),
        array_col("tags", "tags"),
        col("authorId", "author_id"),
        col("views", "views"),
        col("isPublished", "is_published"),
        col("createdAt", "created_at"),
        col("updatedAt", "updated_at"),
    ],
};

const COLLECTIONS: Table = Table {
    name: "collections",
    select: "id, user_id, title, description, resource_ids, is_public, share_token, \
             created_at, updated_at",
    columns: &[
        col("userId", "user_id"),
        col("title", "title"),
        col("isPublic", "is_public"),
        array_col("resourceIds", "resource_ids"),
        col("createdAt", "created_at"),
        col("updatedAt", "updated_at"),
    ],
};

const EVENTS: Table = Table {
    name: "events",
    select: "id, title, description, start_date, end_date, location, external_link, \
             live_stream_link, event_image, created_by, registered_users, max_participants, \
             created_at, updated_at",
    columns: &[
        col("title", "title"),
        col("location", "location"),
        col("createdBy", "created_by"),
        array_col("registeredUsers", "registered_users"),
        col("startDate", "start_date"),
        col("createdAt", "created_at"),
        col("updatedAt", "updated_at"),
    ],
};

const LOGS: Table = Table {
    name: "request_logs",
    select: "id, level, message, user_id, endpoint, status_code, duration_ms, created_at",
    columns: &[
        col("level", "level"),
        col("userId", "user_id"),
        col("endpoint", "endpoint"),
        col("statusCode", "status_code"),
        col("createdAt", "created_at"),
    ],
};

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for Identity {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Identity {
            id: row.id.to_string(),
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role: row.role.parse().map_err(corrupt)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ResourceRow {
    id: Uuid,
    title: String,
    description: String,
    content: String,
    resource_type: String,
    grade_level: String,
    subject: String,
    tags: Vec<String>,
    media_url: Option<String>,
    thumbnail_url: Option<String>,
    author_id: Uuid,
    views: i64,
    is_published: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ResourceRow> for Resource {
    type Error = StoreError;

    fn try_from(row: ResourceRow) -> Result<Self, Self::Error> {
        Ok(Resource {
            id: row.id.to_string(),
            title: row.title,
            description: row.description,
            content: row.content,
            resource_type: row.resource_type.parse().map_err(corrupt)?,
            grade_level: row.grade_level.parse().map_err(corrupt)?,
            subject: row.subject,
            tags: row.tags,
            media_url: row.media_url,
            thumbnail_url: row.thumbnail_url,
            author_id: row.author_id.to_string(),
            views: row.views,
            is_published: row.is_published,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CollectionRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    description: Option<String>,
    resource_ids: Vec<String>,
    is_public: bool,
    share_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CollectionRow> for Collection {
    fn from(row: CollectionRow) -> Self {
        Collection {
            id: row.id.to_string(),
            owner_id: row.user_id.to_string(),
            title: row.title,
            description: row.description,
            resource_ids: row.resource_ids,
            is_public: row.is_public,
            share_token: row.share_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: Option<DateTime<Utc>>,
    location: String,
    external_link: Option<String>,
    live_stream_link: Option<String>,
    event_image: Option<String>,
    created_by: Uuid,
    registered_users: Vec<String>,
    max_participants: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<EventRow> for Event {
    fn from(row: EventRow) -> Self {
        Event {
            id: row.id.to_string(),
            title: row.title,
            description: row.description,
            start_date: row.start_date,
            end_date: row.end_date,
            location: row.location,
            external_link: row.external_link,
            live_stream_link: row.live_stream_link,
            event_image: row.event_image,
            created_by: row.created_by.to_string(),
            registered_users: row.registered_users,
            max_participants: row.max_participants.and_then(|m| u32::try_from(m).ok()),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LogRow {
    id: Uuid,
    level: String,
    message: String,
    user_id: Option<Uuid>,
    endpoint: String,
    status_code: i32,
    duration_ms: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<LogRow> for LogEntry {
    type Error = StoreError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        Ok(LogEntry {
            id: row.id.to_string(),
            level: row.level.parse().map_err(corrupt)?,
            message: row.message,
            user_id: row.user_id.map(|u| u.to_string()),
            endpoint: row.endpoint,
            status_code: u16::try_from(row.status_code).unwrap_or_default(),
            duration_ms: u64::try_from(row.duration_ms).unwrap_or_default(),
            created_at: row.created_at,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Internal(format!("corrupt row: {e}"))
}

fn parse_id(id: &str) -> Option<Uuid> {
    Uuid::parse_str(id).ok()
}

/// Parse an id that must be valid (ids we generated ourselves).
fn require_id(id: &str) -> StoreResult<Uuid> {
    parse_id(id).ok_or_else(|| StoreError::Internal(format!("invalid id: {id}")))
}

fn map_unique(e: sqlx::Error, what: &str) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(format!("{what} already exists"))
        }
        _ => StoreError::Db(e),
    }
}

fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, table: &Table, filter: &Filter) {
    qb.push(" WHERE TRUE");
    for predicate in filter.predicates() {
        qb.push(" AND ");
        match predicate {
            Predicate::Equals { field, value } => match table.column(field) {
                Some(c) if c.array => {
                    qb.push_bind(value.clone());
                    qb.push(" = ANY(").push(c.column).push(")");
                }
                Some(c) => {
                    qb.push(c.column).push("::text = ").push_bind(value.clone());
                }
                None => {
                    qb.push("FALSE");
                }
            },
            Predicate::Flag { field, value } => match table.column(field) {
                Some(c) => {
                    qb.push(c.column).push(" = ").push_bind(*value);
                }
                None => {
                    qb.push("FALSE");
                }
            },
            Predicate::Search { fields, terms } => {
                qb.push("(FALSE");
                for c in fields.iter().filter_map(|f| table.column(f)) {
                    for term in terms {
                        let pattern = format!("%{}%", escape_like(term));
                        qb.push(" OR ");
                        if c.array {
                            qb.push("EXISTS (SELECT 1 FROM unnest(")
                                .push(c.column)
                                .push(") AS v WHERE v ILIKE ")
                                .push_bind(pattern)
                                .push(")");
                        } else {
                            qb.push(c.column).push(" ILIKE ").push_bind(pattern);
                        }
                    }
                }
                qb.push(")");
            }
        }
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, table: &Table, sort: &SortOrder) {
    qb.push(" ORDER BY ");
    if let Some(c) = table.column(sort.field) {
        qb.push(c.column).push(match sort.direction {
            Direction::Asc => " ASC, ",
            Direction::Desc => " DESC, ",
        });
    }
    qb.push("id ASC");
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn list<R>(&self, table: &Table, query: &ListQuery) -> StoreResult<(Vec<R>, u64)>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let total = self.count(table, &query.filter).await?;

        let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
        qb.push(table.select).push(" FROM ").push(table.name);
        push_filter(&mut qb, table, &query.filter);
        push_order(&mut qb, table, &query.sort);
        qb.push(" LIMIT ")
            .push_bind(to_i64(query.pagination.limit))
            .push(" OFFSET ")
            .push_bind(to_i64(query.pagination.skip));
        let rows = qb.build_query_as::<R>().fetch_all(&self.pool).await?;
        Ok((rows, total))
    }

    async fn count(&self, table: &Table, filter: &Filter) -> StoreResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM ");
        qb.push(table.name);
        push_filter(&mut qb, table, filter);
        let n = qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
        Ok(u64::try_from(n).unwrap_or_default())
    }

    async fn fetch_by_id<R>(&self, table: &Table, id: &str) -> StoreResult<Option<R>>
    where
        R: for<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!("SELECT {} FROM {} WHERE id = $1", table.select, table.name);
        let row = sqlx::query_as::<_, R>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_id(&self, table: &Table, id: &str) -> StoreResult<bool> {
        let Some(id) = parse_id(id) else {
            return Ok(false);
        };
        let sql = format!("DELETE FROM {} WHERE id = $1", table.name);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl IdentityStore for PgStore {
    async fn find_user_by_id(&self, id: &str) -> StoreResult<Option<Identity>> {
        self.fetch_by_id::<UserRow>(&USERS, id)
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let sql = format!("SELECT {} FROM users WHERE lower(email) = $1", USERS.select);
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn create_user(&self, new: NewIdentity) -> StoreResult<Identity> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USERS.select
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(uuidv7())
            .bind(&new.name)
            .bind(normalize_email(&new.email))
            .bind(&new.password_hash)
            .bind(new.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique(e, "email"))?;
        row.try_into()
    }

    async fn update_user(&self, id: &str, patch: IdentityPatch) -> StoreResult<Option<Identity>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                password_hash = COALESCE($3, password_hash), \
                role = COALESCE($4, role), \
                is_active = COALESCE($5, is_active), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            USERS.select
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .bind(patch.name)
            .bind(patch.password_hash)
            .bind(patch.role.map(|r| r.as_str()))
            .bind(patch.is_active)
            .fetch_optional(&self.pool)
            .await?
            .map(Identity::try_from)
            .transpose()
    }

    async fn list_users(&self, query: &ListQuery) -> StoreResult<Page<Identity>> {
        let (rows, total) = self.list::<UserRow>(&USERS, query).await?;
        let items = rows
            .into_iter()
            .map(Identity::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page { items, total })
    }

    async fn count_users(&self, filter: &Filter) -> StoreResult<u64> {
        self.count(&USERS, filter).await
    }
}

#[async_trait]
impl TicketStore for PgStore {
    async fn insert_ticket(&self, ticket: PasswordResetTicket) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO password_resets (id, user_id, token, expires_at, used, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(require_id(&ticket.id)?)
        .bind(require_id(&ticket.user_id)?)
        .bind(&ticket.token)
        .bind(ticket.expires_at)
        .bind(ticket.used)
        .bind(ticket.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn consume_ticket(&self, token: &str, now: DateTime<Utc>) -> StoreResult<Option<String>> {
        let user_id = sqlx::query_scalar::<_, String>(
            "UPDATE password_resets SET used = TRUE \
             WHERE token = $1 AND NOT used AND expires_at > $2 \
             RETURNING user_id::text",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user_id)
    }
}

#[async_trait]
impl ResourceStore for PgStore {
    async fn insert_resource(&self, r: Resource) -> StoreResult<Resource> {
        let sql = format!(
            "INSERT INTO resources (id, title, description, content, resource_type, grade_level, \
                subject, tags, media_url, thumbnail_url, author_id, views, is_published, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING {}",
            RESOURCES.select
        );
        sqlx::query_as::<_, ResourceRow>(&sql)
            .bind(require_id(&r.id)?)
            .bind(&r.title)
            .bind(&r.description)
            .bind(&r.content)
            .bind(r.resource_type.as_str())
            .bind(r.grade_level.as_str())
            .bind(&r.subject)
            .bind(&r.tags)
            .bind(&r.media_url)
            .bind(&r.thumbnail_url)
            .bind(require_id(&r.author_id)?)
            .bind(r.views)
            .bind(r.is_published)
            .bind(r.created_at)
            .bind(r.updated_at)
            .fetch_one(&self.pool)
            .await?
            .try_into()
    }

    async fn find_resource(&self, id: &str) -> StoreResult<Option<Resource>> {
        self.fetch_by_id::<ResourceRow>(&RESOURCES, id)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn record_resource_view(&self, id: &str) -> StoreResult<Option<Resource>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE resources SET views = views + 1 WHERE id = $1 RETURNING {}",
            RESOURCES.select
        );
        sqlx::query_as::<_, ResourceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn update_resource(&self, id: &str, patch: ResourcePatch) -> StoreResult<Option<Resource>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE resources SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                content = COALESCE($4, content), \
                resource_type = COALESCE($5, resource_type), \
                grade_level = COALESCE($6, grade_level), \
                subject = COALESCE($7, subject), \
                tags = COALESCE($8, tags), \
                media_url = COALESCE($9, media_url), \
                thumbnail_url = COALESCE($10, thumbnail_url), \
                is_published = COALESCE($11, is_published), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            RESOURCES.select
        );
        sqlx::query_as::<_, ResourceRow>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.content)
            .bind(patch.resource_type.map(|t| t.as_str()))
            .bind(patch.grade_level.map(|g| g.as_str()))
            .bind(patch.subject)
            .bind(patch.tags)
            .bind(patch.media_url)
            .bind(patch.thumbnail_url)
            .bind(patch.is_published)
            .fetch_optional(&self.pool)
            .await?
            .map(Resource::try_from)
            .transpose()
    }

    async fn delete_resource(&self, id: &str) -> StoreResult<bool> {
        let Some(uuid) = parse_id(id) else {
            return Ok(false);
        };
        let mut tx = self.pool.begin().await?;
        let deleted = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(uuid)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;
        if deleted {
            sqlx::query(
                "UPDATE collections SET resource_ids = array_remove(resource_ids, $1) \
                 WHERE $1 = ANY(resource_ids)",
            )
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(deleted)
    }

    async fn list_resources(&self, query: &ListQuery) -> StoreResult<Page<Resource>> {
        let (rows, total) = self.list::<ResourceRow>(&RESOURCES, query).await?;
        let items = rows
            .into_iter()
            .map(Resource::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page { items, total })
    }

    async fn count_resources(&self, filter: &Filter) -> StoreResult<u64> {
        self.count(&RESOURCES, filter).await
    }
}

#[async_trait]
impl CollectionStore for PgStore {
    async fn insert_collection(&self, c: Collection) -> StoreResult<Collection> {
        let sql = format!(
            "INSERT INTO collections (id, user_id, title, description, resource_ids, is_public, \
                share_token, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING {}",
            COLLECTIONS.select
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(require_id(&c.id)?)
            .bind(require_id(&c.owner_id)?)
            .bind(&c.title)
            .bind(&c.description)
            .bind(&c.resource_ids)
            .bind(c.is_public)
            .bind(&c.share_token)
            .bind(c.created_at)
            .bind(c.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_collection(&self, id: &str) -> StoreResult<Option<Collection>> {
        Ok(self
            .fetch_by_id::<CollectionRow>(&COLLECTIONS, id)
            .await?
            .map(Collection::from))
    }

    async fn find_collection_by_share_token(&self, token: &str) -> StoreResult<Option<Collection>> {
        let sql = format!(
            "SELECT {} FROM collections WHERE share_token = $1",
            COLLECTIONS.select
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Collection::from))
    }

    async fn update_collection(
        &self,
        id: &str,
        patch: CollectionPatch,
    ) -> StoreResult<Option<Collection>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE collections SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                is_public = COALESCE($4, is_public), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLLECTIONS.select
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.is_public)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Collection::from))
    }

    async fn delete_collection(&self, id: &str) -> StoreResult<bool> {
        self.delete_by_id(&COLLECTIONS, id).await
    }

    async fn list_collections(&self, query: &ListQuery) -> StoreResult<Page<Collection>> {
        let (rows, total) = self.list::<CollectionRow>(&COLLECTIONS, query).await?;
        Ok(Page {
            items: rows.into_iter().map(Collection::from).collect(),
            total,
        })
    }

    async fn add_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<MembershipChange> {
        let Some(uuid) = parse_id(id) else {
            return Ok(MembershipChange::CollectionMissing);
        };
        let sql = format!(
            "UPDATE collections SET \
                resource_ids = array_append(resource_ids, $2), \
                updated_at = now() \
             WHERE id = $1 AND NOT ($2 = ANY(resource_ids)) RETURNING {}",
            COLLECTIONS.select
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(uuid)
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = row {
            return Ok(MembershipChange::Added(row.into()));
        }
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM collections WHERE id = $1)")
                .bind(uuid)
                .fetch_one(&self.pool)
                .await?;
        Ok(if exists {
            MembershipChange::AlreadyPresent
        } else {
            MembershipChange::CollectionMissing
        })
    }

    async fn remove_collection_resource(
        &self,
        id: &str,
        resource_id: &str,
    ) -> StoreResult<Option<Collection>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE collections SET \
                resource_ids = array_remove(resource_ids, $2), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            COLLECTIONS.select
        );
        let row = sqlx::query_as::<_, CollectionRow>(&sql)
            .bind(id)
            .bind(resource_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Collection::from))
    }

    async fn ensure_share_token(&self, id: &str, candidate: &str) -> StoreResult<Option<String>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let token = sqlx::query_scalar::<_, Option<String>>(
            "UPDATE collections SET share_token = COALESCE(share_token, $2) \
             WHERE id = $1 RETURNING share_token",
        )
        .bind(id)
        .bind(candidate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique(e, "share token"))?;
        Ok(token.flatten())
    }
}

#[async_trait]
impl EventStore for PgStore {
    async fn insert_event(&self, e: Event) -> StoreResult<Event> {
        let sql = format!(
            "INSERT INTO events (id, title, description, start_date, end_date, location, \
                external_link, live_stream_link, event_image, created_by, registered_users, \
                max_participants, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING {}",
            EVENTS.select
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(require_id(&e.id)?)
            .bind(&e.title)
            .bind(&e.description)
            .bind(e.start_date)
            .bind(e.end_date)
            .bind(&e.location)
            .bind(&e.external_link)
            .bind(&e.live_stream_link)
            .bind(&e.event_image)
            .bind(require_id(&e.created_by)?)
            .bind(&e.registered_users)
            .bind(e.max_participants.map(|m| i32::try_from(m).unwrap_or(i32::MAX)))
            .bind(e.created_at)
            .bind(e.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find_event(&self, id: &str) -> StoreResult<Option<Event>> {
        Ok(self
            .fetch_by_id::<EventRow>(&EVENTS, id)
            .await?
            .map(Event::from))
    }

    async fn update_event(&self, id: &str, patch: EventPatch) -> StoreResult<Option<Event>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE events SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                start_date = COALESCE($4, start_date), \
                end_date = COALESCE($5, end_date), \
                location = COALESCE($6, location), \
                external_link = COALESCE($7, external_link), \
                live_stream_link = COALESCE($8, live_stream_link), \
                event_image = COALESCE($9, event_image), \
                max_participants = COALESCE($10, max_participants), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            EVENTS.select
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(patch.title)
            .bind(patch.description)
            .bind(patch.start_date)
            .bind(patch.end_date)
            .bind(patch.location)
            .bind(patch.external_link)
            .bind(patch.live_stream_link)
            .bind(patch.event_image)
            .bind(patch.max_participants.map(|m| i32::try_from(m).unwrap_or(i32::MAX)))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }

    async fn delete_event(&self, id: &str) -> StoreResult<bool> {
        self.delete_by_id(&EVENTS, id).await
    }

    async fn list_events(&self, query: &ListQuery) -> StoreResult<Page<Event>> {
        let (rows, total) = self.list::<EventRow>(&EVENTS, query).await?;
        Ok(Page {
            items: rows.into_iter().map(Event::from).collect(),
            total,
        })
    }

    async fn count_events(&self, filter: &Filter) -> StoreResult<u64> {
        self.count(&EVENTS, filter).await
    }

    async fn register_for_event(&self, id: &str, user_id: &str) -> StoreResult<Registration> {
        let Some(uuid) = parse_id(id) else {
            return Ok(Registration::EventMissing);
        };
        let sql = format!(
            "UPDATE events SET \
                registered_users = array_append(registered_users, $2), \
                updated_at = now() \
             WHERE id = $1 \
               AND NOT ($2 = ANY(registered_users)) \
               AND (max_participants IS NULL OR cardinality(registered_users) < max_participants) \
             RETURNING {}",
            EVENTS.select
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(uuid)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        if let Some(row) = row {
            return Ok(Registration::Registered(row.into()));
        }

        let registered = sqlx::query_scalar::<_, bool>(
            "SELECT $2 = ANY(registered_users) FROM events WHERE id = $1",
        )
        .bind(uuid)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(match registered {
            None => Registration::EventMissing,
            Some(true) => Registration::AlreadyRegistered,
            Some(false) => Registration::Full,
        })
    }

    async fn unregister_from_event(&self, id: &str, user_id: &str) -> StoreResult<Option<Event>> {
        let Some(id) = parse_id(id) else {
            return Ok(None);
        };
        let sql = format!(
            "UPDATE events SET \
                registered_users = array_remove(registered_users, $2), \
                updated_at = now() \
             WHERE id = $1 RETURNING {}",
            EVENTS.select
        );
        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Event::from))
    }
}

#[async_trait]
impl LogStore for PgStore {
    async fn append_log(&self, entry: LogEntry) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO request_logs \
                (id, level, message, user_id, endpoint, status_code, duration_ms, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(require_id(&entry.id)?)
        .bind(entry.level.as_str())
        .bind(&entry.message)
        .bind(entry.user_id.as_deref().and_then(parse_id))
        .bind(&entry.endpoint)
        .bind(i32::from(entry.status_code))
        .bind(to_i64(entry.duration_ms))
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_logs(&self, query: &ListQuery) -> StoreResult<Page<LogEntry>> {
        let (rows, total) = self.list::<LogRow>(&LOGS, query).await?;
        let items = rows
            .into_iter()
            .map(LogEntry::try_from)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok(Page { items, total })
    }
}

impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }
}
