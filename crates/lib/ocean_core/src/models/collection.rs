//! User-curated resource collections.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::{Document, FieldValue};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection {
    pub id: String,
    #[serde(rename = "userId")]
    pub owner_id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub resource_ids: Vec<String>,
    pub is_public: bool,
    #[serde(skip)]
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CollectionPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl CollectionPatch {
    pub fn apply(self, c: &mut Collection) {
        if let Some(v) = self.title {
            c.title = v;
        }
        if let Some(v) = self.description {
            c.description = Some(v);
        }
        if let Some(v) = self.is_public {
            c.is_public = v;
        }
    }
}

/// Result of a conditional add-to-set on a collection's resources.
#[derive(Debug, Clone)]
pub enum MembershipChange {
    Added(Collection),
    AlreadyPresent,
    CollectionMissing,
}

impl Document for Collection {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "userId" => FieldValue::Text(&self.owner_id),
            "title" => FieldValue::Text(&self.title),
            "isPublic" => FieldValue::Flag(self.is_public),
            "resourceIds" => FieldValue::List(&self.resource_ids),
            "createdAt" => FieldValue::Time(self.created_at),
            "updatedAt" => FieldValue::Time(self.updated_at),
            _ => FieldValue::Missing,
        }
    }
}
