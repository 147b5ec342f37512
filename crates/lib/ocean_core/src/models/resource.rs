//! Educational resources.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UnknownVariant;
use crate::query::{Document, FieldValue, FilterField, SortOption, SortOrder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Video,
    Image,
    Lesson,
    Link,
    #[serde(rename = "PDF")]
    Pdf,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::Video,
        ResourceType::Image,
        ResourceType::Lesson,
        ResourceType::Link,
        ResourceType::Pdf,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Video => "Video",
            ResourceType::Image => "Image",
            ResourceType::Lesson => "Lesson",
            ResourceType::Link => "Link",
            ResourceType::Pdf => "PDF",
        }
    }
}

impl FromStr for ResourceType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("resource type", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GradeLevel {
    #[serde(rename = "K-2")]
    K2,
    #[serde(rename = "3-5")]
    G3To5,
    #[serde(rename = "6-8")]
    G6To8,
    #[serde(rename = "9-12")]
    G9To12,
    #[serde(rename = "Higher Ed")]
    HigherEd,
    General,
}

impl GradeLevel {
    pub const ALL: [GradeLevel; 6] = [
        GradeLevel::K2,
        GradeLevel::G3To5,
        GradeLevel::G6To8,
        GradeLevel::G9To12,
        GradeLevel::HigherEd,
        GradeLevel::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GradeLevel::K2 => "K-2",
            GradeLevel::G3To5 => "3-5",
            GradeLevel::G6To8 => "6-8",
            GradeLevel::G9To12 => "9-12",
            GradeLevel::HigherEd => "Higher Ed",
            GradeLevel::General => "General",
        }
    }
}

impl FromStr for GradeLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("grade level", s))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub resource_type: ResourceType,
    pub grade_level: GradeLevel,
    pub subject: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub author_id: String,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct ResourcePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub content: Option<String>,
    pub resource_type: Option<ResourceType>,
    pub grade_level: Option<GradeLevel>,
    pub subject: Option<String>,
    pub tags: Option<Vec<String>>,
    pub media_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub is_published: Option<bool>,
}

impl ResourcePatch {
    pub fn publish(published: bool) -> Self {
        Self {
            is_published: Some(published),
            ..Self::default()
        }
    }

    /// Apply onto an in-memory copy.
    pub fn apply(self, r: &mut Resource) {
        if let Some(v) = self.title {
            r.title = v;
        }
        if let Some(v) = self.description {
            r.description = v;
        }
        if let Some(v) = self.content {
            r.content = v;
        }
        if let Some(v) = self.resource_type {
            r.resource_type = v;
        }
        if let Some(v) = self.grade_level {
            r.grade_level = v;
        }
        if let Some(v) = self.subject {
            r.subject = v;
        }
        if let Some(v) = self.tags {
            r.tags = v;
        }
        if let Some(v) = self.media_url {
            r.media_url = Some(v);
        }
        if let Some(v) = self.thumbnail_url {
            r.thumbnail_url = Some(v);
        }
        if let Some(v) = self.is_published {
            r.is_published = v;
        }
    }
}

/// Fields searched by the free-text `query` parameter.
pub const RESOURCE_SEARCH_FIELDS: &[&str] = &["title", "description", "tags"];

/// Public listing / search filters.
pub const RESOURCE_FILTERS: &[FilterField] = &[
    FilterField::equals("grade", "gradeLevel"),
    FilterField::equals("type", "type"),
    FilterField::equals("subject", "subject"),
    FilterField::equals("tag", "tags"),
];

/// Search filters: the listing filters plus free text over [`RESOURCE_SEARCH_FIELDS`].
pub const RESOURCE_SEARCH_FILTERS: &[FilterField] = &[
    FilterField::equals("grade", "gradeLevel"),
    FilterField::equals("type", "type"),
    FilterField::equals("subject", "subject"),
    FilterField::equals("tag", "tags"),
    FilterField::search("query", RESOURCE_SEARCH_FIELDS),
];

/// Admin listing filters.
pub const ADMIN_RESOURCE_FILTERS: &[FilterField] = &[FilterField::flag("isPublished", "isPublished")];

pub const RESOURCE_SORTS: &[SortOption] = &[
    SortOption::new("newest", SortOrder::desc("createdAt")),
    SortOption::new("oldest", SortOrder::asc("createdAt")),
    SortOption::new("popular", SortOrder::desc("views")),
    SortOption::new("views", SortOrder::desc("views")),
];

impl Document for Resource {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "title" => FieldValue::Text(&self.title),
            "description" => FieldValue::Text(&self.description),
            "type" => FieldValue::Text(self.resource_type.as_str()),
            "gradeLevel" => FieldValue::Text(self.grade_level.as_str()),
            "subject" => FieldValue::Text(&self.subject),
            "tags" => FieldValue::List(&self.tags),
            "authorId" => FieldValue::Text(&self.author_id),
            "views" => FieldValue::Number(self.views),
            "isPublished" => FieldValue::Flag(self.is_published),
            "createdAt" => FieldValue::Time(self.created_at),
            "updatedAt" => FieldValue::Time(self.updated_at),
            _ => FieldValue::Missing,
        }
    }
}
