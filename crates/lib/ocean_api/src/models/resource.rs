//! Resource payloads and views.

use ocean_core::models::UserSummary;
use ocean_core::models::resource::{Resource, ResourcePatch};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateResourceRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: String,
    #[serde(default)]
    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: String,
    #[serde(default, rename = "type")]
    #[validate(custom(function = "crate::validation::resource_type"))]
    pub resource_type: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validation::grade_level"))]
    pub grade_level: String,
    #[serde(default)]
    #[validate(length(min = 2, max = 100, message = "Subject must be between 2 and 100 characters"))]
    pub subject: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validation::tags"))]
    pub tags: Vec<String>,
    #[validate(url(message = "Media URL must be a valid URL"))]
    pub media_url: Option<String>,
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResourceRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(
        min = 10,
        max = 1000,
        message = "Description must be between 10 and 1000 characters"
    ))]
    pub description: Option<String>,
    #[validate(length(min = 10, message = "Content must be at least 10 characters"))]
    pub content: Option<String>,
    #[serde(rename = "type")]
    #[validate(custom(function = "crate::validation::resource_type"))]
    pub resource_type: Option<String>,
    #[validate(custom(function = "crate::validation::grade_level"))]
    pub grade_level: Option<String>,
    #[validate(length(min = 2, max = 100, message = "Subject must be between 2 and 100 characters"))]
    pub subject: Option<String>,
    #[validate(custom(function = "crate::validation::tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(url(message = "Media URL must be a valid URL"))]
    pub media_url: Option<String>,
    #[validate(url(message = "Thumbnail URL must be a valid URL"))]
    pub thumbnail_url: Option<String>,
    pub is_published: Option<bool>,
}

fn parse_enum<T: std::str::FromStr>(value: &str) -> AppResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| AppError::BadRequest(e.to_string()))
}

impl UpdateResourceRequest {
    /// Convert into a store patch. Enum fields were validated already.
    pub fn into_patch(self) -> AppResult<ResourcePatch> {
        Ok(ResourcePatch {
            title: self.title,
            description: self.description,
            content: self.content,
            resource_type: self.resource_type.as_deref().map(parse_enum).transpose()?,
            grade_level: self.grade_level.as_deref().map(parse_enum).transpose()?,
            subject: self.subject,
            tags: self.tags,
            media_url: self.media_url,
            thumbnail_url: self.thumbnail_url,
            is_published: self.is_published,
        })
    }
}

impl CreateResourceRequest {
    pub fn resource_type(&self) -> AppResult<ocean_core::models::resource::ResourceType> {
        parse_enum(&self.resource_type)
    }

    pub fn grade_level(&self) -> AppResult<ocean_core::models::resource::GradeLevel> {
        parse_enum(&self.grade_level)
    }
}

/// A resource with its author's summary.
#[derive(Debug, Serialize)]
pub struct ResourceView {
    #[serde(flatten)]
    pub resource: Resource,
    pub author: Option<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::field_errors;

    #[test]
    fn create_reports_wire_field_names() {
        let req: CreateResourceRequest = serde_json::from_value(serde_json::json!({
            "title": "Coral reefs",
            "description": "short",
            "content": "Long enough content",
            "type": "Podcast",
            "gradeLevel": "6-8",
            "subject": "Biology",
            "tags": ["reef", "x"]
        }))
        .unwrap();
        let errors = field_errors(&req.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["description", "tags", "type"]);
    }

    #[test]
    fn update_builds_patch() {
        let req: UpdateResourceRequest = serde_json::from_value(serde_json::json!({
            "type": "PDF", "isPublished": false
        }))
        .unwrap();
        assert!(req.validate().is_ok());
        let patch = req.into_patch().unwrap();
        assert_eq!(
            patch.resource_type,
            Some(ocean_core::models::resource::ResourceType::Pdf)
        );
        assert_eq!(patch.is_published, Some(false));
        assert!(patch.title.is_none());
    }
}
