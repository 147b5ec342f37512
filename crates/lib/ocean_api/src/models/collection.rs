//! Collection payloads and views.

use ocean_core::models::UserSummary;
use ocean_core::models::collection::{Collection, CollectionPatch};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::ResourceView;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCollectionRequest {
    #[validate(length(min = 2, max = 200, message = "Title must be between 2 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

impl From<UpdateCollectionRequest> for CollectionPatch {
    fn from(req: UpdateCollectionRequest) -> Self {
        CollectionPatch {
            title: req.title,
            description: req.description,
            is_public: req.is_public,
        }
    }
}

/// Body of the add and remove endpoints.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Resource ID is required"))]
    pub resource_id: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ShareCollectionRequest {
    #[serde(default)]
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub share_link: String,
}

/// A collection with its owner and member resources.
#[derive(Debug, Serialize)]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: Collection,
    pub owner: Option<UserSummary>,
    pub resources: Vec<ResourceView>,
}
