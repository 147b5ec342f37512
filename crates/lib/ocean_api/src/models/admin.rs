//! Admin payloads and views.

use ocean_core::models::identity::{Identity, Role};
use ocean_core::models::log::LogEntry;
use ocean_core::models::resource::Resource;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateRoleRequest {
    #[serde(default)]
    #[validate(custom(function = "crate::validation::role"))]
    pub role: String,
}

impl UpdateRoleRequest {
    pub fn role(&self) -> AppResult<Role> {
        self.role
            .parse()
            .map_err(|e: ocean_core::models::UnknownVariant| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_users: u64,
    pub total_resources: u64,
    pub published_resources: u64,
    pub total_events: u64,
    pub active_users: u64,
}

#[derive(Debug, Serialize)]
pub struct RecentActivity {
    pub logs: Vec<LogEntry>,
    pub users: Vec<Identity>,
    pub resources: Vec<Resource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub stats: Stats,
    pub recent_activity: RecentActivity,
}
