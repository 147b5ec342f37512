//! Route paths.

pub const GET_ROOT: &str = "/";
pub const GET_HEALTH: &str = "/health";
pub const GET_API_HEALTH: &str = "/api/health";

// Auth
pub const POST_AUTH_REGISTER: &str = "/api/auth/register";
pub const POST_AUTH_LOGIN: &str = "/api/auth/login";
pub const POST_AUTH_REFRESH: &str = "/api/auth/refresh";
pub const POST_AUTH_FORGOT_PASSWORD: &str = "/api/auth/forgot-password";
pub const POST_AUTH_RESET_PASSWORD: &str = "/api/auth/reset-password";
pub const GET_AUTH_ME: &str = "/api/auth/me";

// Resources
pub const RESOURCES: &str = "/api/resources";
pub const GET_RESOURCES_SEARCH: &str = "/api/resources/search";
pub const RESOURCES_ID: &str = "/api/resources/{id}";

// Collections
pub const COLLECTIONS: &str = "/api/collections";
pub const GET_COLLECTIONS_PUBLIC_TOKEN: &str = "/api/collections/public/{token}";
pub const COLLECTIONS_ID: &str = "/api/collections/{id}";
pub const POST_COLLECTIONS_ID_ADD: &str = "/api/collections/{id}/add";
pub const POST_COLLECTIONS_ID_REMOVE: &str = "/api/collections/{id}/remove";
pub const POST_COLLECTIONS_ID_SHARE: &str = "/api/collections/{id}/share";

// Events
pub const EVENTS: &str = "/api/events";
pub const EVENTS_ID: &str = "/api/events/{id}";
pub const POST_EVENTS_ID_REGISTER: &str = "/api/events/{id}/register";
pub const POST_EVENTS_ID_UNREGISTER: &str = "/api/events/{id}/unregister";

// Admin
pub const GET_ADMIN_DASHBOARD_STATS: &str = "/api/admin/dashboard/stats";
pub const GET_ADMIN_USERS: &str = "/api/admin/users";
pub const PUT_ADMIN_USERS_ID_ROLE: &str = "/api/admin/users/{userId}/role";
pub const PUT_ADMIN_USERS_ID_DEACTIVATE: &str = "/api/admin/users/{userId}/deactivate";
pub const GET_ADMIN_RESOURCES: &str = "/api/admin/resources";
pub const PUT_ADMIN_RESOURCES_ID_PUBLISH: &str = "/api/admin/resources/{id}/publish";
pub const PUT_ADMIN_RESOURCES_ID_UNPUBLISH: &str = "/api/admin/resources/{id}/unpublish";
pub const GET_ADMIN_LOGS: &str = "/api/admin/logs";
