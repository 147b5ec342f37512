//! Request middleware: authentication, authorization, rate limiting and
//! the persisted request log.

pub mod auth;
pub mod authz;
pub mod rate_limit;
pub mod request_log;
