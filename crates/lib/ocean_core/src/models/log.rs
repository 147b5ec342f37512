//! Persisted request activity log.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::UnknownVariant;
use crate::query::{Document, FieldValue, FilterField};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

impl FromStr for LogLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(UnknownVariant::new("log level", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub level: LogLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub endpoint: String,
    pub status_code: u16,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
}

pub const LOG_FILTERS: &[FilterField] = &[
    FilterField::equals("level", "level"),
    FilterField::equals("userId", "userId"),
];

impl Document for LogEntry {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "level" => FieldValue::Text(self.level.as_str()),
            "userId" => self
                .user_id
                .as_deref()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Missing),
            "endpoint" => FieldValue::Text(&self.endpoint),
            "statusCode" => FieldValue::Number(i64::from(self.status_code)),
            "createdAt" => FieldValue::Time(self.created_at),
            _ => FieldValue::Missing,
        }
    }
}
