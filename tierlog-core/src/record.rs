use std::{backtrace::Backtrace, error::Error, fmt::Display};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::level::Level;

pub const ERROR_KEY: &str = "error";
pub const STACKTRACE_KEY: &str = "stacktrace";

/// A structured key/value attached to a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub key: String,
    pub value: Value,
}

impl Field {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Renders the value with its `Display` implementation.
    pub fn display(key: impl Into<String>, value: &impl Display) -> Self {
        Self::new(key, value.to_string())
    }

    /// Serializes the value to JSON. Values that fail to serialize are kept as
    /// the serialization error message.
    pub fn serialize(key: impl Into<String>, value: &impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or_else(|err| Value::String(err.to_string()));
        Self::new(key, value)
    }

    /// The `error` and `stacktrace` fields for an error, with the trace captured
    /// at the call site.
    pub fn error_with_stack(err: &dyn Error) -> [Field; 2] {
        let stack = Backtrace::force_capture().to_string();
        [
            Field::new(ERROR_KEY, err.to_string()),
            Field::new(STACKTRACE_KEY, stack),
        ]
    }
}

/// A single log call, shared between every sink that accepts it.
#[derive(Debug, Clone)]
pub struct Record {
    pub level: Level,
    pub time: DateTime<Utc>,
    pub message: String,
    pub fields: Vec<Field>,
}

impl Record {
    pub fn new(level: Level, message: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            level,
            time: Utc::now(),
            message: message.into(),
            fields,
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|f| f.key == key).map(|f| &f.value)
    }
}
