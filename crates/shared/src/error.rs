use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error payload returned by the remote store alongside a non-success status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl StoreErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }
}

impl fmt::Display for StoreErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some(details) = &self.details {
            write!(f, " ({details})")?;
        }
        Ok(())
    }
}

/// Any failed read against the record store. Callers treat every variant the
/// same way; the split only feeds diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadFailure {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("store rejected query{}: {body}", status_suffix(.status))]
    Store {
        status: Option<u16>,
        body: StoreErrorBody,
    },
    #[error("malformed store response: {0}")]
    Malformed(String),
}

impl ReadFailure {
    pub fn store(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Store {
            status,
            body: StoreErrorBody::new(message),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|status| format!(" with status {status}"))
        .unwrap_or_default()
}
