//! Error types for railsync-core

use std::fmt;

use thiserror::Error;

use crate::models::{EntityId, EntityKind};

/// Result type alias using railsync-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a sync run
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid settings, raised before any remote call
    #[error("Configuration error: {0}")]
    Config(String),

    /// Two sibling records are equal under the kind's equality policy
    #[error(
        "Duplicate {kind} '{label}' in {scope}: records {first} and {second} cannot be told apart"
    )]
    DuplicateEntity {
        kind: EntityKind,
        scope: String,
        label: String,
        first: EntityId,
        second: EntityId,
    },

    /// Sections whose `parent_id` chain loops back instead of reaching a root
    #[error("Sections {} in {scope} form a parent cycle", join_ids(.sections))]
    SectionCycle {
        scope: String,
        sections: Vec<EntityId>,
    },

    /// A fetch, create, or delete call failed
    #[error("Failed to {action} {kind} in {scope}: {source}")]
    Transport {
        action: TransportAction,
        kind: EntityKind,
        scope: String,
        #[source]
        source: TransportError,
    },
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

fn join_ids(ids: &[EntityId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Remote operation that was in flight when a transport error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportAction {
    Fetch,
    Create,
    Delete,
}

impl fmt::Display for TransportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = match self {
            Self::Fetch => "fetch",
            Self::Create => "create",
            Self::Delete => "delete",
        };
        f.write_str(action)
    }
}

/// Failures reported by a [`crate::transport::Transport`]
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("TestRail API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),
    #[error("Cannot address {kind} records from {scope}")]
    IncompleteScope { kind: EntityKind, scope: String },
    #[error("No {kind} with id {id}")]
    NotFound { kind: EntityKind, id: EntityId },
    #[error("Failed to decode JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TransportResult<T> = std::result::Result<T, TransportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_names_action_and_scope() {
        let error = Error::Transport {
            action: TransportAction::Create,
            kind: EntityKind::Suite,
            scope: "project 2".to_string(),
            source: TransportError::Api {
                status: 403,
                message: "no access".to_string(),
            },
        };
        assert_eq!(
            error.to_string(),
            "Failed to create suite in project 2: TestRail API error: no access (403)"
        );
    }

    #[test]
    fn duplicate_error_mentions_both_ids() {
        let error = Error::DuplicateEntity {
            kind: EntityKind::Suite,
            scope: "project 1".to_string(),
            label: "Regression".to_string(),
            first: EntityId(4),
            second: EntityId(9),
        };
        let rendered = error.to_string();
        assert!(rendered.contains("'Regression'"));
        assert!(rendered.contains("records 4 and 9"));
    }

    #[test]
    fn section_cycle_lists_every_id() {
        let error = Error::SectionCycle {
            scope: "project 1 / suite 3".to_string(),
            sections: vec![EntityId(7), EntityId(8)],
        };
        assert_eq!(
            error.to_string(),
            "Sections 7, 8 in project 1 / suite 3 form a parent cycle"
        );
    }
}
