//! Transport seam between the synchronizers and the remote service.
//!
//! The synchronizers only ever see [`Transport`]; the HTTP client, the
//! in-memory service used by tests, and the dry-run planner all plug in here.

mod dry_run;
mod http;
mod memory;

use serde_json::Value;

use crate::error::{TransportError, TransportResult};
use crate::models::{Entity, EntityId, EntityKind, Fields, Scope};

pub use dry_run::DryRunTransport;
pub use http::HttpTransport;
pub use memory::MemoryTransport;

/// Fetch, create, and delete records of any entity kind.
///
/// Calls are awaited one at a time by the synchronizers; implementations need
/// not support overlapping requests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// List the records of `T::KIND` directly under `scope`
    async fn fetch<T: Entity>(&self, scope: &Scope) -> TransportResult<Vec<T>>;

    /// Create a record of `T::KIND` under `scope` and return it with its new id
    async fn create<T: Entity>(&self, scope: &Scope, fields: Fields) -> TransportResult<T>;

    async fn delete(&self, kind: EntityKind, id: EntityId) -> TransportResult<()>;
}

impl<R: Transport> Transport for &R {
    async fn fetch<T: Entity>(&self, scope: &Scope) -> TransportResult<Vec<T>> {
        (**self).fetch(scope).await
    }

    async fn create<T: Entity>(&self, scope: &Scope, fields: Fields) -> TransportResult<T> {
        (**self).create(scope, fields).await
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> TransportResult<()> {
        (**self).delete(kind, id).await
    }
}

/// A mutating call recorded by the in-memory and dry-run transports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create {
        kind: EntityKind,
        scope: Scope,
        id: EntityId,
        label: String,
    },
    Delete {
        kind: EntityKind,
        id: EntityId,
    },
}

impl Mutation {
    pub const fn is_create(&self) -> bool {
        matches!(self, Self::Create { .. })
    }
}

/// Ensure the scope carries the parent ids needed to address `kind`
pub(crate) fn require_parents(kind: EntityKind, scope: &Scope) -> TransportResult<()> {
    let complete = match kind {
        EntityKind::Milestone | EntityKind::Suite => true,
        EntityKind::Section => scope.suite.is_some(),
        EntityKind::Case => scope.suite.is_some() && scope.section.is_some(),
    };
    if complete {
        Ok(())
    } else {
        Err(TransportError::IncompleteScope {
            kind,
            scope: scope.to_string(),
        })
    }
}

/// Build the record a create call returns from the submitted fields
pub(crate) fn materialize<T: Entity>(mut fields: Fields, id: EntityId) -> TransportResult<T> {
    fields.insert("id".to_string(), id.into());
    Ok(serde_json::from_value(Value::Object(fields))?)
}

pub(crate) fn label_of(fields: &Fields) -> String {
    fields
        .get("name")
        .or_else(|| fields.get("title"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
