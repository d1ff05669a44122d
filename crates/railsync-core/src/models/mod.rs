//! Data models for the TestRail entity tree

mod case;
mod milestone;
mod section;
mod suite;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use case::Case;
pub use milestone::Milestone;
pub use section::Section;
pub use suite::Suite;

/// JSON object sent to the remote service when creating a record
pub type Fields = serde_json::Map<String, Value>;

/// Identifier assigned by the remote service (projects included)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<EntityId> for Value {
    fn from(value: EntityId) -> Self {
        Self::from(value.0)
    }
}

/// The four synchronized entity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    Milestone,
    Suite,
    Section,
    Case,
}

impl EntityKind {
    pub const ALL: [Self; 4] = [Self::Milestone, Self::Suite, Self::Section, Self::Case];

    /// Singular name as used in API endpoint names (`add_suite`, `delete_case`)
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Suite => "suite",
            Self::Section => "section",
            Self::Case => "case",
        }
    }

    /// Collection key used by paginated list responses
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Milestone => "milestones",
            Self::Suite => "suites",
            Self::Section => "sections",
            Self::Case => "cases",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parent chain needed to address a sub-collection in the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scope {
    pub project: EntityId,
    pub suite: Option<EntityId>,
    pub section: Option<EntityId>,
}

impl Scope {
    pub const fn project(project: EntityId) -> Self {
        Self {
            project,
            suite: None,
            section: None,
        }
    }

    #[must_use]
    pub const fn suite(self, suite: EntityId) -> Self {
        Self {
            suite: Some(suite),
            ..self
        }
    }

    #[must_use]
    pub const fn section(self, section: EntityId) -> Self {
        Self {
            section: Some(section),
            ..self
        }
    }

    /// Suite and section ids carried by this scope (the project id excluded)
    pub fn parent_ids(&self) -> impl Iterator<Item = EntityId> {
        self.suite.into_iter().chain(self.section)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "project {}", self.project)?;
        if let Some(suite) = self.suite {
            write!(f, " / suite {suite}")?;
        }
        if let Some(section) = self.section {
            write!(f, " / section {section}")?;
        }
        Ok(())
    }
}

/// A record type the synchronizer can reconcile and copy
pub trait Entity: Clone + fmt::Debug + DeserializeOwned {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Human-readable name used in logs and error messages
    fn label(&self) -> &str;

    /// Kind-specific field projection sent on create; never contains `id`
    fn draft(&self) -> Fields;
}

/// A source record paired with the destination record it corresponds to.
///
/// Lives only for the duration of one sync run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Synced<T> {
    pub source: T,
    pub destination_id: EntityId,
}

impl<T: Entity> Synced<T> {
    pub fn id(&self) -> EntityId {
        self.source.id()
    }
}

pub(crate) fn put(fields: &mut Fields, key: &str, value: Option<impl Into<Value>>) {
    if let Some(value) = value {
        fields.insert(key.to_string(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_display_lists_parent_chain() {
        let scope = Scope::project(EntityId(3))
            .suite(EntityId(7))
            .section(EntityId(12));
        assert_eq!(scope.to_string(), "project 3 / suite 7 / section 12");
        assert_eq!(Scope::project(EntityId(3)).to_string(), "project 3");
    }

    #[test]
    fn scope_parent_ids_skip_project() {
        let scope = Scope::project(EntityId(1)).suite(EntityId(2));
        assert_eq!(scope.parent_ids().collect::<Vec<_>>(), vec![EntityId(2)]);
    }

    #[test]
    fn entity_id_is_transparent_on_the_wire() {
        let id: EntityId = serde_json::from_str("42").unwrap();
        assert_eq!(id, EntityId(42));
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
    }

    #[test]
    fn put_skips_missing_values() {
        let mut fields = Fields::new();
        put(&mut fields, "refs", None::<String>);
        put(&mut fields, "estimate", Some("1m"));
        assert!(!fields.contains_key("refs"));
        assert_eq!(fields["estimate"], "1m");
    }
}
