//! Milestone model

use serde::{Deserialize, Serialize};

use super::{put, Entity, EntityId, EntityKind, Fields};

/// A project milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Due date (Unix seconds)
    #[serde(default)]
    pub due_on: Option<i64>,
    #[serde(default)]
    pub is_completed: bool,
    /// Completion date (Unix seconds)
    #[serde(default)]
    pub completed_on: Option<i64>,
}

impl Entity for Milestone {
    const KIND: EntityKind = EntityKind::Milestone;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn draft(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone().into());
        put(&mut fields, "description", self.description.clone());
        put(&mut fields, "due_on", self.due_on);
        fields
    }
}
