//! Section model

use serde::{Deserialize, Serialize};

use super::{put, Entity, EntityId, EntityKind, Fields};

/// A section inside a suite; sections nest through `parent_id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub suite_id: Option<EntityId>,
    #[serde(default)]
    pub parent_id: Option<EntityId>,
}

impl Entity for Section {
    const KIND: EntityKind = EntityKind::Section;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    /// `suite_id` and `parent_id` are left out: they must point into the
    /// destination tree and are filled in by the section synchronizer.
    fn draft(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("name".to_string(), self.name.clone().into());
        put(&mut fields, "description", self.description.clone());
        fields
    }
}
