//! Suite model

use serde::{Deserialize, Serialize};

use super::{put, Entity, EntityId, EntityKind, Fields};

/// A test suite; owns a tree of sections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suite {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Entity for Suite {
    const KIND: EntityKind = EntityKind::Suite;

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
        fields
    }
}
