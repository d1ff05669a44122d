//! Case model

use serde::{Deserialize, Serialize};

use super::{put, Entity, EntityId, EntityKind, Fields};

/// A test case inside a section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Case {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub section_id: Option<EntityId>,
    #[serde(default)]
    pub type_id: Option<u64>,
    #[serde(default)]
    pub priority_id: Option<u64>,
    #[serde(default)]
    pub estimate: Option<String>,
    #[serde(default)]
    pub milestone_id: Option<EntityId>,
    #[serde(default)]
    pub refs: Option<String>,
}

impl Entity for Case {
    const KIND: EntityKind = EntityKind::Case;

    fn id(&self) -> EntityId {
        self.id
    }

    fn label(&self) -> &str {
        &self.title
    }

    /// `milestone_id` is left out; it refers to a source-project milestone and
    /// is remapped by the orchestrator.
    fn draft(&self) -> Fields {
        let mut fields = Fields::new();
        fields.insert("title".to_string(), self.title.clone().into());
        put(&mut fields, "type_id", self.type_id);
        put(&mut fields, "priority_id", self.priority_id);
        put(&mut fields, "estimate", self.estimate.clone());
        put(&mut fields, "refs", self.refs.clone());
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_projects_case_fields() {
        let case = Case {
            id: EntityId(100),
            title: "User can log in".to_string(),
            section_id: Some(EntityId(3)),
            type_id: Some(1),
            priority_id: Some(2),
            estimate: Some("30s".to_string()),
            milestone_id: Some(EntityId(7)),
            refs: None,
        };
        let draft = case.draft();
        assert_eq!(draft["title"], "User can log in");
        assert_eq!(draft["priority_id"], 2);
        assert!(!draft.contains_key("refs"));
        assert!(!draft.contains_key("milestone_id"));
        assert!(!draft.contains_key("section_id"));
    }
}
