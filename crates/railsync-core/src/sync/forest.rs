//! Parent/child view over a suite's flat section list

use std::collections::HashSet;

use crate::models::{EntityId, Section};

#[derive(Debug)]
pub(crate) struct SectionForest<'a> {
    sections: &'a [Section],
    ids: HashSet<EntityId>,
}

impl<'a> SectionForest<'a> {
    pub(crate) fn new(sections: &'a [Section]) -> Self {
        Self {
            sections,
            ids: sections.iter().map(|section| section.id).collect(),
        }
    }

    /// Parent of `section` within this list; a dangling `parent_id` makes it a root
    fn parent_of(&self, section: &Section) -> Option<EntityId> {
        section.parent_id.filter(|parent| self.ids.contains(parent))
    }

    /// Sections directly below `parent` (`None` for the roots), in list order
    pub(crate) fn children(&self, parent: Option<EntityId>) -> Vec<Section> {
        self.sections
            .iter()
            .filter(|section| self.parent_of(section) == parent)
            .cloned()
            .collect()
    }

    /// Every non-empty sibling group, roots first
    pub(crate) fn groups(&self) -> impl Iterator<Item = Vec<Section>> + '_ {
        std::iter::once(None)
            .chain(self.sections.iter().map(|section| Some(section.id)))
            .map(|parent| self.children(parent))
            .filter(|group| !group.is_empty())
    }

    /// Sections whose parent chain loops instead of reaching a root, in list order
    pub(crate) fn stranded(&self) -> Vec<EntityId> {
        let mut reachable = HashSet::new();
        let mut pending = vec![None];
        while let Some(parent) = pending.pop() {
            for section in self.children(parent) {
                if reachable.insert(section.id) {
                    pending.push(Some(section.id));
                }
            }
        }
        self.sections
            .iter()
            .map(|section| section.id)
            .filter(|id| !reachable.contains(id))
            .collect()
    }
}
