//! Planning decorator: reads pass through, writes are only recorded.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{label_of, materialize, require_parents, Mutation, Transport};
use crate::error::TransportResult;
use crate::models::{Entity, EntityId, EntityKind, Fields, Scope};

/// Wraps a transport so a full sync can run without touching the destination.
///
/// Planned creates receive synthetic ids counting down from `u64::MAX`; any
/// fetch addressed under such an id returns an empty list, which is exactly
/// what the destination would hold right after the create.
#[derive(Debug)]
pub struct DryRunTransport<R> {
    inner: R,
    plan: Mutex<Plan>,
}

#[derive(Debug)]
struct Plan {
    next_id: u64,
    planned: HashSet<EntityId>,
    mutations: Vec<Mutation>,
}

impl<R> DryRunTransport<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            plan: Mutex::new(Plan {
                next_id: u64::MAX,
                planned: HashSet::new(),
                mutations: Vec::new(),
            }),
        }
    }

    /// Creates and deletes that a real run would have issued, in order
    pub fn planned_mutations(&self) -> Vec<Mutation> {
        self.lock().mutations.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Plan> {
        self.plan.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: Transport> Transport for DryRunTransport<R> {
    async fn fetch<T: Entity>(&self, scope: &Scope) -> TransportResult<Vec<T>> {
        let under_planned = {
            let plan = self.lock();
            scope.parent_ids().any(|id| plan.planned.contains(&id))
        };
        if under_planned {
            return Ok(Vec::new());
        }
        self.inner.fetch(scope).await
    }

    async fn create<T: Entity>(&self, scope: &Scope, fields: Fields) -> TransportResult<T> {
        require_parents(T::KIND, scope)?;
        let mut plan = self.lock();
        let id = EntityId(plan.next_id);
        plan.next_id -= 1;
        plan.planned.insert(id);
        plan.mutations.push(Mutation::Create {
            kind: T::KIND,
            scope: *scope,
            id,
            label: label_of(&fields),
        });
        materialize(fields, id)
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> TransportResult<()> {
        self.lock().mutations.push(Mutation::Delete { kind, id });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::{Section, Suite};
    use crate::transport::MemoryTransport;

    #[tokio::test]
    async fn writes_are_recorded_but_not_applied() {
        let memory = MemoryTransport::new();
        let project = Scope::project(EntityId(1));
        let existing = memory.seed(EntityKind::Suite, &project, json!({"name": "Old"}));
        let dry_run = DryRunTransport::new(&memory);

        let mut fields = Fields::new();
        fields.insert("name".to_string(), "New".into());
        let planned: Suite = dry_run.create(&project, fields).await.unwrap();
        dry_run.delete(EntityKind::Suite, existing).await.unwrap();

        assert_eq!(planned.id, EntityId(u64::MAX));
        assert_eq!(dry_run.planned_mutations().len(), 2);
        assert!(memory.journal().is_empty());
        assert_eq!(memory.records::<Suite>(&project).len(), 1);
    }

    #[tokio::test]
    async fn fetches_under_planned_parents_are_empty() {
        let memory = MemoryTransport::new();
        let project = Scope::project(EntityId(1));
        let dry_run = DryRunTransport::new(&memory);

        let mut fields = Fields::new();
        fields.insert("name".to_string(), "New".into());
        let planned: Suite = dry_run.create(&project, fields).await.unwrap();

        let sections: Vec<Section> = dry_run.fetch(&project.suite(planned.id)).await.unwrap();
        assert!(sections.is_empty());
    }
}
