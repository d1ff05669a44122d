//! In-memory stand-in for the remote service.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use super::{label_of, materialize, require_parents, Mutation, Transport};
use crate::error::{TransportAction, TransportError, TransportResult};
use crate::models::{Entity, EntityId, EntityKind, Fields, Scope};

type Bucket = (EntityKind, Scope);

/// Records kept as JSON objects per kind and scope, with sequential ids and
/// the cascade rules of the remote service (deleting a suite removes its
/// sections and cases, deleting a section removes its descendants).
#[derive(Debug, Default)]
pub struct MemoryTransport {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    next_id: u64,
    buckets: HashMap<Bucket, Vec<Fields>>,
    journal: Vec<Mutation>,
    failures: HashSet<(TransportAction, EntityKind)>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record without journaling it; returns the assigned id
    pub fn seed(&self, kind: EntityKind, scope: &Scope, fields: Value) -> EntityId {
        let mut state = self.lock();
        let id = state.allocate_id();
        let mut record = match fields {
            Value::Object(map) => map,
            _ => Fields::new(),
        };
        record.insert("id".to_string(), id.into());
        fill_parent_fields(kind, scope, &mut record);
        state.buckets.entry((kind, *scope)).or_default().push(record);
        id
    }

    /// Typed snapshot of the records under `scope`
    pub fn records<T: Entity>(&self, scope: &Scope) -> Vec<T> {
        self.lock()
            .buckets
            .get(&(T::KIND, *scope))
            .map(|records| {
                records
                    .iter()
                    .filter_map(|record| serde_json::from_value(Value::Object(record.clone())).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Mutating calls received so far, in order
    pub fn journal(&self) -> Vec<Mutation> {
        self.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.lock().journal.clear();
    }

    /// Make every subsequent `action` on `kind` fail with an API error
    pub fn fail_on(&self, action: TransportAction, kind: EntityKind) {
        self.lock().failures.insert((action, kind));
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MemoryState {
    fn allocate_id(&mut self) -> EntityId {
        self.next_id += 1;
        EntityId(self.next_id)
    }

    fn check(&self, action: TransportAction, kind: EntityKind) -> TransportResult<()> {
        if self.failures.contains(&(action, kind)) {
            return Err(TransportError::Api {
                status: 500,
                message: format!("injected {action} failure for {kind}"),
            });
        }
        Ok(())
    }

    fn locate(&self, kind: EntityKind, id: EntityId) -> Option<Bucket> {
        self.buckets.iter().find_map(|(bucket, records)| {
            (bucket.0 == kind && records.iter().any(|record| record_id(record) == Some(id)))
                .then_some(*bucket)
        })
    }

    fn remove(&mut self, kind: EntityKind, id: EntityId) -> TransportResult<()> {
        let bucket = self
            .locate(kind, id)
            .ok_or(TransportError::NotFound { kind, id })?;
        if let Some(records) = self.buckets.get_mut(&bucket) {
            records.retain(|record| record_id(record) != Some(id));
        }

        match kind {
            EntityKind::Suite => self.buckets.retain(|(bucket_kind, scope), _| {
                !(matches!(bucket_kind, EntityKind::Section | EntityKind::Case)
                    && scope.suite == Some(id))
            }),
            EntityKind::Section => {
                let removed = self.remove_descendants(&bucket, id);
                self.buckets.retain(|(bucket_kind, scope), _| {
                    !(*bucket_kind == EntityKind::Case
                        && scope.section.is_some_and(|section| removed.contains(&section)))
                });
            }
            EntityKind::Milestone | EntityKind::Case => {}
        }
        Ok(())
    }

    /// Drop every section below `root` in its bucket; returns `root` and the
    /// removed descendants
    fn remove_descendants(&mut self, bucket: &Bucket, root: EntityId) -> HashSet<EntityId> {
        let mut removed = HashSet::from([root]);
        let Some(records) = self.buckets.get_mut(bucket) else {
            return removed;
        };
        loop {
            let before = records.len();
            records.retain(|record| {
                let parent = record
                    .get("parent_id")
                    .and_then(Value::as_u64)
                    .map(EntityId);
                match parent {
                    Some(parent) if removed.contains(&parent) => {
                        if let Some(id) = record_id(record) {
                            removed.insert(id);
                        }
                        false
                    }
                    _ => true,
                }
            });
            if records.len() == before {
                return removed;
            }
        }
    }
}

impl Transport for MemoryTransport {
    async fn fetch<T: Entity>(&self, scope: &Scope) -> TransportResult<Vec<T>> {
        require_parents(T::KIND, scope)?;
        let state = self.lock();
        state.check(TransportAction::Fetch, T::KIND)?;
        let records = state
            .buckets
            .get(&(T::KIND, *scope))
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .map(Value::Object)
            .collect::<Vec<_>>();
        Ok(serde_json::from_value(Value::Array(records))?)
    }

    async fn create<T: Entity>(&self, scope: &Scope, mut fields: Fields) -> TransportResult<T> {
        require_parents(T::KIND, scope)?;
        let mut state = self.lock();
        state.check(TransportAction::Create, T::KIND)?;
        let id = state.allocate_id();
        fill_parent_fields(T::KIND, scope, &mut fields);
        let created = materialize::<T>(fields.clone(), id)?;
        state.journal.push(Mutation::Create {
            kind: T::KIND,
            scope: *scope,
            id,
            label: label_of(&fields),
        });
        fields.insert("id".to_string(), id.into());
        state.buckets.entry((T::KIND, *scope)).or_default().push(fields);
        Ok(created)
    }

    async fn delete(&self, kind: EntityKind, id: EntityId) -> TransportResult<()> {
        let mut state = self.lock();
        state.check(TransportAction::Delete, kind)?;
        state.remove(kind, id)?;
        state.journal.push(Mutation::Delete { kind, id });
        Ok(())
    }
}

fn record_id(record: &Fields) -> Option<EntityId> {
    record.get("id").and_then(Value::as_u64).map(EntityId)
}

fn fill_parent_fields(kind: EntityKind, scope: &Scope, record: &mut Fields) {
    match kind {
        EntityKind::Section => {
            if let Some(suite) = scope.suite {
                record.entry("suite_id").or_insert_with(|| suite.into());
            }
        }
        EntityKind::Case => {
            if let Some(section) = scope.section {
                record.insert("section_id".to_string(), section.into());
            }
        }
        EntityKind::Milestone | EntityKind::Suite => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::{Case, Section, Suite};

    const PROJECT: EntityId = EntityId(1);

    #[tokio::test]
    async fn create_assigns_ids_and_journals() {
        let transport = MemoryTransport::new();
        let scope = Scope::project(PROJECT);
        let mut fields = Fields::new();
        fields.insert("name".to_string(), "Smoke".into());

        let suite: Suite = transport.create(&scope, fields).await.unwrap();
        let listed: Vec<Suite> = transport.fetch(&scope).await.unwrap();

        assert_eq!(listed, vec![suite.clone()]);
        assert_eq!(
            transport.journal(),
            vec![Mutation::Create {
                kind: EntityKind::Suite,
                scope,
                id: suite.id,
                label: "Smoke".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn deleting_a_suite_drops_its_sections_and_cases() {
        let transport = MemoryTransport::new();
        let project = Scope::project(PROJECT);
        let suite = transport.seed(EntityKind::Suite, &project, json!({"name": "Regression"}));
        let suite_scope = project.suite(suite);
        let section = transport.seed(EntityKind::Section, &suite_scope, json!({"name": "Login"}));
        transport.seed(
            EntityKind::Case,
            &suite_scope.section(section),
            json!({"title": "Valid password"}),
        );

        transport.delete(EntityKind::Suite, suite).await.unwrap();

        assert!(transport.records::<Section>(&suite_scope).is_empty());
        assert!(transport
            .records::<Case>(&suite_scope.section(section))
            .is_empty());
    }

    #[tokio::test]
    async fn deleting_a_section_cascades_to_descendants() {
        let transport = MemoryTransport::new();
        let scope = Scope::project(PROJECT).suite(EntityId(50));
        let root = transport.seed(EntityKind::Section, &scope, json!({"name": "Root"}));
        let child = transport.seed(
            EntityKind::Section,
            &scope,
            json!({"name": "Child", "parent_id": root.0}),
        );
        transport.seed(
            EntityKind::Section,
            &scope,
            json!({"name": "Grandchild", "parent_id": child.0}),
        );
        let sibling = transport.seed(EntityKind::Section, &scope, json!({"name": "Sibling"}));
        transport.seed(EntityKind::Case, &scope.section(child), json!({"title": "Deep"}));

        transport.delete(EntityKind::Section, root).await.unwrap();

        let left = transport.records::<Section>(&scope);
        assert_eq!(left.iter().map(|s| s.id).collect::<Vec<_>>(), vec![sibling]);
        assert!(transport.records::<Case>(&scope.section(child)).is_empty());
    }

    #[tokio::test]
    async fn deleting_unknown_record_fails() {
        let transport = MemoryTransport::new();
        let error = transport
            .delete(EntityKind::Case, EntityId(99))
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::NotFound { .. }));
        assert!(transport.journal().is_empty());
    }

    #[tokio::test]
    async fn injected_failures_surface_as_api_errors() {
        let transport = MemoryTransport::new();
        transport.fail_on(TransportAction::Fetch, EntityKind::Suite);
        let error = transport
            .fetch::<Suite>(&Scope::project(PROJECT))
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::Api { status: 500, .. }));
    }
}
