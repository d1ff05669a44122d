//! Per-kind fetch, reconcile, delete, match, copy.

use crate::error::{Error, Result, TransportAction, TransportError};
use crate::models::{Entity, EntityId, EntityKind, Fields, Scope, Synced};
use crate::policy::EqualityPolicy;
use crate::reconcile::{find_duplicate, reconcile};
use crate::sync::SyncReport;
use crate::transport::Transport;

/// Applies reconciliations of one sibling group at a time through a transport
#[derive(Debug)]
pub struct EntitySynchronizer<'t, R> {
    transport: &'t R,
    delete_enabled: bool,
}

impl<'t, R: Transport> EntitySynchronizer<'t, R> {
    pub const fn new(transport: &'t R, delete_enabled: bool) -> Self {
        Self {
            transport,
            delete_enabled,
        }
    }

    pub async fn fetch<T: Entity>(&self, scope: &Scope) -> Result<Vec<T>> {
        let records = self
            .transport
            .fetch::<T>(scope)
            .await
            .map_err(wrap(TransportAction::Fetch, T::KIND, scope))?;
        tracing::debug!("Fetched {} {} from {}", records.len(), T::KIND.plural(), scope);
        Ok(records)
    }

    /// Fetch both sides of `T::KIND` and make the destination match the source
    pub async fn sync<T, P>(
        &self,
        policy: &P,
        source_scope: &Scope,
        destination_scope: &Scope,
        report: &mut SyncReport,
    ) -> Result<Vec<Synced<T>>>
    where
        T: Entity,
        P: EqualityPolicy<T>,
    {
        let source = self.fetch::<T>(source_scope).await?;
        let destination = self.fetch::<T>(destination_scope).await?;
        self.apply(
            policy,
            &source,
            &destination,
            source_scope,
            destination_scope,
            T::draft,
            report,
        )
        .await
    }

    /// Reconcile already fetched sibling groups and issue the mutations.
    ///
    /// Returns every source record tagged with its destination id, in source
    /// order. `draft` builds the create payload of a copied record.
    #[allow(clippy::too_many_arguments)]
    pub async fn apply<T, P, D>(
        &self,
        policy: &P,
        source: &[T],
        destination: &[T],
        source_scope: &Scope,
        destination_scope: &Scope,
        draft: D,
        report: &mut SyncReport,
    ) -> Result<Vec<Synced<T>>>
    where
        T: Entity,
        P: EqualityPolicy<T>,
        D: Fn(&T) -> Fields,
    {
        ensure_unique(source, policy, source_scope)?;
        ensure_unique(destination, policy, destination_scope)?;

        let outcome = reconcile(source, destination, policy);
        if outcome.is_noop() {
            tracing::debug!("{} in {} already in sync", T::KIND.plural(), destination_scope);
        }

        for orphan in &outcome.orphans {
            if self.delete_enabled {
                self.transport
                    .delete(T::KIND, orphan.id())
                    .await
                    .map_err(wrap(TransportAction::Delete, T::KIND, destination_scope))?;
                tracing::info!(
                    "Deleted {} '{}' ({}) from {}",
                    T::KIND,
                    orphan.label(),
                    orphan.id(),
                    destination_scope
                );
                report.counts_mut(T::KIND).deleted += 1;
            } else {
                tracing::warn!(
                    "Keeping orphaned {} '{}' ({}) in {}; deletion is disabled",
                    T::KIND,
                    orphan.label(),
                    orphan.id(),
                    destination_scope
                );
                report.counts_mut(T::KIND).orphans_kept += 1;
            }
        }

        let mut destination_ids: Vec<Option<EntityId>> = vec![None; source.len()];
        for entry in &outcome.matches {
            destination_ids[entry.source_index] = Some(entry.destination_id);
        }
        report.counts_mut(T::KIND).matched += outcome.matches.len();

        for &index in &outcome.copies {
            let record = &source[index];
            let created = self
                .transport
                .create::<T>(destination_scope, draft(record))
                .await
                .map_err(wrap(TransportAction::Create, T::KIND, destination_scope))?;
            tracing::info!(
                "Created {} '{}' in {} (source {} -> destination {})",
                T::KIND,
                record.label(),
                destination_scope,
                record.id(),
                created.id()
            );
            destination_ids[index] = Some(created.id());
            report.counts_mut(T::KIND).created += 1;
        }

        Ok(source
            .iter()
            .zip(destination_ids)
            .filter_map(|(record, destination_id)| {
                destination_id.map(|destination_id| Synced {
                    source: record.clone(),
                    destination_id,
                })
            })
            .collect())
    }
}

pub(crate) fn ensure_unique<T, P>(records: &[T], policy: &P, scope: &Scope) -> Result<()>
where
    T: Entity,
    P: EqualityPolicy<T>,
{
    match find_duplicate(records, policy) {
        Some((first, second)) => Err(Error::DuplicateEntity {
            kind: T::KIND,
            scope: scope.to_string(),
            label: first.label().to_string(),
            first: first.id(),
            second: second.id(),
        }),
        None => Ok(()),
    }
}

fn wrap(action: TransportAction, kind: EntityKind, scope: &Scope) -> impl FnOnce(TransportError) -> Error {
    let scope = scope.to_string();
    move |source| Error::Transport {
        action,
        kind,
        scope,
        source,
    }
}
