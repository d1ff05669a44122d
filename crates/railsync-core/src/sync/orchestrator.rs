//! Top-down walk over the entity hierarchy.

use std::collections::{HashMap, VecDeque};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{Case, Entity, EntityId, Milestone, Scope, Section, Suite, Synced};
use crate::policy::{CaseEquality, MilestoneEquality, SectionEquality, SuiteEquality};
use crate::sync::forest::SectionForest;
use crate::sync::synchronizer::ensure_unique;
use crate::sync::{EntitySynchronizer, SyncReport};
use crate::transport::Transport;

/// Progress of a sync run, traced at debug level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Init,
    MilestonesSynced,
    SuitesSynced,
    SectionsSynced { suite: EntityId },
    CasesSynced { section: EntityId },
    Done,
}

/// Drives one sync run from the source project into the destination project.
///
/// Runs are strictly sequential and stop at the first error; whatever was
/// already created or deleted stays that way.
#[derive(Debug)]
pub struct Orchestrator<R> {
    transport: R,
    config: SyncConfig,
}

impl<R: Transport> Orchestrator<R> {
    pub fn new(transport: R, config: SyncConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { transport, config })
    }

    pub async fn sync(&self) -> Result<SyncReport> {
        let mut report = SyncReport::new();
        let synchronizer = EntitySynchronizer::new(&self.transport, self.config.delete_enabled);
        let source = Scope::project(self.config.source_project);
        let destination = Scope::project(self.config.destination_project);
        tracing::info!("Syncing {source} into {destination}");
        trace_stage(SyncStage::Init);

        let milestones = synchronizer
            .sync::<Milestone, _>(&MilestoneEquality, &source, &destination, &mut report)
            .await?;
        let milestone_ids: HashMap<EntityId, EntityId> = milestones
            .iter()
            .map(|milestone| (milestone.id(), milestone.destination_id))
            .collect();
        trace_stage(SyncStage::MilestonesSynced);

        let suites = synchronizer
            .sync::<Suite, _>(&SuiteEquality, &source, &destination, &mut report)
            .await?;
        trace_stage(SyncStage::SuitesSynced);

        for suite in &suites {
            let source_suite = source.suite(suite.id());
            let destination_suite = destination.suite(suite.destination_id);

            let sections =
                sync_sections(&synchronizer, &source_suite, &destination_suite, &mut report)
                    .await?;
            trace_stage(SyncStage::SectionsSynced { suite: suite.id() });

            for section in &sections {
                sync_cases(
                    &synchronizer,
                    &source_suite.section(section.id()),
                    &destination_suite.section(section.destination_id),
                    &milestone_ids,
                    &mut report,
                )
                .await?;
                trace_stage(SyncStage::CasesSynced {
                    section: section.id(),
                });
            }
        }

        report.finish();
        trace_stage(SyncStage::Done);
        tracing::info!(
            "Sync finished: {} changes, {} orphans kept",
            report.mutations(),
            report.orphans_kept()
        );
        Ok(report)
    }
}

/// Reconcile a suite's section forest one sibling group at a time.
///
/// Both flat lists are fetched once and every sibling group on both sides is
/// checked before the first mutation. Children of a source section are
/// compared with the children of its destination counterpart, so a created
/// section's children are all copied. Results come back in fetch order.
async fn sync_sections<R: Transport>(
    synchronizer: &EntitySynchronizer<'_, R>,
    source_scope: &Scope,
    destination_scope: &Scope,
    report: &mut SyncReport,
) -> Result<Vec<Synced<Section>>> {
    let source = synchronizer.fetch::<Section>(source_scope).await?;
    let destination = synchronizer.fetch::<Section>(destination_scope).await?;
    let source_forest = SectionForest::new(&source);
    let destination_forest = SectionForest::new(&destination);
    validate_forest(&source_forest, source_scope)?;
    validate_forest(&destination_forest, destination_scope)?;
    let destination_suite = destination_scope.suite;

    let mut destination_ids: HashMap<EntityId, EntityId> = HashMap::new();
    let mut pending = VecDeque::from([(None, None)]);
    while let Some((source_parent, destination_parent)) = pending.pop_front() {
        let source_group = source_forest.children(source_parent);
        let destination_group = destination_forest.children(destination_parent);
        let draft = |section: &Section| {
            let mut fields = section.draft();
            if let Some(suite) = destination_suite {
                fields.insert("suite_id".to_string(), suite.into());
            }
            if let Some(parent) = destination_parent {
                fields.insert("parent_id".to_string(), parent.into());
            }
            fields
        };

        let synced = synchronizer
            .apply(
                &SectionEquality,
                &source_group,
                &destination_group,
                source_scope,
                destination_scope,
                draft,
                report,
            )
            .await?;
        for section in synced {
            destination_ids.insert(section.id(), section.destination_id);
            pending.push_back((Some(section.id()), Some(section.destination_id)));
        }
    }

    Ok(source
        .into_iter()
        .filter_map(|section| {
            destination_ids
                .get(&section.id)
                .map(|&destination_id| Synced {
                    source: section,
                    destination_id,
                })
        })
        .collect())
}

fn validate_forest(forest: &SectionForest<'_>, scope: &Scope) -> Result<()> {
    let stranded = forest.stranded();
    if !stranded.is_empty() {
        return Err(Error::SectionCycle {
            scope: scope.to_string(),
            sections: stranded,
        });
    }
    for group in forest.groups() {
        ensure_unique(&group, &SectionEquality, scope)?;
    }
    Ok(())
}

/// Cases keep their milestone when it was synced; otherwise the field is dropped
async fn sync_cases<R: Transport>(
    synchronizer: &EntitySynchronizer<'_, R>,
    source_scope: &Scope,
    destination_scope: &Scope,
    milestone_ids: &HashMap<EntityId, EntityId>,
    report: &mut SyncReport,
) -> Result<Vec<Synced<Case>>> {
    let source = synchronizer.fetch::<Case>(source_scope).await?;
    let destination = synchronizer.fetch::<Case>(destination_scope).await?;
    let draft = |case: &Case| {
        let mut fields = case.draft();
        if let Some(milestone) = case
            .milestone_id
            .and_then(|milestone| milestone_ids.get(&milestone))
        {
            fields.insert("milestone_id".to_string(), (*milestone).into());
        }
        fields
    };

    synchronizer
        .apply(
            &CaseEquality,
            &source,
            &destination,
            source_scope,
            destination_scope,
            draft,
            report,
        )
        .await
}

fn trace_stage(stage: SyncStage) {
    tracing::debug!(?stage, "Sync stage reached");
}
