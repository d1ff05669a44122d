//! One-way synchronization of a project's tree into another project.
//!
//! [`Orchestrator`] walks milestones, suites, sections, and cases top-down and
//! hands each sibling group to an [`EntitySynchronizer`], which reconciles it
//! and issues the deletes and creates through the [`crate::transport::Transport`].

mod forest;
mod orchestrator;
mod report;
mod synchronizer;

pub use orchestrator::{Orchestrator, SyncStage};
pub use report::{KindCounts, SyncReport};
pub use synchronizer::EntitySynchronizer;
