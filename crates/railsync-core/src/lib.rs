//! railsync-core - Core library for railsync
//!
//! This crate contains the entity models, equality policies, the reconciliation
//! engine, and the transports used to mirror one TestRail project's tree of
//! milestones, suites, sections, and cases into another project.

pub mod config;
pub mod error;
pub mod models;
pub mod policy;
pub mod reconcile;
pub mod sync;
pub mod transport;
pub mod util;

pub use config::{ClientConfig, SyncConfig};
pub use error::{Error, Result, TransportError};
pub use models::{Case, Entity, EntityId, EntityKind, Milestone, Scope, Section, Suite, Synced};
pub use sync::{Orchestrator, SyncReport};
