//! Three-way classification of two same-kind record lists.
//!
//! Given the source and destination siblings of one scope, [`reconcile`] finds
//! the destination orphans (no equal source record), the source records that
//! already have an equal destination counterpart, and the source records that
//! must be copied. Lists are small (tens to low hundreds), so the quadratic
//! scan is fine.

use crate::models::{Entity, EntityId};
use crate::policy::EqualityPolicy;

/// A source record bound to an existing destination record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match {
    /// Position of the source record in the source list
    pub source_index: usize,
    pub destination_id: EntityId,
}

/// Outcome of reconciling one sibling group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation<'a, T> {
    /// Destination records with no equal source record, in destination order
    pub orphans: Vec<&'a T>,
    /// Source records with an equal destination record, in source order
    pub matches: Vec<Match>,
    /// Positions of source records with no destination counterpart
    pub copies: Vec<usize>,
}

impl<T> Reconciliation<'_, T> {
    /// Destination id bound to the source record at `source_index`, if any
    pub fn destination_for(&self, source_index: usize) -> Option<EntityId> {
        self.matches
            .iter()
            .find(|entry| entry.source_index == source_index)
            .map(|entry| entry.destination_id)
    }

    pub fn is_noop(&self) -> bool {
        self.orphans.is_empty() && self.copies.is_empty()
    }
}

/// Classify `source` against `destination` under `policy`.
///
/// Orphan detection iterates the destination list outermost, so duplicate
/// source records never keep an unrelated destination record alive. Matching
/// iterates the source list outermost and binds each source record to the
/// first equal destination record by position.
pub fn reconcile<'a, T, P>(source: &'a [T], destination: &'a [T], policy: &P) -> Reconciliation<'a, T>
where
    T: Entity,
    P: EqualityPolicy<T>,
{
    let orphans = destination
        .iter()
        .filter(|dest| !source.iter().any(|src| policy.equal(src, dest)))
        .collect::<Vec<_>>();

    let mut matches = Vec::new();
    let mut copies = Vec::new();
    for (source_index, src) in source.iter().enumerate() {
        match destination.iter().find(|dest| policy.equal(src, dest)) {
            Some(dest) => matches.push(Match {
                source_index,
                destination_id: dest.id(),
            }),
            None => copies.push(source_index),
        }
    }

    Reconciliation {
        orphans,
        matches,
        copies,
    }
}

/// First pair of distinct records in `records` that `policy` cannot tell apart
pub fn find_duplicate<'a, T, P>(records: &'a [T], policy: &P) -> Option<(&'a T, &'a T)>
where
    T: Entity,
    P: EqualityPolicy<T>,
{
    records.iter().enumerate().find_map(|(index, first)| {
        records[index + 1..]
            .iter()
            .find(|second| policy.equal(first, second))
            .map(|second| (first, second))
    })
}
