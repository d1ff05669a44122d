//! Equality policies deciding when a source and a destination record denote
//! the same entity.
//!
//! Free-text fields compare after trimming, with missing and blank values
//! considered equal; the remote service returns `null` and `""` interchangeably.

use crate::models::{Case, Milestone, Section, Suite};
use crate::util::normalized_text;

/// Pure, symmetric comparison over a kind-specific field subset
pub trait EqualityPolicy<T> {
    fn equal(&self, a: &T, b: &T) -> bool;
}

/// Milestones match on name, description, and due date.
///
/// Completion state is not compared: a milestone cannot be created already
/// completed, so a completed source milestone would never converge.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilestoneEquality;

impl EqualityPolicy<Milestone> for MilestoneEquality {
    fn equal(&self, a: &Milestone, b: &Milestone) -> bool {
        a.name == b.name
            && same_text(a.description.as_deref(), b.description.as_deref())
            && a.due_on == b.due_on
    }
}

/// Suites match on name and description.
#[derive(Debug, Clone, Copy, Default)]
pub struct SuiteEquality;

impl EqualityPolicy<Suite> for SuiteEquality {
    fn equal(&self, a: &Suite, b: &Suite) -> bool {
        a.name == b.name && same_text(a.description.as_deref(), b.description.as_deref())
    }
}

/// Sections match on name; only siblings under the same parent are compared.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionEquality;

impl EqualityPolicy<Section> for SectionEquality {
    fn equal(&self, a: &Section, b: &Section) -> bool {
        a.name == b.name
    }
}

/// Cases match on title.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseEquality;

impl EqualityPolicy<Case> for CaseEquality {
    fn equal(&self, a: &Case, b: &Case) -> bool {
        a.title == b.title
    }
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    normalized_text(a) == normalized_text(b)
}
