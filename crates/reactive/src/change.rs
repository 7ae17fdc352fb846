//! Row-level changes of a result table.

use wattle_core::AggregateResult;

/// One change to a `TableSink`, as seen by subscribers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableChange<G> {
    /// A group appeared.
    Added(AggregateResult<G>),
    /// A group's values were replaced.
    Modified {
        old: AggregateResult<G>,
        new: AggregateResult<G>,
    },
    /// A group disappeared; carries the last row held for it.
    Removed(AggregateResult<G>),
}

impl<G> TableChange<G> {
    /// Returns the group the change is about.
    pub fn group(&self) -> &G {
        match self {
            TableChange::Added(row) | TableChange::Removed(row) => row.group(),
            TableChange::Modified { new, .. } => new.group(),
        }
    }

    /// Returns the row present after the change, if any.
    pub fn current(&self) -> Option<&AggregateResult<G>> {
        match self {
            TableChange::Added(row) => Some(row),
            TableChange::Modified { new, .. } => Some(new),
            TableChange::Removed(_) => None,
        }
    }

    /// Returns the row present before the change, if any.
    pub fn previous(&self) -> Option<&AggregateResult<G>> {
        match self {
            TableChange::Added(_) => None,
            TableChange::Modified { old, .. } => Some(old),
            TableChange::Removed(row) => Some(row),
        }
    }

    #[inline]
    pub fn is_added(&self) -> bool {
        matches!(self, TableChange::Added(_))
    }

    #[inline]
    pub fn is_modified(&self) -> bool {
        matches!(self, TableChange::Modified { .. })
    }

    #[inline]
    pub fn is_removed(&self) -> bool {
        matches!(self, TableChange::Removed(_))
    }
}
