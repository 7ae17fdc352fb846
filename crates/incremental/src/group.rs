//! Per-group state owned by an aggregator.

use crate::function::BoxedFunction;
use alloc::vec::Vec;
use hashbrown::HashMap;
use wattle_core::{AggregateResult, Error, Identified, Result, Value};

/// A member snapshot and the value it folded into each function.
struct Member<T> {
    element: T,
    /// Positional: entry `i` was folded into function `i`
    contributions: Vec<Option<Value>>,
}

/// Current members of one group and their running aggregates.
///
/// Members are stored as owned snapshots keyed by element id, together
/// with the values they folded in. Removing a member retracts those stored
/// values, so the retraction always mirrors what was folded, whatever the
/// caller's copy or the extractors' inputs look like now.
pub struct Group<T: Identified, G> {
    id: G,
    members: HashMap<T::Id, Member<T>>,
    functions: Vec<BoxedFunction<T>>,
    /// Last result sent downstream, if the group is currently visible
    last_result: Option<AggregateResult<G>>,
    /// Retractions since the accumulators were last rebuilt
    retractions: u32,
}

impl<T: Identified, G> Group<T, G> {
    pub(crate) fn new(id: G, functions: Vec<BoxedFunction<T>>) -> Self {
        Self {
            id,
            members: HashMap::new(),
            functions,
            last_result: None,
            retractions: 0,
        }
    }

    /// Returns the group identity.
    #[inline]
    pub fn id(&self) -> &G {
        &self.id
    }

    /// Returns the number of members.
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns true if the group has no members.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns true if the element with `id` is a member.
    #[inline]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.members.contains_key(id)
    }

    /// Returns the stored snapshot of a member.
    #[inline]
    pub fn member(&self, id: &T::Id) -> Option<&T> {
        self.members.get(id).map(|m| &m.element)
    }

    /// Returns the values a member folded in, positionally.
    pub fn contributions(&self, id: &T::Id) -> Option<&[Option<Value>]> {
        self.members.get(id).map(|m| m.contributions.as_slice())
    }

    /// Iterates over the member snapshots in no particular order.
    pub fn members(&self) -> impl Iterator<Item = &T> + '_ {
        self.members.values().map(|m| &m.element)
    }

    /// Returns the group's functions in configuration order.
    #[inline]
    pub fn functions(&self) -> &[BoxedFunction<T>] {
        &self.functions
    }

    /// Returns the current value of every function, positionally.
    pub fn values(&self) -> Vec<Option<Value>> {
        self.functions.iter().map(|f| f.value()).collect()
    }

    /// Returns the last result sent downstream for this group.
    #[inline]
    pub fn last_result(&self) -> Option<&AggregateResult<G>> {
        self.last_result.as_ref()
    }

    /// Returns true if any function may carry rounding residue.
    pub fn is_lossy(&self) -> bool {
        self.functions.iter().any(|f| f.is_lossy())
    }

    #[inline]
    pub(crate) fn retractions(&self) -> u32 {
        self.retractions
    }

    pub(crate) fn set_last_result(&mut self, result: Option<AggregateResult<G>>) {
        self.last_result = result;
    }

    pub(crate) fn take_last_result(&mut self) -> Option<AggregateResult<G>> {
        self.last_result.take()
    }

    /// Rebuilds every accumulator from the member snapshots.
    ///
    /// Extractors run again here, so the stored contributions are
    /// refreshed along with the accumulators.
    ///
    /// Returns true if any function value changed as a result.
    pub(crate) fn rederive(&mut self) -> bool {
        let before = self.values();
        for function in &mut self.functions {
            function.reset();
        }
        for member in self.members.values_mut() {
            member.contributions = self
                .functions
                .iter_mut()
                .map(|f| f.fold_element(&member.element))
                .collect();
        }
        self.retractions = 0;
        self.values() != before
    }
}

impl<T: Identified, G: core::fmt::Debug> Group<T, G> {
    /// Adds a member and folds its contribution into every function.
    pub(crate) fn add(&mut self, element: T) -> Result<()> {
        let id = element.id();
        if self.members.contains_key(&id) {
            return Err(Error::duplicate_member(&id));
        }
        let contributions = self
            .functions
            .iter_mut()
            .map(|f| f.fold_element(&element))
            .collect();
        self.members.insert(
            id,
            Member {
                element,
                contributions,
            },
        );
        Ok(())
    }

    /// Removes a member and retracts the values it folded in.
    ///
    /// Returns the removed snapshot.
    pub(crate) fn remove(&mut self, id: &T::Id) -> Result<T> {
        let member = self
            .members
            .remove(id)
            .ok_or_else(|| Error::missing_member(&self.id, id))?;
        for (function, contribution) in self.functions.iter_mut().zip(member.contributions) {
            if let Some(value) = contribution {
                function.retract(value);
            }
        }
        self.retractions = self.retractions.saturating_add(1);
        Ok(member.element)
    }
}

impl<T: Identified, G: Clone> Group<T, G> {
    /// Builds the positional result tuple from the current accumulators.
    pub fn result(&self) -> AggregateResult<G> {
        AggregateResult::new(self.id.clone(), self.values())
    }
}
