//! Stateful filter transform.

use crate::processor::Transform;
use alloc::vec::Vec;
use hashbrown::HashSet;
use log::trace;
use wattle_core::{Identified, Operation};

/// Passes elements matching a predicate.
///
/// Remembers which element ids are currently passed so the downstream
/// view stays consistent when an element crosses the predicate boundary:
/// an update that starts matching becomes an `Insert`, one that stops
/// matching becomes a `Delete`, and deletes of never-passed elements are
/// dropped.
pub struct Filter<T: Identified, P> {
    predicate: P,
    passed: HashSet<T::Id>,
}

impl<T, P> Filter<T, P>
where
    T: Identified,
    P: FnMut(&T) -> bool,
{
    pub fn new(predicate: P) -> Self {
        Self {
            predicate,
            passed: HashSet::new(),
        }
    }

    /// Returns the number of elements currently passed downstream.
    #[inline]
    pub fn passed_count(&self) -> usize {
        self.passed.len()
    }

    #[inline]
    pub fn is_passed(&self, id: &T::Id) -> bool {
        self.passed.contains(id)
    }
}

impl<T, P> Transform<T, T> for Filter<T, P>
where
    T: Identified,
    P: FnMut(&T) -> bool,
{
    fn transform_insert(&mut self, element: T) -> Vec<Operation<T>> {
        if !(self.predicate)(&element) {
            return Vec::new();
        }
        self.passed.insert(element.id());
        alloc::vec![Operation::Insert(element)]
    }

    fn transform_update(&mut self, element: T) -> Vec<Operation<T>> {
        let id = element.id();
        let was = self.passed.contains(&id);
        let now = (self.predicate)(&element);
        match (was, now) {
            (true, true) => alloc::vec![Operation::Update(element)],
            (false, true) => {
                trace!("{:?} now passes the filter", id);
                self.passed.insert(id);
                alloc::vec![Operation::Insert(element)]
            }
            (true, false) => {
                trace!("{:?} no longer passes the filter", id);
                self.passed.remove(&id);
                alloc::vec![Operation::Delete(element)]
            }
            (false, false) => Vec::new(),
        }
    }

    fn transform_delete(&mut self, element: T) -> Vec<Operation<T>> {
        if self.passed.remove(&element.id()) {
            alloc::vec![Operation::Delete(element)]
        } else {
            Vec::new()
        }
    }
}
