//! Aggregate results and element identity.

use crate::value::Value;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

/// Gives an element a stable identity across versions of itself.
///
/// Two versions of the same domain object (before and after an update)
/// must report the same id. The aggregator keys its member snapshots and
/// cached group lists by this id.
pub trait Identified {
    type Id: Clone + Eq + Hash + Debug;

    fn id(&self) -> Self::Id;
}

macro_rules! impl_identified_by_value {
    ($($ty:ty),*) => {
        $(
            impl Identified for $ty {
                type Id = $ty;

                #[inline]
                fn id(&self) -> Self::Id {
                    *self
                }
            }
        )*
    };
}

impl_identified_by_value!(i8, i16, i32, i64, u8, u16, u32, u64, usize);

/// Snapshot of one group's computed values.
///
/// `values` is positional: entry `i` belongs to the i-th aggregate
/// function of the aggregator that produced it. `None` means the function
/// has no data for the group.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AggregateResult<G> {
    group: G,
    values: Vec<Option<Value>>,
}

impl<G> AggregateResult<G> {
    pub fn new(group: G, values: Vec<Option<Value>>) -> Self {
        Self { group, values }
    }

    /// Returns the group identity.
    #[inline]
    pub fn group(&self) -> &G {
        &self.group
    }

    /// Returns all function results in order.
    #[inline]
    pub fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    /// Returns the result of the function at `index`.
    ///
    /// Returns None both for an out-of-range index and for "no data".
    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.values.get(index).copied().flatten()
    }

    /// Returns the number of function results.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns true if every function reports no data.
    pub fn is_no_data(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// Consumes the result and returns its parts.
    pub fn into_parts(self) -> (G, Vec<Option<Value>>) {
        (self.group, self.values)
    }
}

impl<G: Identified> Identified for AggregateResult<G> {
    type Id = G::Id;

    fn id(&self) -> Self::Id {
        self.group.id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_result_accessors() {
        let result = AggregateResult::new("floor-1", vec![Some(Value::Int(6)), None]);
        assert_eq!(*result.group(), "floor-1");
        assert_eq!(result.len(), 2);
        assert_eq!(result.get(0), Some(Value::Int(6)));
        assert_eq!(result.get(1), None);
        assert_eq!(result.get(5), None);
        assert!(!result.is_no_data());
    }

    #[test]
    fn test_result_no_data() {
        let result = AggregateResult::new(1u32, vec![None, None]);
        assert!(result.is_no_data());
    }

    #[test]
    fn test_integer_identity() {
        assert_eq!(7i64.id(), 7);
        assert_eq!(AggregateResult::new(3u64, vec![]).id(), 3);
    }
}
