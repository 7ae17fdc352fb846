//! Grouping aggregator.
//!
//! The aggregator assigns every incoming element to zero or more groups,
//! keeps one set of running aggregate functions per group, and emits an
//! `AggregateResult` operation downstream each time a group changes:
//!
//! - `Insert` when a group first becomes visible
//! - `Update` when a visible group's values are recomputed
//! - `Delete` carrying the last result when a group is destroyed or its
//!   result is suppressed
//!
//! Membership is recorded when an element is inserted or updated and that
//! record, not a fresh `groups()` query, decides what a later update or
//! delete retracts. Group lookups that walk mutable ancestor state can
//! therefore change between calls without corrupting any accumulator.

use crate::config::AggregatorConfig;
use crate::function::BoxedFunction;
use crate::group::Group;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::HashMap;
use log::{debug, error, trace, warn};
use wattle_core::{
    AggregateResult, Emitter, Error, Identified, Operation, Result, Sink, SinkHandle, SinkId,
    Source, Value,
};

/// Grouping and aggregation behavior supplied to an aggregator.
pub trait AggregateStrategy<T: Identified> {
    /// Group identity.
    type GroupId: Clone + Eq + Hash + Debug;

    /// Creates the private accumulators of a new group.
    ///
    /// Must return the same functions in the same order on every call;
    /// result tuples are positional.
    fn create_aggregate_functions(&self) -> Vec<BoxedFunction<T>>;

    /// Returns every group `element` currently belongs to.
    ///
    /// Duplicates are ignored.
    fn groups(&self, element: &T) -> Vec<Self::GroupId>;

    /// Builds the result emitted for a group, or None to hide the group.
    fn create_group_result(
        &self,
        id: &Self::GroupId,
        group: &Group<T, Self::GroupId>,
    ) -> Option<AggregateResult<Self::GroupId>> {
        Some(AggregateResult::new(id.clone(), group.values()))
    }

    /// Called after `element` stops being a member of `group`.
    fn on_remove_element(&mut self, _element: &T, _group: &Self::GroupId) {}
}

type GroupOf<T, S> = Group<T, <S as AggregateStrategy<T>>::GroupId>;
type PreparedGroups<T, G> = Vec<(G, Vec<BoxedFunction<T>>)>;

/// Incrementally maintained group-by aggregation.
pub struct Aggregator<T: Identified, S: AggregateStrategy<T>> {
    strategy: S,
    config: AggregatorConfig,
    /// Number of functions every group carries
    shape: usize,
    groups: HashMap<S::GroupId, GroupOf<T, S>>,
    /// Element id -> groups recorded at its last insert/update
    membership: HashMap<T::Id, Vec<S::GroupId>>,
    emitter: Emitter<AggregateResult<S::GroupId>>,
}

impl<T, S> Aggregator<T, S>
where
    T: Identified + Clone,
    S: AggregateStrategy<T>,
{
    /// Creates an aggregator with the default configuration.
    pub fn new(strategy: S) -> Self {
        Self::with_config(strategy, AggregatorConfig::default())
    }

    /// Creates an aggregator with the given configuration.
    pub fn with_config(strategy: S, config: AggregatorConfig) -> Self {
        let shape = strategy.create_aggregate_functions().len();
        Self {
            strategy,
            config,
            shape,
            groups: HashMap::new(),
            membership: HashMap::new(),
            emitter: Emitter::new(),
        }
    }

    #[inline]
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Mutable access to the strategy.
    ///
    /// Changing what `groups()` returns for elements already inserted is
    /// fine; it takes effect on their next update.
    #[inline]
    pub fn strategy_mut(&mut self) -> &mut S {
        &mut self.strategy
    }

    #[inline]
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Returns the group with the given identity, if it exists.
    #[inline]
    pub fn group(&self, id: &S::GroupId) -> Option<&GroupOf<T, S>> {
        self.groups.get(id)
    }

    /// Iterates over all live groups.
    pub fn groups(&self) -> impl Iterator<Item = &GroupOf<T, S>> + '_ {
        self.groups.values()
    }

    /// Returns the number of live groups.
    #[inline]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns the number of elements currently tracked.
    #[inline]
    pub fn element_count(&self) -> usize {
        self.membership.len()
    }

    /// Returns true if the element with `id` is tracked.
    #[inline]
    pub fn contains(&self, id: &T::Id) -> bool {
        self.membership.contains_key(id)
    }

    /// Returns the groups recorded for an element.
    pub fn cached_groups(&self, id: &T::Id) -> Option<&[S::GroupId]> {
        self.membership.get(id).map(Vec::as_slice)
    }

    /// Returns the last result emitted for a group.
    pub fn result(&self, id: &S::GroupId) -> Option<&AggregateResult<S::GroupId>> {
        self.groups.get(id).and_then(|g| g.last_result())
    }

    /// Computes a group's values from scratch with fresh accumulators.
    ///
    /// Does not touch the group. Useful to check the incremental state.
    pub fn recompute(&self, id: &S::GroupId) -> Option<Vec<Option<Value>>> {
        let group = self.groups.get(id)?;
        let mut functions = self.strategy.create_aggregate_functions();
        for function in &mut functions {
            for member in group.members() {
                function.fold_element(member);
            }
        }
        Some(functions.iter().map(|f| f.value()).collect())
    }

    /// Adds an element to every group it belongs to.
    pub fn try_insert(&mut self, element: T) -> Result<()> {
        let id = element.id();
        if self.membership.contains_key(&id) {
            return Err(Error::duplicate_member(&id));
        }
        let groups = dedup(self.strategy.groups(&element));
        let mut fresh = self.prepare_groups(&groups)?;

        trace!("insert {:?} into {} group(s)", id, groups.len());
        for gid in &groups {
            self.join(gid, element.clone(), &mut fresh)?;
            self.publish(gid);
        }
        self.membership.insert(id, groups);
        Ok(())
    }

    /// Re-files an element: retracts its recorded contribution and folds
    /// in the new one, in old and new groups alike.
    ///
    /// Each affected group is recomputed and emitted exactly once.
    pub fn try_update(&mut self, element: T) -> Result<()> {
        let id = element.id();
        self.check_recorded(&id)?;
        let new_groups = dedup(self.strategy.groups(&element));
        let mut fresh = self.prepare_groups(&new_groups)?;
        let old_groups = self.membership.remove(&id).unwrap_or_default();

        if !same_set(&old_groups, &new_groups) {
            trace!("{:?} moves from {:?} to {:?}", id, old_groups, new_groups);
        }

        let affected: Vec<S::GroupId> = old_groups
            .iter()
            .chain(new_groups.iter().filter(|g| !old_groups.contains(g)))
            .cloned()
            .collect();

        for gid in &affected {
            let was_member = old_groups.contains(gid);
            let is_member = new_groups.contains(gid);
            if was_member {
                self.leave(gid, &id, !is_member)?;
            }
            if is_member {
                self.join(gid, element.clone(), &mut fresh)?;
            }
            self.settle(gid);
        }
        self.membership.insert(id, new_groups);
        Ok(())
    }

    /// Removes an element from every group it was recorded in.
    pub fn try_delete(&mut self, element: T) -> Result<()> {
        let id = element.id();
        self.check_recorded(&id)?;
        let groups = self.membership.remove(&id).unwrap_or_default();

        if self.config.verify_membership {
            let current = dedup(self.strategy.groups(&element));
            if !same_set(&current, &groups) {
                debug!(
                    "membership of {:?} drifted since it was recorded: {:?} -> {:?}",
                    id, groups, current
                );
            }
        }

        trace!("delete {:?} from {} group(s)", id, groups.len());
        for gid in &groups {
            self.leave(gid, &id, true)?;
            self.settle(gid);
        }
        Ok(())
    }

    /// Rebuilds one group's accumulators from its members.
    ///
    /// Emits an update and returns true only if the values changed.
    pub fn rederive(&mut self, id: &S::GroupId) -> bool {
        let changed = match self.groups.get_mut(id) {
            Some(group) => group.rederive(),
            None => return false,
        };
        if changed {
            warn!("re-derivation corrected drift in group {:?}", id);
            self.publish(id);
        }
        changed
    }

    /// Rebuilds every group. Returns the number of groups that changed.
    pub fn rederive_all(&mut self) -> usize {
        let ids: Vec<S::GroupId> = self.groups.keys().cloned().collect();
        ids.iter().filter(|id| self.rederive(id)).count()
    }

    /// Checks that an element is tracked and that every recorded group
    /// still holds it.
    fn check_recorded(&self, id: &T::Id) -> Result<()> {
        let groups = self
            .membership
            .get(id)
            .ok_or_else(|| Error::not_a_member(id))?;
        for gid in groups {
            if !self.groups.get(gid).is_some_and(|g| g.contains(id)) {
                return Err(Error::missing_member(gid, id));
            }
        }
        Ok(())
    }

    /// Builds accumulators for the groups that do not exist yet.
    ///
    /// Runs before any mutation so a misbehaving factory leaves the
    /// aggregator untouched.
    fn prepare_groups(&self, groups: &[S::GroupId]) -> Result<PreparedGroups<T, S::GroupId>> {
        let mut fresh = Vec::new();
        for gid in groups {
            if self.groups.contains_key(gid) {
                continue;
            }
            let functions = self.strategy.create_aggregate_functions();
            if functions.len() != self.shape {
                return Err(Error::shape_mismatch(self.shape, functions.len()));
            }
            fresh.push((gid.clone(), functions));
        }
        Ok(fresh)
    }

    fn join(
        &mut self,
        gid: &S::GroupId,
        element: T,
        fresh: &mut PreparedGroups<T, S::GroupId>,
    ) -> Result<()> {
        let strategy = &self.strategy;
        let group = self.groups.entry(gid.clone()).or_insert_with(|| {
            debug!("group {:?} created", gid);
            let functions = match fresh.iter().position(|(id, _)| id == gid) {
                Some(pos) => fresh.swap_remove(pos).1,
                None => strategy.create_aggregate_functions(),
            };
            Group::new(gid.clone(), functions)
        });
        group.add(element)
    }

    fn leave(&mut self, gid: &S::GroupId, id: &T::Id, notify: bool) -> Result<()> {
        let group = self
            .groups
            .get_mut(gid)
            .ok_or_else(|| Error::missing_member(gid, id))?;
        let snapshot = group.remove(id)?;
        if notify {
            self.strategy.on_remove_element(&snapshot, gid);
        }
        Ok(())
    }

    /// Destroys the group if it emptied, otherwise publishes it.
    fn settle(&mut self, gid: &S::GroupId) {
        let empty = self.groups.get(gid).is_some_and(|g| g.is_empty());
        if empty {
            self.destroy(gid);
        } else {
            self.publish(gid);
        }
    }

    fn destroy(&mut self, gid: &S::GroupId) {
        if let Some(mut group) = self.groups.remove(gid) {
            debug!("group {:?} destroyed", gid);
            if let Some(last) = group.take_last_result() {
                self.emitter.emit(Operation::Delete(last));
            }
        }
    }

    /// Recomputes a group's result and emits the matching operation.
    fn publish(&mut self, gid: &S::GroupId) {
        let Some(group) = self.groups.get_mut(gid) else {
            return;
        };
        if let Some(interval) = self.config.rederive_interval {
            if group.retractions() >= interval.get() && group.rederive() {
                warn!("re-derivation corrected drift in group {:?}", gid);
            }
        }

        let next = self.strategy.create_group_result(gid, group);
        let op = match (group.take_last_result(), next) {
            (None, None) => None,
            (None, Some(new)) => {
                group.set_last_result(Some(new.clone()));
                Some(Operation::Insert(new))
            }
            (Some(old), None) => Some(Operation::Delete(old)),
            (Some(old), Some(new)) => {
                if self.config.skip_unchanged && old == new {
                    group.set_last_result(Some(old));
                    None
                } else {
                    group.set_last_result(Some(new.clone()));
                    Some(Operation::Update(new))
                }
            }
        };
        if let Some(op) = op {
            self.emitter.emit(op);
        }
    }
}

impl<T, S> Sink<T> for Aggregator<T, S>
where
    T: Identified + Clone,
    S: AggregateStrategy<T>,
{
    /// Applies one operation.
    ///
    /// # Panics
    ///
    /// Panics if the operation breaks a membership invariant: a second
    /// insert of a tracked element, or an update/delete of an untracked one.
    fn accept(&mut self, op: Operation<T>) {
        let outcome = match op {
            Operation::Insert(element) => self.try_insert(element),
            Operation::Update(element) => self.try_update(element),
            Operation::Delete(element) => self.try_delete(element),
        };
        if let Err(err) = outcome {
            error!("aggregator invariant violated: {}", err);
            panic!("aggregator invariant violated: {}", err);
        }
    }
}

impl<T, S> Source<AggregateResult<S::GroupId>> for Aggregator<T, S>
where
    T: Identified,
    S: AggregateStrategy<T>,
{
    fn attach(&mut self, sink: SinkHandle<AggregateResult<S::GroupId>>) -> SinkId {
        self.emitter.attach(sink)
    }

    fn detach(&mut self, id: SinkId) -> bool {
        self.emitter.detach(id)
    }
}

/// Drops repeated group ids, keeping first-seen order.
fn dedup<G: PartialEq>(groups: Vec<G>) -> Vec<G> {
    let mut unique = Vec::with_capacity(groups.len());
    for gid in groups {
        if !unique.contains(&gid) {
            unique.push(gid);
        }
    }
    unique
}

fn same_set<G: PartialEq>(a: &[G], b: &[G]) -> bool {
    a.len() == b.len() && a.iter().all(|g| b.contains(g))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{AggregatorBuilder, FnStrategy};
    use crate::function::{Count, Sum};
    use alloc::boxed::Box;
    use alloc::rc::Rc;
    use alloc::vec;
    use core::cell::{Cell, RefCell};
    use wattle_core::{OpKind, OperationBatchExt, VecSink};

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    enum Parity {
        Even,
        Odd,
    }

    /// Integers grouped by parity, with a sum and a count.
    #[derive(Default)]
    struct ParityStrategy {
        removed: Vec<(i64, Parity)>,
    }

    impl AggregateStrategy<i64> for ParityStrategy {
        type GroupId = Parity;

        fn create_aggregate_functions(&self) -> Vec<BoxedFunction<i64>> {
            vec![
                Box::new(Sum::new(|x: &i64| Some(Value::Int(*x)))),
                Box::new(Count::all()),
            ]
        }

        fn groups(&self, element: &i64) -> Vec<Parity> {
            if element % 2 == 0 {
                vec![Parity::Even]
            } else {
                vec![Parity::Odd]
            }
        }

        fn on_remove_element(&mut self, element: &i64, group: &Parity) {
            self.removed.push((*element, *group));
        }
    }

    type ResultSink = Rc<RefCell<VecSink<AggregateResult<Parity>>>>;

    fn make_aggregator() -> (Aggregator<i64, ParityStrategy>, ResultSink) {
        let mut agg = Aggregator::new(ParityStrategy::default());
        let sink: ResultSink = Rc::new(RefCell::new(VecSink::new()));
        agg.attach(sink.clone());
        (agg, sink)
    }

    fn sum_of(agg: &Aggregator<i64, ParityStrategy>, parity: Parity) -> Option<Value> {
        agg.result(&parity).and_then(|r| r.get(0))
    }

    #[test]
    fn test_first_member_emits_insert() {
        let (mut agg, sink) = make_aggregator();
        agg.insert(2);
        agg.insert(4);

        let ops = sink.borrow_mut().take();
        assert_eq!(ops.len(), 2);
        assert!(ops[0].is_insert());
        assert!(ops[1].is_update());
        assert_eq!(ops[1].element().get(0), Some(Value::Int(6)));
    }

    #[test]
    fn test_even_odd_sums() {
        let (mut agg, sink) = make_aggregator();
        for x in 0..6 {
            agg.insert(x);
        }
        assert_eq!(sum_of(&agg, Parity::Even), Some(Value::Int(6)));
        assert_eq!(sum_of(&agg, Parity::Odd), Some(Value::Int(9)));

        agg.delete(2);
        assert_eq!(sum_of(&agg, Parity::Even), Some(Value::Int(4)));

        agg.delete(0);
        agg.delete(4);
        assert!(agg.group(&Parity::Even).is_none());
        assert_eq!(sum_of(&agg, Parity::Odd), Some(Value::Int(9)));

        let ops = sink.borrow_mut().take();
        let last = ops.last().unwrap();
        assert!(last.is_delete());
        assert_eq!(*last.element().group(), Parity::Even);
    }

    #[test]
    fn test_update_within_group() {
        let (mut agg, sink) = make_aggregator();
        agg.insert(1);
        agg.insert(3);
        sink.borrow_mut().take();

        agg.update(3);
        let ops = sink.borrow_mut().take();
        // Same group before and after: one recomputation
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_update());
        assert!(agg.strategy().removed.is_empty());
    }

    #[test]
    fn test_hook_sees_snapshot_on_delete() {
        let (mut agg, _sink) = make_aggregator();
        agg.insert(5);
        agg.delete(5);
        assert_eq!(agg.strategy().removed, vec![(5, Parity::Odd)]);
        assert!(agg.cached_groups(&5).is_none());
    }

    #[test]
    fn test_cached_groups_recorded() {
        let (mut agg, _sink) = make_aggregator();
        agg.insert(8);
        assert_eq!(agg.cached_groups(&8), Some(&[Parity::Even][..]));
        assert!(agg.contains(&8));
        assert_eq!(agg.element_count(), 1);
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let (mut agg, sink) = make_aggregator();
        agg.insert(2);
        let err = agg.try_insert(2).unwrap_err();
        assert!(matches!(err, Error::DuplicateMember { .. }));
        assert_eq!(sum_of(&agg, Parity::Even), Some(Value::Int(2)));
        assert_eq!(sink.borrow().len(), 1);
    }

    #[test]
    fn test_unknown_delete_rejected() {
        let (mut agg, _sink) = make_aggregator();
        assert!(matches!(agg.try_delete(7), Err(Error::NotAMember { .. })));
        assert!(matches!(agg.try_update(7), Err(Error::NotAMember { .. })));
    }

    #[test]
    #[should_panic(expected = "invariant violated")]
    fn test_sink_panics_on_violation() {
        let (mut agg, _sink) = make_aggregator();
        agg.delete(1);
    }

    #[test]
    fn test_insert_delete_inverse() {
        let (mut agg, _sink) = make_aggregator();
        agg.insert(2);
        agg.insert(3);
        let before_even = agg.result(&Parity::Even).cloned();
        let before_odd = agg.result(&Parity::Odd).cloned();

        agg.insert(10);
        agg.delete(10);

        assert_eq!(agg.result(&Parity::Even).cloned(), before_even);
        assert_eq!(agg.result(&Parity::Odd).cloned(), before_odd);
        assert_eq!(agg.group_count(), 2);
    }

    #[test]
    fn test_skip_unchanged() {
        let config = AggregatorConfig::new().with_skip_unchanged(true);
        let mut agg = Aggregator::with_config(ParityStrategy::default(), config);
        let sink: ResultSink = Rc::new(RefCell::new(VecSink::new()));
        agg.attach(sink.clone());

        agg.insert(1);
        // Same value re-filed: nothing new to report
        agg.update(1);
        assert_eq!(sink.borrow().ops().count_kind(OpKind::Update), 0);
        assert_eq!(sink.borrow().len(), 1);
    }

    #[test]
    fn test_recompute_matches_incremental() {
        let (mut agg, _sink) = make_aggregator();
        for x in [1, 3, 5, 7] {
            agg.insert(x);
        }
        agg.delete(3);
        agg.update(5);

        let group = agg.group(&Parity::Odd).unwrap();
        assert_eq!(agg.recompute(&Parity::Odd), Some(group.values()));
    }

    #[test]
    fn test_rederive_unchanged_is_silent() {
        let (mut agg, sink) = make_aggregator();
        agg.insert(2);
        sink.borrow_mut().take();

        assert!(!agg.rederive(&Parity::Even));
        assert_eq!(agg.rederive_all(), 0);
        assert!(sink.borrow().is_empty());
        assert!(!agg.rederive(&Parity::Odd));
    }

    struct BadFactory {
        calls: core::cell::Cell<usize>,
    }

    impl AggregateStrategy<i64> for BadFactory {
        type GroupId = i64;

        fn create_aggregate_functions(&self) -> Vec<BoxedFunction<i64>> {
            let calls = self.calls.get();
            self.calls.set(calls + 1);
            (0..=calls)
                .map(|_| Box::new(Count::all()) as BoxedFunction<i64>)
                .collect()
        }

        fn groups(&self, element: &i64) -> Vec<i64> {
            vec![*element]
        }
    }

    #[test]
    fn test_shape_mismatch_leaves_state_untouched() {
        let mut agg = Aggregator::new(BadFactory {
            calls: core::cell::Cell::new(0),
        });
        let err = agg.try_insert(1).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { expected: 1, got: 2 }));
        assert_eq!(agg.group_count(), 0);
        assert_eq!(agg.element_count(), 0);
    }

    #[test]
    fn test_duplicate_group_ids_collapse() {
        struct Twice;
        impl AggregateStrategy<i64> for Twice {
            type GroupId = u8;
            fn create_aggregate_functions(&self) -> Vec<BoxedFunction<i64>> {
                vec![Box::new(Count::all())]
            }
            fn groups(&self, _element: &i64) -> Vec<u8> {
                vec![1, 1, 2]
            }
        }

        let mut agg = Aggregator::new(Twice);
        let sink = Rc::new(RefCell::new(VecSink::<AggregateResult<u8>>::new()));
        agg.attach(sink.clone());
        agg.insert(9);

        assert_eq!(sink.borrow().len(), 2);
        assert_eq!(agg.result(&1).and_then(|r| r.get(0)), Some(Value::Int(1)));
    }

    #[test]
    fn test_delete_retracts_folded_value() {
        let factor = Rc::new(Cell::new(1));
        let scale = factor.clone();
        let mut agg = AggregatorBuilder::new()
            .group_by(|_: &i64| vec![0u8])
            .sum(move |x: &i64| Some(Value::Int(*x * scale.get())))
            .max({
                let scale = factor.clone();
                move |x: &i64| Some(Value::Int(*x * scale.get()))
            })
            .build()
            .unwrap();

        agg.insert(10);
        agg.insert(20);
        factor.set(2);
        agg.delete(10);

        let result = agg.result(&0).unwrap();
        assert_eq!(result.get(0), Some(Value::Int(20)));
        assert_eq!(result.get(1), Some(Value::Int(20)));
    }

    type FloatAggregator = Aggregator<i64, FnStrategy<i64, u8>>;

    /// Element 1 weighs 1e17 and element 2 weighs 1.0: folding both loses
    /// the 1.0, so retracting element 1 leaves a drifted zero.
    fn drifting_sum(
        config: AggregatorConfig,
    ) -> (FloatAggregator, Rc<RefCell<VecSink<AggregateResult<u8>>>>) {
        let mut agg = AggregatorBuilder::new()
            .group_by(|_: &i64| vec![0u8])
            .sum(|x: &i64| Some(Value::Float(if *x == 1 { 1e17 } else { 1.0 })))
            .config(config)
            .build()
            .unwrap();
        let sink = Rc::new(RefCell::new(VecSink::<AggregateResult<u8>>::new()));
        agg.attach(sink.clone());
        agg.insert(1);
        agg.insert(2);
        (agg, sink)
    }

    #[test]
    fn test_rederive_corrects_drift() {
        let (mut agg, sink) = drifting_sum(AggregatorConfig::new());
        agg.delete(1);
        assert_eq!(agg.result(&0).and_then(|r| r.get(0)), Some(Value::Float(0.0)));
        sink.borrow_mut().take();

        assert!(agg.rederive(&0));

        let ops = sink.borrow_mut().take();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_update());
        assert_eq!(ops[0].element().get(0), Some(Value::Float(1.0)));
        assert!(!agg.rederive(&0));
        assert!(sink.borrow().is_empty());
    }

    #[test]
    fn test_rederive_interval_corrects_before_publishing() {
        let (mut agg, sink) = drifting_sum(AggregatorConfig::new().with_rederive_interval(1));
        sink.borrow_mut().take();

        agg.delete(1);

        let ops = sink.borrow_mut().take();
        assert_eq!(ops.len(), 1);
        assert!(ops[0].is_update());
        assert_eq!(ops[0].element().get(0), Some(Value::Float(1.0)));
    }

    #[test]
    fn test_verify_membership_keeps_recorded_groups() {
        let shift = Rc::new(Cell::new(0u8));
        let current = shift.clone();
        let mut agg = AggregatorBuilder::new()
            .group_by(move |_: &i64| vec![current.get()])
            .count_all()
            .config(AggregatorConfig::new().with_verify_membership(true))
            .build()
            .unwrap();
        let sink = Rc::new(RefCell::new(VecSink::<AggregateResult<u8>>::new()));
        agg.attach(sink.clone());

        agg.insert(1);
        agg.insert(2);
        shift.set(5);
        agg.delete(1);

        assert_eq!(agg.result(&0).and_then(|r| r.get(0)), Some(Value::Int(1)));
        assert!(agg.group(&5).is_none());

        agg.delete(2);
        assert_eq!(agg.group_count(), 0);
        let last = sink.borrow_mut().take().pop().unwrap();
        assert!(last.is_delete());
        assert_eq!(*last.element().group(), 0);
    }

    #[test]
    fn test_skip_unchanged_reports_domain_switch() {
        let mut agg = AggregatorBuilder::new()
            .group_by(|_: &i64| vec![0u8])
            .sum(|x: &i64| Some(if *x < 0 { Value::Float(0.0) } else { Value::Int(*x) }))
            .config(AggregatorConfig::new().with_skip_unchanged(true))
            .build()
            .unwrap();
        let sink = Rc::new(RefCell::new(VecSink::<AggregateResult<u8>>::new()));
        agg.attach(sink.clone());

        agg.insert(5);
        agg.insert(6);
        sink.borrow_mut().take();

        // A zero-valued float contributor keeps the magnitude
        agg.insert(-1);
        let ops = sink.borrow_mut().take();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].element().get(0), Some(Value::Float(11.0)));
    }
}
