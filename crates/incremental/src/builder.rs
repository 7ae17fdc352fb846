//! Closure-based aggregation strategy and its builder.

use crate::aggregator::{AggregateStrategy, Aggregator};
use crate::config::AggregatorConfig;
use crate::function::{Avg, BoxedFunction, Count, ExtractorFn, Max, Min, Sum};
use crate::group::Group;
use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use wattle_core::{AggregateResult, Error, Identified, Result, Value};

type FunctionFactory<T> = Box<dyn Fn() -> BoxedFunction<T>>;
type GroupsFn<T, G> = Box<dyn Fn(&T) -> Vec<G>>;
type ResultFn<T, G> = Box<dyn Fn(&G, &Group<T, G>) -> Option<AggregateResult<G>>>;
type RemoveHook<T, G> = Box<dyn FnMut(&T, &G)>;

/// A strategy assembled from closures.
pub struct FnStrategy<T: Identified, G> {
    factories: Vec<FunctionFactory<T>>,
    groups: GroupsFn<T, G>,
    result: Option<ResultFn<T, G>>,
    on_remove: Option<RemoveHook<T, G>>,
    suppress_empty: bool,
}

impl<T, G> AggregateStrategy<T> for FnStrategy<T, G>
where
    T: Identified,
    G: Clone + Eq + Hash + Debug,
{
    type GroupId = G;

    fn create_aggregate_functions(&self) -> Vec<BoxedFunction<T>> {
        self.factories.iter().map(|factory| factory()).collect()
    }

    fn groups(&self, element: &T) -> Vec<G> {
        (self.groups)(element)
    }

    fn create_group_result(&self, id: &G, group: &Group<T, G>) -> Option<AggregateResult<G>> {
        let result = match &self.result {
            Some(build) => build(id, group)?,
            None => AggregateResult::new(id.clone(), group.values()),
        };
        if self.suppress_empty && result.is_no_data() {
            return None;
        }
        Some(result)
    }

    fn on_remove_element(&mut self, element: &T, group: &G) {
        if let Some(hook) = &mut self.on_remove {
            hook(element, group);
        }
    }
}

/// Builder for an aggregator over closures.
///
/// ```
/// use wattle_core::{Sink, Value};
/// use wattle_incremental::AggregatorBuilder;
///
/// let mut agg = AggregatorBuilder::new()
///     .group_by(|x: &i64| vec![x % 2 == 0])
///     .sum(|x: &i64| Some(Value::Int(*x)))
///     .build()
///     .unwrap();
///
/// agg.insert(2);
/// agg.insert(4);
/// assert_eq!(agg.result(&true).and_then(|r| r.get(0)), Some(Value::Int(6)));
/// ```
pub struct AggregatorBuilder<T: Identified, G> {
    factories: Vec<FunctionFactory<T>>,
    groups: Option<GroupsFn<T, G>>,
    result: Option<ResultFn<T, G>>,
    on_remove: Option<RemoveHook<T, G>>,
    suppress_empty: bool,
    config: AggregatorConfig,
}

impl<T, G> Default for AggregatorBuilder<T, G>
where
    T: Identified + Clone + 'static,
    G: Clone + Eq + Hash + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, G> AggregatorBuilder<T, G>
where
    T: Identified + Clone + 'static,
    G: Clone + Eq + Hash + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            factories: Vec::new(),
            groups: None,
            result: None,
            on_remove: None,
            suppress_empty: false,
            config: AggregatorConfig::default(),
        }
    }

    /// Sets the group lookup.
    pub fn group_by<F>(mut self, groups: F) -> Self
    where
        F: Fn(&T) -> Vec<G> + 'static,
    {
        self.groups = Some(Box::new(groups));
        self
    }

    /// Appends a function built by `factory` for every new group.
    pub fn function<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> BoxedFunction<T> + 'static,
    {
        self.factories.push(Box::new(factory));
        self
    }

    pub fn sum<F>(self, extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        let extract: ExtractorFn<T> = Rc::new(extract);
        self.function(move || -> BoxedFunction<T> { Box::new(Sum::from_extractor(extract.clone())) })
    }

    pub fn count<F>(self, extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        let extract: ExtractorFn<T> = Rc::new(extract);
        self.function(move || -> BoxedFunction<T> { Box::new(Count::from_extractor(extract.clone())) })
    }

    /// Counts every member.
    pub fn count_all(self) -> Self {
        self.function(|| -> BoxedFunction<T> { Box::new(Count::all()) })
    }

    pub fn avg<F>(self, extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        let extract: ExtractorFn<T> = Rc::new(extract);
        self.function(move || -> BoxedFunction<T> { Box::new(Avg::from_extractor(extract.clone())) })
    }

    pub fn min<F>(self, extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        let extract: ExtractorFn<T> = Rc::new(extract);
        self.function(move || -> BoxedFunction<T> { Box::new(Min::from_extractor(extract.clone())) })
    }

    pub fn max<F>(self, extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        let extract: ExtractorFn<T> = Rc::new(extract);
        self.function(move || -> BoxedFunction<T> { Box::new(Max::from_extractor(extract.clone())) })
    }

    /// Replaces the default result construction. Returning None hides the
    /// group downstream.
    pub fn result<F>(mut self, build: F) -> Self
    where
        F: Fn(&G, &Group<T, G>) -> Option<AggregateResult<G>> + 'static,
    {
        self.result = Some(Box::new(build));
        self
    }

    /// Sets a hook called after an element leaves a group.
    pub fn on_remove<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&T, &G) + 'static,
    {
        self.on_remove = Some(Box::new(hook));
        self
    }

    /// Hides groups whose every function reports no data.
    pub fn suppress_empty(mut self, suppress: bool) -> Self {
        self.suppress_empty = suppress;
        self
    }

    pub fn config(mut self, config: AggregatorConfig) -> Self {
        self.config = config;
        self
    }

    /// Finishes the aggregator.
    pub fn build(self) -> Result<Aggregator<T, FnStrategy<T, G>>> {
        let groups = self
            .groups
            .ok_or_else(|| Error::missing_strategy("group_by"))?;
        if self.factories.is_empty() {
            return Err(Error::missing_strategy("aggregate function"));
        }
        let strategy = FnStrategy {
            factories: self.factories,
            groups,
            result: self.result,
            on_remove: self.on_remove,
            suppress_empty: self.suppress_empty,
        };
        Ok(Aggregator::with_config(strategy, self.config))
    }
}
