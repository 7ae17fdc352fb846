//! Incremental aggregate functions.
//!
//! Each group of an aggregator owns one private instance of every
//! configured function. A function folds in the value it extracts from a
//! member when the member joins the group. The group keeps that folded
//! value and hands it back to `retract` when the member leaves, so a
//! retraction undoes exactly what was folded even if the extractor reads
//! state that changed in between. No other member is looked at.
//!
//! Retracting something that was never folded is a fatal fault.
//!
//! An extractor returning `None` means the element does not participate;
//! a function with zero participants reports `None` ("no data"), never zero.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use log::error;
use wattle_core::Value;

/// Extracts the value an element contributes to a function.
pub type ExtractorFn<T> = Rc<dyn Fn(&T) -> Option<Value>>;

/// A boxed aggregate function, as stored per group.
pub type BoxedFunction<T> = Box<dyn AggregateFunction<T>>;

/// A per-group incremental accumulator.
pub trait AggregateFunction<T> {
    /// Returns the value `element` contributes, or None if it does not participate.
    fn extract(&self, element: &T) -> Option<Value>;

    /// Folds a value into the accumulator.
    fn fold(&mut self, value: Value);

    /// Removes a previously folded value. Exact inverse of `fold`.
    fn retract(&mut self, value: Value);

    /// Returns the current result, or None when no member participates.
    fn value(&self) -> Option<Value>;

    /// Clears all accumulated state.
    fn reset(&mut self);

    /// Returns true if retraction may leave rounding residue.
    fn is_lossy(&self) -> bool {
        false
    }

    /// Folds in the contribution of `element`, if any.
    ///
    /// Returns the folded value. Keep it: it is what `retract` must get
    /// back when the element leaves.
    fn fold_element(&mut self, element: &T) -> Option<Value> {
        let value = self.extract(element)?;
        self.fold(value);
        Some(value)
    }
}

/// Decrements a participant counter.
///
/// # Panics
///
/// Panics when the counter is already zero.
fn decrement(counter: &mut usize, what: &str) {
    match counter.checked_sub(1) {
        Some(remaining) => *counter = remaining,
        None => {
            error!("retract from an empty {}", what);
            panic!("retract from an empty {}", what);
        }
    }
}

/// Running SUM.
///
/// Integer contributions accumulate exactly in an i128, so any sequence
/// of folds and retractions over i64 inputs lands on the exact total. The
/// result is reported as `Int` while it fits an i64, `Float` otherwise.
///
/// Float contributions accumulate in an f64 and switch the result to
/// `Float`. Float retraction is subtraction and can leave residue; the
/// float part is zeroed once its last contributor leaves, and
/// `Aggregator::rederive` rebuilds it from the members on demand.
pub struct Sum<T> {
    extract: ExtractorFn<T>,
    int_total: i128,
    float_total: f64,
    float_count: usize,
    count: usize,
}

impl<T> Sum<T> {
    /// Creates a sum over the values produced by `extract`.
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        Self::from_extractor(Rc::new(extract))
    }

    /// Creates a sum sharing an existing extractor.
    pub fn from_extractor(extract: ExtractorFn<T>) -> Self {
        Self {
            extract,
            int_total: 0,
            float_total: 0.0,
            float_count: 0,
            count: 0,
        }
    }

    /// Returns the number of participating members.
    #[inline]
    pub fn count(&self) -> usize {
        self.count
    }

    fn total_f64(&self) -> f64 {
        self.int_total as f64 + self.float_total
    }
}

impl<T> AggregateFunction<T> for Sum<T> {
    fn extract(&self, element: &T) -> Option<Value> {
        (self.extract)(element)
    }

    fn fold(&mut self, value: Value) {
        self.count += 1;
        match value {
            Value::Int(v) => self.int_total += v as i128,
            Value::Float(v) => {
                self.float_total += v;
                self.float_count += 1;
            }
        }
    }

    fn retract(&mut self, value: Value) {
        decrement(&mut self.count, "sum");
        match value {
            Value::Int(v) => self.int_total -= v as i128,
            Value::Float(v) => {
                decrement(&mut self.float_count, "float sum");
                if self.float_count == 0 {
                    self.float_total = 0.0;
                } else {
                    self.float_total -= v;
                }
            }
        }
    }

    fn value(&self) -> Option<Value> {
        if self.count == 0 {
            return None;
        }
        if self.float_count > 0 {
            return Some(Value::Float(self.total_f64()));
        }
        Some(match i64::try_from(self.int_total) {
            Ok(v) => Value::Int(v),
            Err(_) => Value::Float(self.int_total as f64),
        })
    }

    fn reset(&mut self) {
        self.int_total = 0;
        self.float_total = 0.0;
        self.float_count = 0;
        self.count = 0;
    }

    fn is_lossy(&self) -> bool {
        self.float_count > 0
    }
}

/// Running COUNT of participating members.
pub struct Count<T> {
    extract: ExtractorFn<T>,
    count: usize,
}

impl<T> Count<T> {
    /// Counts the members for which `extract` yields a value.
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        Self::from_extractor(Rc::new(extract))
    }

    pub fn from_extractor(extract: ExtractorFn<T>) -> Self {
        Self { extract, count: 0 }
    }
}

impl<T: 'static> Count<T> {
    /// Counts every member.
    pub fn all() -> Self {
        Self::new(|_| Some(Value::Int(1)))
    }
}

impl<T> AggregateFunction<T> for Count<T> {
    fn extract(&self, element: &T) -> Option<Value> {
        (self.extract)(element)
    }

    fn fold(&mut self, _value: Value) {
        self.count += 1;
    }

    fn retract(&mut self, _value: Value) {
        decrement(&mut self.count, "count");
    }

    fn value(&self) -> Option<Value> {
        (self.count > 0).then(|| Value::Int(self.count as i64))
    }

    fn reset(&mut self) {
        self.count = 0;
    }
}

/// Running AVG, kept as a sum and a participant count.
pub struct Avg<T> {
    sum: Sum<T>,
}

impl<T> Avg<T> {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        Self { sum: Sum::new(extract) }
    }

    pub fn from_extractor(extract: ExtractorFn<T>) -> Self {
        Self {
            sum: Sum::from_extractor(extract),
        }
    }
}

impl<T> AggregateFunction<T> for Avg<T> {
    fn extract(&self, element: &T) -> Option<Value> {
        self.sum.extract(element)
    }

    fn fold(&mut self, value: Value) {
        self.sum.fold(value);
    }

    fn retract(&mut self, value: Value) {
        self.sum.retract(value);
    }

    fn value(&self) -> Option<Value> {
        let count = self.sum.count();
        (count > 0).then(|| Value::Float(self.sum.total_f64() / count as f64))
    }

    fn reset(&mut self) {
        self.sum.reset();
    }

    fn is_lossy(&self) -> bool {
        self.sum.is_lossy()
    }
}

/// Ordered multiset backing MIN and MAX.
///
/// Retracting the current extreme moves to the next key in O(log n)
/// instead of rescanning the group.
struct Extremes {
    values: BTreeMap<Value, usize>,
}

impl Extremes {
    fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    fn add(&mut self, value: Value) {
        *self.values.entry(value).or_insert(0) += 1;
    }

    fn remove(&mut self, value: Value) {
        let remaining = match self.values.get_mut(&value) {
            Some(count) => {
                *count -= 1;
                *count
            }
            None => {
                error!("retract of a value never folded: {:?}", value);
                panic!("retract of a value never folded: {:?}", value);
            }
        };
        if remaining == 0 {
            self.values.remove(&value);
        }
    }
}

/// Running MIN.
pub struct Min<T> {
    extract: ExtractorFn<T>,
    extremes: Extremes,
}

impl<T> Min<T> {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        Self::from_extractor(Rc::new(extract))
    }

    pub fn from_extractor(extract: ExtractorFn<T>) -> Self {
        Self {
            extract,
            extremes: Extremes::new(),
        }
    }
}

impl<T> AggregateFunction<T> for Min<T> {
    fn extract(&self, element: &T) -> Option<Value> {
        (self.extract)(element)
    }

    fn fold(&mut self, value: Value) {
        self.extremes.add(value);
    }

    fn retract(&mut self, value: Value) {
        self.extremes.remove(value);
    }

    fn value(&self) -> Option<Value> {
        self.extremes.values.keys().next().copied()
    }

    fn reset(&mut self) {
        self.extremes.values.clear();
    }
}

/// Running MAX.
pub struct Max<T> {
    extract: ExtractorFn<T>,
    extremes: Extremes,
}

impl<T> Max<T> {
    pub fn new<F>(extract: F) -> Self
    where
        F: Fn(&T) -> Option<Value> + 'static,
    {
        Self::from_extractor(Rc::new(extract))
    }

    pub fn from_extractor(extract: ExtractorFn<T>) -> Self {
        Self {
            extract,
            extremes: Extremes::new(),
        }
    }
}

impl<T> AggregateFunction<T> for Max<T> {
    fn extract(&self, element: &T) -> Option<Value> {
        (self.extract)(element)
    }

    fn fold(&mut self, value: Value) {
        self.extremes.add(value);
    }

    fn retract(&mut self, value: Value) {
        self.extremes.remove(value);
    }

    fn value(&self) -> Option<Value> {
        self.extremes.values.keys().next_back().copied()
    }

    fn reset(&mut self) {
        self.extremes.values.clear();
    }
}
