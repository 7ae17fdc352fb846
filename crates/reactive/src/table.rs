//! In-memory result table.

use crate::change::TableChange;
use crate::subscription::{SubscriptionId, SubscriptionManager};
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;
use hashbrown::HashMap;
use log::{debug, trace};
use wattle_core::{AggregateResult, Operation, Sink, Value};

/// Terminal sink holding the latest result row per group.
///
/// `Insert` and `Update` store the row under its group, `Delete` removes
/// it. Every change is pushed to subscribers before `accept` returns.
pub struct TableSink<G> {
    rows: HashMap<G, AggregateResult<G>>,
    subscriptions: SubscriptionManager<TableChange<G>>,
}

impl<G> Default for TableSink<G>
where
    G: Clone + Eq + Hash + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<G> TableSink<G>
where
    G: Clone + Eq + Hash + Debug,
{
    pub fn new() -> Self {
        Self {
            rows: HashMap::new(),
            subscriptions: SubscriptionManager::new(),
        }
    }

    /// Returns the row of a group.
    #[inline]
    pub fn get(&self, group: &G) -> Option<&AggregateResult<G>> {
        self.rows.get(group)
    }

    /// Returns one positional value of a group's row.
    pub fn value(&self, group: &G, index: usize) -> Option<Value> {
        self.rows.get(group).and_then(|row| row.get(index))
    }

    #[inline]
    pub fn contains(&self, group: &G) -> bool {
        self.rows.contains_key(group)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over the rows in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&G, &AggregateResult<G>)> + '_ {
        self.rows.iter()
    }

    /// Returns the group ids currently present.
    pub fn groups(&self) -> Vec<G> {
        self.rows.keys().cloned().collect()
    }

    /// Removes every row, notifying subscribers of each removal.
    pub fn clear(&mut self) {
        let rows: Vec<AggregateResult<G>> = self.rows.drain().map(|(_, row)| row).collect();
        for row in rows {
            self.subscriptions.notify_all(&TableChange::Removed(row));
        }
    }

    /// Registers a callback for every subsequent change.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&TableChange<G>) + 'static,
    {
        self.subscriptions.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscriptions.unsubscribe(id)
    }

    #[inline]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Stores a row, reporting whether it replaced one.
    fn upsert(&mut self, row: AggregateResult<G>) -> TableChange<G> {
        match self.rows.insert(row.group().clone(), row.clone()) {
            Some(old) => TableChange::Modified { old, new: row },
            None => TableChange::Added(row),
        }
    }
}

impl<G> Sink<AggregateResult<G>> for TableSink<G>
where
    G: Clone + Eq + Hash + Debug,
{
    fn accept(&mut self, op: Operation<AggregateResult<G>>) {
        let change = match op {
            Operation::Insert(row) => {
                let change = self.upsert(row);
                if change.is_modified() {
                    debug!("insert over existing row {:?}", change.group());
                }
                change
            }
            Operation::Update(row) => {
                let change = self.upsert(row);
                if change.is_added() {
                    debug!("update of absent row {:?} stored as new", change.group());
                }
                change
            }
            Operation::Delete(row) => match self.rows.remove(row.group()) {
                Some(old) => TableChange::Removed(old),
                None => {
                    debug!("delete of absent row {:?} ignored", row.group());
                    return;
                }
            },
        };
        trace!("table change for {:?}", change.group());
        self.subscriptions.notify_all(&change);
    }
}
