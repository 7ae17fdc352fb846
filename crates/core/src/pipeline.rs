//! Source and sink plumbing.
//!
//! A `Source` owns an ordered list of downstream sink handles and pushes
//! every operation it emits to each of them, synchronously, before
//! returning. Handles are `Rc<RefCell<..>>` because a pipeline is driven
//! from one logical thread and a sink may be shared by several sources.
//!
//! Cycles are not supported: a sink that feeds back into a source it is
//! currently being called from panics on the `RefCell` borrow.

use crate::operation::Operation;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

/// Identifier of one attachment between a source and a sink.
pub type SinkId = u64;

/// Shared handle to a downstream sink.
pub type SinkHandle<T> = Rc<RefCell<dyn Sink<T>>>;

/// Receives operations from one or more sources.
pub trait Sink<T> {
    /// Consumes one operation.
    fn accept(&mut self, op: Operation<T>);

    fn insert(&mut self, element: T) {
        self.accept(Operation::Insert(element));
    }

    fn update(&mut self, element: T) {
        self.accept(Operation::Update(element));
    }

    fn delete(&mut self, element: T) {
        self.accept(Operation::Delete(element));
    }
}

/// Emits operations to attached sinks.
pub trait Source<T> {
    /// Attaches a downstream sink and returns the attachment id.
    ///
    /// Attaching the same sink twice delivers every operation twice.
    fn attach(&mut self, sink: SinkHandle<T>) -> SinkId;

    /// Detaches a sink by attachment id.
    ///
    /// Returns true if the attachment existed.
    fn detach(&mut self, id: SinkId) -> bool;
}

/// Ordered fan-out list shared by every source implementation.
pub struct Emitter<T> {
    sinks: Vec<(SinkId, SinkHandle<T>)>,
    next_id: SinkId,
}

impl<T> Default for Emitter<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Emitter<T> {
    /// Creates an emitter with no sinks attached.
    pub fn new() -> Self {
        Self {
            sinks: Vec::new(),
            next_id: 1,
        }
    }

    /// Attaches a sink at the end of the fan-out list.
    pub fn attach(&mut self, sink: SinkHandle<T>) -> SinkId {
        let id = self.next_id;
        self.next_id += 1;
        self.sinks.push((id, sink));
        id
    }

    /// Detaches a sink by attachment id.
    pub fn detach(&mut self, id: SinkId) -> bool {
        let before = self.sinks.len();
        self.sinks.retain(|(sink_id, _)| *sink_id != id);
        self.sinks.len() != before
    }

    /// Returns the number of attached sinks.
    #[inline]
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Returns true if no sink is attached.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl<T: Clone> Emitter<T> {
    /// Delivers one operation to every attached sink.
    ///
    /// The last sink receives the original, the others a clone.
    pub fn emit(&self, op: Operation<T>) {
        if let Some(((_, last), rest)) = self.sinks.split_last() {
            for (_, sink) in rest {
                sink.borrow_mut().accept(op.clone());
            }
            last.borrow_mut().accept(op);
        }
    }

    /// Delivers a batch of operations in order.
    pub fn emit_all(&self, ops: impl IntoIterator<Item = Operation<T>>) {
        for op in ops {
            self.emit(op);
        }
    }
}

/// Head of a pipeline.
///
/// The domain model calls `insert`/`update`/`delete` on a feed whenever a
/// tracked object changes; the feed forwards each call unchanged.
pub struct Feed<T> {
    emitter: Emitter<T>,
}

impl<T> Default for Feed<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Feed<T> {
    pub fn new() -> Self {
        Self {
            emitter: Emitter::new(),
        }
    }

    /// Returns the number of attached sinks.
    #[inline]
    pub fn sink_count(&self) -> usize {
        self.emitter.len()
    }
}

impl<T: Clone> Sink<T> for Feed<T> {
    fn accept(&mut self, op: Operation<T>) {
        self.emitter.emit(op);
    }
}

impl<T> Source<T> for Feed<T> {
    fn attach(&mut self, sink: SinkHandle<T>) -> SinkId {
        self.emitter.attach(sink)
    }

    fn detach(&mut self, id: SinkId) -> bool {
        self.emitter.detach(id)
    }
}

/// A sink that records every operation it receives.
#[derive(Clone, Debug, Default)]
pub struct VecSink<T> {
    ops: Vec<Operation<T>>,
}

impl<T> VecSink<T> {
    pub fn new() -> Self {
        Self { ops: Vec::new() }
    }

    /// Returns the recorded operations in arrival order.
    #[inline]
    pub fn ops(&self) -> &[Operation<T>] {
        &self.ops
    }

    /// Takes the recorded operations, leaving the sink empty.
    pub fn take(&mut self) -> Vec<Operation<T>> {
        core::mem::take(&mut self.ops)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ops.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

impl<T> Sink<T> for VecSink<T> {
    fn accept(&mut self, op: Operation<T>) {
        self.ops.push(op);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_feed_forwards_in_order() {
        let sink = Rc::new(RefCell::new(VecSink::<i32>::new()));
        let mut feed: Feed<i32> = Feed::new();
        feed.attach(sink.clone());

        feed.insert(1);
        feed.update(1);
        feed.delete(1);

        assert_eq!(
            sink.borrow().ops(),
            &[Operation::Insert(1), Operation::Update(1), Operation::Delete(1)]
        );
    }

    #[test]
    fn test_feed_fan_out() {
        let first = Rc::new(RefCell::new(VecSink::<i32>::new()));
        let second = Rc::new(RefCell::new(VecSink::<i32>::new()));
        let mut feed: Feed<i32> = Feed::new();
        feed.attach(first.clone());
        feed.attach(second.clone());

        feed.insert(7);

        assert_eq!(first.borrow().ops(), &[Operation::Insert(7)]);
        assert_eq!(second.borrow().ops(), &[Operation::Insert(7)]);
    }

    #[test]
    fn test_detach() {
        let sink = Rc::new(RefCell::new(VecSink::<i32>::new()));
        let mut feed: Feed<i32> = Feed::new();
        let id = feed.attach(sink.clone());
        assert_eq!(feed.sink_count(), 1);

        assert!(feed.detach(id));
        assert!(!feed.detach(id));
        feed.insert(1);

        assert!(sink.borrow().is_empty());
    }

    #[test]
    fn test_emit_without_sinks() {
        let emitter: Emitter<i32> = Emitter::new();
        assert!(emitter.is_empty());
        emitter.emit(Operation::Insert(1));
    }

    #[test]
    fn test_emit_all() {
        let sink = Rc::new(RefCell::new(VecSink::<i32>::new()));
        let mut emitter: Emitter<i32> = Emitter::new();
        emitter.attach(sink.clone());

        emitter.emit_all(vec![Operation::Insert(1), Operation::Delete(2)]);

        let ops = sink.borrow_mut().take();
        assert_eq!(ops.len(), 2);
        assert!(sink.borrow().is_empty());
    }
}
