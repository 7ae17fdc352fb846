//! Generic pipeline stage.

use alloc::vec::Vec;
use core::marker::PhantomData;
use log::trace;
use wattle_core::{Emitter, Operation, Sink, SinkHandle, SinkId, Source};

/// Turns one input operation into zero or more output operations.
pub trait Transform<In, Out> {
    fn transform_insert(&mut self, element: In) -> Vec<Operation<Out>>;

    fn transform_update(&mut self, element: In) -> Vec<Operation<Out>>;

    fn transform_delete(&mut self, element: In) -> Vec<Operation<Out>>;

    /// Dispatches on the operation kind.
    fn transform(&mut self, op: Operation<In>) -> Vec<Operation<Out>> {
        match op {
            Operation::Insert(element) => self.transform_insert(element),
            Operation::Update(element) => self.transform_update(element),
            Operation::Delete(element) => self.transform_delete(element),
        }
    }
}

/// A sink and source at once: every operation it accepts is run through
/// its transform and the results are emitted, in order, before `accept`
/// returns.
pub struct Processor<In, Out, X> {
    transform: X,
    emitter: Emitter<Out>,
    _input: PhantomData<fn(In)>,
}

impl<In, Out, X> Processor<In, Out, X>
where
    X: Transform<In, Out>,
{
    pub fn new(transform: X) -> Self {
        Self {
            transform,
            emitter: Emitter::new(),
            _input: PhantomData,
        }
    }

    #[inline]
    pub fn transform(&self) -> &X {
        &self.transform
    }

    #[inline]
    pub fn transform_mut(&mut self) -> &mut X {
        &mut self.transform
    }

    /// Returns the number of attached sinks.
    #[inline]
    pub fn sink_count(&self) -> usize {
        self.emitter.len()
    }
}

impl<In, Out, X> Sink<In> for Processor<In, Out, X>
where
    Out: Clone,
    X: Transform<In, Out>,
{
    fn accept(&mut self, op: Operation<In>) {
        let kind = op.kind();
        let out = self.transform.transform(op);
        trace!("{:?} produced {} operation(s)", kind, out.len());
        self.emitter.emit_all(out);
    }
}

impl<In, Out, X> Source<Out> for Processor<In, Out, X> {
    fn attach(&mut self, sink: SinkHandle<Out>) -> SinkId {
        self.emitter.attach(sink)
    }

    fn detach(&mut self, id: SinkId) -> bool {
        self.emitter.detach(id)
    }
}
