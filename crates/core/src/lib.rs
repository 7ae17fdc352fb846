//! Wattle Core - Operation stream types for the wattle aggregation pipeline.
//!
//! This crate provides the vocabulary shared by every pipeline stage:
//!
//! - `Operation`: Insert/Update/Delete of one element, the unit of dataflow
//! - `Sink` / `Source`: consume and emit ends of an operation stream
//! - `Emitter`: ordered fan-out list used by every source
//! - `Feed`: head of a pipeline, driven by the domain model
//! - `Value`: numeric values extracted by aggregate functions
//! - `AggregateResult`: snapshot of one group's computed values
//! - `Error`: broken-invariant errors
//!
//! # Example
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use wattle_core::{Feed, Operation, Sink, Source, VecSink};
//!
//! let sink = Rc::new(RefCell::new(VecSink::<i64>::new()));
//! let mut feed: Feed<i64> = Feed::new();
//! feed.attach(sink.clone());
//!
//! feed.insert(3);
//! feed.delete(3);
//!
//! assert_eq!(sink.borrow().ops(), &[Operation::Insert(3), Operation::Delete(3)]);
//! ```

#![no_std]

extern crate alloc;

mod error;
mod operation;
mod pipeline;
mod result;
mod value;

pub use error::{Error, Result};
pub use operation::{OpKind, Operation, OperationBatch, OperationBatchExt};
pub use pipeline::{Emitter, Feed, Sink, SinkHandle, SinkId, Source, VecSink};
pub use result::{AggregateResult, Identified};
pub use value::Value;
