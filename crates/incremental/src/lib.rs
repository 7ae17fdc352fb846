//! Wattle Incremental - grouping aggregation over operation streams.
//!
//! Elements enter as `Insert`/`Update`/`Delete` operations. The aggregator
//! files each element into the groups its strategy names, folds the
//! element into every group's private accumulators, and emits one
//! `AggregateResult` operation per affected group. Nothing is ever
//! recomputed from scratch: a delete retracts exactly the snapshot that
//! was folded in.
//!
//! # Core Concepts
//!
//! - `AggregateFunction`: a per-group accumulator with fold and retract
//! - `Group`: members of one group plus their accumulators
//! - `AggregateStrategy`: group lookup, function factory and result shape
//! - `Aggregator`: the stage tying these together
//! - `Processor` + `Transform`: generic stages for reshaping a stream
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use wattle_core::{AggregateResult, Sink, Source, Value, VecSink};
//! use wattle_incremental::AggregatorBuilder;
//!
//! let mut agg = AggregatorBuilder::new()
//!     .group_by(|x: &i64| vec![if x % 2 == 0 { "EVEN" } else { "ODD" }])
//!     .sum(|x: &i64| Some(Value::Int(*x)))
//!     .build()
//!     .unwrap();
//! let out = Rc::new(RefCell::new(VecSink::<AggregateResult<&str>>::new()));
//! agg.attach(out.clone());
//!
//! for x in 0..6 {
//!     agg.insert(x);
//! }
//! agg.delete(2);
//!
//! assert_eq!(agg.result(&"EVEN").and_then(|r| r.get(0)), Some(Value::Int(4)));
//! assert_eq!(agg.result(&"ODD").and_then(|r| r.get(0)), Some(Value::Int(9)));
//! assert_eq!(out.borrow().len(), 7);
//! ```

#![no_std]

extern crate alloc;

pub mod aggregator;
pub mod builder;
pub mod config;
pub mod function;
pub mod group;
pub mod operators;
pub mod processor;

pub use aggregator::{AggregateStrategy, Aggregator};
pub use builder::{AggregatorBuilder, FnStrategy};
pub use config::AggregatorConfig;
pub use function::{AggregateFunction, Avg, BoxedFunction, Count, ExtractorFn, Max, Min, Sum};
pub use group::Group;
pub use operators::{Filter, FlatMap, Map};
pub use processor::{Processor, Transform};
