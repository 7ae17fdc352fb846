//! Wattle Reactive - result tables at the end of a pipeline.
//!
//! A `TableSink` keeps the latest `AggregateResult` row per group, the
//! way a UI table shows one line per area or floor, and pushes each row
//! change to its subscribers.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use wattle_core::{Sink, Source, Value};
//! use wattle_incremental::AggregatorBuilder;
//! use wattle_reactive::TableSink;
//!
//! let mut agg = AggregatorBuilder::new()
//!     .group_by(|x: &i64| vec![x % 2 == 0])
//!     .sum(|x: &i64| Some(Value::Int(*x)))
//!     .build()
//!     .unwrap();
//! let table = Rc::new(RefCell::new(TableSink::<bool>::new()));
//! agg.attach(table.clone());
//!
//! agg.insert(3);
//! agg.insert(4);
//! assert_eq!(table.borrow().value(&false, 0), Some(Value::Int(3)));
//! assert_eq!(table.borrow().len(), 2);
//! ```

#![no_std]

extern crate alloc;

pub mod change;
pub mod subscription;
pub mod table;

pub use change::TableChange;
pub use subscription::{ChangeCallback, Subscription, SubscriptionId, SubscriptionManager};
pub use table::TableSink;
