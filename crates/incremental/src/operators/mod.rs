//! Stock transforms for `Processor` stages.
//!
//! - `Map`: one-to-one, kind-preserving
//! - `FlatMap`: one-to-many, kind-preserving
//! - `Filter`: predicate with boundary-crossing updates

mod filter;
mod map;

pub use filter::Filter;
pub use map::{FlatMap, Map};
