//! Error types for the wattle pipeline.
//!
//! These describe broken invariants. The plain `Sink` entry points treat
//! them as fatal and panic; the checked `try_*` entry points on the
//! aggregator hand them back before any state is touched.

use alloc::format;
use alloc::string::String;
use core::fmt::Debug;
use thiserror::Error as ThisError;

/// Result type alias for wattle operations.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum Error {
    /// Insert of an element that is already a member.
    #[error("element {element} inserted twice without an intervening delete")]
    DuplicateMember { element: String },

    /// Update or delete of an element that was never inserted.
    #[error("element {element} is not a member of this aggregator")]
    NotAMember { element: String },

    /// A recorded group does not hold the element it should hold.
    #[error("group {group} has no recorded member {element}")]
    MissingMember { group: String, element: String },

    /// A builder was finished without a required strategy piece.
    #[error("aggregator builder is missing `{what}`")]
    MissingStrategy { what: &'static str },

    /// The function factory returned a differently shaped set.
    #[error("aggregate function factory returned {got} functions, expected {expected}")]
    ShapeMismatch { expected: usize, got: usize },
}

impl Error {
    /// Creates a duplicate member error.
    pub fn duplicate_member(element: &impl Debug) -> Self {
        Error::DuplicateMember {
            element: format!("{:?}", element),
        }
    }

    /// Creates a not-a-member error.
    pub fn not_a_member(element: &impl Debug) -> Self {
        Error::NotAMember {
            element: format!("{:?}", element),
        }
    }

    /// Creates a missing member error.
    pub fn missing_member(group: &impl Debug, element: &impl Debug) -> Self {
        Error::MissingMember {
            group: format!("{:?}", group),
            element: format!("{:?}", element),
        }
    }

    /// Creates a missing strategy error.
    pub fn missing_strategy(what: &'static str) -> Self {
        Error::MissingStrategy { what }
    }

    /// Creates a shape mismatch error.
    pub fn shape_mismatch(expected: usize, got: usize) -> Self {
        Error::ShapeMismatch { expected, got }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_display() {
        let err = Error::duplicate_member(&42);
        assert!(err.to_string().contains("42"));

        let err = Error::missing_member(&"EVEN", &2);
        assert!(err.to_string().contains("\"EVEN\""));

        let err = Error::missing_strategy("groups");
        assert!(err.to_string().contains("groups"));
    }

    #[test]
    fn test_error_constructors() {
        match Error::shape_mismatch(2, 3) {
            Error::ShapeMismatch { expected, got } => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            _ => panic!("Wrong error type"),
        }
    }
}
