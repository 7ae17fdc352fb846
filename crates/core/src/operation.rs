//! Operation type, the unit of dataflow.
//!
//! An Operation tags a single element with the kind of change that
//! happened to it: insertion, update, or deletion.

use alloc::vec::Vec;

/// The kind of change an operation carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpKind {
    Insert,
    Update,
    Delete,
}

/// A change to one element.
///
/// Operations are immutable once built. Each attached sink receives its
/// own copy and consumes it exactly once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation<T> {
    /// The element entered the stream
    Insert(T),
    /// The element changed in place
    Update(T),
    /// The element left the stream
    Delete(T),
}

impl<T> Operation<T> {
    /// Creates an operation of the given kind.
    #[inline]
    pub fn new(kind: OpKind, element: T) -> Self {
        match kind {
            OpKind::Insert => Operation::Insert(element),
            OpKind::Update => Operation::Update(element),
            OpKind::Delete => Operation::Delete(element),
        }
    }

    /// Returns the kind of this operation.
    #[inline]
    pub fn kind(&self) -> OpKind {
        match self {
            Operation::Insert(_) => OpKind::Insert,
            Operation::Update(_) => OpKind::Update,
            Operation::Delete(_) => OpKind::Delete,
        }
    }

    /// Returns a reference to the element.
    #[inline]
    pub fn element(&self) -> &T {
        match self {
            Operation::Insert(e) | Operation::Update(e) | Operation::Delete(e) => e,
        }
    }

    /// Consumes the operation and returns the element.
    #[inline]
    pub fn into_element(self) -> T {
        match self {
            Operation::Insert(e) | Operation::Update(e) | Operation::Delete(e) => e,
        }
    }

    /// Splits the operation into its kind and element.
    #[inline]
    pub fn into_parts(self) -> (OpKind, T) {
        let kind = self.kind();
        (kind, self.into_element())
    }

    #[inline]
    pub fn is_insert(&self) -> bool {
        matches!(self, Operation::Insert(_))
    }

    #[inline]
    pub fn is_update(&self) -> bool {
        matches!(self, Operation::Update(_))
    }

    #[inline]
    pub fn is_delete(&self) -> bool {
        matches!(self, Operation::Delete(_))
    }

    /// Maps the element to a new type, keeping the kind.
    #[inline]
    pub fn map<U, F>(self, f: F) -> Operation<U>
    where
        F: FnOnce(T) -> U,
    {
        let (kind, element) = self.into_parts();
        Operation::new(kind, f(element))
    }
}

/// A batch of operations, in emission order.
pub type OperationBatch<T> = Vec<Operation<T>>;

/// Extension trait for working with operation batches.
pub trait OperationBatchExt<T> {
    /// Counts the operations of the given kind.
    fn count_kind(&self, kind: OpKind) -> usize;

    /// Returns the elements of the operations of the given kind.
    fn elements_of(&self, kind: OpKind) -> Vec<&T>;
}

impl<T> OperationBatchExt<T> for [Operation<T>] {
    fn count_kind(&self, kind: OpKind) -> usize {
        self.iter().filter(|op| op.kind() == kind).count()
    }

    fn elements_of(&self, kind: OpKind) -> Vec<&T> {
        self.iter()
            .filter(|op| op.kind() == kind)
            .map(Operation::element)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_operation_insert() {
        let op = Operation::Insert(42);
        assert!(op.is_insert());
        assert!(!op.is_update());
        assert!(!op.is_delete());
        assert_eq!(op.kind(), OpKind::Insert);
        assert_eq!(*op.element(), 42);
    }

    #[test]
    fn test_operation_new_matches_kind() {
        assert_eq!(Operation::new(OpKind::Update, 1), Operation::Update(1));
        assert_eq!(Operation::new(OpKind::Delete, 1), Operation::Delete(1));
    }

    #[test]
    fn test_operation_map_keeps_kind() {
        let op = Operation::Delete(21).map(|x| x * 2);
        assert_eq!(op, Operation::Delete(42));
    }

    #[test]
    fn test_operation_into_parts() {
        let (kind, element) = Operation::Update("lamp").into_parts();
        assert_eq!(kind, OpKind::Update);
        assert_eq!(element, "lamp");
    }

    #[test]
    fn test_batch_count_kind() {
        let batch: OperationBatch<i32> = vec![
            Operation::Insert(1),
            Operation::Insert(2),
            Operation::Delete(3),
        ];
        assert_eq!(batch.count_kind(OpKind::Insert), 2);
        assert_eq!(batch.count_kind(OpKind::Update), 0);
        assert_eq!(batch.elements_of(OpKind::Delete), vec![&3]);
    }
}
