//! Kind-preserving map and flat-map transforms.

use crate::processor::Transform;
use alloc::vec::Vec;
use wattle_core::Operation;

/// Maps each element one-to-one, keeping the operation kind.
pub struct Map<F> {
    mapper: F,
}

impl<F> Map<F> {
    pub fn new(mapper: F) -> Self {
        Self { mapper }
    }
}

impl<In, Out, F> Transform<In, Out> for Map<F>
where
    F: FnMut(In) -> Out,
{
    fn transform_insert(&mut self, element: In) -> Vec<Operation<Out>> {
        alloc::vec![Operation::Insert((self.mapper)(element))]
    }

    fn transform_update(&mut self, element: In) -> Vec<Operation<Out>> {
        alloc::vec![Operation::Update((self.mapper)(element))]
    }

    fn transform_delete(&mut self, element: In) -> Vec<Operation<Out>> {
        alloc::vec![Operation::Delete((self.mapper)(element))]
    }
}

/// Expands each element into zero or more elements, all carrying the
/// input operation's kind.
///
/// Typical use is re-keying a container change into changes of the items
/// it holds, e.g. an area into the devices inside it.
pub struct FlatMap<F> {
    expand: F,
}

impl<F> FlatMap<F> {
    pub fn new(expand: F) -> Self {
        Self { expand }
    }
}

impl<In, Out, F> Transform<In, Out> for FlatMap<F>
where
    F: FnMut(In) -> Vec<Out>,
{
    fn transform_insert(&mut self, element: In) -> Vec<Operation<Out>> {
        (self.expand)(element).into_iter().map(Operation::Insert).collect()
    }

    fn transform_update(&mut self, element: In) -> Vec<Operation<Out>> {
        (self.expand)(element).into_iter().map(Operation::Update).collect()
    }

    fn transform_delete(&mut self, element: In) -> Vec<Operation<Out>> {
        (self.expand)(element).into_iter().map(Operation::Delete).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::{String, ToString};
    use alloc::vec;

    #[test]
    fn test_map_basic() {
        let mut map = Map::new(|x: i32| x * 2);
        assert_eq!(map.transform(Operation::Insert(1)), vec![Operation::Insert(2)]);
        assert_eq!(map.transform(Operation::Delete(3)), vec![Operation::Delete(6)]);
    }

    #[test]
    fn test_map_preserves_kind() {
        let mut map = Map::new(|x: i32| x.to_string());
        let out: Vec<Operation<String>> = map.transform(Operation::Update(5));
        assert_eq!(out, vec![Operation::Update("5".to_string())]);
    }

    #[test]
    fn test_flat_map_fan_out() {
        let mut devices = FlatMap::new(|area: u32| -> Vec<u32> { (0..3).map(|i| area * 10 + i).collect() });
        let out: Vec<Operation<u32>> = devices.transform(Operation::Update(4));
        assert_eq!(
            out,
            vec![Operation::Update(40), Operation::Update(41), Operation::Update(42)]
        );
    }

    #[test]
    fn test_flat_map_empty() {
        let mut nothing = FlatMap::new(|_: u32| Vec::<u32>::new());
        assert!(nothing.transform(Operation::Insert(1)).is_empty());
    }
}
