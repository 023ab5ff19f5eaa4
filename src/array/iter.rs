use super::GenericArray;
use crate::prelude::*;

use std::iter::FusedIterator;

/// Iterator over the populated values, in AoS order. Created by [`GenericArray::values`].
pub struct Values<'a, B: Backend> {
    array: &'a GenericArray<B>,
    front: usize,
    back: usize,
}

impl<'a, B: Backend> Iterator for Values<'a, B> {
    type Item = B::Value;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let value = self.array.backend.get_value(self.front);
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, B: Backend> DoubleEndedIterator for Values<'a, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(self.array.backend.get_value(self.back))
    }
}

impl<'a, B: Backend> ExactSizeIterator for Values<'a, B> {}
impl<'a, B: Backend> FusedIterator for Values<'a, B> {}

/// One tuple of an array, read lazily.
pub struct TupleRef<'a, B: Backend> {
    array: &'a GenericArray<B>,
    tuple: usize,
}

impl<'a, B: Backend> Clone for TupleRef<'a, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, B: Backend> Copy for TupleRef<'a, B> {}

impl<'a, B: Backend> TupleRef<'a, B> {
    /// index of the tuple in the array
    pub fn index(&self) -> usize {
        self.tuple
    }

    pub fn len(&self) -> usize {
        self.array.number_of_components()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, component: usize) -> B::Value {
        self.array.component(self.tuple, component)
    }

    pub fn iter(&self) -> impl Iterator<Item = B::Value> + 'a {
        let (array, tuple) = (self.array, self.tuple);
        (0..array.number_of_components()).map(move |component| array.component(tuple, component))
    }

    pub fn to_vec(&self) -> Vec<B::Value> {
        self.iter().collect()
    }
}

/// Iterator over the complete tuples. Created by [`GenericArray::tuples`].
pub struct Tuples<'a, B: Backend> {
    array: &'a GenericArray<B>,
    front: usize,
    back: usize,
}

impl<'a, B: Backend> Iterator for Tuples<'a, B> {
    type Item = TupleRef<'a, B>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let tuple = TupleRef {
            array: self.array,
            tuple: self.front,
        };
        self.front += 1;
        Some(tuple)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, B: Backend> DoubleEndedIterator for Tuples<'a, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(TupleRef {
            array: self.array,
            tuple: self.back,
        })
    }
}

impl<'a, B: Backend> ExactSizeIterator for Tuples<'a, B> {}
impl<'a, B: Backend> FusedIterator for Tuples<'a, B> {}

/// Iterator over one component of every complete tuple. Created by
/// [`GenericArray::component_values`].
pub struct ComponentValues<'a, B: Backend> {
    array: &'a GenericArray<B>,
    component: usize,
    front: usize,
    back: usize,
}

impl<'a, B: Backend> Iterator for ComponentValues<'a, B> {
    type Item = B::Value;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let value = self.array.backend.get_component(self.front, self.component);
        self.front += 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }
}

impl<'a, B: Backend> ExactSizeIterator for ComponentValues<'a, B> {}
impl<'a, B: Backend> FusedIterator for ComponentValues<'a, B> {}

impl<B: Backend> GenericArray<B> {
    pub fn values(&self) -> Values<'_, B> {
        Values {
            array: self,
            front: 0,
            back: self.len,
        }
    }

    pub fn tuples(&self) -> Tuples<'_, B> {
        Tuples {
            array: self,
            front: 0,
            back: self.number_of_tuples(),
        }
    }

    /// Values of one component. Empty when `component` is out of range.
    pub fn component_values(&self, component: usize) -> ComponentValues<'_, B> {
        let back = if component < self.number_of_components() {
            self.number_of_tuples()
        } else {
            0
        };

        ComponentValues {
            array: self,
            component,
            front: 0,
            back,
        }
    }
}
