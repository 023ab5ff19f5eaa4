use super::GenericArray;
use crate::prelude::*;

use std::cmp::Ordering;

/// Sorted `(value, index)` pairs for reverse lookups, plus the indices holding `NaN`.
#[derive(Debug)]
pub(crate) struct LookupTable<T> {
    sorted: Vec<(T, usize)>,
    nans: Vec<usize>,
}

impl<T: Scalar> LookupTable<T> {
    fn build<B: Backend<Value = T>>(backend: &B, values: usize) -> Self {
        tracing::trace!(values, "building value lookup table");

        let mut sorted = Vec::with_capacity(values);
        let mut nans = Vec::new();
        for idx in 0..values {
            let value = backend.get_value(idx);
            if value.is_nan() {
                nans.push(idx);
            } else {
                sorted.push((value, idx));
            }
        }

        // stable, so equal values stay in index order
        sorted.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        Self { sorted, nans }
    }

    fn matches(&self, value: T) -> &[(T, usize)] {
        let start = self.sorted.partition_point(|(v, _)| *v < value);
        let end = self.sorted.partition_point(|(v, _)| *v <= value);
        &self.sorted[start..end]
    }

    fn first(&self, value: T) -> Option<usize> {
        if value.is_nan() {
            self.nans.first().copied()
        } else {
            self.matches(value).first().map(|(_, idx)| *idx)
        }
    }

    fn all(&self, value: T) -> Vec<usize> {
        if value.is_nan() {
            self.nans.clone()
        } else {
            self.matches(value).iter().map(|(_, idx)| *idx).collect()
        }
    }
}

impl<B: Backend> GenericArray<B> {
    /// Index of a value equal to `value`, if any. `NaN` matches `NaN`.
    ///
    /// The first call after a modification builds a sorted table of every value, later calls
    /// are logarithmic.
    pub fn lookup_value(&self, value: B::Value) -> Option<usize> {
        self.with_lookup(|table| table.first(value))
    }

    /// every index holding `value`, ascending
    pub fn lookup_all(&self, value: B::Value) -> Vec<usize> {
        self.with_lookup(|table| table.all(value))
    }

    /// drop the lookup table, it is rebuilt on the next lookup
    pub fn clear_lookup(&self) {
        self.cache().lookup = None;
    }

    fn with_lookup<R>(&self, f: impl FnOnce(&LookupTable<B::Value>) -> R) -> R {
        let mut cache = self.cache();
        let table = cache
            .lookup
            .get_or_insert_with(|| LookupTable::build(&self.backend, self.len));
        f(table)
    }
}

#[cfg(test)]
mod tests {
    use crate::{AosArray, ScaledSoaArray};

    #[test]
    fn finds_every_match() {
        let mut array = AosArray::<i32>::with_components(2).unwrap();
        for v in [3, 1, 4, 1, 5, 9, 2, 6] {
            array.insert_next_value(v).unwrap();
        }

        assert_eq!(array.lookup_all(1), vec![1, 3]);
        assert!(matches!(array.lookup_value(1), Some(1) | Some(3)));
        assert_eq!(array.lookup_value(9), Some(5));
        assert_eq!(array.lookup_value(7), None);
        assert!(array.lookup_all(7).is_empty());
    }

    #[test]
    fn nan_matches_nan() {
        let mut array = AosArray::<f32>::new();
        for v in [f32::NAN, 0.0, -0.0, f32::NAN] {
            array.insert_next_value(v).unwrap();
        }

        assert_eq!(array.lookup_all(f32::NAN), vec![0, 3]);
        assert_eq!(array.lookup_all(0.0), vec![1, 2]);
    }

    #[test]
    fn rebuilt_after_modification() {
        let mut array = ScaledSoaArray::<u16>::new();
        array.insert_next_value(4).unwrap();
        assert_eq!(array.lookup_value(4), Some(0));

        array.set_scale(2).unwrap();
        assert_eq!(array.lookup_value(4), None);
        assert_eq!(array.lookup_value(8), Some(0));

        array.set_value(0, 6);
        assert_eq!(array.lookup_value(6), Some(0));

        array.clear_lookup();
        assert_eq!(array.lookup_all(6), vec![0]);
    }
}
