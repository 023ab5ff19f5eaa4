use super::{GenericArray, RangeComponent};
use crate::prelude::*;

use std::any::Any;

impl<B: Backend> DataArray for GenericArray<B> {
    fn layout(&self) -> Layout {
        B::LAYOUT
    }

    fn scalar_type(&self) -> ScalarType {
        GenericArray::scalar_type(self)
    }

    fn name(&self) -> &str {
        GenericArray::name(self)
    }

    fn number_of_components(&self) -> usize {
        GenericArray::number_of_components(self)
    }

    fn number_of_tuples(&self) -> usize {
        GenericArray::number_of_tuples(self)
    }

    fn number_of_values(&self) -> usize {
        GenericArray::number_of_values(self)
    }

    fn component_f64(&self, tuple_idx: usize, component: usize) -> f64 {
        self.component(tuple_idx, component).as_f64()
    }

    fn set_component_f64(&mut self, tuple_idx: usize, component: usize, value: f64) {
        self.set_component(tuple_idx, component, B::Value::from_f64(value))
    }

    fn value_f64(&self, value_idx: usize) -> f64 {
        self.value(value_idx).as_f64()
    }

    fn set_value_f64(&mut self, value_idx: usize, value: f64) {
        self.set_value(value_idx, B::Value::from_f64(value))
    }

    fn tuple_f64(&self, tuple_idx: usize, tuple: &mut [f64]) {
        GenericArray::tuple_f64(self, tuple_idx, tuple)
    }

    fn set_tuple_f64(&mut self, tuple_idx: usize, tuple: &[f64]) {
        GenericArray::set_tuple_f64(self, tuple_idx, tuple)
    }

    fn insert_next_tuple_f64(&mut self, tuple: &[f64]) -> Result<usize, Error> {
        GenericArray::insert_next_tuple_f64(self, tuple)
    }

    fn set_number_of_components(&mut self, components: usize) -> Result<(), Error> {
        GenericArray::set_number_of_components(self, components)
    }

    fn set_number_of_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        GenericArray::set_number_of_tuples(self, tuples)
    }

    fn fill_component_f64(&mut self, component: usize, value: f64) -> Result<(), Error> {
        self.fill_component(component, B::Value::from_f64(value))
    }

    fn range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        GenericArray::range(self, which)
    }

    fn finite_range(&self, which: RangeComponent) -> Option<[f64; 2]> {
        GenericArray::finite_range(self, which)
    }

    fn actual_memory_size(&self) -> usize {
        GenericArray::actual_memory_size(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
