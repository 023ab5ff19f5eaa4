use super::soa::{ComponentBuffers, SoaBackend};
use super::GenericArray;
use crate::prelude::*;

/// Struct-of-arrays storage where every value is multiplied by `scale` when read and divided
/// by it when written.
///
/// For integral types the division truncates toward zero, so reading back a written value
/// only reproduces it when it is a multiple of the scale.
#[derive(Debug)]
pub struct ScaledSoaBackend<T: Scalar> {
    inner: SoaBackend<T>,
    scale: T,
}

impl<T: Scalar> Default for ScaledSoaBackend<T> {
    fn default() -> Self {
        Self {
            inner: SoaBackend::default(),
            scale: T::one(),
        }
    }
}

impl<T: Scalar> ScaledSoaBackend<T> {
    pub fn scale(&self) -> T {
        self.scale
    }

    /// Change the scale without touching the stored values. Zero is rejected and leaves the
    /// scale unchanged.
    pub fn set_scale(&mut self, scale: T) -> Result<(), Error> {
        if scale.is_zero() {
            return Err(Error::ZeroScale);
        }
        self.scale = scale;
        Ok(())
    }

    /// the unscaled storage
    pub fn inner(&self) -> &SoaBackend<T> {
        &self.inner
    }
}

impl<T: Scalar> Backend for ScaledSoaBackend<T> {
    type Value = T;

    const LAYOUT: Layout = Layout::ScaledSoa;

    fn components(&self) -> usize {
        self.inner.components()
    }

    fn set_components(&mut self, components: usize) -> Result<(), Error> {
        self.inner.set_components(components).map_err(|err| match err {
            Error::ComponentsLocked {
                current, requested, ..
            } => Error::ComponentsLocked {
                layout: Self::LAYOUT,
                current,
                requested,
            },
            other => other,
        })
    }

    fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    #[inline]
    fn get_value(&self, value_idx: usize) -> T {
        self.inner.get_value(value_idx).scale_up(self.scale)
    }

    #[inline]
    fn set_value(&mut self, value_idx: usize, value: T) {
        self.inner.set_value(value_idx, value.scale_down(self.scale))
    }

    #[inline]
    fn get_tuple(&self, tuple_idx: usize, tuple: &mut [T]) {
        self.inner.get_tuple(tuple_idx, tuple);
        for value in tuple.iter_mut().take(self.components()) {
            *value = value.scale_up(self.scale);
        }
    }

    #[inline]
    fn set_tuple(&mut self, tuple_idx: usize, tuple: &[T]) {
        for (component, value) in tuple.iter().take(self.components()).enumerate() {
            self.inner
                .set_component(tuple_idx, component, value.scale_down(self.scale));
        }
    }

    #[inline]
    fn get_component(&self, tuple_idx: usize, component: usize) -> T {
        self.inner
            .get_component(tuple_idx, component)
            .scale_up(self.scale)
    }

    #[inline]
    fn set_component(&mut self, tuple_idx: usize, component: usize, value: T) {
        self.inner
            .set_component(tuple_idx, component, value.scale_down(self.scale))
    }

    fn allocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.inner.allocate_tuples(tuples)
    }

    fn reallocate_tuples(&mut self, tuples: usize) -> Result<(), Error> {
        self.inner.reallocate_tuples(tuples)
    }

    fn fill(&mut self, values: usize, value: T) {
        self.inner.fill(values, value.scale_down(self.scale))
    }

    fn fill_component(&mut self, tuples: usize, component: usize, value: T) {
        self.inner
            .fill_component(tuples, component, value.scale_down(self.scale))
    }

    /// copies the stored values together with the scale
    fn copy_from(&mut self, source: &Self, tuples: usize, policy: &CopyPolicy) {
        self.scale = source.scale;
        self.inner.copy_from(&source.inner, tuples, policy);
    }

    fn shallow_copy(&self) -> Self {
        Self {
            inner: self.inner.shallow_copy(),
            scale: self.scale,
        }
    }

    unsafe fn alias(&mut self) -> Self {
        Self {
            // SAFETY: forwarded to the caller
            inner: unsafe { self.inner.alias() },
            scale: self.scale,
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation()
    }

    fn scale_factor(&self) -> Option<f64> {
        Some(self.scale.as_f64())
    }

    /// a scale that does not survive the conversion to `T` (zero) leaves the scale alone
    fn adopt_scale(&mut self, scale: f64) {
        let scale = T::from_f64(scale);
        if !scale.is_zero() {
            self.scale = scale;
        }
    }

    fn release(&mut self) {
        self.inner.release()
    }

    fn memory_size(&self) -> usize {
        self.inner.memory_size()
    }
}

impl<T: Scalar> ComponentBuffers for ScaledSoaBackend<T> {
    fn component_buffer(&self, component: usize) -> &Buffer<T> {
        self.inner.component_buffer(component)
    }

    fn component_buffer_mut(&mut self, component: usize) -> &mut Buffer<T> {
        self.inner.component_buffer_mut(component)
    }

    fn buffers_replaced(&mut self) {
        self.inner.buffers_replaced()
    }
}

impl<T: Scalar> GenericArray<ScaledSoaBackend<T>> {
    pub fn scale(&self) -> T {
        self.backend.scale()
    }

    /// Change the scale. Stored values are kept, so every logical value changes with it.
    pub fn set_scale(&mut self, scale: T) -> Result<(), Error> {
        self.backend.set_scale(scale)?;
        tracing::trace!(%scale, "scale changed");
        self.data_changed();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RangeComponent;

    #[test]
    fn reads_and_writes_are_scaled() {
        let mut array = GenericArray::<ScaledSoaBackend<f64>>::with_components(2).unwrap();
        array.set_scale(2.0).unwrap();
        array.insert_next_typed_tuple(&[3.0, 5.0]).unwrap();

        assert_eq!(array.component_slice(0), &[1.5]);
        assert_eq!(array.component(0, 1), 5.0);

        let mut tuple = [0.0; 2];
        array.typed_tuple(0, &mut tuple);
        assert_eq!(tuple, [3.0, 5.0]);
    }

    #[test]
    fn integer_writes_truncate() {
        let mut array = GenericArray::<ScaledSoaBackend<i32>>::new();
        array.set_scale(2).unwrap();
        array.insert_next_value(7).unwrap();
        array.insert_next_value(-7).unwrap();

        assert_eq!(array.component_slice(0), &[3, -3]);
        assert_eq!(array.value(0), 6);
        assert_eq!(array.value(1), -6);
    }

    #[test]
    fn zero_scale_rejected() {
        let mut array = GenericArray::<ScaledSoaBackend<f32>>::new();
        array.set_scale(4.0).unwrap();
        assert!(matches!(array.set_scale(0.0), Err(Error::ZeroScale)));
        assert_eq!(array.scale(), 4.0);
    }

    #[test]
    fn scale_change_invalidates_range() {
        let mut array = GenericArray::<ScaledSoaBackend<f64>>::new();
        array.insert_next_value(1.0).unwrap();
        array.insert_next_value(3.0).unwrap();
        assert_eq!(array.range(RangeComponent::Component(0)), Some([1.0, 3.0]));

        array.set_scale(10.0).unwrap();
        assert_eq!(array.range(RangeComponent::Component(0)), Some([10.0, 30.0]));
    }

    #[test]
    fn converting_copy_keeps_the_scale() {
        let mut source = GenericArray::<ScaledSoaBackend<i32>>::with_components(2).unwrap();
        source.set_scale(4).unwrap();
        source.insert_next_typed_tuple(&[8, -12]).unwrap();

        let mut dest = GenericArray::<ScaledSoaBackend<f32>>::new();
        dest.deep_copy(&source).unwrap();
        assert_eq!(dest.scale(), 4.0);
        assert_eq!(dest.component_slice(0), &[2.0]);
        assert_eq!(dest.component(0, 1), -12.0);

        // an unscaled source leaves the destination at one
        let mut plain = crate::SoaArray::<f64>::new();
        plain.insert_next_value(3.0).unwrap();
        dest.deep_copy(&plain).unwrap();
        assert_eq!(dest.scale(), 1.0);

        // a fractional scale cannot be held by an integral array
        let mut fractional = GenericArray::<ScaledSoaBackend<f64>>::new();
        fractional.set_scale(0.5).unwrap();
        fractional.insert_next_value(3.0).unwrap();
        let mut narrow = GenericArray::<ScaledSoaBackend<i16>>::new();
        narrow.deep_copy(&fractional).unwrap();
        assert_eq!(narrow.scale(), 1);
        assert_eq!(narrow.value(0), 3);
    }

    #[test]
    fn locked_components_report_scaled_layout() {
        let mut array = GenericArray::<ScaledSoaBackend<u8>>::with_components(2).unwrap();
        array.set_number_of_tuples(1).unwrap();
        assert!(matches!(
            array.set_number_of_components(1),
            Err(Error::ComponentsLocked {
                layout: Layout::ScaledSoa,
                ..
            })
        ));
    }
}
