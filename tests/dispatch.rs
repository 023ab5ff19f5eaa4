use std::any::TypeId;

use vtk_array::dispatch::{AllArrays, AosArrays, Integrals, Reals, SoaArrays};
use vtk_array::prelude::*;
use vtk_array::{dispatch2, dispatch3, dispatch_list};

/// reports the concrete array type the worker was monomorphized for
struct Identify<'a> {
    calls: &'a mut usize,
}

impl<'a> Worker for Identify<'a> {
    type Output = TypeId;

    fn execute<B: Backend>(self, _array: &GenericArray<B>) -> TypeId {
        *self.calls += 1;
        TypeId::of::<GenericArray<B>>()
    }
}

fn every_array() -> Vec<AnyArray> {
    [Layout::Aos, Layout::Soa, Layout::ScaledSoa]
        .into_iter()
        .flat_map(|layout| {
            ScalarType::ALL
                .into_iter()
                .map(move |ty| AnyArray::new(layout, ty))
        })
        .collect()
}

#[test]
fn every_member_dispatches_exactly_once() {
    for array in every_array() {
        let mut calls = 0;
        let found = AllArrays::dispatch(&array, Identify { calls: &mut calls })
            .ok()
            .unwrap();

        assert_eq!(calls, 1);
        assert_eq!(found, array.as_data_array().as_any().type_id());
    }
}

#[test]
fn misses_are_reported() {
    let mut misses = 0;
    for array in every_array() {
        let real = array.scalar_type() == ScalarType::Float32
            || array.scalar_type() == ScalarType::Float64;

        assert_eq!(Reals::contains(&array), real);
        assert_eq!(Integrals::contains(&array), !real);

        let mut calls = 0;
        let result = Reals::dispatch(&array, Identify { calls: &mut calls });
        if result.is_err() {
            misses += 1;
            assert_eq!(calls, 0);
        }
    }
    assert_eq!(misses, 24);

    let scaled = AnyArray::new(Layout::ScaledSoa, ScalarType::Float32);
    assert!(!<(AosArrays, SoaArrays)>::contains(&scaled));
    assert!(!<()>::contains(&scaled));
}

dispatch_list! {
    Narrow = [AosArray<f64>, SoaArray<i32>]
}

#[test]
fn custom_lists() {
    let hit = AnyArray::new(Layout::Soa, ScalarType::Int32);
    let miss = AnyArray::new(Layout::Aos, ScalarType::Int32);

    assert!(Narrow::contains(&hit));
    assert!(!Narrow::contains(&miss));
    assert!(<(Narrow, AosArray<i32>)>::contains(&miss));
    assert!(SoaArray::<i32>::contains(&hit));
}

struct Sum;

impl Worker3 for Sum {
    type Output = Result<(), vtk_array::Error>;

    fn execute<A: Backend, B: Backend, C: Backend>(
        self,
        first: &GenericArray<A>,
        second: &GenericArray<B>,
        dest: &mut GenericArray<C>,
    ) -> Self::Output {
        dest.set_number_of_tuples(first.number_of_tuples())?;
        for idx in 0..first.number_of_values() {
            let sum = first.value(idx).as_f64() + second.value(idx).as_f64();
            dest.set_value(idx, C::Value::from_f64(sum));
        }
        Ok(())
    }
}

struct Negate;

impl Worker2 for Negate {
    type Output = ();

    fn execute<A: Backend, B: Backend>(self, source: &GenericArray<A>, dest: &mut GenericArray<B>) {
        for idx in 0..source.number_of_values() {
            dest.insert_next_value(B::Value::from_f64(-source.value(idx).as_f64()))
                .unwrap();
        }
    }
}

#[test]
fn multi_array_dispatch() {
    let mut first = AnyArray::new(Layout::Aos, ScalarType::Int16);
    let mut second = AnyArray::new(Layout::ScaledSoa, ScalarType::Float64);
    for v in [1.0, 2.0, 3.0] {
        first.insert_next_tuple_f64(&[v]).unwrap();
        second.insert_next_tuple_f64(&[v / 2.0]).unwrap();
    }

    let mut dest = AnyArray::new(Layout::Soa, ScalarType::Float32);
    dispatch3::<Integrals, Reals, Reals, _>(&first, &second, &mut dest, Sum)
        .ok()
        .unwrap()
        .unwrap();
    let dest_values: Vec<f64> = (0..3).map(|i| dest.value_f64(i)).collect();
    assert_eq!(dest_values, vec![1.5, 3.0, 4.5]);

    // the second array is not integral: nothing runs
    assert!(dispatch3::<Integrals, Integrals, Reals, _>(&first, &second, &mut dest, Sum).is_err());
    assert_eq!(dest.number_of_values(), 3);

    let mut negated = AnyArray::new(Layout::Aos, ScalarType::Int8);
    dispatch2::<AllArrays, Integrals, _>(&first, &mut negated, Negate)
        .ok()
        .unwrap();
    assert_eq!(negated.value_f64(2), -3.0);

    // destination not in the list
    assert!(dispatch2::<AllArrays, Reals, _>(&first, &mut negated, Negate).is_err());
    assert_eq!(negated.number_of_values(), 3);
}

#[test]
fn deep_copy_through_any_array() {
    let mut source = AnyArray::with_components(Layout::Soa, ScalarType::UInt64, 2).unwrap();
    source.insert_next_tuple_f64(&[1.0, 2.0]).unwrap();
    source.insert_next_tuple_f64(&[3.0, 4.0]).unwrap();

    let mut dest = AnyArray::new(Layout::ScaledSoa, ScalarType::Float32);
    dest.deep_copy(&source).unwrap();
    dest.deep_copy(&source).unwrap();

    assert_eq!(dest.number_of_components(), 2);
    assert_eq!(dest.number_of_tuples(), 2);
    for i in 0..4 {
        assert_eq!(dest.value_f64(i), source.value_f64(i));
    }
}
