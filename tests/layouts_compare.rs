//! The same logical contents behave the same in every layout.

use proptest::prelude::*;
use vtk_array::prelude::*;
use vtk_array::{AosBackend, ScaledSoaBackend, SoaBackend};

/// splits every non empty copy into chunks
const ALWAYS_PARALLEL: CopyPolicy = CopyPolicy {
    parallel_threshold_bytes: 1,
    min_chunk_bytes: 1,
    max_tasks: 4,
};

fn arb_contents() -> impl Strategy<Value = (usize, Vec<i32>)> {
    (1usize..5).prop_flat_map(|components| {
        let values = proptest::collection::vec(-50i32..50, 0..12)
            .prop_map(move |base| base.repeat(components));
        (Just(components), values)
    })
}

fn arb_f32_contents() -> impl Strategy<Value = (usize, Vec<f32>)> {
    (1usize..4, 0usize..10).prop_flat_map(|(components, tuples)| {
        let value = prop_oneof![
            8 => (-1.0e3f32..1.0e3),
            1 => Just(f32::NAN),
            1 => Just(f32::INFINITY),
        ];
        (
            Just(components),
            proptest::collection::vec(value, components * tuples),
        )
    })
}

fn build<B: Backend>(components: usize, values: &[B::Value]) -> GenericArray<B> {
    let mut array = GenericArray::<B>::with_components(components).unwrap();
    for value in values {
        array.insert_next_value(*value).unwrap();
    }
    array
}

fn ranges<B: Backend>(array: &GenericArray<B>) -> Vec<Option<[f64; 2]>> {
    let mut out: Vec<_> = (0..array.number_of_components())
        .flat_map(|c| {
            [
                array.range(RangeComponent::Component(c)),
                array.finite_range(RangeComponent::Component(c)),
            ]
        })
        .collect();
    out.push(array.range(RangeComponent::Magnitude));
    out.push(array.finite_range(RangeComponent::Magnitude));
    out
}

proptest! {
    #[test]
    fn integer_layouts_agree((components, values) in arb_contents(), needle in -50i32..50) {
        let aos = build::<AosBackend<i32>>(components, &values);
        let soa = build::<SoaBackend<i32>>(components, &values);
        let scaled = build::<ScaledSoaBackend<i32>>(components, &values);

        prop_assert_eq!(aos.number_of_tuples(), soa.number_of_tuples());
        prop_assert_eq!(aos.values().collect::<Vec<_>>(), soa.values().collect::<Vec<_>>());
        prop_assert_eq!(aos.values().collect::<Vec<_>>(), scaled.values().collect::<Vec<_>>());

        prop_assert_eq!(ranges(&aos), ranges(&soa));
        prop_assert_eq!(ranges(&aos), ranges(&scaled));

        for c in 0..components {
            prop_assert_eq!(aos.value_range(c, None), soa.value_range(c, None));
        }

        prop_assert_eq!(aos.lookup_value(needle), soa.lookup_value(needle));
        prop_assert_eq!(aos.lookup_all(needle), scaled.lookup_all(needle));
    }

    #[test]
    fn float_layouts_agree((components, values) in arb_f32_contents()) {
        let aos = build::<AosBackend<f32>>(components, &values);
        let soa = build::<SoaBackend<f32>>(components, &values);

        prop_assert_eq!(ranges(&aos), ranges(&soa));
        prop_assert_eq!(aos.lookup_all(f32::NAN), soa.lookup_all(f32::NAN));
    }

    #[test]
    fn deep_copy_is_idempotent((components, values) in arb_contents()) {
        let source = build::<SoaBackend<i32>>(components, &values);

        let mut dest = AosArray::<i16>::new();
        dest.deep_copy(&source).unwrap();
        let first: Vec<i16> = dest.values().collect();
        dest.deep_copy(&source).unwrap();

        prop_assert_eq!(dest.number_of_components(), components);
        prop_assert_eq!(dest.number_of_tuples(), source.number_of_tuples());
        prop_assert_eq!(dest.values().collect::<Vec<_>>(), first);
        for (idx, value) in source.values().enumerate() {
            prop_assert_eq!(dest.value(idx) as i32, value);
        }
    }

    #[test]
    fn chunked_deep_copy_matches_source((components, values) in arb_contents()) {
        let aos = build::<AosBackend<i32>>(components, &values);
        let soa = build::<SoaBackend<i32>>(components, &values);
        let mut scaled = build::<ScaledSoaBackend<i32>>(components, &values);
        scaled.set_scale(3).unwrap();

        let mut aos_copy = AosArray::<i32>::new();
        aos_copy.deep_copy_with(&aos, &ALWAYS_PARALLEL).unwrap();
        let mut soa_copy = SoaArray::<i32>::new();
        soa_copy.deep_copy_with(&soa, &ALWAYS_PARALLEL).unwrap();
        let mut scaled_copy = ScaledSoaArray::<i32>::new();
        scaled_copy.deep_copy_with(&scaled, &ALWAYS_PARALLEL).unwrap();

        prop_assert_eq!(aos_copy.number_of_components(), components);
        prop_assert_eq!(soa_copy.number_of_tuples(), soa.number_of_tuples());
        prop_assert_eq!(aos_copy.as_slice(), aos.as_slice());
        prop_assert_eq!(soa_copy.values().collect::<Vec<_>>(), values.clone());
        let tuples = soa.number_of_tuples();
        for c in 0..components {
            prop_assert_eq!(&soa_copy.component_slice(c)[..tuples], &soa.component_slice(c)[..tuples]);
        }
        prop_assert_eq!(scaled_copy.scale(), 3);
        prop_assert_eq!(
            scaled_copy.values().collect::<Vec<_>>(),
            scaled.values().collect::<Vec<_>>()
        );
    }

    #[test]
    fn component_round_trip(components in 1usize..4, tuple in 0usize..6, value in -100i64..100) {
        let mut aos = AosArray::<i64>::with_components(components).unwrap();
        let mut soa = SoaArray::<i64>::with_components(components).unwrap();
        let mut scaled = ScaledSoaArray::<i64>::with_components(components).unwrap();
        scaled.set_scale(5).unwrap();

        for c in 0..components {
            aos.insert_component(tuple, c, value).unwrap();
            soa.insert_component(tuple, c, value).unwrap();
            scaled.insert_component(tuple, c, value * 5).unwrap();

            prop_assert_eq!(aos.component(tuple, c), value);
            prop_assert_eq!(soa.component(tuple, c), value);
            // exact for multiples of the scale
            prop_assert_eq!(scaled.component(tuple, c), value * 5);
        }
    }
}
