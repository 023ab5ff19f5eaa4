use vtk_array::parse::read_inline_dataarray_as;
use vtk_array::prelude::*;
use vtk_array::{read_inline_dataarray, Encoding, Reader, Writer};

fn sample(layout: Layout, ty: ScalarType) -> AnyArray {
    let mut array = AnyArray::with_components(layout, ty, 3).unwrap();
    array.set_name(format!("{layout} {ty}"));
    for tuple in 0..4 {
        let base = tuple as f64 * 3.0;
        array
            .insert_next_tuple_f64(&[base, base + 1.0, 100.0 - base])
            .unwrap();
    }
    array
}

fn write(array: &AnyArray, encoding: Encoding) -> String {
    let mut writer = Writer::new(Vec::new());
    array.write_inline(&mut writer, encoding).unwrap();
    String::from_utf8(writer.into_inner()).unwrap()
}

fn assert_same(a: &AnyArray, b: &AnyArray) {
    assert_eq!(a.scalar_type(), b.scalar_type());
    assert_eq!(a.name(), b.name());
    assert_eq!(a.number_of_components(), b.number_of_components());
    assert_eq!(a.number_of_tuples(), b.number_of_tuples());
    for idx in 0..a.number_of_values() {
        assert_eq!(a.value_f64(idx), b.value_f64(idx), "value {idx}");
    }
}

#[test]
fn every_array_survives_both_encodings() {
    for layout in [Layout::Aos, Layout::Soa, Layout::ScaledSoa] {
        for ty in ScalarType::ALL {
            let array = sample(layout, ty);

            for encoding in [Encoding::Ascii, Encoding::Base64] {
                let xml = write(&array, encoding);

                let mut reader = Reader::from_str(&xml);
                let read = read_inline_dataarray_as(&mut reader, layout).unwrap();
                assert_eq!(read.layout(), layout);
                assert_same(&array, &read);
            }
        }
    }
}

#[test]
fn scaled_arrays_write_logical_values() {
    let mut array = ScaledSoaArray::<i16>::with_components(1).unwrap();
    array.set_name("pressure");
    array.set_scale(10).unwrap();
    for v in [10, 20, -30] {
        array.insert_next_value(v).unwrap();
    }

    let xml = write(&AnyArray::from(array), Encoding::Ascii);
    assert!(xml.contains(">10 20 -30 <"));

    // read back as array-of-structs
    let mut reader = Reader::from_str(&xml);
    let read = read_inline_dataarray(&mut reader).unwrap();
    let read = read.downcast_ref::<AosArray<i16>>().unwrap();
    assert_eq!(read.as_slice(), &[10, 20, -30]);
}

#[test]
fn float_specials_round_trip() {
    let mut array = AosArray::<f64>::new();
    array.set_name("specials");
    for v in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1.0e-300, -0.25] {
        array.insert_next_value(v).unwrap();
    }
    let array = AnyArray::from(array);

    for encoding in [Encoding::Ascii, Encoding::Base64] {
        let xml = write(&array, encoding);
        let mut reader = Reader::from_str(&xml);
        let read = read_inline_dataarray(&mut reader).unwrap();

        assert!(read.value_f64(0).is_nan());
        for idx in 1..5 {
            assert_eq!(read.value_f64(idx), array.value_f64(idx));
        }
    }
}

#[test]
fn reads_a_dataarray_inside_a_document() {
    let xml = r#"<?xml version="1.0"?>
<!-- written by hand -->
<DataArray type="UInt32" Name="cell &amp; id" NumberOfComponents="2" NumberOfTuples="2" format="ascii">
    0 1
    4294967295 3
</DataArray>"#;

    let mut reader = Reader::from_str(xml);
    let array = read_inline_dataarray(&mut reader).unwrap();

    assert_eq!(array.name(), "cell & id");
    assert_eq!(array.scalar_type(), ScalarType::UInt32);
    assert_eq!(array.number_of_tuples(), 2);
    assert_eq!(array.component_f64(1, 0), u32::MAX as f64);
    assert_eq!(
        array.range(RangeComponent::Component(1)),
        Some([1.0, 3.0])
    );
}
