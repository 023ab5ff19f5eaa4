use crate::dispatch::{AllArrays, Worker};
use crate::prelude::*;
use crate::utils;

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;

/// the encoding to use when writing an inline dataarray
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Ascii,
    Base64,
}

impl Encoding {
    fn to_str(&self) -> &'static str {
        match &self {
            Self::Ascii => "ascii",
            Self::Base64 => "binary",
        }
    }
}

/// Write every complete tuple of `array` as a single inline `DataArray` element.
///
/// Values are written tuple by tuple regardless of the layout of the array, so an array read
/// back with [`read_inline_dataarray_as`](crate::parse::read_inline_dataarray_as) holds the
/// same logical values. `RangeMin`/`RangeMax` hold the magnitude range when there is one.
pub fn write_inline_dataarray<W: Write, B: Backend>(
    writer: &mut Writer<W>,
    array: &GenericArray<B>,
    encoding: Encoding,
) -> Result<(), Error> {
    let components = array.number_of_components().to_string();
    let tuples = array.number_of_tuples();
    let tuples_str = tuples.to_string();

    let mut start = BytesStart::new("DataArray");
    start.push_attribute(("type", array.scalar_type().vtk_name()));
    start.push_attribute(("Name", array.name()));
    start.push_attribute(("NumberOfComponents", components.as_str()));
    start.push_attribute(("NumberOfTuples", tuples_str.as_str()));
    start.push_attribute(("format", encoding.to_str()));

    if let Some([min, max]) = array.range(RangeComponent::Magnitude) {
        let mut buffer = ryu::Buffer::new();
        let min = buffer.format(min).to_string();
        let max = buffer.format(max).to_string();
        start.push_attribute(("RangeMin", min.as_str()));
        start.push_attribute(("RangeMax", max.as_str()));
    }

    writer.write_event(Event::Start(start))?;

    // a trailing partial tuple is not written
    let values = array
        .values()
        .take(tuples * array.number_of_components());

    let data = match encoding {
        Encoding::Ascii => {
            let mut data = String::new();
            for value in values {
                value.write_ascii(&mut data);
                data.push(' ');
            }
            data
        }
        Encoding::Base64 => {
            let byte_count = tuples * array.number_of_components() * B::Value::SIZE;
            let mut bytes = Vec::with_capacity(8 + byte_count);
            // UInt64 header with the number of bytes that follow
            utils::extend_le_bytes(byte_count as u64, &mut bytes);
            for value in values {
                utils::extend_le_bytes(value, &mut bytes);
            }
            base64::encode(&bytes)
        }
    };

    writer.write_event(Event::Text(BytesText::new(&data)))?;
    writer.write_event(Event::End(BytesEnd::new("DataArray")))?;

    tracing::debug!(
        name = array.name(),
        scalar_type = %array.scalar_type(),
        tuples,
        encoding = encoding.to_str(),
        "wrote DataArray"
    );

    Ok(())
}

impl AnyArray {
    /// Write this array as an inline `DataArray` element, see [`write_inline_dataarray`].
    pub fn write_inline<W: Write>(
        &self,
        writer: &mut Writer<W>,
        encoding: Encoding,
    ) -> Result<(), Error> {
        let worker = WriteInline { writer, encoding };
        AllArrays::dispatch(self, worker).unwrap_or_else(|_| {
            Err(Error::NotDispatched {
                layout: self.layout(),
                scalar_type: self.scalar_type(),
            })
        })
    }
}

struct WriteInline<'w, W: Write> {
    writer: &'w mut Writer<W>,
    encoding: Encoding,
}

impl<'w, W: Write> Worker for WriteInline<'w, W> {
    type Output = Result<(), Error>;

    fn execute<B: Backend>(self, array: &GenericArray<B>) -> Self::Output {
        write_inline_dataarray(self.writer, array, self.encoding)
    }
}
