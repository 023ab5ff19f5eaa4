//! reading VTK xml `DataArray` elements
//!
//! A `DataArray` element is read into an [`AnyArray`] of the scalar type named by its `type`
//! attribute. Inline `ascii` and `binary` (base64 with a `UInt64` byte count header, little
//! endian) formats are understood.

mod error;
mod event_summary;

pub use error::{
    Binary, InvalidNumber, MalformedAttribute, MalformedXml, MissingAttribute, ParseError,
    ParsedNameOrBytes, UnexpectedAttributeValue, UnexpectedElement, ValueCount,
};
use event_summary::EventSummary;

use crate::dispatch::AllArrays;
use crate::prelude::*;
use crate::utils;

use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Ascii,
    Binary,
}

/// the attributes of a `DataArray` start tag
#[derive(Debug)]
struct DataArrayHeader {
    scalar_type: ScalarType,
    name: String,
    components: usize,
    tuples: Option<usize>,
    format: Format,
}

impl DataArrayHeader {
    fn check_count(&self, values: usize) -> Result<usize, ValueCount> {
        if values % self.components != 0 {
            return Err(ValueCount::PartialTuple {
                array_name: self.name.clone(),
                values,
                components: self.components,
            });
        }

        let tuples = values / self.components;
        match self.tuples {
            Some(declared) if declared != tuples => Err(ValueCount::Tuples {
                array_name: self.name.clone(),
                declared,
                actual: tuples,
            }),
            _ => Ok(tuples),
        }
    }
}

/// Read the next `DataArray` element into an array-of-structs array.
///
/// Leading declarations, comments and whitespace are skipped.
pub fn read_inline_dataarray<R: BufRead>(reader: &mut Reader<R>) -> Result<AnyArray, Error> {
    read_inline_dataarray_as(reader, Layout::Aos)
}

/// Read the next `DataArray` element into an array of the given layout.
pub fn read_inline_dataarray_as<R: BufRead>(
    reader: &mut Reader<R>,
    layout: Layout,
) -> Result<AnyArray, Error> {
    let mut buffer = Vec::new();
    let (header, was_empty) = read_dataarray_start(reader, &mut buffer)?;

    let body = if was_empty {
        String::new()
    } else {
        read_body(reader, &mut buffer)?
    };

    let mut array = AnyArray::with_components(layout, header.scalar_type, header.components)?;
    array.set_name(header.name.as_str());

    let fill = Fill {
        header: &header,
        body: &body,
    };
    AllArrays::dispatch_mut(&mut array, fill).unwrap_or_else(|_| {
        Err(Error::NotDispatched {
            layout,
            scalar_type: header.scalar_type,
        })
    })?;

    tracing::debug!(
        name = %header.name,
        scalar_type = %header.scalar_type,
        components = header.components,
        format = ?header.format,
        "read DataArray"
    );

    Ok(array)
}

fn read_dataarray_start<R: BufRead>(
    reader: &mut Reader<R>,
    buffer: &mut Vec<u8>,
) -> Result<(DataArrayHeader, bool), ParseError> {
    loop {
        buffer.clear();
        let event = reader
            .read_event_into(buffer)
            .map_err(MalformedXml::from)?;

        match &event {
            Event::Start(start) | Event::Empty(start) => {
                if start.name().as_ref() != b"DataArray" {
                    let actual_event = EventSummary::start(start);
                    return Err(UnexpectedElement::new("DataArray", actual_event).into());
                }

                let was_empty = matches!(event, Event::Empty(_));
                return Ok((parse_header(start)?, was_empty));
            }
            // sometimes there are headers for type of file, we just continue
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            Event::Text(text) if text.iter().all(u8::is_ascii_whitespace) => continue,
            Event::Eof => {
                return Err(UnexpectedElement::new("DataArray", EventSummary::eof()).into());
            }
            other => {
                let actual_event = EventSummary::new(other);
                return Err(UnexpectedElement::new("DataArray", actual_event).into());
            }
        }
    }
}

fn parse_header(start: &BytesStart<'_>) -> Result<DataArrayHeader, ParseError> {
    let mut scalar_type = None;
    let mut name = String::new();
    let mut components = 1;
    let mut tuples = None;
    let mut format = None;

    for attribute in start.attributes() {
        let attribute = attribute.map_err(MalformedAttribute::from)?;
        let value = attribute.unescape_value().map_err(MalformedXml::from)?;

        match attribute.key.as_ref() {
            b"type" => {
                let parsed = ScalarType::from_vtk_name(&value)
                    .ok_or_else(|| unexpected_value("type", "a VTK scalar type", &value))?;
                scalar_type = Some(parsed);
            }
            b"Name" => name = value.into_owned(),
            b"NumberOfComponents" => {
                components = value
                    .parse()
                    .ok()
                    .filter(|components| *components > 0)
                    .ok_or_else(|| {
                        unexpected_value("NumberOfComponents", "a positive integer", &value)
                    })?;
            }
            b"NumberOfTuples" => {
                let parsed = value
                    .parse()
                    .map_err(|_| unexpected_value("NumberOfTuples", "an integer", &value))?;
                tuples = Some(parsed);
            }
            b"format" => {
                format = Some(match &*value {
                    "ascii" => Format::Ascii,
                    "binary" => Format::Binary,
                    other => return Err(unexpected_value("format", "ascii or binary", other).into()),
                });
            }
            _ => {}
        }
    }

    let scalar_type = scalar_type.ok_or_else(|| missing_attribute("type"))?;
    let format = format.ok_or_else(|| missing_attribute("format"))?;

    Ok(DataArrayHeader {
        scalar_type,
        name,
        components,
        tuples,
        format,
    })
}

fn unexpected_value(attribute: &str, expected: &str, actual: &str) -> UnexpectedAttributeValue {
    UnexpectedAttributeValue::new(
        "DataArray".into(),
        attribute.into(),
        expected.into(),
        ParsedNameOrBytes::from(actual),
    )
}

fn missing_attribute(attribute: &str) -> MissingAttribute {
    MissingAttribute::new("DataArray".into(), attribute.into())
}

/// collect the text up to the closing `</DataArray>`
fn read_body<R: BufRead>(reader: &mut Reader<R>, buffer: &mut Vec<u8>) -> Result<String, ParseError> {
    let mut body = String::new();

    loop {
        buffer.clear();
        let event = reader
            .read_event_into(buffer)
            .map_err(MalformedXml::from)?;

        match event {
            Event::Text(text) => body.push_str(&text.unescape().map_err(MalformedXml::from)?),
            Event::Comment(_) => continue,
            Event::End(end) if end.name().as_ref() == b"DataArray" => return Ok(body),
            other => {
                let actual_event = EventSummary::new(&other);
                return Err(UnexpectedElement::new("/DataArray", actual_event).into());
            }
        }
    }
}

/// parses the body into the values of an array of any type
struct Fill<'a> {
    header: &'a DataArrayHeader,
    body: &'a str,
}

impl<'a> WorkerMut for Fill<'a> {
    type Output = Result<(), Error>;

    fn execute<B: Backend>(self, array: &mut GenericArray<B>) -> Self::Output {
        let values: Vec<B::Value> = match self.header.format {
            Format::Ascii => decode_ascii(self.header, self.body)?,
            Format::Binary => decode_binary(self.header, self.body)?,
        };

        let tuples = self
            .header
            .check_count(values.len())
            .map_err(ParseError::from)?;

        array.set_number_of_tuples(tuples)?;
        for (idx, value) in values.into_iter().enumerate() {
            array.set_value(idx, value);
        }

        Ok(())
    }
}

fn decode_ascii<T: Scalar>(header: &DataArrayHeader, body: &str) -> Result<Vec<T>, ParseError> {
    body.split_ascii_whitespace()
        .map(|text| {
            text.parse::<T>().map_err(|_| {
                ParseError::from(InvalidNumber::new(header.name.clone(), text.into(), T::TYPE))
            })
        })
        .collect()
}

fn decode_binary<T: Scalar>(header: &DataArrayHeader, body: &str) -> Result<Vec<T>, ParseError> {
    // line breaks are allowed inside the encoded text
    let compact: String = body.split_ascii_whitespace().collect();
    let bytes = base64::decode(compact.as_bytes())
        .map_err(|err| Binary::Decode(header.name.clone(), err))?;

    let truncated = |declared: u64| Binary::Truncated {
        array_name: header.name.clone(),
        declared,
        available: bytes.len(),
    };

    // UInt64 byte count, then the values
    let count_bytes = bytes.get(..8).ok_or_else(|| truncated(8))?;
    let declared = utils::from_le_bytes::<u64>(count_bytes);

    let end = usize::try_from(declared)
        .ok()
        .and_then(|len| len.checked_add(8))
        .filter(|end| *end <= bytes.len())
        .ok_or_else(|| truncated(declared.saturating_add(8)))?;
    let payload = &bytes[8..end];

    if payload.len() % T::SIZE != 0 {
        return Err(Binary::Misaligned {
            array_name: header.name.clone(),
            bytes: payload.len(),
            size: T::SIZE,
        }
        .into());
    }

    Ok(payload
        .chunks_exact(T::SIZE)
        .map(utils::from_le_bytes::<T>)
        .collect())
}
