use crate::prelude::*;

use super::event_summary::EventSummary;

use quick_xml::name::QName;

/// Failure to read a VTK xml `DataArray` element
#[derive(Debug, thiserror::Error, From)]
pub enum ParseError {
    #[error("{0}")]
    MalformedXml(MalformedXml),
    #[error("{0}")]
    MalformedAttribute(MalformedAttribute),
    #[error("{0}")]
    MissingAttribute(MissingAttribute),
    #[error("{0}")]
    UnexpectedElement(UnexpectedElement),
    #[error("{0}")]
    UnexpectedAttributeValue(UnexpectedAttributeValue),
    #[error("{0}")]
    InvalidNumber(InvalidNumber),
    #[error("{0}")]
    Binary(Binary),
    #[error("{0}")]
    ValueCount(ValueCount),
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml element: {xml_err}")]
pub struct MalformedXml {
    xml_err: quick_xml::Error,
}

#[derive(From, Display, Debug)]
#[display(fmt = "failed to parse an xml attribute: {att_err}")]
pub struct MalformedAttribute {
    att_err: quick_xml::events::attributes::AttrError,
}

#[derive(From, Display, Debug)]
#[display(fmt = "unexpected element. Expected `{expected_name}`, got {actual_element}")]
pub struct UnexpectedElement {
    expected_name: String,
    actual_element: EventSummary,
}

impl UnexpectedElement {
    pub(crate) fn new<T: Into<String>>(expected_name: T, actual_element: EventSummary) -> Self {
        Self {
            expected_name: expected_name.into(),
            actual_element,
        }
    }
}

#[derive(Display, Debug, Constructor)]
#[display(
    fmt = "unexpected attribute value for {attribute_name} in {element_name} element: expected {expected_value}, got {actual_value}"
)]
pub struct UnexpectedAttributeValue {
    pub(crate) element_name: String,
    pub(crate) attribute_name: String,
    pub(crate) expected_value: String,
    pub(crate) actual_value: ParsedNameOrBytes,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "missing attribute `{attribute_name}` in {element_name} element")]
pub struct MissingAttribute {
    element_name: String,
    attribute_name: String,
}

#[derive(Display, Debug, Constructor)]
#[display(fmt = "`{text}` in DataArray `{array_name}` is not a valid {scalar_type}")]
pub struct InvalidNumber {
    array_name: String,
    text: String,
    scalar_type: ScalarType,
}

#[derive(Display, Debug)]
pub enum Binary {
    #[display(fmt = "DataArray `{_0}` is not valid base64: {_1}")]
    Decode(String, base64::DecodeError),
    #[display(
        fmt = "DataArray `{array_name}` declares {declared} bytes but only {available} follow the header"
    )]
    Truncated {
        array_name: String,
        declared: u64,
        available: usize,
    },
    #[display(fmt = "DataArray `{array_name}` holds {bytes} bytes, not a multiple of the {size} byte value size")]
    Misaligned {
        array_name: String,
        bytes: usize,
        size: usize,
    },
}

#[derive(Display, Debug)]
pub enum ValueCount {
    #[display(
        fmt = "DataArray `{array_name}` holds {values} values, not a whole number of {components} component tuples"
    )]
    PartialTuple {
        array_name: String,
        values: usize,
        components: usize,
    },
    #[display(fmt = "DataArray `{array_name}` declares {declared} tuples but holds {actual}")]
    Tuples {
        array_name: String,
        declared: usize,
        actual: usize,
    },
}

#[derive(From, Display, Debug)]
pub enum ParsedNameOrBytes {
    #[display(fmt = "{_0}")]
    Utf8(String),
    #[display(fmt = "{_0:?} (cannot convert to UTF8 string)")]
    Bytes(Vec<u8>),
}

impl ParsedNameOrBytes {
    pub(crate) fn new(bytes: &[u8]) -> Self {
        let vec = Vec::from(bytes);
        match String::from_utf8(vec) {
            Ok(string) => Self::Utf8(string),
            Err(e) => Self::Bytes(e.into_bytes()),
        }
    }
}

impl<'a> From<QName<'a>> for ParsedNameOrBytes {
    fn from(x: QName) -> Self {
        Self::new(x.as_ref())
    }
}

impl<'a> From<&'a str> for ParsedNameOrBytes {
    fn from(x: &str) -> Self {
        Self::Utf8(x.into())
    }
}
