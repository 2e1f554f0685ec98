use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// A decoded AMQP field table. Keys are short strings; a key repeated on the wire keeps the last
/// value seen.
pub type FieldTable = BTreeMap<String, FieldValue>;

/// An AMQP "long string": up to 4 GiB of opaque bytes. Usually text, but nothing on the wire says
/// so.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LongString(#[serde(with = "serde_bytes")] Vec<u8>);

impl LongString {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the contents as a string, if they are valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for LongString {
    fn from(v: Vec<u8>) -> Self {
        LongString(v)
    }
}

impl From<&str> for LongString {
    fn from(v: &str) -> Self {
        LongString(v.as_bytes().to_vec())
    }
}

impl From<String> for LongString {
    fn from(v: String) -> Self {
        LongString(v.into_bytes())
    }
}

impl fmt::Debug for LongString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LongString({:?})", self.to_string_lossy())
    }
}

impl fmt::Display for LongString {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

/// An AMQP decimal: `value * 10^-scale`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    pub scale: u8,
    pub value: i32,
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}", self.value);
        }
        let sign = if self.value < 0 { "-" } else { "" };
        let digits = self.value.unsigned_abs().to_string();
        let scale = self.scale as usize;
        if digits.len() > scale {
            let (int, frac) = digits.split_at(digits.len() - scale);
            write!(f, "{}{}.{}", sign, int, frac)
        } else {
            write!(f, "{}0.{:0>width$}", sign, digits, width = scale)
        }
    }
}

/// One typed value inside a field table or field array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Void,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    LongString(LongString),
    Bytes(#[serde(with = "serde_bytes")] Vec<u8>),
    Timestamp(Timestamp),
    Array(Vec<FieldValue>),
    Table(FieldTable),
}

static VOID: FieldValue = FieldValue::Void;

impl FieldValue {
    /// The single-octet type tag this value carries on the wire.
    pub fn type_tag(&self) -> u8 {
        match self {
            FieldValue::Void => b'V',
            FieldValue::Bool(_) => b't',
            FieldValue::I8(_) => b'b',
            FieldValue::I16(_) => b's',
            FieldValue::I32(_) => b'I',
            FieldValue::I64(_) => b'l',
            FieldValue::F32(_) => b'f',
            FieldValue::F64(_) => b'd',
            FieldValue::Decimal(_) => b'D',
            FieldValue::LongString(_) => b'S',
            FieldValue::Bytes(_) => b'x',
            FieldValue::Timestamp(_) => b'T',
            FieldValue::Array(_) => b'A',
            FieldValue::Table(_) => b'F',
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, FieldValue::Void)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            FieldValue::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Get any integer variant, widened to an i64.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            FieldValue::I8(v) => Some(v as i64),
            FieldValue::I16(v) => Some(v as i64),
            FieldValue::I32(v) => Some(v as i64),
            FieldValue::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FieldValue::F32(v) => Some(v as f64),
            FieldValue::F64(v) => Some(v),
            _ => None,
        }
    }

    /// Get a long string's contents, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::LongString(v) => v.as_str(),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::LongString(v) => Some(v.as_bytes()),
            FieldValue::Bytes(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match *self {
            FieldValue::Timestamp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::Array(v) => Some(v.as_slice()),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&FieldTable> {
        match self {
            FieldValue::Table(v) => Some(v),
            _ => None,
        }
    }
}

/// Index into a nested table. Anything missing, or indexing a non-table, yields `Void`.
impl Index<&str> for FieldValue {
    type Output = FieldValue;

    fn index(&self, key: &str) -> &FieldValue {
        match self {
            FieldValue::Table(table) => table.get(key).unwrap_or(&VOID),
            _ => &VOID,
        }
    }
}

/// Index into an array. Out of range, or indexing a non-array, yields `Void`.
impl Index<usize> for FieldValue {
    type Output = FieldValue;

    fn index(&self, index: usize) -> &FieldValue {
        match self {
            FieldValue::Array(array) => array.get(index).unwrap_or(&VOID),
            _ => &VOID,
        }
    }
}
