//! Attribute sets
//!
//! Attribute sets are unordered key to scalar mappings. Values keep their
//! numeric or text type across a write/read cycle.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{ContainerError, Result};

const TAG_INT: u8 = 1;
const TAG_UINT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_TEXT: u8 = 4;

/// A single attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}
impl AttrValue {
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::UInt(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(_) => None,
        }
    }
}
impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}
impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}
impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}
impl From<u64> for AttrValue {
    fn from(v: u64) -> Self {
        Self::UInt(v)
    }
}
impl From<u32> for AttrValue {
    fn from(v: u32) -> Self {
        Self::UInt(u64::from(v))
    }
}
impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}
impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}
impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

/// An attribute set
///
/// Keys are unique. A sorted map keeps the encoded bytes stable for identical sets.
pub type Attributes = BTreeMap<String, AttrValue>;

/// Builds an [`Attributes`] set from `(key, value)` pairs
pub fn attributes<I, K, V>(pairs: I) -> Attributes
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Writes a `u16`-length-prefixed name
pub(crate) fn write_name<W: Write>(writer: &mut W, name: &str) -> Result<()> {
    let len = u16::try_from(name.len()).map_err(|_| {
        anyhow::anyhow!("Name exceeds {} bytes: {}", u16::MAX, name)
    })?;
    writer.write_u16::<LittleEndian>(len)?;
    writer.write_all(name.as_bytes())?;
    Ok(())
}

/// Splits `len` bytes off the front of `reader`
///
/// The length is checked against what is left before anything is allocated.
pub(crate) fn take<'a>(reader: &mut &'a [u8], len: u64) -> Result<&'a [u8]> {
    let remaining = reader.len();
    let Some(len) = usize::try_from(len).ok().filter(|&n| n <= remaining) else {
        return Err(ContainerError::PayloadOverrun { len, remaining }.into());
    };
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Ok(head)
}

/// Reads a `u16`-length-prefixed name
pub(crate) fn read_name(reader: &mut &[u8]) -> Result<String> {
    let len = reader.read_u16::<LittleEndian>()?;
    let buf = take(reader, u64::from(len))?;
    Ok(std::str::from_utf8(buf)?.to_string())
}

pub(crate) fn write_attributes<W: Write>(writer: &mut W, attrs: &Attributes) -> Result<()> {
    writer.write_u32::<LittleEndian>(attrs.len() as u32)?;
    for (key, value) in attrs {
        write_name(writer, key)?;
        match value {
            AttrValue::Int(v) => {
                writer.write_u8(TAG_INT)?;
                writer.write_i64::<LittleEndian>(*v)?;
            }
            AttrValue::UInt(v) => {
                writer.write_u8(TAG_UINT)?;
                writer.write_u64::<LittleEndian>(*v)?;
            }
            AttrValue::Float(v) => {
                writer.write_u8(TAG_FLOAT)?;
                writer.write_f64::<LittleEndian>(*v)?;
            }
            AttrValue::Text(v) => {
                writer.write_u8(TAG_TEXT)?;
                writer.write_u32::<LittleEndian>(v.len() as u32)?;
                writer.write_all(v.as_bytes())?;
            }
        }
    }
    Ok(())
}

pub(crate) fn read_attributes(reader: &mut &[u8]) -> Result<Attributes> {
    let count = reader.read_u32::<LittleEndian>()?;
    let mut attrs = Attributes::new();
    for _ in 0..count {
        let key = read_name(reader)?;
        let value = match reader.read_u8()? {
            TAG_INT => AttrValue::Int(reader.read_i64::<LittleEndian>()?),
            TAG_UINT => AttrValue::UInt(reader.read_u64::<LittleEndian>()?),
            TAG_FLOAT => AttrValue::Float(reader.read_f64::<LittleEndian>()?),
            TAG_TEXT => {
                let len = reader.read_u32::<LittleEndian>()?;
                let buf = take(reader, u64::from(len))?;
                AttrValue::Text(std::str::from_utf8(buf)?.to_string())
            }
            tag => {
                return Err(ContainerError::InvalidTag {
                    kind: "attribute",
                    tag,
                }
                .into())
            }
        };
        attrs.insert(key, value);
    }
    Ok(attrs)
}
