//! In-memory group tree and its binary encoding
//!
//! A container body is a tree of named groups. Leaves are datasets holding either
//! 16-bit signal samples or text bytes. Groups and datasets both carry attributes.

use std::collections::BTreeMap;
use std::io::Write;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};

use super::attrs::{read_attributes, read_name, take, write_attributes, write_name, Attributes};
use crate::error::{ContainerError, NotFoundError, Result};

const TAG_GROUP: u8 = 1;
const TAG_DATASET: u8 = 2;

const DTYPE_I16: u8 = 1;
const DTYPE_TEXT: u8 = 2;

/// Payload of a dataset
#[derive(Debug, Clone, PartialEq)]
pub enum DatasetData {
    /// Raw acquisition samples, stored losslessly as 16-bit integers
    I16(Vec<i16>),
    /// Variable-length text bytes
    Text(Vec<u8>),
}

/// A leaf node
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub data: DatasetData,
    pub attrs: Attributes,
}
impl Dataset {
    #[must_use]
    pub fn signal(samples: Vec<i16>) -> Self {
        Self {
            data: DatasetData::I16(samples),
            attrs: Attributes::new(),
        }
    }

    #[must_use]
    pub fn text(bytes: Vec<u8>) -> Self {
        Self {
            data: DatasetData::Text(bytes),
            attrs: Attributes::new(),
        }
    }
}

/// A node of the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Group(Group),
    Dataset(Dataset),
}

/// A named collection of child nodes plus an attribute set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Group {
    pub attrs: Attributes,
    pub children: BTreeMap<String, Node>,
}

fn components(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|c| !c.is_empty())
}

impl Group {
    /// Resolves a `/`-separated path to a node
    #[must_use]
    pub fn node(&self, path: &str) -> Option<&Node> {
        let mut parts = components(path).peekable();
        let mut group = self;
        while let Some(part) = parts.next() {
            let child = group.children.get(part)?;
            if parts.peek().is_none() {
                return Some(child);
            }
            match child {
                Node::Group(g) => group = g,
                Node::Dataset(_) => return None,
            }
        }
        None
    }

    /// Resolves a path to a group; the empty path is this group
    pub fn group(&self, path: &str) -> Result<&Group> {
        if components(path).next().is_none() {
            return Ok(self);
        }
        match self.node(path) {
            Some(Node::Group(g)) => Ok(g),
            _ => Err(NotFoundError::Group(path.to_string()).into()),
        }
    }

    /// Resolves a path to a dataset
    pub fn dataset(&self, path: &str) -> Result<&Dataset> {
        match self.node(path) {
            Some(Node::Dataset(d)) => Ok(d),
            _ => Err(NotFoundError::Dataset(path.to_string()).into()),
        }
    }

    /// Returns the group at `path`, creating it and any missing parents
    pub fn require_group(&mut self, path: &str) -> Result<&mut Group> {
        let mut group = self;
        for part in components(path) {
            let child = group
                .children
                .entry(part.to_string())
                .or_insert_with(|| Node::Group(Group::default()));
            group = match child {
                Node::Group(g) => g,
                Node::Dataset(_) => {
                    return Err(ContainerError::NotAGroup(part.to_string()).into());
                }
            };
        }
        Ok(group)
    }

    /// Stores a dataset at `path`, replacing any existing node with that name
    pub fn put_dataset(&mut self, path: &str, dataset: Dataset) -> Result<()> {
        let (parent, name) = match path.trim_matches('/').rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path.trim_matches('/')),
        };
        self.require_group(parent)?
            .children
            .insert(name.to_string(), Node::Dataset(dataset));
        Ok(())
    }

    /// Removes the node at `path`, returning it if it existed
    pub fn remove(&mut self, path: &str) -> Option<Node> {
        let (parent, name) = match path.trim_matches('/').rsplit_once('/') {
            Some((parent, name)) => (parent, name),
            None => ("", path.trim_matches('/')),
        };
        let mut group = self;
        for part in components(parent) {
            group = match group.children.get_mut(part)? {
                Node::Group(g) => g,
                Node::Dataset(_) => return None,
            };
        }
        group.children.remove(name)
    }

    /// Names of the direct children that are groups
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.children.iter().filter_map(|(name, node)| match node {
            Node::Group(_) => Some(name.as_str()),
            Node::Dataset(_) => None,
        })
    }

    pub(crate) fn encode<W: Write>(&self, writer: &mut W, compress: Option<i32>) -> Result<()> {
        writer.write_u8(TAG_GROUP)?;
        write_attributes(writer, &self.attrs)?;
        writer.write_u32::<LittleEndian>(self.children.len() as u32)?;
        for (name, node) in &self.children {
            write_name(writer, name)?;
            match node {
                Node::Group(group) => group.encode(writer, compress)?,
                Node::Dataset(dataset) => encode_dataset(writer, dataset, compress)?,
            }
        }
        Ok(())
    }

    /// Decodes a tree from the front of `reader`
    ///
    /// Every length prefix is checked against the bytes left in `reader`.
    pub(crate) fn decode(reader: &mut &[u8], compressed: bool) -> Result<Self> {
        match reader.read_u8()? {
            TAG_GROUP => Self::decode_body(reader, compressed),
            tag => Err(ContainerError::InvalidTag { kind: "node", tag }.into()),
        }
    }

    fn decode_body(reader: &mut &[u8], compressed: bool) -> Result<Self> {
        let attrs = read_attributes(reader)?;
        let count = reader.read_u32::<LittleEndian>()?;
        let mut children = BTreeMap::new();
        for _ in 0..count {
            let name = read_name(reader)?;
            let node = match reader.read_u8()? {
                TAG_GROUP => Node::Group(Self::decode_body(reader, compressed)?),
                TAG_DATASET => Node::Dataset(decode_dataset(reader, compressed)?),
                tag => return Err(ContainerError::InvalidTag { kind: "node", tag }.into()),
            };
            children.insert(name, node);
        }
        Ok(Self { attrs, children })
    }
}

fn encode_dataset<W: Write>(writer: &mut W, dataset: &Dataset, compress: Option<i32>) -> Result<()> {
    writer.write_u8(TAG_DATASET)?;
    write_attributes(writer, &dataset.attrs)?;
    match &dataset.data {
        DatasetData::I16(samples) => {
            let mut raw = vec![0u8; samples.len() * 2];
            LittleEndian::write_i16_into(samples, &mut raw);
            let payload = match compress {
                Some(level) => zstd::encode_all(raw.as_slice(), level)?,
                None => raw,
            };
            writer.write_u8(DTYPE_I16)?;
            writer.write_u64::<LittleEndian>(payload.len() as u64)?;
            writer.write_all(&payload)?;
        }
        DatasetData::Text(bytes) => {
            writer.write_u8(DTYPE_TEXT)?;
            writer.write_u64::<LittleEndian>(bytes.len() as u64)?;
            writer.write_all(bytes)?;
        }
    }
    Ok(())
}

fn decode_dataset(reader: &mut &[u8], compressed: bool) -> Result<Dataset> {
    let attrs = read_attributes(reader)?;
    let dtype = reader.read_u8()?;
    let len = reader.read_u64::<LittleEndian>()?;
    let payload = take(reader, len)?;
    let data = match dtype {
        DTYPE_I16 => {
            let raw = if compressed {
                zstd::decode_all(payload)?
            } else {
                payload.to_vec()
            };
            if raw.len() % 2 != 0 {
                return Err(ContainerError::OddSignalPayload(raw.len()).into());
            }
            let mut samples = vec![0i16; raw.len() / 2];
            LittleEndian::read_i16_into(&raw, &mut samples);
            DatasetData::I16(samples)
        }
        DTYPE_TEXT => DatasetData::Text(payload.to_vec()),
        tag => {
            return Err(ContainerError::InvalidTag {
                kind: "dataset type",
                tag,
            }
            .into())
        }
    };
    Ok(Dataset { data, attrs })
}
