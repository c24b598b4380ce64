//! Read access to containers
//!
//! Both container shapes hand out a [`ReadGroupReader`], which projects the pieces
//! of one read through the shape's [`Layout`]. Every getter is independent: the
//! basecall getter may fail with a not-found error while the others succeed.

use std::path::Path;

use super::attrs::Attributes;
use super::header::ContainerKind;
use super::layout::Layout;
use super::read_group::{Basecall, Identity, ReadGroup, Signal};
use super::store::Store;
use super::tree::{DatasetData, Group};
use crate::config::{has_container_extension, CONTAINER_EXTENSION};
use crate::error::{ContainerError, NotFoundError, Result};

/// Projections of a single read group
#[derive(Debug, Clone, Copy)]
pub struct ReadGroupReader<'a> {
    root: &'a Group,
    layout: &'a Layout,
}
impl<'a> ReadGroupReader<'a> {
    fn new(root: &'a Group, layout: &'a Layout) -> Self {
        Self { root, layout }
    }

    /// The basecall text and its attribute set
    ///
    /// A missing basecall is reported as a not-found error: see [`crate::Error::is_not_found`].
    pub fn basecall(&self) -> Result<Basecall> {
        let path = self.layout.fastq_dataset();
        let dataset = self.root.dataset(&path)?;
        let DatasetData::Text(bytes) = &dataset.data else {
            return Err(ContainerError::UnexpectedDataType {
                expected: "text",
                path,
            }
            .into());
        };
        let fastq = std::str::from_utf8(bytes)?.to_string();
        let attrs = self.attrs(&self.layout.basecall_group())?;
        Ok(Basecall { fastq, attrs })
    }

    /// The raw samples
    pub fn signal(&self) -> Result<Vec<i16>> {
        let path = self.layout.signal_dataset();
        match &self.root.dataset(&path)?.data {
            DatasetData::I16(samples) => Ok(samples.clone()),
            DatasetData::Text(_) => Err(ContainerError::UnexpectedDataType {
                expected: "i16",
                path,
            }
            .into()),
        }
    }

    pub fn signal_attrs(&self) -> Result<Attributes> {
        self.attrs(&self.layout.signal_group())
    }

    pub fn channel_attrs(&self) -> Result<Attributes> {
        self.attrs(&self.layout.channel_group())
    }

    pub fn context_attrs(&self) -> Result<Attributes> {
        self.attrs(&self.layout.context_group())
    }

    pub fn tracking_attrs(&self) -> Result<Attributes> {
        self.attrs(&self.layout.tracking_group())
    }

    /// Collects the whole read group
    ///
    /// Fails if any mandatory piece is missing; an absent basecall becomes `None`.
    pub fn load(&self) -> Result<ReadGroup> {
        let basecall = match self.basecall() {
            Ok(basecall) => Some(basecall),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };
        Ok(ReadGroup {
            signal: Signal {
                samples: self.signal()?,
                attrs: self.signal_attrs()?,
            },
            identity: Identity {
                channel: self.channel_attrs()?,
                context: self.context_attrs()?,
                tracking: self.tracking_attrs()?,
            },
            basecall,
        })
    }

    fn attrs(&self, path: &str) -> Result<Attributes> {
        Ok(self.root.group(path)?.attrs.clone())
    }
}

fn check_extension(path: &Path) -> Result<()> {
    if has_container_extension(path) {
        Ok(())
    } else {
        Err(ContainerError::InvalidExtension {
            expected: CONTAINER_EXTENSION,
            path: path.to_path_buf(),
        }
        .into())
    }
}

/// A container holding many reads, one top-level group per read
///
/// Opened read-only; the source file is never modified.
#[derive(Debug)]
pub struct MultiReadContainer {
    store: Store,
    groups: Vec<(String, Layout)>,
}
impl MultiReadContainer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_extension(path)?;
        let store = Store::open(path)?;
        store.expect_kind(ContainerKind::Multi)?;
        let groups = store
            .root()
            .group_names()
            .map(|name| (name.to_string(), Layout::multi(name)))
            .collect();
        Ok(Self { store, groups })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    /// Names of every read group, in stored order
    pub fn read_groups(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|(name, _)| name.as_str())
    }

    #[must_use]
    pub fn num_reads(&self) -> usize {
        self.groups.len()
    }

    /// Projections of the named read group
    pub fn reader(&self, group: &str) -> Result<ReadGroupReader<'_>> {
        self.groups
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, layout)| ReadGroupReader::new(self.store.root(), layout))
            .ok_or_else(|| NotFoundError::Group(group.to_string()).into())
    }

    /// Iterates `(group name, reader)` over every read group
    pub fn readers(&self) -> impl Iterator<Item = (&str, ReadGroupReader<'_>)> {
        self.groups
            .iter()
            .map(|(name, layout)| (name.as_str(), ReadGroupReader::new(self.store.root(), layout)))
    }
}

/// A container holding exactly one read at fixed paths
#[derive(Debug)]
pub struct SingleReadContainer {
    store: Store,
    layout: Layout,
}
impl SingleReadContainer {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        check_extension(path)?;
        let store = Store::open(path)?;
        store.expect_kind(ContainerKind::Single)?;
        Ok(Self {
            store,
            layout: Layout::Single,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    #[must_use]
    pub fn reader(&self) -> ReadGroupReader<'_> {
        ReadGroupReader::new(self.store.root(), &self.layout)
    }
}
