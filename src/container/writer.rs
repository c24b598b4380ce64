//! Write access to containers
//!
//! [`SingleReadWriter`] produces the single-read layout downstream tools expect.
//! [`MultiReadBuilder`] assembles multi-read containers from owned read groups.
//!
//! # Example
//!
//! ```rust,no_run
//! use fast5kit::{attributes, SingleReadWriter};
//!
//! let mut writer = SingleReadWriter::create("read_0001.fast5");
//! writer.write_signal(&[684, 690, 701], attributes([("read_number", 12i64)])).unwrap();
//! writer
//!     .write_identity(
//!         attributes([("channel_number", "42")]),
//!         attributes([("sample_frequency", "4000")]),
//!         attributes([("run_id", "abc")]),
//!     )
//!     .unwrap();
//!
//! // Nothing is on disk until the writer is finished
//! writer.finish().unwrap();
//! ```

use std::path::Path;

use super::attrs::Attributes;
use super::header::ContainerKind;
use super::layout::Layout;
use super::read_group::ReadGroup;
use super::store::Store;
use super::tree::{Dataset, Group, Node};
use crate::config::ANALYSES_GROUP;
use crate::error::Result;

fn write_signal(
    root: &mut Group,
    layout: &Layout,
    samples: &[i16],
    attrs: Attributes,
) -> Result<()> {
    root.require_group(&layout.signal_group())?.attrs = attrs;
    root.put_dataset(&layout.signal_dataset(), Dataset::signal(samples.to_vec()))
}

fn write_basecall(
    root: &mut Group,
    layout: &Layout,
    fastq: &str,
    attrs: Attributes,
) -> Result<()> {
    root.require_group(&layout.basecall_group())?.attrs.extend(attrs);
    root.put_dataset(
        &layout.fastq_dataset(),
        Dataset::text(fastq.as_bytes().to_vec()),
    )
}

fn write_identity(
    root: &mut Group,
    layout: &Layout,
    channel: Attributes,
    context: Attributes,
    tracking: Attributes,
) -> Result<()> {
    root.require_group(&layout.channel_group())?.attrs = channel;
    root.require_group(&layout.context_group())?.attrs = context;
    root.require_group(&layout.tracking_group())?.attrs = tracking;
    Ok(())
}

/// Writer for single-read containers
///
/// Each write replaces what an earlier call stored at the same location.
/// No write is required before another, and the container only reaches disk on
/// [`SingleReadWriter::finish`]; dropping an unfinished writer leaves no file.
#[derive(Debug)]
pub struct SingleReadWriter {
    store: Store,
    layout: Layout,
}
impl SingleReadWriter {
    /// Starts a new single-read container at `path`
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        let mut store = Store::create(path, ContainerKind::Single);
        // The analyses group exists even before any basecall is written
        store
            .root_mut()
            .children
            .insert(ANALYSES_GROUP.to_string(), Node::Group(Group::default()));
        Self {
            store,
            layout: Layout::Single,
        }
    }

    /// Opens an existing single-read container for mutation
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
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

    /// Stores the samples under the raw read group
    ///
    /// The attribute set replaces the one of an earlier call.
    pub fn write_signal(&mut self, samples: &[i16], attrs: Attributes) -> Result<()> {
        write_signal(self.store.root_mut(), &self.layout, samples, attrs)
    }

    /// Stores (or replaces) the basecall text
    ///
    /// Attributes are merged into the basecall group: supplied keys overwrite,
    /// existing keys not supplied are kept.
    pub fn write_basecall(&mut self, fastq: &str, attrs: Attributes) -> Result<()> {
        write_basecall(self.store.root_mut(), &self.layout, fastq, attrs)
    }

    /// Stores the three identity attribute sets under the unique global key group
    pub fn write_identity(
        &mut self,
        channel: Attributes,
        context: Attributes,
        tracking: Attributes,
    ) -> Result<()> {
        write_identity(self.store.root_mut(), &self.layout, channel, context, tracking)
    }

    /// Writes every piece of an owned read group
    pub fn write_read_group(&mut self, read: &ReadGroup) -> Result<()> {
        self.write_signal(&read.signal.samples, read.signal.attrs.clone())?;
        if let Some(basecall) = &read.basecall {
            self.write_basecall(&basecall.fastq, basecall.attrs.clone())?;
        }
        self.write_identity(
            read.identity.channel.clone(),
            read.identity.context.clone(),
            read.identity.tracking.clone(),
        )
    }

    /// Writes the container to disk
    pub fn finish(mut self) -> Result<()> {
        self.store.save()
    }
}

/// Builder for multi-read containers
#[derive(Debug)]
pub struct MultiReadBuilder {
    store: Store,
}
impl MultiReadBuilder {
    pub fn create<P: AsRef<Path>>(path: P) -> Self {
        Self {
            store: Store::create(path, ContainerKind::Multi),
        }
    }

    /// Adds (or replaces) the read group named `group`
    pub fn add_read(&mut self, group: &str, read: &ReadGroup) -> Result<()> {
        let layout = Layout::multi(group);
        let root = self.store.root_mut();
        root.children.remove(group);
        write_signal(root, &layout, &read.signal.samples, read.signal.attrs.clone())?;
        if let Some(basecall) = &read.basecall {
            write_basecall(root, &layout, &basecall.fastq, basecall.attrs.clone())?;
        }
        write_identity(
            root,
            &layout,
            read.identity.channel.clone(),
            read.identity.context.clone(),
            read.identity.tracking.clone(),
        )
    }

    /// Removes a piece of a read group, producing deliberately incomplete input
    ///
    /// `path` is relative to the read group, e.g. `channel_id`.
    pub fn remove(&mut self, group: &str, path: &str) -> bool {
        self.store
            .root_mut()
            .remove(&format!("{group}/{path}"))
            .is_some()
    }

    pub fn finish(mut self) -> Result<()> {
        self.store.save()
    }
}
