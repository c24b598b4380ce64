use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tempfile::NamedTempFile;

use super::header::{ContainerHeader, ContainerKind, SIZE_HEADER};
use super::tree::Group;
use crate::config::DEFAULT_COMPRESSION_LEVEL;
use crate::error::{ContainerError, Result};

/// A container file loaded into memory
///
/// The whole group tree is decoded on open. Nothing reaches disk until
/// [`Store::save`], which writes a temporary sibling file and renames it over the
/// destination so a failed write never leaves a partial container behind.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    header: ContainerHeader,
    root: Group,
}
impl Store {
    /// Starts an empty container of the given shape; the file is written by [`Store::save`]
    pub fn create<P: AsRef<Path>>(path: P, kind: ContainerKind) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: ContainerHeader::new(kind, true),
            root: Group::default(),
        }
    }

    /// Opens and decodes an existing container
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be opened or is not a regular file
    /// * The header is invalid
    /// * The body length does not match the file size
    /// * The group tree is malformed
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        if !file.metadata()?.is_file() {
            return Err(ContainerError::IncompatibleFile(path.to_path_buf()).into());
        }

        // Safety: the file is open and won't be modified while mapped
        let mmap = unsafe { Mmap::map(&file)? };
        let header = ContainerHeader::from_buffer(&mmap)?;

        let body = &mmap[SIZE_HEADER..];
        if body.len() as u64 != header.body_len {
            return Err(ContainerError::FileTruncation(mmap.len()).into());
        }
        let root = Group::decode(&mut &body[..], header.is_compressed())?;

        Ok(Self {
            path: path.to_path_buf(),
            header,
            root,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        self.header.kind
    }

    #[must_use]
    pub fn root(&self) -> &Group {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Group {
        &mut self.root
    }

    /// Fails unless the container has the expected shape
    pub fn expect_kind(&self, expected: ContainerKind) -> Result<()> {
        if self.header.kind == expected {
            Ok(())
        } else {
            Err(ContainerError::UnexpectedKind {
                expected: expected.name(),
                path: self.path.clone(),
            }
            .into())
        }
    }

    /// Encodes the tree and atomically replaces the file at [`Store::path`]
    pub fn save(&mut self) -> Result<()> {
        let compress = self
            .header
            .is_compressed()
            .then_some(DEFAULT_COMPRESSION_LEVEL);

        let mut body = Vec::new();
        self.root.encode(&mut body, compress)?;
        self.header.body_len = body.len() as u64;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            self.header.write_bytes(&mut writer)?;
            writer.write_all(&body)?;
            writer.flush()?;
        }
        tmp.persist(&self.path)?;
        Ok(())
    }
}
