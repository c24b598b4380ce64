//! Header module for containers
//!
//! The header identifies the file, records its shape (multi- or single-read),
//! whether numeric datasets are compressed, and the length of the encoded body.

use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;

use crate::error::{ContainerError, Result};

/// Current magic number: "F5CN" in ASCII (in little-endian byte order)
const MAGIC: u32 = 0x4E43_3546;

/// Current format version of the container format
const FORMAT: u8 = 1;

/// Value of every reserved byte
const RESERVED: u8 = 42;

/// Size of the header in bytes
pub const SIZE_HEADER: usize = 32;

/// Bit set in [`ContainerHeader::flags`] when numeric datasets are zstd-compressed
pub const FLAG_COMPRESSED: u8 = 0b0000_0001;

/// Shape of a container
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Top-level children are read groups, one per read
    Multi,
    /// Exactly one read rooted at fixed group paths
    Single,
}
impl ContainerKind {
    fn to_byte(self) -> u8 {
        match self {
            Self::Multi => 0,
            Self::Single => 1,
        }
    }

    fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(Self::Multi),
            1 => Ok(Self::Single),
            _ => Err(ContainerError::InvalidKind(byte).into()),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Multi => "multi-read",
            Self::Single => "single-read",
        }
    }
}

/// Header structure for container files
///
/// The total size of this structure is 32 bytes, with a fixed layout to ensure
/// consistent reading and writing across different platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    /// Magic number to identify the file format
    ///
    /// 4 bytes
    pub magic: u32,

    /// Version of the file format
    ///
    /// 1 byte
    pub format: u8,

    /// Shape of the container
    ///
    /// 1 byte
    pub kind: ContainerKind,

    /// Encoding flags (see [`FLAG_COMPRESSED`])
    ///
    /// 1 byte
    pub flags: u8,

    /// Length of the encoded group tree following the header
    ///
    /// 8 bytes
    pub body_len: u64,

    /// Reserve remaining bytes for future use
    ///
    /// 17 bytes
    pub reserved: [u8; 17],
}
impl ContainerHeader {
    /// Creates a new header for an empty container of the given shape
    #[must_use]
    pub fn new(kind: ContainerKind, compressed: bool) -> Self {
        Self {
            magic: MAGIC,
            format: FORMAT,
            kind,
            flags: if compressed { FLAG_COMPRESSED } else { 0 },
            body_len: 0,
            reserved: [RESERVED; 17],
        }
    }

    #[must_use]
    pub fn is_compressed(&self) -> bool {
        self.flags & FLAG_COMPRESSED != 0
    }

    /// Parses a header from a fixed-size byte array
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The magic number is incorrect
    /// * The format version is unsupported
    /// * The kind byte is unknown
    /// * The reserved bytes are invalid
    pub fn from_bytes(buffer: &[u8; SIZE_HEADER]) -> Result<Self> {
        let magic = LittleEndian::read_u32(&buffer[0..4]);
        if magic != MAGIC {
            return Err(ContainerError::InvalidMagicNumber(magic).into());
        }
        let format = buffer[4];
        if format != FORMAT {
            return Err(ContainerError::InvalidFormatVersion(format).into());
        }
        let kind = ContainerKind::from_byte(buffer[5])?;
        let flags = buffer[6];
        let body_len = LittleEndian::read_u64(&buffer[7..15]);
        let mut reserved = [0u8; 17];
        reserved.copy_from_slice(&buffer[15..32]);
        if reserved.iter().any(|&b| b != RESERVED) {
            return Err(ContainerError::InvalidReservedBytes.into());
        }
        Ok(Self {
            magic,
            format,
            kind,
            flags,
            body_len,
            reserved,
        })
    }

    /// Parses a header from the beginning of an arbitrarily sized buffer
    pub fn from_buffer(buffer: &[u8]) -> Result<Self> {
        let mut bytes = [0u8; SIZE_HEADER];
        if buffer.len() < SIZE_HEADER {
            return Err(ContainerError::InvalidSize(buffer.len(), SIZE_HEADER).into());
        }
        bytes.copy_from_slice(&buffer[..SIZE_HEADER]);
        Self::from_bytes(&bytes)
    }

    /// Writes the header to a writer
    pub fn write_bytes<W: Write>(&self, writer: &mut W) -> Result<()> {
        let mut buffer = [0u8; SIZE_HEADER];
        LittleEndian::write_u32(&mut buffer[0..4], self.magic);
        buffer[4] = self.format;
        buffer[5] = self.kind.to_byte();
        buffer[6] = self.flags;
        LittleEndian::write_u64(&mut buffer[7..15], self.body_len);
        buffer[15..32].copy_from_slice(&self.reserved);
        writer.write_all(&buffer)?;
        Ok(())
    }
}
