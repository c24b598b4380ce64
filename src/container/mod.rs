//! # container
//!
//! Containers hold the raw signal, identity metadata and optional basecall text of
//! one or many nanopore reads as a tree of named groups with attribute sets.
//!
//! Two shapes exist and are not interchangeable:
//!
//! * **multi-read**: one top-level group per read, named `read_<id>`, opened with
//!   [`MultiReadContainer`] and written with [`MultiReadBuilder`].
//! * **single-read**: exactly one read at fixed paths, opened with
//!   [`SingleReadContainer`] and written (or mutated) with [`SingleReadWriter`].
//!
//! ## Group layout
//!
//! | Piece            | multi-read                                              | single-read                                    |
//! | ---------------- | ------------------------------------------------------- | ---------------------------------------------- |
//! | signal attrs     | `read_<id>/Raw`                                         | `Raw/Reads/Read_1`                             |
//! | signal samples   | `read_<id>/Raw/Signal`                                  | `Raw/Reads/Read_1/Signal`                      |
//! | channel attrs    | `read_<id>/channel_id`                                  | `UniqueGlobalKey/channel_id`                   |
//! | context attrs    | `read_<id>/context_tags`                                | `UniqueGlobalKey/context_tags`                 |
//! | tracking attrs   | `read_<id>/tracking_id`                                 | `UniqueGlobalKey/tracking_id`                  |
//! | basecall attrs   | `read_<id>/Analyses/Basecall_1D_000`                    | `Analyses/Basecall_1D_000`                     |
//! | basecall text    | `read_<id>/Analyses/Basecall_1D_000/BaseCalled_template/Fastq` | `Analyses/Basecall_1D_000/BaseCalled_template/Fastq` |
//!
//! ## File format
//!
//! A container file consists of a fixed-size header followed by the encoded group tree.
//!
//! ### Header Format (32 bytes total)
//!
//! | Offset | Size (bytes) | Name     | Description                         | Type   |
//! | ------ | ------------ | -------- | ----------------------------------- | ------ |
//! | 0      | 4            | magic    | Magic number (`F5CN`)               | uint32 |
//! | 4      | 1            | format   | Format version (currently 1)        | uint8  |
//! | 5      | 1            | kind     | 0 = multi-read, 1 = single-read     | uint8  |
//! | 6      | 1            | flags    | bit 0: signal datasets zstd-compressed | uint8 |
//! | 7      | 8            | body_len | Length of the encoded tree in bytes | uint64 |
//! | 15     | 17           | reserved | Reserved for future use             | bytes  |
//!
//! ### Tree encoding
//!
//! * group: `1u8 | attributes | child count (u32) | (name, node)*`
//! * dataset: `2u8 | attributes | dtype (u8: 1 = i16, 2 = text) | payload length (u64) | payload`
//! * attributes: `count (u32) | (key, tag u8, value)*` with tags int64, uint64, float64 and text
//! * names: `u16` length followed by UTF-8 bytes
//!
//! All integers are little-endian.
//!
//! ## Validation
//!
//! Readers verify the magic number, the format version, the kind byte, the reserved
//! bytes, and that the file size minus the header equals `body_len`. Every length
//! prefix inside the body is checked against the bytes that remain, and 16-bit
//! signal payloads must hold a whole number of samples.
//!
//! ## Compatibility
//!
//! Containers carry the `.fast5` extension and the fast5 group names, but the file
//! is this binary tree, not HDF5. HDF5 readers cannot open it. This includes the
//! external index and embed executables driven by [`crate::pipeline`]; those need
//! a conversion step or their own reader for this format.

mod attrs;
mod header;
mod layout;
mod read_group;
mod reader;
mod store;
mod tree;
mod writer;

pub use attrs::{attributes, AttrValue, Attributes};
pub use header::{ContainerHeader, ContainerKind, SIZE_HEADER};
pub use layout::Layout;
pub use read_group::{Basecall, Identity, ReadGroup, Signal};
pub use reader::{MultiReadContainer, ReadGroupReader, SingleReadContainer};
pub use store::Store;
pub use tree::{Dataset, DatasetData, Group, Node};
pub use writer::{MultiReadBuilder, SingleReadWriter};
