//! # fast5kit
//!
//! Tools for nanopore signal containers: split multi-read containers into one
//! container per read, and embed basecall text into existing single-read
//! containers using a read-to-file index.
//!
//! ## Modules
//!
//! * [`container`]: the two container shapes, their reader and writer
//! * [`split`]: multi-read to single-read conversion
//! * [`index`]: readdb and sequencing-summary resolution
//! * [`embed`]: basecall embedding
//! * [`filter`]: read selection by primary alignment and base quality
//! * [`dispatch`]: bounded parallel execution with per-item failure isolation
//! * [`tools`] and [`pipeline`]: external index/embed executables
//!
//! ## Example
//!
//! ```rust,no_run
//! use fast5kit::{split_directory, EmbedConfig, SplitConfig};
//!
//! let stats = split_directory("multi_reads/", &SplitConfig::new("single_reads/")).unwrap();
//! println!("{} reads, {} errors", stats.processed, stats.errors);
//!
//! let config = EmbedConfig::new("calls.fastq").dir("single_reads/");
//! let embedded = fast5kit::embed_basecalls(&config).unwrap();
//! println!("{embedded} basecalls embedded");
//! ```

pub mod basecall;
pub mod config;
pub mod container;
pub mod dispatch;
pub mod embed;
pub mod error;
pub mod filter;
pub mod index;
pub mod pipeline;
pub mod split;
pub mod tools;
pub mod utils;

pub use basecall::{BasecallIndex, BasecallRecord};
pub use config::{EmbedConfig, FilterConfig, SplitConfig, ToolConfig};
pub use container::{
    attributes, AttrValue, Attributes, Basecall, Identity, MultiReadBuilder, MultiReadContainer,
    ReadGroup, ReadGroupReader, Signal, SingleReadContainer, SingleReadWriter,
};
pub use dispatch::{dispatch, dispatch_fn, DispatchReport, Worker};
pub use embed::{embed_basecalls, embed_basecalls_parallel};
pub use error::{Error, Result};
pub use filter::{copy_selected, filter_reads, mirror_directories, FilteredRead};
pub use index::{find_by_ids, resolve, IndexFormat, ReadLocation};
pub use split::{split_container, split_directory, split_directory_parallel, split_file, SplitStats};
