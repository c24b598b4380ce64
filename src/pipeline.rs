//! End-to-end conversion of a multi-read container
//!
//! The container is split into single-read containers together with a basecall
//! text file, which the external index tool then indexes and the external embed
//! tool consumes.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::ToolConfig;
use crate::error::Result;
use crate::split::{split_container, SplitStats};
use crate::tools::{call_embed_tool, call_index_tool};
use crate::utils::file_stem_prefix;

/// Runs split, index and embed for one multi-read container
///
/// Returns the split counts and the path of the basecall text written to
/// `<out_dir>/<stem>.fastq`.
pub fn run<P: AsRef<Path>>(
    multi: P,
    out_dir: &Path,
    tools: &ToolConfig,
) -> Result<(SplitStats, PathBuf)> {
    let multi = multi.as_ref();
    let fastq = out_dir.join(format!("{}.fastq", file_stem_prefix(multi)));

    info!("Processing: {}", multi.display());
    let stats = split_container(multi, out_dir, Some(&fastq))?;
    info!("Processed {} reads ({} errors)", stats.processed, stats.errors);

    call_index_tool(&tools.index_tool, out_dir, &fastq)?;
    call_embed_tool(&tools.embed_tool, &fastq)?;
    Ok((stats, fastq))
}
