//! Embedding basecall text into existing single-read containers
//!
//! The basecall source is indexed in memory, the index file is resolved to
//! container paths, and every container whose read identifier has a record gets
//! that record written as its basecall, replacing any earlier one.

use std::fmt;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::basecall::{prepare_source, BasecallIndex};
use crate::config::EmbedConfig;
use crate::container::{Attributes, SingleReadWriter};
use crate::dispatch::{dispatch, Worker};
use crate::error::Result;
use crate::index::{resolve, ReadLocation};

/// Overwrites the basecall text of one container
///
/// Existing basecall attributes are kept.
pub fn embed_record<P: AsRef<Path>>(path: P, fastq: &str) -> Result<()> {
    let mut writer = SingleReadWriter::open(path)?;
    writer.write_basecall(fastq, Attributes::new())?;
    writer.finish()
}

/// Pairs every resolved location with the record text of its read
///
/// Locations whose read has no record are dropped.
fn collect_jobs(config: &EmbedConfig) -> Result<Vec<EmbedJob>> {
    let source = prepare_source(&config.fastq)?;
    let records = BasecallIndex::from_path(&source)?;
    let locations = resolve(config.index_path(), &config.dirs, config.recursive)?;

    let mut jobs = Vec::with_capacity(locations.len());
    for ReadLocation { read_id, path } in locations {
        match records.get(&read_id) {
            Some(record) => jobs.push(EmbedJob {
                path,
                fastq: record.to_fastq(),
            }),
            None => debug!("No basecall record for {read_id}"),
        }
    }
    Ok(jobs)
}

/// Embeds every matched record, one container after the other
///
/// Returns the number of containers written. A container that cannot be updated
/// is logged and skipped, exactly as [`embed_basecalls_parallel`] does.
pub fn embed_basecalls(config: &EmbedConfig) -> Result<usize> {
    embed_with(config, 1, true)
}

/// Path of a target container with the record text to write into it
pub struct EmbedJob {
    pub path: PathBuf,
    pub fastq: String,
}
impl fmt::Debug for EmbedJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

struct EmbedWorker;
impl Worker for EmbedWorker {
    type Item = EmbedJob;
    type Output = ();

    fn process(&self, job: EmbedJob) -> Result<()> {
        embed_record(&job.path, &job.fastq)
    }
}

/// Embeds every matched record over `workers` threads
///
/// Returns the number of containers written; containers that fail are logged
/// and do not stop the others.
pub fn embed_basecalls_parallel(config: &EmbedConfig, workers: usize) -> Result<usize> {
    embed_with(config, workers, false)
}

fn embed_with(config: &EmbedConfig, workers: usize, debug: bool) -> Result<usize> {
    let jobs = collect_jobs(config)?;
    let report = dispatch(&EmbedWorker, jobs, workers, debug);
    if report.failures > 0 {
        warn!(
            "{} of {} containers could not be updated",
            report.failures, report.total
        );
    }
    info!(
        "Embedded {} basecalls from {}",
        report.outputs.len(),
        config.fastq.display()
    );
    Ok(report.outputs.len())
}
