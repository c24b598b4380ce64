//! Splitting multi-read containers into single-read containers
//!
//! Every read group becomes `<out_dir>/<group>.fast5`. A group without basecall
//! data is still written; a group missing a mandatory piece is counted as an error
//! and skipped without affecting its siblings.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::{SplitConfig, CONTAINER_EXTENSION};
use crate::container::{MultiReadContainer, ReadGroupReader, SingleReadWriter};
use crate::dispatch::{dispatch, Worker};
use crate::error::Result;
use crate::utils::{file_stem_prefix, list_dir};

/// Per-read outcome counts of a split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitStats {
    /// Reads written to their own container
    pub processed: usize,
    /// Reads skipped because a mandatory piece was missing or unwritable
    pub errors: usize,
}
impl Add for SplitStats {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            processed: self.processed + rhs.processed,
            errors: self.errors + rhs.errors,
        }
    }
}
impl AddAssign for SplitStats {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
impl Sum for SplitStats {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Writes one read group to its own container, returning its basecall text
fn split_group(
    reader: &ReadGroupReader<'_>,
    group: &str,
    out_dir: &Path,
) -> Result<Option<String>> {
    let read = reader.load()?;
    if read.basecall.is_none() {
        info!("No basecall data in {group}");
    }

    let output = out_dir.join(format!("{group}.{CONTAINER_EXTENSION}"));
    let mut writer = SingleReadWriter::create(&output);
    writer.write_read_group(&read)?;
    writer.finish()?;

    Ok(read.basecall.map(|basecall| basecall.fastq))
}

/// Splits one multi-read container into `out_dir`
///
/// If `fastq_out` is given, the basecall text of every written read is appended
/// to that file, which is created once for the whole container.
pub fn split_container<P: AsRef<Path>>(
    path: P,
    out_dir: &Path,
    fastq_out: Option<&Path>,
) -> Result<SplitStats> {
    let container = MultiReadContainer::open(path)?;
    debug!(
        "{} read groups in {}",
        container.num_reads(),
        container.path().display()
    );
    std::fs::create_dir_all(out_dir)?;

    let mut fastq = match fastq_out {
        Some(path) => Some(BufWriter::new(File::create(path)?)),
        None => None,
    };

    let mut stats = SplitStats::default();
    for (group, reader) in container.readers() {
        match split_group(&reader, group, out_dir) {
            Ok(basecall) => {
                if let (Some(handle), Some(text)) = (fastq.as_mut(), basecall) {
                    handle.write_all(text.as_bytes())?;
                    if !text.ends_with('\n') {
                        handle.write_all(b"\n")?;
                    }
                }
                stats.processed += 1;
            }
            Err(e) => {
                warn!("Skipping {group} in {}: {e}", container.path().display());
                stats.errors += 1;
            }
        }
    }
    if let Some(mut handle) = fastq {
        handle.flush()?;
    }
    Ok(stats)
}

/// Splits one multi-read container according to `config`
pub fn split_file<P: AsRef<Path>>(path: P, config: &SplitConfig) -> Result<SplitStats> {
    let path = path.as_ref();
    let stem = file_stem_prefix(path);
    let out_dir = if config.subdir_per_source {
        config.out_dir.join(&stem)
    } else {
        config.out_dir.clone()
    };
    let fastq_out = config
        .write_fastq
        .then(|| out_dir.join(format!("{stem}.fastq")));

    let stats = split_container(path, &out_dir, fastq_out.as_deref())?;
    if config.delete_source {
        std::fs::remove_file(path)?;
    }
    Ok(stats)
}

/// Splits every container in `dir`, one file after the other
///
/// A container that cannot be opened is reported and skipped.
pub fn split_directory<P: AsRef<Path>>(dir: P, config: &SplitConfig) -> Result<SplitStats> {
    split_directory_with(dir.as_ref(), config, 1, true)
}

struct SplitWorker<'a> {
    config: &'a SplitConfig,
}
impl Worker for SplitWorker<'_> {
    type Item = PathBuf;
    type Output = SplitStats;

    fn process(&self, path: PathBuf) -> Result<SplitStats> {
        info!("Processing: {}", path.display());
        let stats = split_file(&path, self.config)?;
        debug!("Processed {} reads of {}", stats.processed, path.display());
        Ok(stats)
    }
}

/// Splits every container in `dir` over `workers` threads
pub fn split_directory_parallel<P: AsRef<Path>>(
    dir: P,
    config: &SplitConfig,
    workers: usize,
) -> Result<SplitStats> {
    split_directory_with(dir.as_ref(), config, workers, false)
}

fn split_directory_with(
    dir: &Path,
    config: &SplitConfig,
    workers: usize,
    debug: bool,
) -> Result<SplitStats> {
    let paths = list_dir(dir, Some(CONTAINER_EXTENSION))?;
    let report = dispatch(&SplitWorker { config }, paths, workers, debug);
    let total: SplitStats = report.outputs.into_iter().sum();
    info!(
        "Split finished: {} of {} files, {} reads processed, {} errors",
        report.total - report.failures,
        report.total,
        total.processed,
        total.errors
    );
    Ok(total)
}

#[cfg(test)]
mod testing {
    use super::*;
    use crate::container::{
        attributes, Basecall, ContainerHeader, ContainerKind, Identity, MultiReadBuilder,
        ReadGroup, Signal, SingleReadContainer,
    };
    use anyhow::Result;

    fn read_group(id: &str, with_basecall: bool) -> ReadGroup {
        ReadGroup {
            signal: Signal {
                samples: vec![500, 510, 498, 731],
                attrs: attributes([("read_id", id)]),
            },
            identity: Identity {
                channel: attributes([("channel_number", "12")]),
                context: attributes([("sample_frequency", "4000")]),
                tracking: attributes([("run_id", "r1")]),
            },
            basecall: with_basecall.then(|| Basecall {
                fastq: format!("@{id}\nACGA\n+\n!!!!"),
                attrs: attributes([("name", "basecaller")]),
            }),
        }
    }

    fn build_multi(path: &Path) -> Result<()> {
        let mut builder = MultiReadBuilder::create(path);
        builder.add_read("read_a", &read_group("a", true))?;
        builder.add_read("read_b", &read_group("b", false))?;
        builder.add_read("read_c", &read_group("c", true))?;
        builder.add_read("read_d", &read_group("d", true))?;
        builder.remove("read_d", "tracking_id");
        builder.finish()?;
        Ok(())
    }

    #[test]
    fn test_split_container_isolates_failures() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("batch_0.fast5");
        build_multi(&source)?;

        assert_eq!(MultiReadContainer::open(&source)?.num_reads(), 4);

        let out = dir.path().join("out");
        let fastq = dir.path().join("batch_0.fastq");
        let stats = split_container(&source, &out, Some(&fastq))?;
        assert_eq!(stats, SplitStats { processed: 3, errors: 1 });

        assert!(!out.join("read_d.fast5").exists());
        let a = SingleReadContainer::open(out.join("read_a.fast5"))?;
        assert_eq!(a.reader().signal()?, vec![500, 510, 498, 731]);
        let b = SingleReadContainer::open(out.join("read_b.fast5"))?;
        assert!(b.reader().basecall().unwrap_err().is_not_found());

        let text = std::fs::read_to_string(&fastq)?;
        assert_eq!(text, "@a\nACGA\n+\n!!!!\n@c\nACGA\n+\n!!!!\n");
        assert!(source.exists());
        Ok(())
    }

    #[test]
    fn test_split_file_subdir_and_delete() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("batch_1.fast5");
        build_multi(&source)?;

        let out = dir.path().join("out");
        let config = SplitConfig::new(&out)
            .subdir_per_source(true)
            .delete_source(true)
            .write_fastq(true);
        let stats = split_file(&source, &config)?;
        assert_eq!(stats.processed, 3);
        assert!(out.join("batch_1/read_a.fast5").exists());
        assert!(out.join("batch_1/batch_1.fastq").exists());
        assert!(!source.exists());
        Ok(())
    }

    #[test]
    fn test_split_directory_sequential_and_parallel() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("multi");
        std::fs::create_dir(&input)?;
        build_multi(&input.join("batch_0.fast5"))?;
        build_multi(&input.join("batch_1.fast5"))?;
        std::fs::write(input.join("broken.fast5"), b"not a container")?;

        let sequential = split_directory(
            &input,
            &SplitConfig::new(dir.path().join("seq")).subdir_per_source(true),
        )?;
        let parallel = split_directory_parallel(
            &input,
            &SplitConfig::new(dir.path().join("par")).subdir_per_source(true),
            3,
        )?;
        assert_eq!(sequential, SplitStats { processed: 6, errors: 2 });
        assert_eq!(sequential, parallel);
        Ok(())
    }

    /// A header that passes validation in front of a body whose only dataset
    /// claims far more bytes than the file holds
    fn write_forged(path: &Path) -> Result<()> {
        let mut body = vec![1u8];
        body.extend_from_slice(&0u32.to_le_bytes());
        body.extend_from_slice(&1u32.to_le_bytes());
        body.extend_from_slice(&6u16.to_le_bytes());
        body.extend_from_slice(b"read_x");
        body.push(2);
        body.extend_from_slice(&0u32.to_le_bytes());
        body.push(2);
        body.extend_from_slice(&(1u64 << 45).to_le_bytes());
        body.extend_from_slice(b"tail");

        let mut header = ContainerHeader::new(ContainerKind::Multi, true);
        header.body_len = body.len() as u64;
        let mut bytes = Vec::new();
        header.write_bytes(&mut bytes)?;
        bytes.extend_from_slice(&body);
        std::fs::write(path, bytes)?;
        Ok(())
    }

    #[test]
    fn test_split_directory_skips_forged_lengths() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("multi");
        std::fs::create_dir(&input)?;
        build_multi(&input.join("batch_0.fast5"))?;
        write_forged(&input.join("batch_1.fast5"))?;
        assert!(MultiReadContainer::open(input.join("batch_1.fast5")).is_err());

        let sequential = split_directory(&input, &SplitConfig::new(dir.path().join("seq")))?;
        let parallel =
            split_directory_parallel(&input, &SplitConfig::new(dir.path().join("par")), 2)?;
        assert_eq!(sequential, SplitStats { processed: 3, errors: 1 });
        assert_eq!(sequential, parallel);
        Ok(())
    }

    #[test]
    fn test_stats_sum() {
        let stats = [
            SplitStats { processed: 2, errors: 1 },
            SplitStats { processed: 3, errors: 0 },
        ];
        let total: SplitStats = stats.into_iter().sum();
        assert_eq!(total, SplitStats { processed: 5, errors: 1 });
    }
}
