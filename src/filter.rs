//! Read selection by alignment
//!
//! Every read of an index file is looked up by name in a BAM file. A read is kept
//! when it has a primary alignment (not secondary, unmapped or supplementary, and
//! without an `SA` tag) whose mean base quality reaches the threshold. Selection
//! follows index order and stops once the kept reads cover the trim budget.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use log::{debug, info};
use noodles::bam;
use noodles::sam::alignment::record::data::field::Tag;

use crate::config::{FilterConfig, ALIGNMENT_EXTENSION};
use crate::error::{AlignmentError, Result};
use crate::index::{resolve, ReadLocation};
use crate::utils::sub_directories;

/// Quality byte marking absent base qualities in a BAM record
const MISSING_QUALITY: u8 = 0xFF;

/// The parts of one alignment record the filter looks at
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentSummary {
    /// Neither secondary, unmapped nor supplementary, and no `SA` tag
    pub primary: bool,
    /// Mean phred quality, if the record carries qualities
    pub mean_quality: Option<f64>,
    /// Length of the query sequence
    pub query_length: usize,
}
impl AlignmentSummary {
    fn from_record(record: &bam::Record) -> Result<Self> {
        let flags = record.flags();
        let mut chimeric = false;
        for field in record.data().iter() {
            let (tag, _) = field?;
            if tag == Tag::OTHER_ALIGNMENTS {
                chimeric = true;
                break;
            }
        }
        let primary = !(flags.is_secondary()
            || flags.is_unmapped()
            || flags.is_supplementary()
            || chimeric);

        let scores = record.quality_scores();
        Ok(Self {
            primary,
            mean_quality: mean_quality(scores.as_ref()),
            query_length: record.sequence().len(),
        })
    }

    /// Returns true if the alignment is primary and reaches `threshold`
    #[must_use]
    pub fn passes(&self, threshold: f64) -> bool {
        self.primary && !self.mean_quality.is_some_and(|quality| quality < threshold)
    }
}

fn mean_quality(scores: &[u8]) -> Option<f64> {
    match scores.first() {
        None | Some(&MISSING_QUALITY) => None,
        Some(_) => {
            let sum: u64 = scores.iter().map(|&q| u64::from(q)).sum();
            Some(sum as f64 / scores.len() as f64)
        }
    }
}

/// Alignment summaries keyed by read name
#[derive(Debug, Default)]
pub struct AlignmentIndex {
    by_name: HashMap<String, Vec<AlignmentSummary>>,
}
impl AlignmentIndex {
    /// Reads every record of a BAM file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.extension().is_some_and(|ext| ext == ALIGNMENT_EXTENSION) {
            return Err(AlignmentError::UnsupportedExtension(path.to_path_buf()).into());
        }

        let mut reader = bam::io::Reader::new(File::open(path)?);
        reader.read_header()?;

        let mut index = Self::default();
        let mut unnamed = 0;
        for result in reader.records() {
            let record = result?;
            let Some(name) = record.name() else {
                unnamed += 1;
                continue;
            };
            index.insert(name.to_string(), AlignmentSummary::from_record(&record)?);
        }
        if unnamed > 0 {
            debug!("{unnamed} unnamed records in {}", path.display());
        }
        info!("Indexed alignments of {} reads from {}", index.len(), path.display());
        Ok(index)
    }

    pub fn insert(&mut self, name: String, alignment: AlignmentSummary) {
        self.by_name.entry(name).or_default().push(alignment);
    }

    /// Alignments of `name` in file order
    #[must_use]
    pub fn get(&self, name: &str) -> &[AlignmentSummary] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A located read together with the alignment that selected it
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredRead {
    pub location: ReadLocation,
    pub alignment: AlignmentSummary,
}

/// Keeps the locations whose read has a passing alignment
///
/// Locations are visited in order. Once more than `trim` bases have been
/// selected no further location is considered.
pub fn select(
    locations: Vec<ReadLocation>,
    alignments: &AlignmentIndex,
    quality_threshold: f64,
    trim: Option<u64>,
) -> Vec<FilteredRead> {
    let mut selected = Vec::new();
    let mut bases = 0u64;
    for location in locations {
        if trim.is_some_and(|budget| budget < bases) {
            info!("Filtered {} files for {bases} bases", selected.len());
            break;
        }
        let found = alignments.get(&location.read_id);
        if found.is_empty() {
            debug!("Found no alignments for {}", location.path.display());
            continue;
        }
        for alignment in found.iter().filter(|a| a.passes(quality_threshold)) {
            bases += alignment.query_length as u64;
            selected.push(FilteredRead {
                location: location.clone(),
                alignment: alignment.clone(),
            });
        }
    }
    selected
}

/// Resolves the index of `config` and keeps the reads selected by its alignments
pub fn filter_reads(config: &FilterConfig) -> Result<Vec<FilteredRead>> {
    let alignments = AlignmentIndex::from_path(&config.alignment)?;
    let locations = resolve(&config.index, &config.dirs, config.recursive)?;
    let total = locations.len();
    let selected = select(locations, &alignments, config.quality_threshold, config.trim);
    info!("Kept {} of {total} located reads", selected.len());
    Ok(selected)
}

/// Creates `<out_dir>/<name>` for `in_dir` and every directory below it
///
/// Returns `(input directory, output directory)` pairs in walk order.
pub fn mirror_directories<P: AsRef<Path>, Q: AsRef<Path>>(
    in_dir: P,
    out_dir: Q,
) -> Result<Vec<(PathBuf, PathBuf)>> {
    let mut pairs = Vec::new();
    for sub_in_dir in sub_directories(in_dir)? {
        let Some(name) = sub_in_dir.file_name() else {
            continue;
        };
        let sub_out_dir = out_dir.as_ref().join(name);
        std::fs::create_dir_all(&sub_out_dir)?;
        pairs.push((sub_in_dir, sub_out_dir));
    }
    Ok(pairs)
}

/// Copies the selected containers found below `in_dir` into its mirror under `out_dir`
///
/// Returns the number of files copied.
pub fn copy_selected<P: AsRef<Path>, Q: AsRef<Path>>(
    reads: &[FilteredRead],
    in_dir: P,
    out_dir: Q,
) -> Result<usize> {
    let mut targets = HashMap::new();
    for (sub_in_dir, sub_out_dir) in mirror_directories(in_dir, out_dir)? {
        targets.insert(sub_in_dir.canonicalize()?, sub_out_dir);
    }

    let mut copied = 0;
    for read in reads {
        let path = &read.location.path;
        let (Some(parent), Some(name)) = (path.parent(), path.file_name()) else {
            continue;
        };
        if let Some(sub_out_dir) = targets.get(parent) {
            std::fs::copy(path, sub_out_dir.join(name))?;
            copied += 1;
        }
    }
    info!("Copied {copied} selected containers");
    Ok(copied)
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;

    fn location(id: &str) -> ReadLocation {
        ReadLocation {
            read_id: id.to_string(),
            path: PathBuf::from(format!("/reads/{id}.fast5")),
        }
    }

    fn primary(mean_quality: Option<f64>, query_length: usize) -> AlignmentSummary {
        AlignmentSummary {
            primary: true,
            mean_quality,
            query_length,
        }
    }

    #[test]
    fn test_mean_quality() {
        assert_eq!(mean_quality(&[]), None);
        assert_eq!(mean_quality(&[0xFF, 0xFF]), None);
        assert_eq!(mean_quality(&[10, 20, 30]), Some(20.0));
    }

    #[test]
    fn test_passes() {
        assert!(primary(Some(7.0), 10).passes(7.0));
        assert!(!primary(Some(6.9), 10).passes(7.0));
        assert!(primary(None, 10).passes(7.0));

        let secondary = AlignmentSummary {
            primary: false,
            ..primary(Some(40.0), 10)
        };
        assert!(!secondary.passes(0.0));
    }

    #[test]
    fn test_select_keeps_index_order() {
        let mut alignments = AlignmentIndex::default();
        alignments.insert("c".into(), primary(Some(30.0), 100));
        alignments.insert(
            "a".into(),
            AlignmentSummary {
                primary: false,
                ..primary(Some(30.0), 100)
            },
        );
        alignments.insert("a".into(), primary(Some(25.0), 80));
        alignments.insert("b".into(), primary(Some(3.0), 100));

        let locations = ["a", "b", "missing", "c"].map(location).to_vec();
        let selected = select(locations, &alignments, 7.0, None);
        let ids: Vec<_> = selected.iter().map(|r| r.location.read_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(selected[0].alignment.query_length, 80);
    }

    #[test]
    fn test_select_stops_after_trim_budget() {
        let mut alignments = AlignmentIndex::default();
        for id in ["a", "b", "c", "d"] {
            alignments.insert(id.into(), primary(None, 50));
        }
        let locations = || ["a", "b", "c", "d"].map(location).to_vec();

        // the budget is checked before each read, so the read crossing it is kept
        assert_eq!(select(locations(), &alignments, 7.0, Some(60)).len(), 2);
        assert_eq!(select(locations(), &alignments, 7.0, Some(100)).len(), 3);
        assert_eq!(select(locations(), &alignments, 7.0, Some(0)).len(), 1);
        assert_eq!(select(locations(), &alignments, 7.0, None).len(), 4);
    }

    #[test]
    fn test_rejects_non_bam_alignment() {
        let err = AlignmentIndex::from_path("reads.sam").unwrap_err();
        assert!(matches!(
            err,
            crate::Error::AlignmentError(AlignmentError::UnsupportedExtension(_))
        ));
    }

    #[test]
    fn test_mirror_and_copy() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("pass");
        std::fs::create_dir_all(input.join("batch_0"))?;
        std::fs::write(input.join("batch_0/a.fast5"), b"a")?;
        std::fs::write(input.join("b.fast5"), b"b")?;
        let output = dir.path().join("filtered");

        let pairs = mirror_directories(&input, &output)?;
        assert_eq!(
            pairs,
            vec![
                (input.clone(), output.join("pass")),
                (input.join("batch_0"), output.join("batch_0")),
            ]
        );
        assert!(output.join("batch_0").is_dir());

        let reads: Vec<_> = [input.join("batch_0/a.fast5"), input.join("b.fast5")]
            .into_iter()
            .map(|path| -> Result<FilteredRead> {
                Ok(FilteredRead {
                    location: ReadLocation {
                        read_id: "x".into(),
                        path: path.canonicalize()?,
                    },
                    alignment: primary(None, 1),
                })
            })
            .collect::<Result<_>>()?;
        assert_eq!(copy_selected(&reads, &input, &output)?, 2);
        assert_eq!(std::fs::read(output.join("batch_0/a.fast5"))?, b"a");
        assert_eq!(std::fs::read(output.join("pass/b.fast5"))?, b"b");
        Ok(())
    }
}
