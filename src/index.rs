//! Read-to-file index resolution
//!
//! Index files map read identifiers to container paths relative to one or more
//! search directories. Two column orders exist and are told apart by suffix:
//!
//! * `*.readdb`: `read_id <ws> relative_path`
//! * `*.tsv` / `*.txt` (sequencing summary): `relative_path <ws> read_id`
//!
//! Lines that are not UTF-8 or do not split into exactly two tokens are skipped.

use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::{READDB_SUFFIX, SUMMARY_SUFFIXES};
use crate::error::{IndexError, Result};
use crate::utils::sub_directories;

/// Column order of an index file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexFormat {
    /// `(read_id, path)`
    ReadDb,
    /// `(path, read_id)`
    SequencingSummary,
}
impl IndexFormat {
    /// Determines the column order from the file name
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if name.ends_with(READDB_SUFFIX) {
            return Ok(Self::ReadDb);
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if SUMMARY_SUFFIXES.contains(&ext) => Ok(Self::SequencingSummary),
            _ => Err(IndexError::UnsupportedExtension(path.to_path_buf()).into()),
        }
    }

    /// Splits a line into `(read_id, relative_path)`
    ///
    /// Returns `None` unless the line holds exactly two tokens.
    #[must_use]
    pub fn parse_line<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        let mut tokens = line.split_whitespace();
        let first = tokens.next()?;
        let second = tokens.next()?;
        if tokens.next().is_some() {
            return None;
        }
        match self {
            Self::ReadDb => Some((first, second)),
            Self::SequencingSummary => Some((second, first)),
        }
    }
}

/// A read identifier matched to an existing container file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReadLocation {
    pub read_id: String,
    /// Canonical absolute path of the container
    pub path: PathBuf,
}

/// Expands the search directories, validating each one
fn search_directories(dirs: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    for dir in dirs {
        if !dir.is_dir() {
            return Err(IndexError::NotADirectory(dir.clone()).into());
        }
    }
    if dirs.is_empty() {
        return Ok(vec![PathBuf::from(".")]);
    }
    if !recursive {
        return Ok(dirs.to_vec());
    }
    let mut expanded = Vec::new();
    for dir in dirs {
        expanded.extend(sub_directories(dir)?);
    }
    Ok(expanded)
}

/// Resolves every index line against the search directories
///
/// A read is yielded once per directory in which its relative path exists, so
/// identifiers may repeat. Nothing is deduplicated.
pub fn resolve<P: AsRef<Path>>(
    index: P,
    dirs: &[PathBuf],
    recursive: bool,
) -> Result<Vec<ReadLocation>> {
    let index = index.as_ref();
    let format = IndexFormat::from_path(index)?;
    let search = search_directories(dirs, recursive)?;
    debug!(
        "Resolving {} as {format:?} against {} directories",
        index.display(),
        search.len()
    );

    let reader = BufReader::new(File::open(index)?);
    let mut locations = Vec::new();
    let mut skipped = 0;
    for line in reader.split(b'\n') {
        let line = line?;
        let Some((read_id, relative)) = std::str::from_utf8(&line)
            .ok()
            .and_then(|line| format.parse_line(line))
        else {
            skipped += 1;
            continue;
        };
        for dir in &search {
            let candidate = dir.join(relative);
            if candidate.exists() {
                locations.push(ReadLocation {
                    read_id: read_id.to_string(),
                    path: candidate.canonicalize()?,
                });
            }
        }
    }
    info!(
        "Resolved {} locations from {} ({skipped} lines skipped)",
        locations.len(),
        index.display()
    );
    Ok(locations)
}

/// Resolves the index and keeps the reads whose identifier is in `ids`
///
/// The identifier is compared up to its first `_`.
pub fn find_by_ids<P: AsRef<Path>>(
    index: P,
    ids: &HashSet<String>,
    dirs: &[PathBuf],
    recursive: bool,
) -> Result<Vec<ReadLocation>> {
    Ok(resolve(index, dirs, recursive)?
        .into_iter()
        .filter(|location| {
            let stem = location.read_id.split('_').next().unwrap_or_default();
            ids.contains(stem)
        })
        .collect())
}

#[cfg(test)]
mod testing {
    use super::*;
    use anyhow::Result;

    fn touch(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, b"")?;
        Ok(())
    }

    #[test]
    fn test_format_from_path() -> Result<()> {
        assert_eq!(
            IndexFormat::from_path(Path::new("reads.fastq.index.readdb"))?,
            IndexFormat::ReadDb
        );
        assert_eq!(
            IndexFormat::from_path(Path::new("sequencing_summary.txt"))?,
            IndexFormat::SequencingSummary
        );
        assert_eq!(
            IndexFormat::from_path(Path::new("summary.tsv"))?,
            IndexFormat::SequencingSummary
        );
        assert!(IndexFormat::from_path(Path::new("reads.csv")).is_err());
        Ok(())
    }

    #[test]
    fn test_parse_line() {
        let db = IndexFormat::ReadDb;
        let summary = IndexFormat::SequencingSummary;
        assert_eq!(db.parse_line("abc\tx/abc.fast5"), Some(("abc", "x/abc.fast5")));
        assert_eq!(summary.parse_line("x/abc.fast5 abc\n"), Some(("abc", "x/abc.fast5")));
        assert_eq!(db.parse_line("abc"), None);
        assert_eq!(db.parse_line("a b c"), None);
        assert_eq!(db.parse_line(""), None);
    }

    #[test]
    fn test_resolve_yields_once_per_existing_path() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("reads/read_1.fast5"))?;
        let index = dir.path().join("reads.index.readdb");
        std::fs::write(
            &index,
            "read_1\treads/read_1.fast5\nread_2\treads/read_2.fast5\nmalformed\n",
        )?;

        let locations = resolve(&index, &[dir.path().to_path_buf()], false)?;
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].read_id, "read_1");
        assert!(locations[0].path.is_absolute());
        assert_eq!(
            locations[0].path,
            dir.path().join("reads/read_1.fast5").canonicalize()?
        );
        Ok(())
    }

    #[test]
    fn test_resolve_skips_undecodable_lines() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("read_1.fast5"))?;
        touch(&dir.path().join("read_2.fast5"))?;
        let index = dir.path().join("reads.index.readdb");
        let mut bytes = b"read_1\tread_1.fast5\n".to_vec();
        bytes.extend_from_slice(b"read_\xff\xfe\tbad.fast5\n");
        bytes.extend_from_slice(b"read_2\tread_2.fast5");
        std::fs::write(&index, bytes)?;

        let locations = resolve(&index, &[dir.path().to_path_buf()], false)?;
        let ids: Vec<_> = locations.iter().map(|l| l.read_id.as_str()).collect();
        assert_eq!(ids, vec!["read_1", "read_2"]);
        Ok(())
    }

    #[test]
    fn test_resolve_recursive_repeats_per_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("read_1.fast5"))?;
        touch(&dir.path().join("a/read_1.fast5"))?;
        touch(&dir.path().join("a/b/read_1.fast5"))?;
        let index = dir.path().join("summary.tsv");
        std::fs::write(&index, "read_1.fast5\tread_1\n")?;

        let roots = [dir.path().to_path_buf()];
        assert_eq!(resolve(&index, &roots, false)?.len(), 1);
        assert_eq!(resolve(&index, &roots, true)?.len(), 3);
        Ok(())
    }

    #[test]
    fn test_resolve_rejects_missing_directory() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let index = dir.path().join("x.readdb");
        std::fs::write(&index, "")?;
        let result = resolve(&index, &[dir.path().join("nope")], false);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn test_find_by_ids() -> Result<()> {
        let dir = tempfile::tempdir()?;
        touch(&dir.path().join("a.fast5"))?;
        touch(&dir.path().join("b.fast5"))?;
        let index = dir.path().join("x.readdb");
        std::fs::write(&index, "abc_1 a.fast5\ndef_2 b.fast5\n")?;

        let ids = HashSet::from(["abc".to_string()]);
        let found = find_by_ids(&index, &ids, &[dir.path().to_path_buf()], false)?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].read_id, "abc_1");
        Ok(())
    }
}
