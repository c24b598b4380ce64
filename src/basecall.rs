//! Basecall text sources
//!
//! A source is a file of concatenated 4-line records (header, sequence, separator,
//! quality). The read identifier is the first whitespace-delimited token of the
//! header. Sources may be compressed; the format is detected on open.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};
use memchr::memchr2;
use seq_io::fastq::{Reader, Record};

use crate::config::{CORRECTED_SUFFIX, LEGACY_MARKER, LEGACY_MARKER_FIXED};
use crate::error::{BasecallError, Result};

/// Opens a (possibly compressed) source; an empty file yields `None`
fn open_source(path: &Path) -> Result<Option<Box<dyn Read>>> {
    if std::fs::metadata(path)?.len() == 0 {
        return Ok(None);
    }
    let (handle, format) = niffler::from_path(path)?;
    debug!("Opened {} ({format:?})", path.display());
    Ok(Some(handle))
}

/// One basecall text record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasecallRecord {
    /// Read identifier (first token of the header)
    pub id: String,
    /// Full header line without the leading `@`
    pub head: String,
    pub seq: Vec<u8>,
    pub qual: Vec<u8>,
}
impl BasecallRecord {
    fn from_record<R: Record>(record: &R, source: &Path) -> Result<Self> {
        let head = std::str::from_utf8(record.head())?;
        let id = read_id(head);
        if id.is_empty() {
            return Err(BasecallError::MissingReadId(source.to_path_buf()).into());
        }
        Ok(Self {
            id: id.to_string(),
            head: head.to_string(),
            seq: record.seq().to_vec(),
            qual: record.qual().to_vec(),
        })
    }

    /// Renders the 4-line record without a trailing newline
    #[must_use]
    pub fn to_fastq(&self) -> String {
        format!(
            "@{}\n{}\n+\n{}",
            self.head,
            String::from_utf8_lossy(&self.seq),
            String::from_utf8_lossy(&self.qual)
        )
    }
}

/// Returns the read identifier carried by a header line
#[must_use]
pub fn read_id(head: &str) -> &str {
    let head = head.strip_prefix('@').unwrap_or(head);
    match memchr2(b' ', b'\t', head.as_bytes()) {
        Some(end) => &head[..end],
        None => head,
    }
}

/// All records of a source keyed by read identifier
///
/// A later record with an already seen identifier replaces the earlier one.
#[derive(Debug, Default)]
pub struct BasecallIndex {
    records: HashMap<String, BasecallRecord>,
}
impl BasecallIndex {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut records = HashMap::new();
        let Some(handle) = open_source(path)? else {
            return Ok(Self { records });
        };

        let mut reader = Reader::new(handle);
        while let Some(record) = reader.next() {
            let record = BasecallRecord::from_record(&record?, path)?;
            records.insert(record.id.clone(), record);
        }
        info!("Indexed {} basecall records from {}", records.len(), path.display());
        Ok(Self { records })
    }

    #[must_use]
    pub fn get(&self, read_id: &str) -> Option<&BasecallRecord> {
        self.records.get(read_id)
    }

    #[must_use]
    pub fn contains(&self, read_id: &str) -> bool {
        self.records.contains_key(read_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Reads the first record of a source, if any
pub fn first_record<P: AsRef<Path>>(path: P) -> Result<Option<BasecallRecord>> {
    let path = path.as_ref();
    let Some(handle) = open_source(path)? else {
        return Ok(None);
    };
    let mut reader = Reader::new(handle);
    match reader.next() {
        Some(record) => Ok(Some(BasecallRecord::from_record(&record?, path)?)),
        None => Ok(None),
    }
}

/// Returns true if the first record's header ends with the legacy marker
pub fn needs_correction<P: AsRef<Path>>(path: P) -> Result<bool> {
    Ok(first_record(path)?.is_some_and(|record| record.head.ends_with(LEGACY_MARKER)))
}

/// Writes a copy of `src` to `dst` with the first legacy marker on every line replaced
pub fn correct_legacy_marker<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<PathBuf> {
    let mut writer = BufWriter::new(File::create(dst.as_ref())?);
    if let Some(handle) = open_source(src.as_ref())? {
        for line in BufReader::new(handle).lines() {
            let line = line?;
            writeln!(writer, "{}", line.replacen(LEGACY_MARKER, LEGACY_MARKER_FIXED, 1))?;
        }
    }
    writer.flush()?;
    Ok(dst.as_ref().to_path_buf())
}

/// Returns the path to index: a corrected copy if the source carries the legacy marker
pub fn prepare_source<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
    let path = path.as_ref();
    if !needs_correction(path)? {
        return Ok(path.to_path_buf());
    }
    let mut corrected = path.as_os_str().to_owned();
    corrected.push(CORRECTED_SUFFIX);
    info!(
        "Rewriting legacy headers of {} to {}",
        path.display(),
        Path::new(&corrected).display()
    );
    correct_legacy_marker(path, &corrected)
}
