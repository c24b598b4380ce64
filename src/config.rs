//! Structural constants and run configuration
//!
//! Every fixed group name, file extension and prefix that downstream tools rely on
//! lives here so the container contract can be audited in one place.

use std::path::{Path, PathBuf};

/// File extension of every container (without the leading dot)
pub const CONTAINER_EXTENSION: &str = "fast5";

/// Prefix of read-group names inside multi-read containers
///
/// Split outputs keep the prefix: `read_<id>.fast5`.
pub const READ_GROUP_PREFIX: &str = "read_";

/// Group holding raw acquisition data (and its attributes in multi-read containers)
pub const RAW_GROUP: &str = "Raw";
/// Dataset holding the raw signal samples
pub const SIGNAL_DATASET: &str = "Signal";
/// Fixed location of the single read in a single-read container
pub const SINGLE_RAW_READ: &str = "Raw/Reads/Read_1";

/// Group holding all analyses
pub const ANALYSES_GROUP: &str = "Analyses";
/// Group holding the 1D basecall (and its attributes)
pub const BASECALL_1D_GROUP: &str = "Basecall_1D_000";
/// Group holding the template strand basecall
pub const BASECALLED_TEMPLATE_GROUP: &str = "BaseCalled_template";
/// Dataset holding the 4-line basecall text
pub const FASTQ_DATASET: &str = "Fastq";

/// Group holding the identity attribute sets of a single-read container
pub const UNIQUE_GLOBAL_KEY: &str = "UniqueGlobalKey";
/// Acquisition channel attributes
pub const CHANNEL_ID: &str = "channel_id";
/// Acquisition configuration attributes
pub const CONTEXT_TAGS: &str = "context_tags";
/// Device and run provenance attributes
pub const TRACKING_ID: &str = "tracking_id";

/// Suffix of readdb index files `(read_id, path)`
pub const READDB_SUFFIX: &str = "readdb";
/// Suffixes of sequencing-summary index files `(path, read_id)`
pub const SUMMARY_SUFFIXES: [&str; 2] = ["tsv", "txt"];
/// Suffix appended to a basecall source to find its default readdb
pub const DEFAULT_INDEX_SUFFIX: &str = ".index.readdb";

/// Header marker left by an older producer
pub const LEGACY_MARKER: &str = "strand";
/// Replacement for [`LEGACY_MARKER`]
pub const LEGACY_MARKER_FIXED: &str = "strand.fast5";
/// Suffix of the corrected copy of a basecall source
pub const CORRECTED_SUFFIX: &str = ".corrected.fastq";

/// Extension of alignment files accepted by the read filter
pub const ALIGNMENT_EXTENSION: &str = "bam";
/// Minimum mean phred quality of a read kept by the filter
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 7.0;

/// Default zstd level for compressed signal datasets
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Default number of dispatcher workers
pub const DEFAULT_WORKERS: usize = 2;

/// Returns the default readdb path for a basecall source
#[must_use]
pub fn default_index_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(DEFAULT_INDEX_SUFFIX);
    PathBuf::from(name)
}

/// Returns true if the path carries the container extension
#[must_use]
pub fn has_container_extension(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == CONTAINER_EXTENSION)
}

/// Configuration for splitting multi-read containers
///
/// ```rust
/// use fast5kit::SplitConfig;
///
/// let config = SplitConfig::new("out")
///     .subdir_per_source(true)
///     .delete_source(false);
/// assert!(config.subdir_per_source);
/// ```
#[derive(Debug, Clone)]
pub struct SplitConfig {
    /// Directory receiving the single-read containers
    pub out_dir: PathBuf,
    /// Place each source's reads in `<out_dir>/<source stem>`
    pub subdir_per_source: bool,
    /// Remove the multi-read source once it has been processed
    pub delete_source: bool,
    /// Also write every basecall to `<dir>/<source stem>.fastq`
    pub write_fastq: bool,
}
impl SplitConfig {
    pub fn new<P: Into<PathBuf>>(out_dir: P) -> Self {
        Self {
            out_dir: out_dir.into(),
            subdir_per_source: false,
            delete_source: false,
            write_fastq: false,
        }
    }

    #[must_use]
    pub fn subdir_per_source(mut self, value: bool) -> Self {
        self.subdir_per_source = value;
        self
    }

    #[must_use]
    pub fn delete_source(mut self, value: bool) -> Self {
        self.delete_source = value;
        self
    }

    #[must_use]
    pub fn write_fastq(mut self, value: bool) -> Self {
        self.write_fastq = value;
        self
    }
}

/// Configuration for embedding basecalls into single-read containers
#[derive(Debug, Clone)]
pub struct EmbedConfig {
    /// Basecall text source (4-line records)
    pub fastq: PathBuf,
    /// Directories searched for the indexed container paths
    pub dirs: Vec<PathBuf>,
    /// Index file; defaults to `<fastq>.index.readdb`
    pub index: Option<PathBuf>,
    /// Search every descendant of `dirs` as well
    pub recursive: bool,
}
impl EmbedConfig {
    pub fn new<P: Into<PathBuf>>(fastq: P) -> Self {
        Self {
            fastq: fastq.into(),
            dirs: Vec::new(),
            index: None,
            recursive: false,
        }
    }

    #[must_use]
    pub fn dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn index<P: Into<PathBuf>>(mut self, index: P) -> Self {
        self.index = Some(index.into());
        self
    }

    #[must_use]
    pub fn recursive(mut self, value: bool) -> Self {
        self.recursive = value;
        self
    }

    /// The index file to resolve, falling back to the default next to the source
    #[must_use]
    pub fn index_path(&self) -> PathBuf {
        self.index
            .clone()
            .unwrap_or_else(|| default_index_path(&self.fastq))
    }
}

/// Configuration for selecting reads by their primary alignment
#[derive(Debug, Clone)]
pub struct FilterConfig {
    /// Alignment file (BAM) keyed by read name
    pub alignment: PathBuf,
    /// Index file (readdb or sequencing summary)
    pub index: PathBuf,
    /// Directories searched for the indexed container paths
    pub dirs: Vec<PathBuf>,
    /// Reads with a lower mean base quality are dropped
    pub quality_threshold: f64,
    /// Search every descendant of `dirs` as well
    pub recursive: bool,
    /// Stop once this many aligned bases have been selected
    pub trim: Option<u64>,
}
impl FilterConfig {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(alignment: P, index: Q) -> Self {
        Self {
            alignment: alignment.into(),
            index: index.into(),
            dirs: Vec::new(),
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            recursive: false,
            trim: None,
        }
    }

    #[must_use]
    pub fn dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.dirs.push(dir.into());
        self
    }

    #[must_use]
    pub fn dirs<I, P>(mut self, dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.dirs.extend(dirs.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn quality_threshold(mut self, value: f64) -> Self {
        self.quality_threshold = value;
        self
    }

    #[must_use]
    pub fn recursive(mut self, value: bool) -> Self {
        self.recursive = value;
        self
    }

    #[must_use]
    pub fn trim(mut self, bases: Option<u64>) -> Self {
        self.trim = bases;
        self
    }
}

/// Locations of the external executables used by the pipeline
#[derive(Debug, Clone)]
pub struct ToolConfig {
    /// Builds the readdb index next to the containers
    pub index_tool: PathBuf,
    /// Inserts event and alignment data into the containers
    pub embed_tool: PathBuf,
}
