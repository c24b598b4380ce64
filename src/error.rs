use std::path::PathBuf;

/// Custom Result type for fast5kit operations, wrapping the custom [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for the fast5kit library, encompassing all possible error cases
/// that can occur while reading, writing, splitting, or embedding containers.
#[derive(thiserror::Error, Debug)]
#[error(transparent)]
pub enum Error {
    /// Errors related to the binary layout of a container file
    ContainerError(#[from] ContainerError),
    /// A structural element (group, dataset, attribute set) is absent
    NotFoundError(#[from] NotFoundError),
    /// Errors raised while interpreting read-to-file index files
    IndexError(#[from] IndexError),
    /// Errors raised while reading basecall text sources
    BasecallError(#[from] BasecallError),
    /// Errors raised while reading alignment files
    AlignmentError(#[from] AlignmentError),
    /// Failures reported by external executables
    ToolError(#[from] ToolError),
    /// Standard I/O errors from the Rust standard library
    IoError(#[from] std::io::Error),
    /// UTF-8 encoding/decoding errors
    Utf8Error(#[from] std::str::Utf8Error),
    /// Errors from the FASTQ parser
    FastqError(#[from] seq_io::fastq::Error),
    /// Errors from opening (possibly compressed) text inputs
    NifflerError(#[from] niffler::Error),
    /// Errors encountered while walking directory trees
    WalkDirError(#[from] walkdir::Error),
    /// Errors moving a finished temporary container into place
    PersistError(#[from] tempfile::PersistError),
    /// Generic errors that can occur in any part of the system
    AnyhowError(#[from] anyhow::Error),
}
impl Error {
    /// Returns true if the error signals an expected structural absence
    ///
    /// Callers use this to tell a missing (optional) record apart from a
    /// genuinely broken container.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFoundError(_))
    }
}

/// Errors specific to the on-disk layout of a container
#[derive(thiserror::Error, Debug)]
pub enum ContainerError {
    /// The path is not a regular file
    #[error("File is not regular: {0}")]
    IncompatibleFile(PathBuf),

    /// The magic number in the header does not match the expected value
    #[error("Invalid magic number: {0}")]
    InvalidMagicNumber(u32),

    /// The format version in the header is not supported
    #[error("Invalid format version: {0}")]
    InvalidFormatVersion(u8),

    /// The container kind byte is not a known shape
    #[error("Invalid container kind: {0}")]
    InvalidKind(u8),

    /// The reserved bytes in the header contain unexpected values
    #[error("Invalid reserved bytes")]
    InvalidReservedBytes,

    /// The buffer is too small to hold a header
    ///
    /// # Arguments
    /// * First `usize` - The actual number of bytes provided
    /// * Second `usize` - The expected number of bytes
    #[error("Invalid number of bytes provided: {0}. Expected: {1}")]
    InvalidSize(usize, usize),

    /// The body length recorded in the header disagrees with the file
    #[error(
        "Number of bytes in file does not match expectation - possibly truncated at byte pos {0}"
    )]
    FileTruncation(usize),

    /// A node or value tag inside the body is not recognised
    #[error("Invalid {kind} tag: {tag}")]
    InvalidTag { kind: &'static str, tag: u8 },

    /// The container was opened as the wrong shape
    #[error("Expected a {expected} container at {path}")]
    UnexpectedKind {
        expected: &'static str,
        path: PathBuf,
    },

    /// The path does not carry the container extension
    #[error("Container path must end with .{expected}: {path}")]
    InvalidExtension {
        expected: &'static str,
        path: PathBuf,
    },

    /// A dataset was read as the wrong element type
    #[error("Dataset {path} does not hold {expected} data")]
    UnexpectedDataType {
        expected: &'static str,
        path: String,
    },

    /// A path component would collide with an existing node of another type
    #[error("Path component {0} is not a group")]
    NotAGroup(String),

    /// A length prefix inside the body points past its end
    #[error("Encoded length {len} exceeds the {remaining} bytes left in the body")]
    PayloadOverrun { len: u64, remaining: usize },

    /// A 16-bit signal payload has an odd number of bytes
    #[error("Signal payload of {0} bytes is not a whole number of samples")]
    OddSignalPayload(usize),
}

/// Expected, recoverable absence of a structural element
#[derive(thiserror::Error, Debug)]
pub enum NotFoundError {
    /// No group exists at the given path
    #[error("Group not found: {0}")]
    Group(String),

    /// No dataset exists at the given path
    #[error("Dataset not found: {0}")]
    Dataset(String),
}

/// Errors raised while parsing read-to-file index files
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The index file suffix does not name a supported format
    #[error("Unsupported index file extension (expected .readdb or .tsv): {0}")]
    UnsupportedExtension(PathBuf),

    /// A search root does not exist or is not a directory
    #[error("Path provided does not exist or is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// Errors raised while reading basecall text
#[derive(thiserror::Error, Debug)]
pub enum BasecallError {
    /// A record header has no read identifier
    #[error("Basecall record without a read identifier in {0}")]
    MissingReadId(PathBuf),
}

/// Errors raised while reading alignment files
#[derive(thiserror::Error, Debug)]
pub enum AlignmentError {
    /// The alignment file is not a BAM file
    #[error("Alignment file must be in BAM format: {0}")]
    UnsupportedExtension(PathBuf),
}

/// Failures of external collaborator executables
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// The executable does not exist
    #[error("Executable does not exist: {0}")]
    Missing(PathBuf),

    /// The executable exited with a non-zero status
    #[error("{tool} exited with status {status}: {stderr}")]
    Failed {
        tool: String,
        status: i32,
        stderr: String,
    },

    /// The executable was terminated by a signal
    #[error("{0} was terminated before completion")]
    Terminated(String),
}
