use super::attrs::Attributes;

/// Raw acquisition samples and their attribute set
///
/// The attribute set carries `duration`, `read_id`, `read_number`, `start_mux`
/// and `start_time`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Signal {
    pub samples: Vec<i16>,
    pub attrs: Attributes,
}

/// A 4-line basecall text record and the attributes of the step that produced it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Basecall {
    pub fastq: String,
    pub attrs: Attributes,
}

/// The three identity attribute sets of a read
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Identity {
    /// `digitisation`, `offset`, `range`, `sampling_rate`, `channel_number`
    pub channel: Attributes,
    /// Acquisition configuration
    pub context: Attributes,
    /// Device and run provenance
    pub tracking: Attributes,
}

/// Everything stored for one read
#[derive(Debug, Clone, PartialEq)]
pub struct ReadGroup {
    pub signal: Signal,
    pub identity: Identity,
    pub basecall: Option<Basecall>,
}
