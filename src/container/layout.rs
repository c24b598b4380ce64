use crate::config::{
    ANALYSES_GROUP, BASECALLED_TEMPLATE_GROUP, BASECALL_1D_GROUP, CHANNEL_ID, CONTEXT_TAGS,
    FASTQ_DATASET, RAW_GROUP, SIGNAL_DATASET, SINGLE_RAW_READ, TRACKING_ID, UNIQUE_GLOBAL_KEY,
};

/// Where each piece of a read group lives inside a container
///
/// Multi-read containers nest every piece under the read-group name, single-read
/// containers use fixed paths at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Multi { group: String },
    Single,
}
impl Layout {
    #[must_use]
    pub fn multi<S: Into<String>>(group: S) -> Self {
        Self::Multi {
            group: group.into(),
        }
    }

    fn join(&self, path: &str) -> String {
        match self {
            Self::Multi { group } => format!("{group}/{path}"),
            Self::Single => path.to_string(),
        }
    }

    /// Group carrying the signal attribute set
    #[must_use]
    pub fn signal_group(&self) -> String {
        match self {
            Self::Multi { .. } => self.join(RAW_GROUP),
            Self::Single => SINGLE_RAW_READ.to_string(),
        }
    }

    /// Dataset holding the raw samples
    #[must_use]
    pub fn signal_dataset(&self) -> String {
        format!("{}/{SIGNAL_DATASET}", self.signal_group())
    }

    /// Group carrying the basecall attribute set
    #[must_use]
    pub fn basecall_group(&self) -> String {
        self.join(&format!("{ANALYSES_GROUP}/{BASECALL_1D_GROUP}"))
    }

    /// Dataset holding the basecall text
    #[must_use]
    pub fn fastq_dataset(&self) -> String {
        format!(
            "{}/{BASECALLED_TEMPLATE_GROUP}/{FASTQ_DATASET}",
            self.basecall_group()
        )
    }

    fn identity_group(&self, name: &str) -> String {
        match self {
            Self::Multi { .. } => self.join(name),
            Self::Single => format!("{UNIQUE_GLOBAL_KEY}/{name}"),
        }
    }

    #[must_use]
    pub fn channel_group(&self) -> String {
        self.identity_group(CHANNEL_ID)
    }

    #[must_use]
    pub fn context_group(&self) -> String {
        self.identity_group(CONTEXT_TAGS)
    }

    #[must_use]
    pub fn tracking_group(&self) -> String {
        self.identity_group(TRACKING_ID)
    }
}
