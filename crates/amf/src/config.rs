use std::fmt::{self, Display};

/// Default bound of every reference table.
pub const DEFAULT_MAX_REFERENCES: usize = 65535;

/// Default container nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// How the encoders decide that a complex value was already written.
///
/// Applies to the AMF0 reference table and the AMF3 object table. AMF3
/// strings and traits are always matched by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReferenceMode {
    /// Same allocation, i.e. clones of one [`AmfValue`](crate::AmfValue).
    #[default]
    Identity,
    /// Deep equality, so equal but separately built values share one entry.
    Structural,
}

impl Display for ReferenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("identity"),
            Self::Structural => f.write_str("structural"),
        }
    }
}

/// Limits and policies shared by the encoders and decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// Entries each reference table accepts for lookup before values are
    /// always written inline. AMF0 caps this at 65536 because its indices
    /// are 16 bits wide.
    pub max_references: usize,

    /// Duplicate detection for complex values, in both AMF0 and AMF3.
    pub reference_mode: ReferenceMode,

    /// Maximum container nesting, for both directions.
    pub max_depth: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_references: DEFAULT_MAX_REFERENCES,
            reference_mode: ReferenceMode::Identity,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Display for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CodecConfig {{ max_references: {}, reference_mode: {}, max_depth: {} }}",
            self.max_references, self.reference_mode, self.max_depth
        )
    }
}

impl CodecConfig {
    /// Start building a configuration from the defaults.
    pub fn builder() -> CodecConfigBuilder {
        CodecConfigBuilder::default()
    }
}

/// Builder for [`CodecConfig`].
#[derive(Debug, Clone, Default)]
pub struct CodecConfigBuilder {
    config: CodecConfig,
}

impl CodecConfigBuilder {
    /// Set the reference table bound.
    pub fn max_references(mut self, max_references: usize) -> Self {
        self.config.max_references = max_references;
        self
    }

    /// Set the AMF0 duplicate detection mode.
    pub fn reference_mode(mut self, reference_mode: ReferenceMode) -> Self {
        self.config.reference_mode = reference_mode;
        self
    }

    /// Set the nesting limit.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.config.max_depth = max_depth;
        self
    }

    /// Finish the configuration.
    pub fn build(self) -> CodecConfig {
        self.config
    }
}
