//! Copy strategy selection
//!
//! The strategy is decided once, at the command-line boundary, and passed
//! around as a typed value from there on.

use clap::ValueEnum;

use crate::error::UsageError;

/// How bytes are copied during the timed region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CopyStrategy {
    /// One whole-block copy out of mapped memory
    #[value(name = "memcpy")]
    BulkCopy,
    /// Byte-at-a-time loop out of mapped memory
    #[value(name = "dumb")]
    ByteLoopCopy,
    /// Whole-block copy between two ordinary host buffers
    #[value(name = "reference")]
    ReferenceBaseline,
}

impl CopyStrategy {
    pub const ALL: [CopyStrategy; 3] = [
        CopyStrategy::BulkCopy,
        CopyStrategy::ByteLoopCopy,
        CopyStrategy::ReferenceBaseline,
    ];

    /// Command-line token selecting this strategy
    pub fn token(self) -> &'static str {
        match self {
            CopyStrategy::BulkCopy => "memcpy",
            CopyStrategy::ByteLoopCopy => "dumb",
            CopyStrategy::ReferenceBaseline => "reference",
        }
    }

    /// Name shown in the banner line
    pub fn label(self) -> &'static str {
        match self {
            CopyStrategy::BulkCopy => "memcpy",
            CopyStrategy::ByteLoopCopy => "dumb-copy",
            CopyStrategy::ReferenceBaseline => "reference",
        }
    }

    /// Whether the copy source is the mapped GPU allocation
    pub fn reads_mapped_memory(self) -> bool {
        !matches!(self, CopyStrategy::ReferenceBaseline)
    }

    /// Parses a single strategy token. Matching is exact and case sensitive.
    pub fn parse_token(token: &str) -> Result<Self, UsageError> {
        <Self as ValueEnum>::from_str(token, false).map_err(|_| UsageError::Unknown(token.to_string()))
    }
}

impl std::fmt::Display for CopyStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Selects a strategy from the program arguments, excluding the program name.
///
/// Exactly one argument is accepted; anything else is [`UsageError::Missing`].
pub fn from_args<I, S>(args: I) -> Result<CopyStrategy, UsageError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut args = args.into_iter();
    match (args.next(), args.next()) {
        (Some(token), None) => CopyStrategy::parse_token(token.as_ref()),
        _ => Err(UsageError::Missing),
    }
}
