//! Compression levels accepted by the compressor.

use flate2::Compression;

use crate::error::{Error, Result};

/// Compression levels recognised by the compressor.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CompressionLevel {
    /// Favour speed over compression ratio.
    Fast,
    /// Use the library's default balance between speed and ratio.
    #[default]
    Default,
    /// Favour the best possible compression ratio.
    Best,
    /// An explicit level in the range `0..=9`, where `0` stores the data.
    Precise(u8),
}

impl CompressionLevel {
    /// Creates a [`CompressionLevel::Precise`] value from a numeric level.
    pub fn from_numeric(level: u32) -> Result<Self> {
        if level <= 9 {
            Ok(Self::Precise(level as u8))
        } else {
            Err(Error::Init(format!(
                "compression level {} is outside the supported range 0-9",
                level
            )))
        }
    }

    /// Returns the numeric level understood by the codec.
    pub fn numeric(self) -> u32 {
        Compression::from(self).level()
    }

    fn validate(self) -> Result<Self> {
        match self {
            Self::Precise(level) => Self::from_numeric(u32::from(level)),
            other => Ok(other),
        }
    }
}

impl From<CompressionLevel> for Compression {
    fn from(level: CompressionLevel) -> Self {
        match level {
            CompressionLevel::Fast => Compression::fast(),
            CompressionLevel::Default => Compression::default(),
            CompressionLevel::Best => Compression::best(),
            CompressionLevel::Precise(value) => {
                Compression::new(u32::from(value.min(9)))
            }
        }
    }
}

/// Converts the level into a codec setting, rejecting out-of-range values.
pub(crate) fn checked(level: CompressionLevel) -> Result<Compression> {
    level.validate().map(Compression::from)
}
