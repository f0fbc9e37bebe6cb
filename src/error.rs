//! Error types for loading and converting projects.

use std::io;

use thiserror::Error;

/// Problems with the input project file. Reported and the input skipped.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("project file is unreadable or truncated: {0}")]
    Io(#[from] io::Error),
    #[error("bad signature {found:?}, expected \"CTM\"")]
    BadSignature { found: [u8; 3] },
    #[error("unsupported format version {found} (only version {expected} is supported)")]
    UnsupportedVersion { found: u8, expected: u8 },
    #[error("expanded data is not supported")]
    ExpandedData,
    #[error("extended color mode is not supported")]
    ExtendedColorMode,
    #[error("unknown color method {0}")]
    UnknownColorMethod(u8),
    #[error("unknown screen mode {0}")]
    UnknownScreenMode(u8),
    #[error("negative {what} count {count}")]
    NegativeCount { what: &'static str, count: i32 },
    #[error("{what} {index} references {target} {value}, but only {len} exist")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        target: &'static str,
        value: u16,
        len: usize,
    },
    #[error("tile name {index} is not valid ASCII")]
    BadTileName { index: usize },
    #[error("project contains no character data")]
    NoCharData,
    #[error("projects cannot be joined: {0}")]
    Incompatible(String),
}

/// Violations of the limits baked into the output format. Fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    #[error("too many {what}: {count} (limit {limit})")]
    LimitExceeded {
        what: &'static str,
        count: usize,
        limit: usize,
    },
    #[error("unable to allocate {kind} primes for group {group}")]
    PrimeAllocation { kind: &'static str, group: usize },
    #[error("{kind} prime base block {base} of group {group} does not fit in a byte")]
    PrimeBase {
        kind: &'static str,
        group: usize,
        base: usize,
    },
}

impl ConvertError {
    /// `Err(LimitExceeded)` when `count > limit`.
    pub fn check_limit(what: &'static str, count: usize, limit: usize) -> Result<(), ConvertError> {
        if count > limit {
            Err(ConvertError::LimitExceeded { what, count, limit })
        } else {
            Ok(())
        }
    }
}
