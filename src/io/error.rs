use super::Format;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {format} data: {details} (at line ~{line})")]
    Parse {
        format: Format,
        line: usize,
        details: String,
    },

    #[error("{format} section {section} declares {expected} entries but {found} were read")]
    CountMismatch {
        format: Format,
        section: String,
        expected: usize,
        found: usize,
    },

    #[error(
        "{format} residue ids must not decrease: atom {atom} has residue {current} after residue {previous}"
    )]
    ResidueOrder {
        format: Format,
        atom: usize,
        previous: i32,
        current: i32,
    },

    #[error("cannot write {format}: field '{field}' has {found} entries, expected {expected}")]
    IncompleteRecord {
        format: Format,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("the '{0}' format is not supported for this read operation")]
    UnsupportedReadFormat(Format),

    #[error("the '{0}' format is not supported for this write operation")]
    UnsupportedWriteFormat(Format),

    #[error("invalid canonical JSON record: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },
}

impl Error {
    pub fn parse(format: Format, line: usize, details: impl Into<String>) -> Self {
        Self::Parse {
            format,
            line,
            details: details.into(),
        }
    }

    pub fn count_mismatch(
        format: Format,
        section: impl Into<String>,
        expected: usize,
        found: usize,
    ) -> Self {
        Self::CountMismatch {
            format,
            section: section.into(),
            expected,
            found,
        }
    }

    /// Fails with [`Error::IncompleteRecord`] unless `found == expected`.
    pub fn require_len(
        format: Format,
        field: &'static str,
        expected: usize,
        found: usize,
    ) -> Result<(), Self> {
        if found == expected {
            Ok(())
        } else {
            Err(Self::IncompleteRecord {
                format,
                field,
                expected,
                found,
            })
        }
    }
}
