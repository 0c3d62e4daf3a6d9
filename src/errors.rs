use std::io;

/// Everything that can go wrong while building or parsing an archive.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid tar archive: {0}")]
    Format(#[from] FormatError),

    #[error("entry rejected: {0}")]
    Constraint(#[from] ConstraintError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("content of {name} is not valid utf-8")]
    Utf8 {
        name: String,
        #[source]
        source: std::str::Utf8Error,
    },

    #[error("no entry named {0} in archive")]
    FileNotFound(String),
}

/// The input buffer is not a tar stream this crate can decode.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("archive truncated at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("header checksum mismatch at offset {offset}: stored {stored:o}, computed {computed:o}")]
    ChecksumMismatch {
        offset: usize,
        stored: u32,
        computed: u32,
    },

    #[error("field `{field}` of header at offset {offset} is not a valid octal number")]
    InvalidOctal { field: &'static str, offset: usize },

    #[error("unsupported entry type {typeflag:#04x} in header at offset {offset}")]
    UnsupportedEntryType { offset: usize, typeflag: u8 },

    #[error("header at offset {offset} carries a name that is not valid utf-8")]
    InvalidName { offset: usize },

    #[error("archive does not end with two zero blocks")]
    MissingTerminator,

    #[error("end-of-archive block at offset {offset} is not all zero")]
    MalformedTerminator { offset: usize },
}

/// An entry handed to the writer does not fit the fixed-width header fields.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstraintError {
    #[error("entry name must not be empty")]
    EmptyName,

    #[error("entry name {name:?} is {len} bytes long, at most {max} are allowed")]
    NameTooLong { name: String, len: usize, max: usize },

    #[error("entry name {0:?} contains a nul byte")]
    NulInName(String),

    #[error("{field} name contains a nul byte")]
    NulInOwnerName { field: &'static str },

    #[error("{field} name is {len} bytes long, at most {max} are allowed")]
    OwnerNameTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("{field} value {value} exceeds the maximum of {max}")]
    ValueOutOfRange {
        field: &'static str,
        value: u64,
        max: u64,
    },
}
