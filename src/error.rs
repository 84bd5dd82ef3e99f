use crate::ObjectId;
use thiserror::Error as ThisError;

/// Errors raised while lexing/parsing PDF syntax.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    #[error("the file does not start with a recognizable %PDF- header")]
    InvalidFileHeader,
    #[error("trailer dictionary is malformed or missing /Size")]
    InvalidTrailer,
    #[error("cross-reference table or stream is malformed")]
    InvalidXref,
    #[error("unexpected end of input")]
    EndOfInput,
}

/// Errors raised while locating or merging xref sections.
#[derive(Debug, ThisError, Clone, Copy, PartialEq, Eq)]
pub enum XrefError {
    #[error("could not locate startxref / %%EOF marker")]
    Start,
    #[error("/Prev offset points outside the file")]
    PrevStart,
    #[error("/XRefStm offset points outside the file")]
    StreamStart,
    #[error("/Size exceeds the sanity cap of 8,388,607 entries")]
    SizeTooLarge,
    #[error("xref repair was already attempted once for this document")]
    RepairExhausted,
}

/// Errors raised by the crypter.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum DecryptError {
    #[error("password did not authenticate against either the user or owner password hash")]
    InvalidPassword,
    #[error("/Encrypt dictionary is missing a required field: {0}")]
    MissingField(&'static str),
    #[error("unsupported security handler revision {0}")]
    UnsupportedRevision(u8),
    #[error("AES/RC4 cipher operation failed: {0}")]
    CipherFailure(String),
}

/// The crate-wide error type. Every public, fallible call returns `Result<T, Error>` —
/// malformed input never panics.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Xref(#[from] XrefError),
    #[error("could not parse object starting at offset {offset}")]
    IndirectObject { offset: usize },
    #[error("object id in file ({found:?}) does not match the id requested ({expected:?})")]
    ObjectIdMismatch { expected: ObjectId, found: ObjectId },
    #[error("offset {0} is outside the document buffer")]
    InvalidOffset(usize),
    #[error("no xref entry for the requested object")]
    MissingXrefEntry,
    #[error("expected object of type {expected}, found {found}")]
    ObjectType { expected: &'static str, found: &'static str },
    #[error("integer/length conversion failed: {0}")]
    NumericCast(String),
    #[error("reference cycle detected while resolving {0:?}")]
    ReferenceCycle(ObjectId),
    #[error("reference chain longer than one indirection")]
    DoubleIndirection,
    #[error("stream is malformed: {0}")]
    InvalidStream(String),
    #[error(transparent)]
    Decryption(#[from] DecryptError),
    #[error("document requires a password")]
    InvalidPassword,
    #[error("stream filter failed: {0}")]
    Codec(String),
    #[error("object stream container {0} is not itself cross-referenced")]
    DanglingObjectStreamContainer(u32),
    #[error("incremental writer has already produced output")]
    AlreadyWritten,
    #[error("{0}")]
    Unimplemented(&'static str),
    #[error("invalid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, Error>;
