//! A PDF object-layer engine: tokenizer, indirect-object resolver,
//! cross-reference engine (table and stream forms, with repair), stream
//! filter pipeline, standard security handler crypter, and an incremental
//! writer. This crate stops at the object graph: page content streams,
//! fonts, and rendering are out of scope, and so is anything that reads
//! like an interactive viewer.

pub mod document;
pub mod encryption;
pub mod equality;
pub mod error;
pub mod filters;
pub mod object;
pub mod object_stream;
pub mod parser;
pub mod reader;
pub mod writer;
pub mod xref;

pub use document::Document;
pub use encryption::Permissions;
pub use error::{DecryptError, Error, ParseError, Result, XrefError};
pub use object::{Dictionary, Object, ObjectId, Stream, StringFormat};
pub use reader::PdfMetadata;
pub use writer::{Appender, IncrementalDocument};
