//! Serializing objects back to PDF syntax and appending incremental updates
//! to an already-loaded document without disturbing its existing bytes.

mod incremental;
mod serialize;

pub use incremental::{patch_contents, Appender, IncrementalDocument, SignaturePlacement};
pub use serialize::{write_indirect_object, write_object};
