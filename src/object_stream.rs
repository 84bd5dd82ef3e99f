use std::collections::BTreeMap;

use crate::error::Error;
use crate::filters;
use crate::object::{Object, ObjectId, Stream};
use crate::parser::{self, ParserInput};
use crate::Result;

/// A decoded `/Type /ObjStm` container: `/N` objects packed back-to-back after an
/// offset table of `(object_number, relative_offset)` pairs starting at `/First`.
pub struct ObjectStream {
    pub objects: BTreeMap<ObjectId, Object>,
}

impl ObjectStream {
    /// Decode `stream` (an already-decrypted `ObjStm`) into its constituent objects.
    /// Every object gets generation 0: compressed objects are never directly
    /// referenced with a nonzero generation (ISO 32000-1 7.5.7).
    pub fn new(stream: &mut Stream) -> Result<Self> {
        let n = stream.dict.get(b"N").and_then(Object::as_i64)? as usize;
        let first = stream.dict.get(b"First").and_then(Object::as_i64)? as usize;

        let body = filters::decode_stream(stream)?;

        let header_input = ParserInput::new_extra(&body, "objstm header");
        let pairs = parser::object_stream_header(header_input, n)
            .ok_or(Error::InvalidStream("malformed ObjStm header".to_string()))?;

        let mut objects = BTreeMap::new();
        for (object_number, relative_offset) in pairs {
            let absolute = first + relative_offset;
            if absolute > body.len() {
                continue;
            }
            let slot_input = ParserInput::new_extra(&body[absolute..], "objstm slot");
            if let Some(object) = parser::direct_object(slot_input) {
                objects.insert((object_number, 0), object);
            }
        }

        Ok(ObjectStream { objects })
    }
}
