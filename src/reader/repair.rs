//! Top-down repair: when the xref section named by `startxref` is missing or
//! too corrupt to parse, rebuild a table by scanning the whole buffer for
//! `N G obj` headers instead. This is the fallback path, attempted at most
//! once per load (the caller enforces that), since a file that fails even
//! this is not a PDF this crate can recover.

use std::collections::HashSet;

use super::Reader;
use crate::object::Dictionary;
use crate::parser::{self, ParserInput};
use crate::xref::{Xref, XrefEntry, XrefType};

impl Reader<'_> {
    /// Scans `self.buffer` for every `N G obj` header and returns a freshly
    /// built table plus, if recoverable, a trailer dictionary. Later matches
    /// win over earlier ones for the same object number: without a real xref
    /// chain to say otherwise, the latest physical bytes in the file are the
    /// best guess at the current revision.
    pub(crate) fn repair_xref(&self) -> (Xref, Option<Dictionary>) {
        let buffer = self.buffer;
        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);

        let mut pos = 0;
        while let Some((number, generation, header_start, resume_at)) = next_object_header(buffer, pos) {
            xref.insert(number, XrefEntry::Normal { offset: header_start as u32, generation });
            pos = resume_at;
        }

        let trailer = self.find_trailer(&xref);
        (xref, trailer)
    }

    fn find_trailer(&self, xref: &Xref) -> Option<Dictionary> {
        if let Some(start) = Self::search_substring(self.buffer, b"trailer", 0) {
            if let Ok((_, dict)) = parser::trailer(ParserInput::new_extra(&self.buffer[start..], "trailer")) {
                return Some(dict);
            }
        }
        self.synthesize_trailer(xref)
    }

    /// No `trailer` keyword survived (typical of a file whose xref-stream
    /// form never had one): find the `/Type /Catalog` object by brute force
    /// and build the smallest trailer a loader actually needs.
    fn synthesize_trailer(&self, xref: &Xref) -> Option<Dictionary> {
        for (&number, entry) in xref.entries.iter() {
            let XrefEntry::Normal { offset, generation } = *entry else { continue };
            let id = (number, generation);
            let parsed = parser::indirect_object(
                ParserInput::new_extra(self.buffer, "repair"),
                offset as usize,
                Some(id),
                self,
                &mut HashSet::new(),
            );
            let Ok((_, object)) = parsed else { continue };
            if object.as_dict().map(|d| d.has_type(b"Catalog")).unwrap_or(false) {
                let mut trailer = Dictionary::new();
                trailer.set("Root", crate::object::Object::Reference(id));
                trailer.set("Size", crate::object::Object::Integer(xref.max_id() as i64 + 1));
                return Some(trailer);
            }
        }
        None
    }
}

/// Finds the next `obj` keyword at or after `from` whose preceding bytes
/// parse as `N G ` and whose following (post-whitespace) byte looks like the
/// start of a PDF value, then returns `(object_number, generation,
/// header_start, offset_just_past_"obj")`. Matches inside string or stream
/// content are mostly filtered out by the latter check.
fn next_object_header(buffer: &[u8], from: usize) -> Option<(u32, u16, usize, usize)> {
    let mut search_from = from;
    loop {
        let rel = buffer.get(search_from..)?.windows(3).position(|w| w == b"obj")?;
        let obj_kw = search_from + rel;

        let preceded_by_word_char = obj_kw > 0 && buffer[obj_kw - 1].is_ascii_alphanumeric();
        let followed_by_word_char = buffer.get(obj_kw + 3).is_some_and(|b| b.is_ascii_alphanumeric());
        if preceded_by_word_char || followed_by_word_char {
            search_from = obj_kw + 3;
            continue;
        }

        match parse_header_before(buffer, obj_kw) {
            Some((number, generation, header_start)) if next_byte_looks_like_a_value(buffer, obj_kw + 3) => {
                return Some((number, generation, header_start, obj_kw + 3));
            }
            _ => {
                search_from = obj_kw + 3;
            }
        }
    }
}

fn next_byte_looks_like_a_value(buffer: &[u8], mut pos: usize) -> bool {
    while pos < buffer.len() && buffer[pos].is_ascii_whitespace() {
        pos += 1;
    }
    match buffer.get(pos) {
        Some(&b) => matches!(b, b'<' | b'[' | b'(' | b'/' | b't' | b'f' | b'n' | b'-' | b'+') || b.is_ascii_digit(),
        None => false,
    }
}

/// Walks backward from `obj_kw` (the byte offset of the `o` in `obj`) over
/// `<generation> <object_number>`, tolerating arbitrary whitespace runs.
fn parse_header_before(buffer: &[u8], obj_kw: usize) -> Option<(u32, u16, usize)> {
    let gen_end = trim_trailing_whitespace(buffer, obj_kw);
    let (gen_start, gen_end) = scan_digits_backward(buffer, gen_end);
    if gen_start == gen_end {
        return None;
    }
    let generation: u16 = std::str::from_utf8(&buffer[gen_start..gen_end]).ok()?.parse().ok()?;

    let num_end = trim_trailing_whitespace(buffer, gen_start);
    let (num_start, num_end) = scan_digits_backward(buffer, num_end);
    if num_start == num_end {
        return None;
    }
    let number: u32 = std::str::from_utf8(&buffer[num_start..num_end]).ok()?.parse().ok()?;

    Some((number, generation, num_start))
}

fn trim_trailing_whitespace(buffer: &[u8], end: usize) -> usize {
    let mut e = end;
    while e > 0 && buffer[e - 1].is_ascii_whitespace() {
        e -= 1;
    }
    e
}

fn scan_digits_backward(buffer: &[u8], end: usize) -> (usize, usize) {
    let mut start = end;
    while start > 0 && buffer[start - 1].is_ascii_digit() {
        start -= 1;
    }
    (start, end)
}
