//! Byte-level serialization of [`Object`] values, following spec.md section 6's
//! exact grammar: ASCII-decimal integers, shortest-round-trip reals that always
//! carry a decimal point, `#hh`-escaped names, literal-or-hex strings, and
//! single-space-separated dictionaries/arrays.

use crate::object::{Dictionary, Object, Stream, StringFormat};

/// Bytes that must be `#hh`-escaped inside a name besides non-printable ASCII:
/// the delimiters (ISO 32000-1 7.2.2) plus `#` itself.
fn is_name_delimiter(byte: u8) -> bool {
    matches!(byte, b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%')
}

fn needs_name_escape(byte: u8) -> bool {
    byte == b'#' || is_name_delimiter(byte) || !(0x21..=0x7E).contains(&byte)
}

/// Writes `/` followed by each byte, `#hh`-escaping anything that isn't plain
/// printable ASCII.
pub fn write_name(buf: &mut Vec<u8>, name: &[u8]) {
    buf.push(b'/');
    for &byte in name {
        if needs_name_escape(byte) {
            buf.push(b'#');
            buf.extend_from_slice(format!("{byte:02x}").as_bytes());
        } else {
            buf.push(byte);
        }
    }
}

/// Rust's `f64` `Display` already yields the shortest round-trip decimal and
/// never emits scientific notation; the one gap is that a whole-valued float
/// (`4.0`) prints as `4`, so a trailing `.0` is appended by hand when the
/// formatted text carries no decimal point.
pub fn write_real(buf: &mut Vec<u8>, value: f64) {
    let mut text = format!("{value}");
    if !text.contains('.') {
        text.push_str(".0");
    }
    buf.extend_from_slice(text.as_bytes());
}

pub fn write_integer(buf: &mut Vec<u8>, value: i64) {
    let mut itoa_buf = itoa::Buffer::new();
    buf.extend_from_slice(itoa_buf.format(value).as_bytes());
}

/// Literal-form escapes: backslash, both parentheses, and the named control
/// escapes; every other byte (including raw newlines) passes through as-is.
fn write_literal_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(b'(');
    for &byte in bytes {
        match byte {
            b'\\' => buf.extend_from_slice(b"\\\\"),
            b'(' => buf.extend_from_slice(b"\\("),
            b')' => buf.extend_from_slice(b"\\)"),
            b'\n' => buf.extend_from_slice(b"\\n"),
            b'\r' => buf.extend_from_slice(b"\\r"),
            b'\t' => buf.extend_from_slice(b"\\t"),
            0x08 => buf.extend_from_slice(b"\\b"),
            0x0C => buf.extend_from_slice(b"\\f"),
            _ => buf.push(byte),
        }
    }
    buf.push(b')');
}

fn write_hex_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(b'<');
    for &byte in bytes {
        buf.extend_from_slice(format!("{byte:02X}").as_bytes());
    }
    buf.push(b'>');
}

pub fn write_string(buf: &mut Vec<u8>, bytes: &[u8], format: StringFormat) {
    match format {
        StringFormat::Literal => write_literal_string(buf, bytes),
        StringFormat::Hexadecimal => write_hex_string(buf, bytes),
    }
}

pub fn write_reference(buf: &mut Vec<u8>, number: u32, generation: u16) {
    buf.extend_from_slice(format!("{number} {generation} R").as_bytes());
}

pub fn write_dictionary(buf: &mut Vec<u8>, dict: &Dictionary) {
    buf.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        buf.push(b' ');
        write_name(buf, key);
        buf.push(b' ');
        write_object(buf, value);
    }
    buf.extend_from_slice(b" >>");
}

pub fn write_array(buf: &mut Vec<u8>, items: &[Object]) {
    buf.push(b'[');
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            buf.push(b' ');
        }
        write_object(buf, item);
    }
    buf.push(b']');
}

pub fn write_stream_body(buf: &mut Vec<u8>, dict: &Dictionary, content: &[u8]) {
    write_dictionary(buf, dict);
    buf.extend_from_slice(b"\nstream\n");
    buf.extend_from_slice(content);
    buf.extend_from_slice(b"\nendstream");
}

/// Serializes any value in the form it would take as the RHS of a dictionary
/// entry or array element. Top-level indirect objects (`N G obj ... endobj`)
/// are assembled by the caller, not here, since only the writer knows the
/// assigned object number.
pub fn write_object(buf: &mut Vec<u8>, object: &Object) {
    match object {
        Object::Null => buf.extend_from_slice(b"null"),
        Object::Boolean(b) => buf.extend_from_slice(if *b { b"true" } else { b"false" }),
        Object::Integer(i) => write_integer(buf, *i),
        Object::Real(r) => write_real(buf, *r),
        Object::Name(n) => write_name(buf, n),
        Object::String(s, format) => write_string(buf, s, *format),
        Object::Array(items) => write_array(buf, items),
        Object::Dictionary(dict) => write_dictionary(buf, dict),
        Object::Stream(Stream { dict, content, .. }) => write_stream_body(buf, dict, content),
        Object::Reference((number, generation)) => write_reference(buf, *number, *generation),
    }
}

/// A complete `N G obj\n...\nendobj\n` indirect object, the unit the
/// incremental writer appends to the file and records an xref offset for.
pub fn write_indirect_object(buf: &mut Vec<u8>, number: u32, generation: u16, object: &Object) {
    buf.extend_from_slice(format!("{number} {generation} obj\n").as_bytes());
    write_object(buf, object);
    buf.extend_from_slice(b"\nendobj\n");
}
