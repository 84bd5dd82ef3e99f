//! nom-based lexer and object grammar: everything from a bare literal up
//! through a whole indirect object, a classic xref table, or a decoded
//! xref stream. Resolving a stream's `/Length` when it is itself an
//! indirect reference is the one place parsing and object resolution
//! have to interleave, so `stream`/`object`/`indirect_object` take a
//! `&Reader` to call back into.

use std::collections::HashSet;
use std::str::{self, FromStr};

use nom::branch::alt;
use nom::bytes::complete::{tag, take, take_while, take_while1, take_while_m_n};
use nom::character::complete::{digit0, digit1, one_of, space0};
use nom::combinator::{map, map_opt, map_res, opt, verify};
use nom::error::ErrorKind;
use nom::multi::{count, fold_many0, fold_many1, many0, many0_count};
use nom::sequence::{delimited, pair, preceded, separated_pair, terminated};
use nom::{AsBytes, AsChar, Input, IResult, Parser};
use nom_locate::LocatedSpan;

use crate::error::{self, Error, XrefError};
use crate::filters;
use crate::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use crate::reader::{Reader, MAX_BRACKET};
use crate::xref::{Xref, XrefEntry, XrefType};

pub type ParserInput<'a> = LocatedSpan<&'a [u8], &'a str>;
type NomError<'a> = nom::error::Error<ParserInput<'a>>;
type NomResult<'a, O, E = NomError<'a>> = IResult<ParserInput<'a>, O, E>;

#[inline]
fn strip_nom<O>(r: NomResult<O>) -> Option<O> {
    r.ok().map(|(_, o)| o)
}

#[inline]
fn convert_result<O, E>(result: Result<O, E>, input: ParserInput, error_kind: ErrorKind) -> NomResult<O> {
    result.map(|o| (input, o)).map_err(|_| {
        let err: NomError = nom::error::ParseError::from_error_kind(input, error_kind);
        nom::Err::Error(err)
    })
}

#[inline]
fn offset_stream(object: &mut Object, offset: usize) {
    if let Object::Stream(stream) = object {
        stream.start_position = stream.start_position.and_then(|sp| sp.checked_add(offset));
    }
}

fn eol(input: ParserInput) -> NomResult<ParserInput> {
    alt((tag(&b"\r\n"[..]), tag(&b"\n"[..]), tag(&b"\r"[..]))).parse(input)
}

fn comment(input: ParserInput) -> NomResult<()> {
    map((tag(&b"%"[..]), take_while(|c: u8| !b"\r\n".contains(&c)), eol), |_| ()).parse(input)
}

#[inline]
fn is_whitespace(c: u8) -> bool {
    b" \t\n\r\0\x0C".contains(&c)
}

#[inline]
fn is_delimiter(c: u8) -> bool {
    b"()<>[]{}/%".contains(&c)
}

#[inline]
fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

#[inline]
fn is_direct_literal_string(c: u8) -> bool {
    !b"()\\\r\n".contains(&c)
}

fn white_space(input: ParserInput) -> NomResult<()> {
    map(take_while(is_whitespace), |_| ()).parse(input)
}

fn space(input: ParserInput) -> NomResult<()> {
    fold_many0(alt((map(take_while1(is_whitespace), |_| ()), comment)), || {}, |_, _| ()).parse(input)
}

fn integer(input: ParserInput) -> NomResult<i64> {
    let (i, _) = pair(opt(one_of("+-")), digit1).parse(input)?;
    let int_input = &input[..input.len() - i.len()];
    convert_result(i64::from_str(str::from_utf8(int_input).unwrap()), i, ErrorKind::Digit)
}

fn exponent(input: ParserInput) -> NomResult<()> {
    map((one_of("eE"), opt(one_of("+-")), digit1), |_| ()).parse(input)
}

fn real(input: ParserInput) -> NomResult<f64> {
    let (i, _) = pair(
        opt(one_of("+-")),
        alt((
            map((digit1, tag(&b"."[..]), digit0, opt(exponent)), |_| ()),
            map((tag(&b"."[..]), digit1, opt(exponent)), |_| ()),
            map((digit1, exponent), |_| ()),
        )),
    )
    .parse(input)?;
    let float_input = &input[..input.len() - i.len()];
    convert_result(f64::from_str(str::from_utf8(float_input).unwrap()), i, ErrorKind::Digit)
}

fn hex_char(input: ParserInput) -> NomResult<u8> {
    map_res(verify(take(2usize), |h: &ParserInput| h.as_bytes().iter().copied().all(AsChar::is_hex_digit)), |x: ParserInput| {
        u8::from_str_radix(str::from_utf8(&x).unwrap(), 16)
    })
    .parse(input)
}

fn oct_char(input: ParserInput) -> NomResult<u8> {
    map_res(take_while_m_n(1, 3, AsChar::is_oct_digit), |x: ParserInput| {
        // Overflowing octal escapes are truncated, not rejected (ISO 32000-1 7.3.4.2).
        u16::from_str_radix(str::from_utf8(&x).unwrap(), 8).map(|o| o as u8)
    })
    .parse(input)
}

fn name(input: ParserInput) -> NomResult<Vec<u8>> {
    preceded(
        tag(&b"/"[..]),
        many0(alt((
            preceded(tag(&b"#"[..]), hex_char),
            map_opt(take(1usize), |c: ParserInput| if c[0] != b'#' && is_regular(c[0]) { Some(c[0]) } else { None }),
        ))),
    )
    .parse(input)
}

fn escape_sequence(input: ParserInput) -> NomResult<Option<u8>> {
    preceded(
        tag(&b"\\"[..]),
        alt((
            map(oct_char, Some),
            map(eol, |_| None),
            map(tag(&b"n"[..]), |_| Some(b'\n')),
            map(tag(&b"r"[..]), |_| Some(b'\r')),
            map(tag(&b"t"[..]), |_| Some(b'\t')),
            map(tag(&b"b"[..]), |_| Some(b'\x08')),
            map(tag(&b"f"[..]), |_| Some(b'\x0C')),
            map(take(1usize), |c: ParserInput| Some(c[0])),
        )),
    )
    .parse(input)
}

enum InnerLiteralString<'a> {
    Direct(ParserInput<'a>),
    Escape(Option<u8>),
    Eol(ParserInput<'a>),
    Nested(Vec<u8>),
}

impl InnerLiteralString<'_> {
    fn push(&self, output: &mut Vec<u8>) {
        match self {
            InnerLiteralString::Direct(s) | InnerLiteralString::Eol(s) => output.extend_from_slice(s),
            InnerLiteralString::Escape(e) => output.extend(e),
            InnerLiteralString::Nested(n) => output.extend_from_slice(n),
        }
    }
}

fn inner_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        fold_many0(
            alt((
                map(take_while1(is_direct_literal_string), InnerLiteralString::Direct),
                map(escape_sequence, InnerLiteralString::Escape),
                map(eol, InnerLiteralString::Eol),
                map(nested_literal_string(depth), InnerLiteralString::Nested),
            )),
            Vec::new,
            |mut out: Vec<u8>, value| {
                value.push(&mut out);
                out
            },
        )
        .parse(input)
    }
}

fn nested_literal_string(depth: usize) -> impl Fn(ParserInput) -> NomResult<Vec<u8>> {
    move |input| {
        if depth == 0 {
            map(verify(tag(&b"too deep"[..]), |_| false), |_| vec![]).parse(input)
        } else {
            map(delimited(tag(&b"("[..]), inner_literal_string(depth - 1), tag(&b")"[..])), |mut content| {
                content.insert(0, b'(');
                content.push(b')');
                content
            })
            .parse(input)
        }
    }
}

fn literal_string(input: ParserInput) -> NomResult<Vec<u8>> {
    delimited(tag(&b"("[..]), inner_literal_string(MAX_BRACKET), tag(&b")"[..])).parse(input)
}

#[inline]
fn hex_digit(input: ParserInput) -> NomResult<u8> {
    map_opt(take(1usize), |c: ParserInput| str::from_utf8(&c).ok().and_then(|c| u8::from_str_radix(c, 16).ok())).parse(input)
}

fn hexadecimal_string(input: ParserInput) -> NomResult<Object> {
    map(
        delimited(
            tag(&b"<"[..]),
            terminated(
                fold_many0(
                    preceded(white_space, hex_digit),
                    || -> (Vec<u8>, bool) { (Vec::new(), false) },
                    |state, c| match state {
                        (mut out, false) => {
                            out.push(c << 4);
                            (out, true)
                        }
                        (mut out, true) => {
                            *out.last_mut().unwrap() |= c;
                            (out, false)
                        }
                    },
                ),
                white_space,
            ),
            tag(&b">"[..]),
        ),
        |(bytes, _)| Object::String(bytes, StringFormat::Hexadecimal),
    )
    .parse(input)
}

fn boolean(input: ParserInput) -> NomResult<Object> {
    alt((map(tag(&b"true"[..]), |_| Object::Boolean(true)), map(tag(&b"false"[..]), |_| Object::Boolean(false)))).parse(input)
}

fn null(input: ParserInput) -> NomResult<Object> {
    map(tag(&b"null"[..]), |_| Object::Null).parse(input)
}

fn array(input: ParserInput) -> NomResult<Vec<Object>> {
    delimited(pair(tag(&b"["[..]), space), many0(_direct_object), tag(&b"]"[..])).parse(input)
}

fn dictionary(input: ParserInput) -> NomResult<Dictionary> {
    delimited(pair(tag(&b"<<"[..]), space), inner_dictionary, tag(&b">>"[..])).parse(input)
}

fn inner_dictionary(input: ParserInput) -> NomResult<Dictionary> {
    fold_many0(pair(terminated(name, space), _direct_object), Dictionary::new, |mut dict, (key, value)| {
        dict.set(key, value);
        dict
    })
    .parse(input)
}

/// Bytes of slack subtracted from a next-object-offset correction, covering
/// `\nendstream\nendobj` so the corrected length doesn't swallow them.
const STREAM_LENGTH_CORRECTION_SLACK: usize = 17;

/// Sanity cap on `/Size`, guarding against a crafted file claiming an
/// implausibly large object count (ISO 32000-1 doesn't bound it; this is
/// an implementation-defined ceiling).
const MAX_XREF_SIZE: u32 = 8_388_607;

fn take_stream_body<'a>(i: ParserInput<'a>, length: usize) -> NomResult<'a, ParserInput<'a>> {
    terminated(take(length), pair(opt(eol), tag(&b"endstream"[..]))).parse(i)
}

fn stream<'a>(input: ParserInput<'a>, reader: &Reader, already_seen: &mut HashSet<ObjectId>) -> NomResult<'a, Object> {
    let (i, dict) = terminated(dictionary, (space, tag(&b"stream"[..]), space0, eol)).parse(input)?;

    let Ok(length) = dict.get(b"Length").and_then(|value| {
        if let Ok(id) = value.as_reference() {
            reader.get_object(id, already_seen).and_then(|value| value.as_i64())
        } else {
            value.as_i64()
        }
    }) else {
        // Length is itself an unresolved reference; defer slicing the payload
        // until after the object graph is built (position relative to dict start).
        return Ok((i, Object::Stream(Stream::with_position(dict, input.len() - i.len()))));
    };

    if length < 0 {
        return Err(nom::Err::Failure(nom::error::ParseError::from_error_kind(i, ErrorKind::LengthValue)));
    }

    if let Ok((rest, data)) = take_stream_body(i, length as usize) {
        return Ok((rest, Object::Stream(Stream::new(dict, data.to_vec()))));
    }

    // The declared /Length didn't land on `endstream`: correct it using the
    // byte offset of the next object the xref table knows about, minus slack
    // for the "\nendstream\nendobj" that follows the payload. The slack
    // constant is empirical, so the arithmetic result is only a starting
    // guess; verify it against the literal `endstream` keyword and nudge by
    // a few bytes either way rather than trusting the offset blindly.
    let data_start = i.location_offset();
    let estimate = reader
        .document
        .xref_next_object_offset(data_start + 1)
        .and_then(|next_offset| next_offset.checked_sub(data_start + STREAM_LENGTH_CORRECTION_SLACK))
        .filter(|&corrected| corrected <= reader.buffer.len().saturating_sub(data_start));

    let Some(estimate) = estimate else {
        return Err(nom::Err::Failure(nom::error::ParseError::from_error_kind(i, ErrorKind::LengthValue)));
    };

    const NUDGE: isize = 2;
    let found = (-NUDGE..=NUDGE).find_map(|delta| {
        let candidate = estimate as isize + delta;
        if candidate < 0 {
            return None;
        }
        take_stream_body(i, candidate as usize).ok()
    });

    match found {
        Some((rest, data)) => {
            let mut corrected_dict = dict;
            corrected_dict.set("Length", Object::Integer(data.len() as i64));
            Ok((rest, Object::Stream(Stream::new(corrected_dict, data.to_vec()))))
        }
        None => Err(nom::Err::Failure(nom::error::ParseError::from_error_kind(i, ErrorKind::LengthValue))),
    }
}

fn unsigned_int<I: FromStr>(input: ParserInput) -> NomResult<I> {
    map_res(digit1, |digits: ParserInput| I::from_str(str::from_utf8(&digits).unwrap())).parse(input)
}

fn object_id(input: ParserInput) -> NomResult<ObjectId> {
    pair(terminated(unsigned_int, space), terminated(unsigned_int, space)).parse(input)
}

fn reference(input: ParserInput) -> NomResult<Object> {
    map(terminated(object_id, tag(&b"R"[..])), Object::Reference).parse(input)
}

fn _direct_objects(input: ParserInput) -> NomResult<Object> {
    alt((
        null,
        boolean,
        reference,
        map(real, Object::Real),
        map(integer, Object::Integer),
        map(name, Object::Name),
        map(literal_string, Object::string_literal),
        hexadecimal_string,
        map(array, Object::Array),
        map(dictionary, Object::Dictionary),
    ))
    .parse(input)
}

fn _direct_object(input: ParserInput) -> NomResult<Object> {
    terminated(_direct_objects, space).parse(input)
}

/// Parse a single value with no indirection context — used for object-stream
/// slots, which are always direct objects.
pub fn direct_object(input: ParserInput) -> Option<Object> {
    strip_nom(_direct_object.parse(input))
}

fn object<'a>(input: ParserInput<'a>, reader: &Reader, already_seen: &mut HashSet<ObjectId>) -> NomResult<'a, Object> {
    terminated(alt((|input| stream(input, reader, already_seen), _direct_objects)), space).parse(input)
}

/// Parse the indirect object starting at `offset` in `input`'s underlying
/// buffer, checking it against `expected_id` when the caller already knows
/// which object it asked for.
pub fn indirect_object(
    input: ParserInput, offset: usize, expected_id: Option<ObjectId>, reader: &Reader, already_seen: &mut HashSet<ObjectId>,
) -> crate::Result<(ObjectId, Object)> {
    let (id, mut object) = _indirect_object(input.take_from(offset), offset, expected_id, reader, already_seen)?;
    offset_stream(&mut object, offset);
    Ok((id, object))
}

fn _indirect_object<'a>(
    input: ParserInput<'a>, offset: usize, expected_id: Option<ObjectId>, reader: &Reader, already_seen: &mut HashSet<ObjectId>,
) -> crate::Result<(ObjectId, Object)> {
    let (i, (_, object_id)) =
        terminated((space, object_id), pair(tag(&b"obj"[..]), space)).parse(input).map_err(|_| Error::IndirectObject { offset })?;
    if let Some(expected_id) = expected_id {
        if object_id != expected_id {
            return Err(Error::ObjectIdMismatch { expected: expected_id, found: object_id });
        }
    }

    let object_offset = input.len() - i.len();
    let (_, mut object) = terminated(|i: ParserInput<'a>| object(i, reader, already_seen), (space, opt(tag(&b"endobj"[..])), space))
        .parse(i)
        .map_err(|_| Error::IndirectObject { offset })?;

    offset_stream(&mut object, object_offset);

    Ok((object_id, object))
}

/// Parse `%PDF-M.m` at the very start of the buffer, returning the version string.
pub fn header(input: ParserInput) -> Option<String> {
    strip_nom(
        map_res(delimited(tag(&b"%PDF-"[..]), take_while(|c: u8| !b"\r\n".contains(&c)), pair(eol, many0_count(comment))), |v: ParserInput| {
            str::from_utf8(&v).map(Into::into)
        })
        .parse(input),
    )
}

/// Parse the binary-marker comment line that conventionally follows the header.
pub fn binary_mark(input: ParserInput) -> Option<Vec<u8>> {
    strip_nom(
        map_res(delimited(tag(&b"%"[..]), take_while(|c: u8| !b"\r\n".contains(&c)), pair(eol, many0_count(comment))), |v: ParserInput| {
            Ok::<Vec<u8>, ()>(v.to_vec())
        })
        .parse(input),
    )
}

/// Decode a classic table-form xref section (not including the trailer).
fn xref(input: ParserInput) -> NomResult<Xref> {
    let xref_eol = map(alt((tag(&b" \r"[..]), tag(&b" \n"[..]), tag(&b"\r\n"[..]))), |_| ());
    let xref_entry = pair(
        separated_pair(unsigned_int, tag(&b" "[..]), unsigned_int::<u32>),
        delimited(tag(&b" "[..]), map(one_of("nf"), |k| k == 'n'), xref_eol),
    );

    let xref_section = pair(
        separated_pair(unsigned_int::<usize>, tag(&b" "[..]), unsigned_int::<u32>),
        preceded(pair(opt(tag(&b" "[..])), eol), many0(xref_entry)),
    );

    delimited(
        pair(tag(&b"xref"[..]), eol),
        fold_many1(
            xref_section,
            || -> Xref { Xref::new(0, XrefType::CrossReferenceTable) },
            |mut xref, ((start, _count), entries)| {
                for (index, ((offset, generation), is_normal)) in entries.into_iter().enumerate() {
                    if is_normal {
                        if offset <= 1 {
                            // An `n`-flagged entry with offset 0 or 1 is not a valid
                            // byte position; treat it as free (ISO 32000-1 7.5.4).
                            xref.insert((start + index) as u32, XrefEntry::UnusableFree);
                        } else if let Ok(generation) = generation.try_into() {
                            xref.insert((start + index) as u32, XrefEntry::Normal { offset, generation });
                        }
                    }
                }
                xref
            },
        ),
        space,
    )
    .parse(input)
}

pub(crate) fn trailer(input: ParserInput) -> NomResult<Dictionary> {
    delimited(pair(tag(&b"trailer"[..]), space), dictionary, space).parse(input)
}

/// Parse whatever lives at a `startxref` offset: a classic `xref`+`trailer`
/// pair, or (PDF 1.5+) a single indirect object that is itself an xref stream.
pub fn xref_and_trailer(input: ParserInput, reader: &Reader) -> crate::Result<(Xref, Dictionary)> {
    let xref_trailer = map(pair(xref, trailer), |(mut xref, trailer)| {
        let size = trailer.get(b"Size").and_then(Object::as_i64).map_err(|_| error::ParseError::InvalidTrailer)? as u32;
        if size > MAX_XREF_SIZE {
            return Err(XrefError::SizeTooLarge.into());
        }
        xref.size = size;
        Ok((xref, trailer))
    });
    alt((
        xref_trailer,
        (|input| {
            _indirect_object(input, 0, None, reader, &mut HashSet::new())
                .map(|(_, obj)| {
                    let res = match obj {
                        Object::Stream(stream) => decode_xref_stream(stream),
                        _ => Err(error::ParseError::InvalidXref.into()),
                    };
                    (input, res)
                })
                .map_err(|_| nom::Err::Error(nom::error::ParseError::from_error_kind(input, ErrorKind::Fail)))
        }),
    ))
    .parse(input)
    .map(|(_, o)| o)
    .map_err(|_| error::ParseError::InvalidTrailer)?
}

/// Parse the integer offset named by a trailing `startxref\n<offset>\n%%EOF`.
pub fn xref_start(input: ParserInput) -> Option<i64> {
    strip_nom(delimited(pair(tag(&b"startxref"[..]), eol), trim_spaces(integer), (eol, tag(&b"%%EOF"[..]), space)).parse(input))
}

fn trim_spaces<'a, O>(
    p: impl Parser<ParserInput<'a>, Output = O, Error = nom::error::Error<LocatedSpan<&'a [u8], &'a str>>>,
) -> impl Parser<ParserInput<'a>, Output = O, Error = nom::error::Error<LocatedSpan<&'a [u8], &'a str>>> {
    delimited(many0(tag(" ")), p, many0(tag(" ")))
}

fn object_stream_pair(input: ParserInput) -> NomResult<(u32, usize)> {
    pair(terminated(unsigned_int::<u32>, space), terminated(unsigned_int::<usize>, space)).parse(input)
}

/// Parse the `/N` pairs of `(object_number, relative_offset)` at the front of
/// a decoded `ObjStm` body.
pub fn object_stream_header(input: ParserInput, n: usize) -> Option<Vec<(u32, usize)>> {
    strip_nom(count(object_stream_pair, n).parse(input))
}

/// Decode a cross-reference stream (ISO 32000-1 7.5.8): `/W` gives the byte
/// width of each of the three fields per record, `/Index` gives the object
/// number ranges the records cover (defaulting to `[0, /Size]`).
pub(crate) fn decode_xref_stream(stream: Stream) -> crate::Result<(Xref, Dictionary)> {
    let widths: Vec<usize> = stream
        .dict
        .get(b"W")
        .and_then(Object::as_array)
        .map_err(|_| error::ParseError::InvalidXref)?
        .iter()
        .map(|o| o.as_i64().map(|n| n as usize))
        .collect::<crate::Result<_>>()?;
    if widths.len() != 3 {
        return Err(error::ParseError::InvalidXref.into());
    }

    let size = stream.dict.get(b"Size").and_then(Object::as_i64).map_err(|_| error::ParseError::InvalidTrailer)? as u32;
    if size > MAX_XREF_SIZE {
        return Err(XrefError::SizeTooLarge.into());
    }

    let index_pairs: Vec<(u32, u32)> = match stream.dict.get_opt(b"Index").and_then(|o| o.as_array().ok()) {
        Some(arr) => {
            let nums: Vec<i64> = arr.iter().filter_map(|o| o.as_i64().ok()).collect();
            nums.chunks(2).filter(|c| c.len() == 2).map(|c| (c[0] as u32, c[1] as u32)).collect()
        }
        None => vec![(0, size)],
    };

    let dict = stream.dict.clone();
    let data = filters::decode_stream(&stream)?;
    let entry_size: usize = widths.iter().sum();
    if entry_size == 0 {
        return Err(error::ParseError::InvalidXref.into());
    }

    let mut xref = Xref::new(size, XrefType::CrossReferenceStream);
    let mut offset = 0usize;
    for (first, range_count) in index_pairs {
        for i in 0..range_count {
            if offset + entry_size > data.len() {
                return Err(error::ParseError::InvalidXref.into());
            }

            let mut field_offset = offset;
            let mut fields = [0u64; 3];
            for (slot, &width) in widths.iter().enumerate() {
                fields[slot] = if width == 0 {
                    // Per ISO 32000-1 table 17, an omitted type field defaults to
                    // in-use (1); an omitted second/third field defaults to 0.
                    if slot == 0 {
                        1
                    } else {
                        0
                    }
                } else {
                    data[field_offset..field_offset + width].iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
                };
                field_offset += width;
            }

            let obj_num = first + i;
            match fields[0] {
                0 => xref.insert(obj_num, XrefEntry::Free { next: fields[1] as u32 }),
                1 => xref.insert(obj_num, XrefEntry::Normal { offset: fields[1] as u32, generation: fields[2] as u16 }),
                2 => xref.insert(obj_num, XrefEntry::Compressed { container: fields[1] as u32, index: fields[2] as u16 }),
                _ => return Err(error::ParseError::InvalidXref.into()),
            }
            offset += entry_size;
        }
    }

    Ok((xref, dict))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_span(s: &'_ [u8]) -> ParserInput<'_> {
        LocatedSpan::new_extra(s, "test")
    }

    fn tstrip<O>(r: NomResult<O>) -> Option<O> {
        r.ok().and_then(|(i, o)| if !i.is_empty() { None } else { Some(o) })
    }

    #[test]
    fn parse_real_number() {
        let real = |i| tstrip(real(i));

        assert_eq!(real(test_span(b"0.12")), Some(0.12));
        assert_eq!(real(test_span(b"-.12")), Some(-0.12));
        assert_eq!(real(test_span(b"10.")), Some(10.0));
    }

    #[test]
    fn parse_real_with_exponent() {
        let real = |i| tstrip(real(i));

        assert_eq!(real(test_span(b"1E+35")), Some(1E+35));
        assert_eq!(real(test_span(b"-1E+35")), Some(-1E+35));
        assert_eq!(real(test_span(b"2.5e-3")), Some(2.5e-3));
    }

    #[test]
    fn array_of_reals_with_odd_decimals_and_extreme_exponents() {
        let array = |i| tstrip(array(i));

        let values = array(test_span(b"[+4.-.002]")).unwrap();
        assert_eq!(values, vec![Object::Real(4.0), Object::Real(-0.002)]);

        let values = array(test_span(b"[-1E+35 1E+35]")).unwrap();
        match values.as_slice() {
            [Object::Real(a), Object::Real(b)] => {
                assert!((*a - (-1E+35)).abs() < 1e30);
                assert!((*b - 1E+35).abs() < 1e30);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parse_string() {
        let literal_string = |i| tstrip(literal_string(i));

        let data = vec![
            ("()", ""),
            ("(text())", "text()"),
            ("(text\r\n\\\\(nested\\t\\b\\f))", "text\r\n\\(nested\t\x08\x0C)"),
            ("(text\\0\\53\\053\\0053)", "text\0++\x053"),
            ("(text line\\\n())", "text line()"),
        ];

        for (input, expected) in data {
            assert_eq!(
                literal_string(test_span(input.as_bytes())),
                Some(expected.as_bytes().to_vec()),
                "input: {input:?} output: {expected:?}"
            );
        }
    }

    #[test]
    fn parse_name() {
        let (text, expected) = (b"/ABC#5f", b"ABC\x5F");
        let result = tstrip(name(test_span(text)));
        assert_eq!(result, Some(expected.to_vec()));

        let (text, expected) = (b"/#cb#ce#cc#e5", b"\xcb\xce\xcc\xe5");
        let result = tstrip(name(test_span(text)));
        assert_eq!(result, Some(expected.to_vec()));
    }

    #[test]
    fn parse_name_hash_20_decodes_to_space() {
        let result = tstrip(name(test_span(b"/A#20B")));
        assert_eq!(result, Some(b"A B".to_vec()));
    }

    #[test]
    fn dictionary_with_many_entries_parses_in_full() {
        const ENTRY_COUNT: usize = 150_000;
        let mut input = String::from("<<");
        for i in 0..ENTRY_COUNT {
            input.push_str(&format!("/K{i} {i}"));
        }
        input.push_str(">>");

        let dict = tstrip(dictionary(test_span(input.as_bytes()))).expect("dictionary should parse");
        assert_eq!(dict.len(), ENTRY_COUNT);
        assert_eq!(dict.get(b"K0").unwrap().as_i64().unwrap(), 0);
        assert_eq!(dict.get(format!("K{}", ENTRY_COUNT - 1).as_bytes()).unwrap().as_i64().unwrap(), (ENTRY_COUNT - 1) as i64);
    }

    #[test]
    fn hex_partial() {
        let out = tstrip(hexadecimal_string(test_span(b"<901FA>")));
        match out {
            Some(Object::String(s, _)) => assert_eq!(s, b"\x90\x1F\xA0".to_vec()),
            _ => panic!("unexpected {out:?}"),
        }
    }

    #[test]
    fn hex_separated() {
        let out = tstrip(hexadecimal_string(test_span(b"<9 01F A>")));
        match out {
            Some(Object::String(s, _)) => assert_eq!(s, b"\x90\x1F\xA0".to_vec()),
            _ => panic!("unexpected {out:?}"),
        }
    }

    #[test]
    fn big_generation_value() {
        let input = b"xref
0 1
0000000000 65536 f
0 16
0000000000 65535 f
0000153238 00000 n
0000000019 00000 n
0000000313 00000 n
0000000333 00000 n
0000145531 00000 n
0000153407 00000 n
0000145554 00000 n
0000152303 00000 n
0000152324 00000 n
0000152514 00000 n
0000152880 00000 n
0000153106 00000 n
0000153139 00000 n
0000153532 00000 n
0000153629 00000 n
trailer
<</Size 16/Root 14 0 R
/Info 15 0 R
/ID [ <9DDC4B621B3F485FF5ED0F57D00A028F>
<9DDC4B621B3F485FF5ED0F57D00A028F> ]
/DocChecksum /2BCC3C7DE26E6BF3573E4A6E8362221F
>>
startxref
153804
%%EOF
";
        match xref(test_span(input)) {
            Ok((_, re)) => assert_eq!(re.entries.len(), 15),
            Err(err) => panic!("unexpected {err:?}"),
        }
    }

    #[test]
    fn n_flagged_entry_with_offset_zero_or_one_is_treated_as_free() {
        let input = b"xref
0 3
0000000000 65535 f
0000000000 00000 n
0000000001 00000 n
trailer
<</Size 3>>
";
        let (_, re) = xref(test_span(input)).unwrap();
        assert_eq!(re.get(1), Some(&XrefEntry::UnusableFree));
        assert_eq!(re.get(2), Some(&XrefEntry::UnusableFree));
    }

    #[test]
    fn space_in_startxref_number() {
        let input = b"startxref
153804
%%EOF
";
        match xref_start(test_span(input)) {
            Some(num) => assert_eq!(num, 153804),
            None => panic!("could not parse number in startxref"),
        }
    }

    #[test]
    fn object_stream_header_parses_n_pairs() {
        let input = test_span(b"1 0 2 5 3 11 ");
        let pairs = object_stream_header(input, 3).unwrap();
        assert_eq!(pairs, vec![(1, 0), (2, 5), (3, 11)]);
    }

    #[test]
    fn stream_length_is_corrected_from_next_object_offset() {
        use crate::Document;

        let payload = b"hello";
        let mut buffer = Vec::new();
        buffer.extend_from_slice(b"<< /Length 999 >>\nstream\n");
        buffer.extend_from_slice(payload);
        buffer.extend_from_slice(b"\nendstream\nendobj\n");
        let next_obj_offset = buffer.len();
        buffer.extend_from_slice(b"2 0 obj\n<< >>\nendobj\n");

        let mut document = Document::new();
        let mut xref = Xref::new(0, XrefType::CrossReferenceTable);
        xref.insert(2, XrefEntry::Normal { offset: next_obj_offset as u32, generation: 0 });
        document.reference_table = xref;

        let reader = Reader { buffer: &buffer, document, encryption_state: None, password: None, raw_objects: Default::default() };

        let mut seen = HashSet::new();
        let (_, object) = stream(test_span(&buffer), &reader, &mut seen).unwrap();
        match object {
            Object::Stream(s) => assert_eq!(s.content, payload),
            other => panic!("expected stream, got {other:?}"),
        }
    }

    #[test]
    fn decodes_compressed_xref_entry() {
        // type=2, field1 (container)=7 in one byte, field2 (index)=3 in one byte.
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XRef".to_vec()));
        dict.set("W", Object::Array(vec![Object::Integer(1), Object::Integer(1), Object::Integer(1)]));
        dict.set("Size", Object::Integer(1));
        dict.set("Index", Object::Array(vec![Object::Integer(5), Object::Integer(1)]));
        let stream = Stream::new(dict, vec![2, 7, 3]);
        let (xref, _) = decode_xref_stream(stream).unwrap();
        assert_eq!(xref.get(5), Some(&XrefEntry::Compressed { container: 7, index: 3 }));
    }

    #[test]
    fn xref_stream_rejects_oversized_size() {
        let mut dict = Dictionary::new();
        dict.set("Type", Object::Name(b"XRef".to_vec()));
        dict.set("W", Object::Array(vec![Object::Integer(1), Object::Integer(1), Object::Integer(1)]));
        dict.set("Size", Object::Integer(MAX_XREF_SIZE as i64 + 1));
        let stream = Stream::new(dict, vec![]);
        match decode_xref_stream(stream) {
            Err(Error::Xref(crate::error::XrefError::SizeTooLarge)) => {}
            other => panic!("expected SizeTooLarge, got {other:?}"),
        }
    }
}
