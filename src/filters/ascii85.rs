use super::Filter;
use crate::error::Error;
use crate::object::Dictionary;
use crate::Result;

/// `ASCII85Decode`: base-85 groups of 5 ASCII characters encoding 4 bytes each,
/// `z` shorthand for a zero group, terminated by `~>`.
pub struct Ascii85;

impl Filter for Ascii85 {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 4 / 5);
        let mut group = [0u8; 5];
        let mut count = 0usize;

        let mut iter = bytes.iter().copied().peekable();
        while let Some(b) = iter.next() {
            if b == b'~' {
                break;
            }
            if b.is_ascii_whitespace() {
                continue;
            }
            if b == b'z' && count == 0 {
                out.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            if !(b'!'..=b'u').contains(&b) {
                return Err(Error::Codec(format!("ASCII85Decode: invalid byte {b:#x}")));
            }
            group[count] = b - b'!';
            count += 1;
            if count == 5 {
                out.extend_from_slice(&decode_group(&group, 4));
                count = 0;
            }
        }

        if count > 0 {
            if count == 1 {
                return Err(Error::Codec("ASCII85Decode: truncated final group".to_string()));
            }
            for slot in group.iter_mut().skip(count) {
                *slot = 84;
            }
            let decoded = decode_group(&group, count - 1);
            out.extend_from_slice(&decoded);
        }

        Ok(out)
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 5 / 4 + 2);
        for chunk in bytes.chunks(4) {
            if chunk.len() == 4 && chunk == [0, 0, 0, 0] {
                out.push(b'z');
                continue;
            }
            let mut buf = [0u8; 4];
            buf[..chunk.len()].copy_from_slice(chunk);
            let value = u32::from_be_bytes(buf);
            let mut digits = [0u8; 5];
            let mut v = value;
            for slot in digits.iter_mut().rev() {
                *slot = (v % 85) as u8;
                v /= 85;
            }
            out.extend(digits.iter().take(chunk.len() + 1).map(|d| d + b'!'));
        }
        out.extend_from_slice(b"~>");
        Ok(out)
    }
}

/// Decodes one group of `count` valid base-85 digits (padded to 5 with the
/// maximum digit) into `count` output bytes.
fn decode_group(group: &[u8; 5], count: usize) -> Vec<u8> {
    let mut value: u32 = 0;
    for &digit in group {
        value = value.wrapping_mul(85).wrapping_add(digit as u32);
    }
    value.to_be_bytes()[..count].to_vec()
}
