use super::Filter;
use crate::error::Error;
use crate::object::Dictionary;
use crate::Result;

/// `ASCIIHexDecode`: pairs of hex digits, whitespace ignored, terminated by `>`.
pub struct AsciiHex;

impl Filter for AsciiHex {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut digits = Vec::with_capacity(bytes.len());
        for &b in bytes {
            if b == b'>' {
                break;
            }
            if b.is_ascii_whitespace() {
                continue;
            }
            if !b.is_ascii_hexdigit() {
                return Err(Error::Codec(format!("ASCIIHexDecode: invalid digit {b:#x}")));
            }
            digits.push(b);
        }
        if digits.len() % 2 == 1 {
            digits.push(b'0');
        }

        let mut out = Vec::with_capacity(digits.len() / 2);
        for pair in digits.chunks_exact(2) {
            let hi = hex_value(pair[0]);
            let lo = hex_value(pair[1]);
            out.push((hi << 4) | lo);
        }
        Ok(out)
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 2 + 1);
        for &b in bytes {
            out.push(hex_digit(b >> 4));
            out.push(hex_digit(b & 0xf));
        }
        out.push(b'>');
        Ok(out)
    }
}

fn hex_value(b: u8) -> u8 {
    match b {
        b'0'..=b'9' => b - b'0',
        b'a'..=b'f' => b - b'a' + 10,
        b'A'..=b'F' => b - b'A' + 10,
        _ => 0,
    }
}

fn hex_digit(v: u8) -> u8 {
    match v {
        0..=9 => b'0' + v,
        _ => b'a' + (v - 10),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let filter = AsciiHex;
        let params = Dictionary::new();
        let data = b"Hello, world!".to_vec();
        let encoded = filter.encode(&data, &params).unwrap();
        let decoded = filter.decode(&encoded, &params).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn ignores_whitespace_and_odd_length() {
        let filter = AsciiHex;
        let params = Dictionary::new();
        let decoded = filter.decode(b"48 65 6C6C6F2\n>", &params).unwrap();
        assert_eq!(decoded, b"Hello ");
    }
}
