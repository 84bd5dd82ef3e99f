use weezl::{decode::Decoder, encode::Encoder, BitOrder};

use super::Filter;
use crate::error::Error;
use crate::object::{Dictionary, Object};
use crate::Result;

pub struct Lzw;

/// PDF's `/EarlyChange` defaults to 1 (TIFF-style code-width bump one code early);
/// LZWDecode with `/EarlyChange 0` matches the classic GIF convention instead.
fn early_change(params: &Dictionary) -> bool {
    match params.get_opt(b"EarlyChange") {
        Some(Object::Integer(0)) => false,
        _ => true,
    }
}

impl Filter for Lzw {
    fn decode(&self, bytes: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
        let mut decoder = if early_change(params) {
            Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
        } else {
            Decoder::new(BitOrder::Msb, 8)
        };
        decoder.decode(bytes).map_err(|e| Error::Codec(format!("LZWDecode: {e:?}")))
    }

    fn encode(&self, bytes: &[u8], params: &Dictionary) -> Result<Vec<u8>> {
        let mut encoder = if early_change(params) {
            Encoder::with_tiff_size_switch(BitOrder::Msb, 8)
        } else {
            Encoder::new(BitOrder::Msb, 8)
        };
        encoder.encode(bytes).map_err(|e| Error::Codec(format!("LZWDecode: {e:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let filter = Lzw;
        let params = Dictionary::new();
        let data = b"aaaaaaaaaaaabbbbbbbbbbbbcccccccccccc".to_vec();
        let encoded = filter.encode(&data, &params).unwrap();
        let decoded = filter.decode(&encoded, &params).unwrap();
        assert_eq!(decoded, data);
    }
}
