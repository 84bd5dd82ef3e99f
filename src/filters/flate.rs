use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;

use super::Filter;
use crate::error::Error;
use crate::object::Dictionary;
use crate::Result;

pub struct Flate;

impl Filter for Flate {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut decoder = ZlibDecoder::new(bytes);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).map_err(|e| Error::Codec(format!("FlateDecode: {e}")))?;
        Ok(out)
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).map_err(|e| Error::Codec(format!("FlateDecode: {e}")))?;
        encoder.finish().map_err(|e| Error::Codec(format!("FlateDecode: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let filter = Flate;
        let params = Dictionary::new();
        let data = b"the quick brown fox jumps over the lazy dog".repeat(4);
        let encoded = filter.encode(&data, &params).unwrap();
        let decoded = filter.decode(&encoded, &params).unwrap();
        assert_eq!(decoded, data);
    }
}
