use super::Filter;
use crate::object::Dictionary;
use crate::Result;

/// Identity filter for the image codecs the object layer does not interpret
/// (DCTDecode, CCITTFaxDecode, JBIG2Decode, JPXDecode): the compressed bytes
/// are handed back unchanged for a higher-level image crate to decode.
pub struct ImagePassthrough;

impl Filter for ImagePassthrough {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_identity() {
        let filter = ImagePassthrough;
        let params = Dictionary::new();
        let data = b"\xff\xd8\xff\xe0JFIF".to_vec();
        assert_eq!(filter.decode(&data, &params).unwrap(), data);
        assert_eq!(filter.encode(&data, &params).unwrap(), data);
    }
}
