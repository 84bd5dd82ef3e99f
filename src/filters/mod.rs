//! The stream filter pipeline: a name-keyed registry of codecs plus the
//! PNG/TIFF predictor post-processing that several of them chain with.
//!
//! Per the crate's scope (ISO 32000 object layer, not image reconstruction),
//! the image codecs (DCTDecode, CCITTFaxDecode, JBIG2Decode, JPXDecode) are
//! registered so `encoder_for_stream` never errors on a recognized name, but
//! their `decode` is the identity function: the compressed bytes are handed
//! back unchanged for a higher-level image crate to interpret.
//!
//! `Crypt` is registered as the same identity passthrough: by the time a
//! stream's bytes reach this pipeline the crypter has already decrypted them
//! (ISO 32000-1 7.4.10), so the named crypt filter has nothing left to do.

mod ascii85;
mod ascii_hex;
mod flate;
mod image_passthrough;
mod lzw;
mod predictor;
mod run_length;

use crate::error::Error;
use crate::object::{Dictionary, Object, Stream};
use crate::Result;

/// A single stage of the filter pipeline. Implementations are stateless: all
/// per-stream parameters arrive via `/DecodeParms`.
pub trait Filter {
    fn decode(&self, bytes: &[u8], params: &Dictionary) -> Result<Vec<u8>>;
    fn encode(&self, bytes: &[u8], params: &Dictionary) -> Result<Vec<u8>>;
}

/// Resolve a canonical or abbreviated filter name to its implementation.
pub fn by_name(name: &[u8]) -> Result<Box<dyn Filter>> {
    match name {
        b"FlateDecode" | b"Fl" => Ok(Box::new(flate::Flate)),
        b"LZWDecode" | b"LZW" => Ok(Box::new(lzw::Lzw)),
        b"ASCIIHexDecode" | b"AHx" => Ok(Box::new(ascii_hex::AsciiHex)),
        b"ASCII85Decode" | b"A85" => Ok(Box::new(ascii85::Ascii85)),
        b"RunLengthDecode" | b"RL" => Ok(Box::new(run_length::RunLength)),
        b"DCTDecode" | b"DCT" => Ok(Box::new(image_passthrough::ImagePassthrough)),
        b"CCITTFaxDecode" | b"CCF" => Ok(Box::new(image_passthrough::ImagePassthrough)),
        b"JBIG2Decode" => Ok(Box::new(image_passthrough::ImagePassthrough)),
        b"JPXDecode" => Ok(Box::new(image_passthrough::ImagePassthrough)),
        b"Crypt" => Ok(Box::new(image_passthrough::ImagePassthrough)),
        other => Err(Error::Codec(format!(
            "unrecognized filter name {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

/// One stage plus its own `/DecodeParms`, wrapping the predictor around
/// Flate/LZW when `/Predictor` asks for row-wise differential decoding.
struct Stage {
    filter: Box<dyn Filter>,
    params: Dictionary,
}

/// Chains filters named in a `/Filter` array in order for decode, and in
/// reverse order for encode — itself implements `Filter` so callers never
/// need to special-case the single-filter vs. multi-filter case.
pub struct MultiFilter {
    stages: Vec<Stage>,
}

impl Filter for MultiFilter {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut data = bytes.to_vec();
        for stage in &self.stages {
            data = stage.filter.decode(&data, &stage.params)?;
            data = predictor::undo(&data, &stage.params)?;
        }
        Ok(data)
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut data = bytes.to_vec();
        for stage in self.stages.iter().rev() {
            data = predictor::apply(&data, &stage.params)?;
            data = stage.filter.encode(&data, &stage.params)?;
        }
        Ok(data)
    }
}

fn decode_parms_for(dict: &Dictionary, index: usize, count: usize) -> Dictionary {
    match dict.get_opt(b"DecodeParms").or_else(|| dict.get_opt(b"DP")) {
        Some(Object::Dictionary(d)) if count <= 1 => d.clone(),
        Some(Object::Array(arr)) => match arr.get(index) {
            Some(Object::Dictionary(d)) => d.clone(),
            _ => Dictionary::new(),
        },
        _ => Dictionary::new(),
    }
}

/// Build the filter chain described by a stream dictionary's `/Filter` (and
/// matching `/DecodeParms`) entries. Absent or empty `/Filter` yields the
/// identity chain.
pub fn encoder_for_stream(dict: &Dictionary) -> Result<MultiFilter> {
    let names: Vec<Vec<u8>> = match dict.get_opt(b"Filter") {
        None => Vec::new(),
        Some(Object::Name(n)) => vec![n.clone()],
        Some(Object::Array(arr)) => {
            let mut out = Vec::with_capacity(arr.len());
            for item in arr {
                out.push(item.as_name()?.to_vec());
            }
            out
        }
        Some(other) => {
            return Err(Error::ObjectType { expected: "Name or Array", found: other.enum_variant() })
        }
    };

    let count = names.len();
    let mut stages = Vec::with_capacity(count);
    for (index, name) in names.into_iter().enumerate() {
        let params = decode_parms_for(dict, index, count);
        let filter = by_name(&name)?;
        stages.push(Stage { filter, params });
    }
    Ok(MultiFilter { stages })
}

/// Decode a stream's content through the filter chain its own dictionary names.
pub fn decode_stream(stream: &Stream) -> Result<Vec<u8>> {
    let chain = encoder_for_stream(&stream.dict)?;
    chain.decode(&stream.content, &Dictionary::new())
}
