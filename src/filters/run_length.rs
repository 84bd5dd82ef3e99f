use super::Filter;
use crate::object::Dictionary;
use crate::Result;

/// `RunLengthDecode`: length-byte-prefixed runs; 0-127 means copy the next
/// `len+1` literal bytes, 129-255 means repeat the following byte `257-len`
/// times, 128 is the EOD marker.
pub struct RunLength;

impl Filter for RunLength {
    fn decode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() * 2);
        let mut i = 0;
        while i < bytes.len() {
            let len = bytes[i];
            i += 1;
            if len == 128 {
                break;
            } else if len < 128 {
                let count = len as usize + 1;
                let end = (i + count).min(bytes.len());
                out.extend_from_slice(&bytes[i..end]);
                i = end;
            } else {
                let count = 257 - len as usize;
                if i < bytes.len() {
                    out.extend(std::iter::repeat(bytes[i]).take(count));
                    i += 1;
                }
            }
        }
        Ok(out)
    }

    fn encode(&self, bytes: &[u8], _params: &Dictionary) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(bytes.len() + bytes.len() / 128 + 1);
        let mut i = 0;
        while i < bytes.len() {
            let run_end = (i + 1..bytes.len()).take_while(|&j| bytes[j] == bytes[i]).count() + 1;
            if run_end >= 2 {
                let count = run_end.min(128);
                out.push((257 - count) as u8);
                out.push(bytes[i]);
                i += count;
                continue;
            }

            let start = i;
            let mut j = i + 1;
            while j < bytes.len() && j - start < 128 {
                let next_run = (j..bytes.len()).take_while(|&k| bytes[k] == bytes[j]).count();
                if next_run >= 2 {
                    break;
                }
                j += 1;
            }
            out.push((j - start - 1) as u8);
            out.extend_from_slice(&bytes[start..j]);
            i = j;
        }
        out.push(128);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let filter = RunLength;
        let params = Dictionary::new();
        let data = b"aaaaaaaaHello, world!bbbbbbbbbbbbbbb".to_vec();
        let encoded = filter.encode(&data, &params).unwrap();
        let decoded = filter.decode(&encoded, &params).unwrap();
        assert_eq!(decoded, data);
    }

    #[test]
    fn decodes_literal_run() {
        let filter = RunLength;
        let params = Dictionary::new();
        let decoded = filter.decode(&[2, b'a', b'b', b'c', 128], &params).unwrap();
        assert_eq!(decoded, b"abc");
    }

    #[test]
    fn decodes_repeated_run() {
        let filter = RunLength;
        let params = Dictionary::new();
        let decoded = filter.decode(&[253, b'x', 128], &params).unwrap();
        assert_eq!(decoded, b"xxxx");
    }
}
