use crate::error::Error;
use crate::object::{Dictionary, Object};
use crate::Result;

struct Params {
    predictor: i64,
    colors: usize,
    bits_per_component: usize,
    columns: usize,
}

impl Params {
    fn from_dict(dict: &Dictionary) -> Self {
        let get_int = |key: &[u8], default: i64| match dict.get_opt(key) {
            Some(obj) => obj.as_i64().unwrap_or(default),
            None => default,
        };
        Params {
            predictor: get_int(b"Predictor", 1),
            colors: get_int(b"Colors", 1).max(1) as usize,
            bits_per_component: get_int(b"BitsPerComponent", 8).max(1) as usize,
            columns: get_int(b"Columns", 1).max(1) as usize,
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        (self.colors * self.bits_per_component).div_ceil(8).max(1)
    }

    fn row_len(&self) -> usize {
        (self.colors * self.bits_per_component * self.columns).div_ceil(8)
    }
}

/// Reverses the row-wise differencing `/Predictor` applied before
/// compression. A predictor of 1 (or absent) is the identity.
pub fn undo(data: &[u8], params_dict: &Dictionary) -> Result<Vec<u8>> {
    let params = Params::from_dict(params_dict);
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => Ok(undo_tiff(data, &params)),
        10..=15 => undo_png(data, &params),
        other => Err(Error::Codec(format!("unsupported /Predictor {other}"))),
    }
}

/// Applies the row-wise differencing `/Predictor` before compression.
pub fn apply(data: &[u8], params_dict: &Dictionary) -> Result<Vec<u8>> {
    let params = Params::from_dict(params_dict);
    match params.predictor {
        1 => Ok(data.to_vec()),
        2 => Ok(apply_tiff(data, &params)),
        10..=15 => Ok(apply_png(data, &params)),
        other => Err(Error::Codec(format!("unsupported /Predictor {other}"))),
    }
}

fn undo_png(data: &[u8], params: &Params) -> Result<Vec<u8>> {
    let bpp = params.bytes_per_pixel();
    let row_len = params.row_len();
    let stride = row_len + 1;
    let mut out = Vec::with_capacity(data.len());
    let mut prev = vec![0u8; row_len];

    for chunk in data.chunks(stride) {
        if chunk.len() < 2 {
            break;
        }
        let tag = chunk[0];
        let mut row = chunk[1..].to_vec();
        if row.len() < row_len {
            row.resize(row_len, 0);
        }
        for i in 0..row_len {
            let a = if i >= bpp { row[i - bpp] } else { 0 };
            let b = prev[i];
            let c = if i >= bpp { prev[i - bpp] } else { 0 };
            let recon = match tag {
                0 => row[i],
                1 => row[i].wrapping_add(a),
                2 => row[i].wrapping_add(b),
                3 => row[i].wrapping_add(((a as u16 + b as u16) / 2) as u8),
                4 => row[i].wrapping_add(paeth(a, b, c)),
                other => return Err(Error::Codec(format!("unsupported PNG predictor tag {other}"))),
            };
            row[i] = recon;
        }
        out.extend_from_slice(&row);
        prev = row;
    }
    Ok(out)
}

fn apply_png(data: &[u8], params: &Params) -> Vec<u8> {
    let row_len = params.row_len();
    let mut out = Vec::with_capacity(data.len() + data.len() / row_len.max(1) + 1);
    for row in data.chunks(row_len) {
        out.push(0);
        out.extend_from_slice(row);
    }
    out
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = a as i32 + b as i32 - c as i32;
    let pa = (p - a as i32).abs();
    let pb = (p - b as i32).abs();
    let pc = (p - c as i32).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

fn undo_tiff(data: &[u8], params: &Params) -> Vec<u8> {
    if params.bits_per_component != 8 {
        return data.to_vec();
    }
    let row_len = params.row_len();
    let colors = params.colors;
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_len) {
        for i in colors..row.len() {
            row[i] = row[i].wrapping_add(row[i - colors]);
        }
    }
    out
}

fn apply_tiff(data: &[u8], params: &Params) -> Vec<u8> {
    if params.bits_per_component != 8 {
        return data.to_vec();
    }
    let row_len = params.row_len();
    let colors = params.colors;
    let mut out = data.to_vec();
    for row in out.chunks_mut(row_len) {
        for i in (colors..row.len()).rev() {
            row[i] = row[i].wrapping_sub(row[i - colors]);
        }
    }
    out
}
