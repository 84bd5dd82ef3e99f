use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use md5::{Digest, Md5};
use sha2::{Sha256, Sha384, Sha512};

use super::rc4;
use crate::error::DecryptError;
use crate::object::{Dictionary, Object};
use crate::Document;

/// The 32-byte padding string Algorithm 2 mixes into a user/owner password
/// shorter than 32 bytes (ISO 32000-1 7.6.3.3, table 21).
const PAD: [u8; 32] = [
    0x28, 0xBF, 0x4E, 0x5E, 0x4E, 0x75, 0x8A, 0x41, 0x64, 0x00, 0x4E, 0x56, 0xFF, 0xFA, 0x01, 0x08, 0x2E, 0x2E, 0x00,
    0xB6, 0xD0, 0x68, 0x3E, 0x80, 0x2F, 0x0C, 0xA9, 0xFE, 0x64, 0x53, 0x69, 0x7A,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StreamCipher {
    Rc4,
    Aes128,
    Aes256,
    Identity,
}

#[derive(Debug, Clone)]
pub struct Parameters {
    pub v: i64,
    pub r: u8,
    pub length_bytes: usize,
    pub o: Vec<u8>,
    pub u: Vec<u8>,
    pub oe: Option<Vec<u8>>,
    pub ue: Option<Vec<u8>>,
    pub p: i32,
    pub id0: Vec<u8>,
    pub encrypt_metadata: bool,
    pub(crate) cipher: StreamCipher,
}

pub fn read_parameters(document: &Document, encrypt: &Dictionary) -> Result<Parameters, DecryptError> {
    let v = encrypt.get_opt(b"V").and_then(|o| o.as_i64().ok()).unwrap_or(0);
    let r = encrypt
        .get_opt(b"R")
        .and_then(|o| o.as_i64().ok())
        .ok_or(DecryptError::MissingField("R"))? as u8;
    let length_bits = encrypt.get_opt(b"Length").and_then(|o| o.as_i64().ok()).unwrap_or(40);
    let o = string_bytes(encrypt, b"O")?;
    let u = string_bytes(encrypt, b"U")?;
    let oe = string_bytes(encrypt, b"OE").ok();
    let ue = string_bytes(encrypt, b"UE").ok();
    let p = encrypt.get_opt(b"P").and_then(|o| o.as_i64().ok()).unwrap_or(0) as i32;
    let encrypt_metadata = encrypt.get_opt(b"EncryptMetadata").and_then(|o| o.as_bool().ok()).unwrap_or(true);

    let id0 = document
        .trailer
        .get_opt(b"ID")
        .and_then(|o| o.as_array().ok())
        .and_then(|arr| arr.first())
        .and_then(|obj| obj.as_str().ok())
        .map(|s| s.to_vec())
        .unwrap_or_default();

    let cipher = if r >= 5 {
        StreamCipher::Aes256
    } else if v >= 4 {
        detect_v4_cipher(encrypt)
    } else {
        StreamCipher::Rc4
    };

    Ok(Parameters {
        v,
        r,
        length_bytes: (length_bits / 8).max(5) as usize,
        o,
        u,
        oe,
        ue,
        p,
        id0,
        encrypt_metadata,
        cipher,
    })
}

fn string_bytes(dict: &Dictionary, key: &[u8]) -> Result<Vec<u8>, DecryptError> {
    dict.get_opt(key)
        .and_then(|obj| obj.as_str().ok())
        .map(|s| s.to_vec())
        .ok_or(DecryptError::MissingField("O/U/OE/UE"))
}

/// `/CF`'s crypt filter dictionary named by `/StmF` determines the real cipher
/// when `V` is 4 or 5; `/Identity` or an absent `/CF` leaves streams/strings
/// in the clear.
fn detect_v4_cipher(encrypt: &Dictionary) -> StreamCipher {
    let stmf_name = encrypt.get_opt(b"StmF").and_then(|obj| obj.as_name().ok());
    match stmf_name {
        Some(b"Identity") | None => StreamCipher::Identity,
        Some(name) => {
            let cfm = encrypt
                .get_opt(b"CF")
                .and_then(|o| o.as_dict().ok())
                .and_then(|cf| cf.get_opt(name))
                .and_then(|o| o.as_dict().ok())
                .and_then(|d| d.get_opt(b"CFM"))
                .and_then(|o| o.as_name().ok());
            match cfm {
                Some(b"AESV2") => StreamCipher::Aes128,
                Some(b"AESV3") => StreamCipher::Aes256,
                Some(b"V2") | None => StreamCipher::Rc4,
                _ => StreamCipher::Rc4,
            }
        }
    }
}

/// Authenticate `password` against this `/Encrypt` dictionary, trying the
/// user password and then the owner password, and return the file
/// encryption key on success (ISO 32000-1 Algorithms 2/6/7; ISO 32000-2
/// Algorithm 2.A for R 5/6).
pub fn authenticate(params: &Parameters, password: &str) -> Result<Vec<u8>, DecryptError> {
    authenticate_with_role(params, password).map(|(key, _is_owner)| key)
}

/// Like [`authenticate`], but also reports whether `password` matched as the
/// owner password rather than the user password — the owner route grants
/// full access rights regardless of the stored `/P` bitfield.
pub fn authenticate_with_role(params: &Parameters, password: &str) -> Result<(Vec<u8>, bool), DecryptError> {
    if params.r >= 5 {
        return authenticate_r6_with_role(params, password);
    }

    let padded = pad_password(password.as_bytes());

    let key = compute_file_key_legacy(params, &padded);
    if verify_user_password_legacy(params, &key) {
        return Ok((key, false));
    }

    let user_password = recover_user_password_legacy(params, password.as_bytes())?;
    let owner_key = compute_file_key_legacy(params, &user_password);
    if verify_user_password_legacy(params, &owner_key) {
        return Ok((owner_key, true));
    }

    Err(DecryptError::InvalidPassword)
}

fn pad_password(password: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let n = password.len().min(32);
    out[..n].copy_from_slice(&password[..n]);
    out[n..].copy_from_slice(&PAD[..32 - n]);
    out
}

/// Algorithm 2: compute the file encryption key from a (padded) password.
fn compute_file_key_legacy(params: &Parameters, padded_password: &[u8]) -> Vec<u8> {
    let mut hasher = Md5::new();
    hasher.update(padded_password);
    hasher.update(&params.o);
    hasher.update(params.p.to_le_bytes());
    hasher.update(&params.id0);
    if params.r >= 4 && !params.encrypt_metadata {
        hasher.update([0xFF, 0xFF, 0xFF, 0xFF]);
    }
    let mut hash = hasher.finalize().to_vec();

    if params.r >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..params.length_bytes]).to_vec();
        }
    }

    hash.truncate(params.length_bytes);
    hash
}

/// Algorithms 4/5: compute `/U` from the file key and compare to the stored value.
fn verify_user_password_legacy(params: &Parameters, file_key: &[u8]) -> bool {
    if params.r == 2 {
        let computed = rc4::crypt(file_key, &PAD);
        return computed == params.u;
    }

    let mut hasher = Md5::new();
    hasher.update(PAD);
    hasher.update(&params.id0);
    let mut digest = hasher.finalize().to_vec();

    digest = rc4::crypt(file_key, &digest);
    for i in 1u8..=19 {
        let round_key: Vec<u8> = file_key.iter().map(|b| b ^ i).collect();
        digest = rc4::crypt(&round_key, &digest);
    }

    params.u.len() >= 16 && digest[..16] == params.u[..16]
}

/// Algorithm 7: recover the padded user password from `/O` using a key
/// derived from the owner password, so the owner password also authenticates.
fn recover_user_password_legacy(params: &Parameters, owner_password: &[u8]) -> Result<Vec<u8>, DecryptError> {
    let padded = pad_password(owner_password);
    let mut hash = Md5::digest(padded).to_vec();
    if params.r >= 3 {
        for _ in 0..50 {
            hash = Md5::digest(&hash[..params.length_bytes]).to_vec();
        }
    }
    hash.truncate(params.length_bytes);

    let mut result = params.o.clone();
    if params.r == 2 {
        result = rc4::crypt(&hash, &result);
    } else {
        for i in (0u8..=19).rev() {
            let round_key: Vec<u8> = hash.iter().map(|b| b ^ i).collect();
            result = rc4::crypt(&round_key, &result);
        }
    }
    Ok(result)
}

/// ISO 32000-2 Algorithm 2.A/2.B: AES-256 (R 5/6) authentication and key unwrap.
fn authenticate_r6_with_role(params: &Parameters, password: &str) -> Result<(Vec<u8>, bool), DecryptError> {
    let normalized = stringprep::saslprep(password)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| password.to_string());
    let password_bytes = normalized.as_bytes();

    if params.u.len() < 48 {
        return Err(DecryptError::MissingField("U"));
    }
    let u_hash = &params.u[0..32];
    let u_validation_salt = &params.u[32..40];
    let u_key_salt = &params.u[40..48];

    let hardened = params.r >= 6;
    if hash_r56(password_bytes, u_validation_salt, &[], hardened) == u_hash {
        let intermediate = hash_r56(password_bytes, u_key_salt, &[], hardened);
        let ue = params.ue.as_ref().ok_or(DecryptError::MissingField("UE"))?;
        return unwrap_aes256_key(&intermediate, ue).map(|key| (key, false));
    }

    if params.o.len() >= 48 {
        let o_hash = &params.o[0..32];
        let o_validation_salt = &params.o[32..40];
        let o_key_salt = &params.o[40..48];
        if hash_r56(password_bytes, o_validation_salt, &params.u, hardened) == o_hash {
            let intermediate = hash_r56(password_bytes, o_key_salt, &params.u, hardened);
            let oe = params.oe.as_ref().ok_or(DecryptError::MissingField("OE"))?;
            return unwrap_aes256_key(&intermediate, oe).map(|key| (key, true));
        }
    }

    Err(DecryptError::InvalidPassword)
}

/// Algorithm 2.B: the hardened SHA-256/384/512 hash loop used by R 6 (and the
/// single unhardened SHA-256 pass used by the deprecated R 5 extension).
fn hash_r56(password: &[u8], salt: &[u8], udata: &[u8], hardened: bool) -> Vec<u8> {
    let mut k: Vec<u8> = {
        let mut hasher = Sha256::new();
        hasher.update(password);
        hasher.update(salt);
        hasher.update(udata);
        hasher.finalize().to_vec()
    };

    if !hardened {
        return k;
    }

    let mut round = 0u32;
    loop {
        let mut k1 = Vec::with_capacity(64 * (password.len() + k.len() + udata.len()));
        for _ in 0..64 {
            k1.extend_from_slice(password);
            k1.extend_from_slice(&k);
            k1.extend_from_slice(udata);
        }

        let encryptor = cbc::Encryptor::<aes::Aes128>::new_from_slices(&k[0..16], &k[16..32])
            .expect("16-byte key and IV always valid for AES-128-CBC");
        let e = encryptor.encrypt_padded_vec_mut::<NoPadding>(&k1);

        let modulus: u32 = e[..16].iter().map(|&b| b as u32).sum::<u32>() % 3;
        k = match modulus {
            0 => Sha256::digest(&e).to_vec(),
            1 => Sha384::digest(&e).to_vec(),
            _ => Sha512::digest(&e).to_vec(),
        };

        round += 1;
        if round >= 64 && (*e.last().unwrap_or(&0) as u32) <= round - 32 {
            break;
        }
    }

    k.truncate(32);
    k
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_r2_authenticate_accepts_the_password_its_own_key_derivation_produces() {
        let mut params = Parameters {
            v: 1,
            r: 2,
            length_bytes: 5,
            o: vec![0x7Au8; 32],
            u: Vec::new(),
            oe: None,
            ue: None,
            p: -3392,
            id0: b"0123456789ABCDEF".to_vec(),
            encrypt_metadata: true,
            cipher: StreamCipher::Rc4,
        };

        let padded = pad_password(b"");
        let file_key = compute_file_key_legacy(&params, &padded);
        params.u = rc4::crypt(&file_key, &PAD);

        let (key, is_owner) = authenticate_with_role(&params, "").expect("empty user password should authenticate");
        assert_eq!(key, file_key);
        assert!(!is_owner);
    }

    #[test]
    fn legacy_r2_authenticate_rejects_wrong_password() {
        let mut params = Parameters {
            v: 1,
            r: 2,
            length_bytes: 5,
            o: vec![0x11u8; 32],
            u: Vec::new(),
            oe: None,
            ue: None,
            p: -3392,
            id0: b"0123456789ABCDEF".to_vec(),
            encrypt_metadata: true,
            cipher: StreamCipher::Rc4,
        };
        let padded = pad_password(b"correct horse");
        let file_key = compute_file_key_legacy(&params, &padded);
        params.u = rc4::crypt(&file_key, &PAD);

        assert!(authenticate_with_role(&params, "wrong password").is_err());
    }

    #[test]
    fn r6_authenticate_unwraps_the_file_key_it_was_wrapped_with() {
        let password = "abc";
        let file_key = [0x11u8; 32];
        let validation_salt = [0x01u8; 8];
        let key_salt = [0x02u8; 8];

        let u_hash = hash_r56(password.as_bytes(), &validation_salt, &[], true);
        let intermediate = hash_r56(password.as_bytes(), &key_salt, &[], true);

        let encryptor = cbc::Encryptor::<aes::Aes256>::new_from_slices(&intermediate, &[0u8; 16]).unwrap();
        let ue = encryptor.encrypt_padded_vec_mut::<NoPadding>(&file_key);
        assert_eq!(ue.len(), 32);

        let mut u = Vec::with_capacity(48);
        u.extend_from_slice(&u_hash);
        u.extend_from_slice(&validation_salt);
        u.extend_from_slice(&key_salt);

        let params = Parameters {
            v: 5,
            r: 6,
            length_bytes: 32,
            o: Vec::new(),
            u,
            oe: None,
            ue: Some(ue),
            p: -1,
            id0: Vec::new(),
            encrypt_metadata: true,
            cipher: StreamCipher::Aes256,
        };

        let (key, is_owner) = authenticate_with_role(&params, password).expect("password should unwrap UE");
        assert_eq!(key, file_key.to_vec());
        assert!(!is_owner);
    }

    #[test]
    fn r6_authenticate_rejects_wrong_password() {
        let password = "abc";
        let validation_salt = [0x01u8; 8];
        let mut u = hash_r56(password.as_bytes(), &validation_salt, &[], true);
        u.extend_from_slice(&validation_salt);
        u.extend_from_slice(&[0x02u8; 8]);

        let params = Parameters {
            v: 5,
            r: 6,
            length_bytes: 32,
            o: Vec::new(),
            u,
            oe: None,
            ue: Some(vec![0u8; 32]),
            p: -1,
            id0: Vec::new(),
            encrypt_metadata: true,
            cipher: StreamCipher::Aes256,
        };

        assert!(authenticate_with_role(&params, "definitely not abc").is_err());
    }
}

fn unwrap_aes256_key(intermediate: &[u8], wrapped: &[u8]) -> Result<Vec<u8>, DecryptError> {
    if wrapped.len() != 32 {
        return Err(DecryptError::CipherFailure("UE/OE must be exactly 32 bytes".to_string()));
    }
    let decryptor = cbc::Decryptor::<aes::Aes256>::new_from_slices(intermediate, &[0u8; 16])
        .map_err(|e| DecryptError::CipherFailure(format!("invalid AES-256 key: {e}")))?;
    let mut buf = wrapped.to_vec();
    decryptor
        .decrypt_padded_mut::<NoPadding>(&mut buf)
        .map(|out| out.to_vec())
        .map_err(|e| DecryptError::CipherFailure(format!("AES-256 key unwrap failed: {e}")))
}
