//! Decrypts strings and stream payloads against a PDF's `/Encrypt`
//! dictionary: RC4, AES-128-CBC and AES-256-CBC, standard security handler
//! revisions 2-6.

mod permissions;
mod pkcs5;
mod rc4;
mod standard_security_handler;

use aes::cipher::{block_padding::NoPadding, BlockDecryptMut, KeyIvInit};
use md5::{Digest, Md5};

use self::standard_security_handler::StreamCipher;
use crate::error::DecryptError;
use crate::object::{Dictionary, Object, ObjectId};
use crate::Document;

pub use permissions::Permissions;

type Aes128CbcDec = cbc::Decryptor<aes::Aes128>;

/// Everything the crypter needs once a password has authenticated: the
/// file-encryption key and the negotiated cipher. Strings and streams are
/// decrypted lazily, the first time an object materializes.
#[derive(Debug, Clone)]
pub struct EncryptionState {
    file_key: Vec<u8>,
    cipher: StreamCipher,
}

impl EncryptionState {
    /// Resolve `/Encrypt`, derive its parameters, and authenticate `password`
    /// (empty string tries the "no password" case first).
    pub fn decode(document: &Document, password: &str) -> Result<Self, DecryptError> {
        let encrypt_dict = resolve_encrypt_dict(document)?;
        let params = standard_security_handler::read_parameters(document, encrypt_dict)?;
        let file_key = standard_security_handler::authenticate(&params, password)?;

        Ok(EncryptionState { file_key, cipher: params.cipher })
    }

    pub fn file_key(&self) -> &[u8] {
        &self.file_key
    }
}

fn resolve_encrypt_dict(document: &Document) -> Result<&Dictionary, DecryptError> {
    let encrypt_obj = document
        .trailer
        .get_opt(b"Encrypt")
        .ok_or(DecryptError::MissingField("Encrypt"))?;

    if let Some(id) = encrypt_obj.as_reference().ok() {
        document
            .objects
            .get(&id)
            .ok_or(DecryptError::MissingField("Encrypt"))?
            .as_dict()
            .map_err(|_| DecryptError::MissingField("Encrypt"))
    } else {
        encrypt_obj.as_dict().map_err(|_| DecryptError::MissingField("Encrypt"))
    }
}

/// Authenticate `password` and return the access-permission bitfield it
/// grants: the owner password always yields [`Permissions::all`], the user
/// password yields whatever `/P` stores (ISO 32000-1 7.6.3.2).
pub fn check_access_rights(document: &Document, password: &str) -> Result<Permissions, DecryptError> {
    let encrypt_dict = resolve_encrypt_dict(document)?;
    let params = standard_security_handler::read_parameters(document, encrypt_dict)?;
    let (_, is_owner) = standard_security_handler::authenticate_with_role(&params, password)?;

    if is_owner {
        Ok(Permissions::all())
    } else {
        Ok(Permissions::from_bits_truncate(params.p as u32))
    }
}

fn object_key(state: &EncryptionState, id: ObjectId) -> Vec<u8> {
    if state.cipher == StreamCipher::Aes256 {
        // R=6 (AES-256) uses the file key directly; no per-object salting.
        return state.file_key.clone();
    }

    let mut hasher = Md5::new();
    hasher.update(&state.file_key);
    hasher.update((id.0 & 0xFF_FFFF).to_le_bytes()[..3].to_vec());
    hasher.update(id.1.to_le_bytes());
    if state.cipher == StreamCipher::Aes128 {
        hasher.update(b"sAlT");
    }
    let digest = hasher.finalize();
    let n = (state.file_key.len() + 5).min(16);
    digest[..n].to_vec()
}

fn decrypt_bytes(state: &EncryptionState, key: &[u8], data: &[u8]) -> Result<Vec<u8>, DecryptError> {
    match state.cipher {
        StreamCipher::Identity => Ok(data.to_vec()),
        StreamCipher::Rc4 => Ok(rc4::crypt(key, data)),
        StreamCipher::Aes128 | StreamCipher::Aes256 => {
            if data.len() < 16 {
                return Err(DecryptError::CipherFailure("AES ciphertext shorter than one IV".to_string()));
            }
            let (iv, ciphertext) = data.split_at(16);
            let mut buf = ciphertext.to_vec();
            if state.cipher == StreamCipher::Aes128 {
                let decryptor = Aes128CbcDec::new_from_slices(key, iv)
                    .map_err(|e| DecryptError::CipherFailure(format!("bad AES-128 key/IV: {e}")))?;
                let out = decryptor
                    .decrypt_padded_mut::<pkcs5::Pkcs5>(&mut buf)
                    .map_err(|e| DecryptError::CipherFailure(format!("AES-128-CBC decrypt failed: {e}")))?;
                Ok(out.to_vec())
            } else {
                let decryptor = cbc::Decryptor::<aes::Aes256>::new_from_slices(key, iv)
                    .map_err(|e| DecryptError::CipherFailure(format!("bad AES-256 key/IV: {e}")))?;
                let out = decryptor
                    .decrypt_padded_mut::<NoPadding>(&mut buf)
                    .map_err(|e| DecryptError::CipherFailure(format!("AES-256-CBC decrypt failed: {e}")))?;
                Ok(unpad_pkcs7_tolerant(out))
            }
        }
    }
}

/// AES-256-CBC strings/streams are PKCS#7-padded in practice even though we
/// decrypt with `NoPadding` to tolerate the same one-byte-short edge case
/// `Pkcs5` handles for AES-128; strip the padding by hand afterward.
fn unpad_pkcs7_tolerant(data: &[u8]) -> Vec<u8> {
    match data.last() {
        Some(&n) if n as usize > 0 && (n as usize) <= data.len() => data[..data.len() - n as usize].to_vec(),
        _ => data.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes::cipher::BlockEncryptMut;

    fn state_with(cipher: StreamCipher, file_key: Vec<u8>) -> EncryptionState {
        EncryptionState { file_key, cipher }
    }

    #[test]
    fn object_key_aes256_is_the_file_key_unsalted() {
        let state = state_with(StreamCipher::Aes256, vec![0x42u8; 32]);
        assert_eq!(object_key(&state, (7, 0)), state.file_key);
    }

    #[test]
    fn object_key_varies_with_object_number_and_generation() {
        let state = state_with(StreamCipher::Rc4, vec![0x01u8; 5]);
        let a = object_key(&state, (1, 0));
        let b = object_key(&state, (2, 0));
        let c = object_key(&state, (1, 1));
        assert_ne!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn rc4_decrypt_round_trips() {
        let state = state_with(StreamCipher::Rc4, vec![0xAAu8; 5]);
        let key = object_key(&state, (3, 0));
        let plaintext = b"Hello, encrypted world!";
        let ciphertext = rc4::crypt(&key, plaintext);
        let decrypted = decrypt_bytes(&state, &key, &ciphertext).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes128_decrypt_round_trips() {
        let state = state_with(StreamCipher::Aes128, vec![0x55u8; 16]);
        let key = object_key(&state, (4, 0));
        let iv = [0x24u8; 16];
        let plaintext = b"0123456789abcdef"; // exactly one block
        let encryptor = Aes128CbcEnc::new_from_slices(&key, &iv).unwrap();
        let ciphertext = encryptor.encrypt_padded_vec_mut::<pkcs5::Pkcs5>(plaintext);

        let mut data = iv.to_vec();
        data.extend_from_slice(&ciphertext);
        let decrypted = decrypt_bytes(&state, &key, &data).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn aes256_decrypt_round_trips_and_strips_pkcs7_padding() {
        let state = state_with(StreamCipher::Aes256, vec![0x77u8; 32]);
        let key = object_key(&state, (9, 0));
        let iv = [0x01u8; 16];
        let plaintext = b"a stream payload that is not block aligned";
        let encryptor = cbc::Encryptor::<aes::Aes256>::new_from_slices(&key, &iv).unwrap();
        let ciphertext = encryptor.encrypt_padded_vec_mut::<aes::cipher::block_padding::Pkcs7>(plaintext);

        let mut data = iv.to_vec();
        data.extend_from_slice(&ciphertext);
        let decrypted = decrypt_bytes(&state, &key, &data).unwrap();
        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn decrypt_object_recurses_into_dictionaries_and_streams_once() {
        let state = state_with(StreamCipher::Rc4, vec![0x09u8; 5]);
        let key = object_key(&state, (5, 0));
        let plaintext = b"secret";
        let ciphertext = rc4::crypt(&key, plaintext);

        let mut dict = Dictionary::new();
        dict.set("Secret", Object::string_literal(ciphertext.clone()));
        let mut object = Object::Dictionary(dict);

        decrypt_object(&state, (5, 0), &mut object).unwrap();
        let decoded = object.as_dict().unwrap().get(b"Secret").unwrap().as_str().unwrap();
        assert_eq!(decoded, plaintext);
    }

    type Aes128CbcEnc = cbc::Encryptor<aes::Aes128>;

    #[test]
    fn decrypt_bytes_rejects_ciphertext_shorter_than_one_iv() {
        let state = state_with(StreamCipher::Aes128, vec![0x01u8; 16]);
        assert!(decrypt_bytes(&state, &[0u8; 16], &[0u8; 4]).is_err());
    }
}

/// Recursively decrypt every string and the stream payload (if any) reachable
/// from `object`, in place, using the key derived for `id`.
pub fn decrypt_object(state: &EncryptionState, id: ObjectId, object: &mut Object) -> Result<(), DecryptError> {
    let key = object_key(state, id);
    decrypt_in_place(state, &key, object)
}

fn decrypt_in_place(state: &EncryptionState, key: &[u8], object: &mut Object) -> Result<(), DecryptError> {
    match object {
        Object::String(bytes, _) => {
            *bytes = decrypt_bytes(state, key, bytes)?;
        }
        Object::Array(items) => {
            for item in items.iter_mut() {
                decrypt_in_place(state, key, item)?;
            }
        }
        Object::Dictionary(dict) => {
            for (_, value) in dict.iter_mut() {
                decrypt_in_place(state, key, value)?;
            }
        }
        Object::Stream(stream) => {
            if !stream.decrypted {
                for (_, value) in stream.dict.iter_mut() {
                    decrypt_in_place(state, key, value)?;
                }
                let decrypted = decrypt_bytes(state, key, &stream.content)?;
                stream.content = decrypted;
                stream.decrypted = true;
            }
        }
        _ => {}
    }
    Ok(())
}
