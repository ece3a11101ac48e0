// internal_crypto.rs - sphinx cryptographic primitives
// Copyright (C) 2018  David Stainton.

//! Sphinx crypto primitives: the header stream cipher, the header MAC,
//! the replay tag hash, the per hop KDF and the payload SPRP.

use aes::Aes128;
use ctr::cipher::generic_array::GenericArray;
use ctr::cipher::{KeyIvInit, StreamCipher as _};
use hkdf::Hkdf;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use lioness::{LionessDefault, RAW_KEY_SIZE, STREAM_CIPHER_KEY_SIZE};
use sha2::{Digest, Sha256, Sha512_256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::error::LionessError;

pub const HASH_SIZE: usize = 32;
pub const MAC_KEY_SIZE: usize = 32;
pub const MAC_SIZE: usize = 16;
pub const STREAM_KEY_SIZE: usize = 16;
pub const STREAM_IV_SIZE: usize = 16;
pub const SPRP_KEY_SIZE: usize = RAW_KEY_SIZE;
/// Lioness only accepts blocks longer than this.
pub const SPRP_MIN_BLOCK_SIZE: usize = STREAM_CIPHER_KEY_SIZE;

const HMAC_BLOCK_SIZE: usize = 64;

const KDF_INFO: &[u8] = b"sphinxcrypto-kdf-v0-hkdf-sha256";
const KDF_FIXED_SIZE: usize = MAC_KEY_SIZE + STREAM_KEY_SIZE + STREAM_IV_SIZE + SPRP_KEY_SIZE;

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type HmacSha256 = Hmac<Sha256>;

/// stream cipher for sphinx crypto usage, AES-128 in counter mode
pub struct StreamCipher {
    cipher: Aes128Ctr,
}

impl StreamCipher {
    /// create a new StreamCipher struct
    pub fn new(key: &[u8; STREAM_KEY_SIZE], iv: &[u8; STREAM_IV_SIZE]) -> StreamCipher {
        StreamCipher {
            cipher: Aes128Ctr::new(GenericArray::from_slice(key), GenericArray::from_slice(iv)),
        }
    }

    /// xor the key stream into `data`
    pub fn xor_key_stream(&mut self, data: &mut [u8]) {
        self.cipher.apply_keystream(data);
    }

    /// overwrite `dst` with raw key stream
    pub fn key_stream(&mut self, dst: &mut [u8]) {
        dst.zeroize();
        self.cipher.apply_keystream(dst);
    }
}

/// The keys derived from one hop's shared secret. Every field is
/// wiped when the bundle is dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct PacketKeys {
    pub header_mac: [u8; MAC_KEY_SIZE],
    pub header_encryption: [u8; STREAM_KEY_SIZE],
    pub header_encryption_iv: [u8; STREAM_IV_SIZE],
    pub payload_encryption: [u8; SPRP_KEY_SIZE],
    pub blinding_factor: Vec<u8>,
}

/// Expand a shared secret into the per hop key bundle. The HKDF info
/// string binds the output to the NIKE scheme in use.
pub fn kdf(
    shared_secret: &[u8],
    scheme_name: &str,
    blinding_factor_size: usize,
) -> Result<PacketKeys, hkdf::InvalidLength> {
    let hk = Hkdf::<Sha256>::new(None, shared_secret);
    let mut okm = Zeroizing::new(vec![0u8; KDF_FIXED_SIZE + blinding_factor_size]);
    hk.expand_multi_info(&[KDF_INFO, scheme_name.as_bytes()], &mut okm)?;

    let fixed = array_ref![okm, 0, KDF_FIXED_SIZE];
    let (header_mac, header_encryption, header_encryption_iv, payload_encryption) =
        array_refs![fixed, MAC_KEY_SIZE, STREAM_KEY_SIZE, STREAM_IV_SIZE, SPRP_KEY_SIZE];
    Ok(PacketKeys {
        header_mac: *header_mac,
        header_encryption: *header_encryption,
        header_encryption_iv: *header_encryption_iv,
        payload_encryption: *payload_encryption,
        blinding_factor: okm[KDF_FIXED_SIZE..].to_vec(),
    })
}

/// SHA-512/256, used for replay tags
pub fn hash(input: &[u8]) -> [u8; HASH_SIZE] {
    let digest = Sha512_256::digest(input);
    let mut output = [0u8; HASH_SIZE];
    output.copy_from_slice(&digest);
    output
}

/// HMAC-SHA256 truncated to `MAC_SIZE`, computed over the concatenation of `data`
pub fn hmac(key: &[u8; MAC_KEY_SIZE], data: &[&[u8]]) -> [u8; MAC_SIZE] {
    // Zero padding a short key to the block size leaves HMAC unchanged.
    let mut padded = Zeroizing::new([0u8; HMAC_BLOCK_SIZE]);
    padded[..MAC_KEY_SIZE].copy_from_slice(key);
    let mut m = <HmacSha256 as KeyInit>::new(GenericArray::from_slice(&padded[..]));
    for d in data {
        m.update(d);
    }
    let result = m.finalize().into_bytes();
    let mut out = [0u8; MAC_SIZE];
    out.copy_from_slice(&result[..MAC_SIZE]);
    out
}

fn sprp_error(err: lioness::LionessError) -> LionessError {
    match err {
        lioness::LionessError::BlockSizeError => LionessError::BlockSizeError(SPRP_MIN_BLOCK_SIZE),
    }
}

/// Lioness (ChaCha20, BLAKE2b) encryption of `block` in place.
pub fn sprp_encrypt(key: &[u8; SPRP_KEY_SIZE], block: &mut [u8]) -> Result<(), LionessError> {
    LionessDefault::new_raw(key).encrypt(block).map_err(sprp_error)
}

pub fn sprp_decrypt(key: &[u8; SPRP_KEY_SIZE], block: &mut [u8]) -> Result<(), LionessError> {
    LionessDefault::new_raw(key).decrypt(block).map_err(sprp_error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_cipher_test() {
        let key = [7u8; STREAM_KEY_SIZE];
        let iv = [9u8; STREAM_IV_SIZE];
        let mut ks = [0xffu8; 64];
        StreamCipher::new(&key, &iv).key_stream(&mut ks);

        let mut data = [0u8; 64];
        StreamCipher::new(&key, &iv).xor_key_stream(&mut data);
        assert_eq!(ks, data);

        StreamCipher::new(&key, &iv).xor_key_stream(&mut data);
        assert_eq!(data, [0u8; 64]);
    }

    #[test]
    fn kdf_test() {
        let secret = [3u8; 32];
        let a = kdf(&secret, "x25519", 32).unwrap();
        let b = kdf(&secret, "x25519", 32).unwrap();
        assert_eq!(a.header_mac, b.header_mac);
        assert_eq!(a.payload_encryption[..], b.payload_encryption[..]);
        assert_eq!(a.blinding_factor.len(), 32);
        assert_eq!(a.blinding_factor, b.blinding_factor);

        // The scheme name is part of the HKDF info.
        let c = kdf(&secret, "another-nike", 32).unwrap();
        assert_ne!(a.header_mac, c.header_mac);
    }

    #[test]
    fn hmac_parts_test() {
        let key = [1u8; MAC_KEY_SIZE];
        let whole = hmac(&key, &[b"hello world"]);
        let parts = hmac(&key, &[b"hello", b" ", b"world"]);
        assert_eq!(whole, parts);
        assert_ne!(whole, hmac(&[2u8; MAC_KEY_SIZE], &[b"hello world"]));

        // Same as keying HMAC with the unpadded 32 byte key.
        let mut m = <HmacSha256 as Mac>::new_from_slice(&key).unwrap();
        m.update(b"hello world");
        assert_eq!(whole[..], m.finalize().into_bytes()[..MAC_SIZE]);
    }

    #[test]
    fn hash_test() {
        // SHA-512/256 of the empty string.
        let want = hex::decode("c672b8d1ef56ed28ab87c3622c5114069bdd3ad7b8f9737498d0c01ecef0967a").unwrap();
        assert_eq!(hash(b"")[..], want[..]);
    }

    #[test]
    fn sprp_test() {
        let key = [5u8; SPRP_KEY_SIZE];
        let plaintext = vec![0x42u8; 100];
        let mut block = plaintext.clone();
        sprp_encrypt(&key, &mut block).unwrap();
        assert_ne!(block, plaintext);
        sprp_decrypt(&key, &mut block).unwrap();
        assert_eq!(block, plaintext);

        // Flipping the last plaintext byte changes the head of the block.
        let mut flipped = plaintext.clone();
        flipped[99] ^= 1;
        let mut a = plaintext.clone();
        sprp_encrypt(&key, &mut a).unwrap();
        sprp_encrypt(&key, &mut flipped).unwrap();
        assert_ne!(a[..SPRP_MIN_BLOCK_SIZE], flipped[..SPRP_MIN_BLOCK_SIZE]);
    }

    #[test]
    fn sprp_block_size_test() {
        let key = [5u8; SPRP_KEY_SIZE];
        let mut short = [0u8; SPRP_MIN_BLOCK_SIZE];
        assert_eq!(
            sprp_encrypt(&key, &mut short),
            Err(LionessError::BlockSizeError(SPRP_MIN_BLOCK_SIZE))
        );
        assert_eq!(
            sprp_decrypt(&key, &mut short),
            Err(LionessError::BlockSizeError(SPRP_MIN_BLOCK_SIZE))
        );
        let mut just_enough = [0u8; SPRP_MIN_BLOCK_SIZE + 1];
        assert!(sprp_encrypt(&key, &mut just_enough).is_ok());
    }
}
