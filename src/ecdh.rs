// ecdh.rs - wrapping library for curve25519 dh operations
// Copyright (C) 2018  David Stainton.

use rand_core::{CryptoRng, RngCore};
use x25519_dalek::StaticSecret;
use zeroize::{Zeroize, Zeroizing};

use super::error::NikeError;

pub const CURVE25519_SIZE: usize = 32;

/// An X25519 public key, which doubles as the Sphinx group element.
/// The client also carries blinded shared secrets in this type, those
/// copies must be wiped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Zeroize)]
pub struct PublicKey {
    key: [u8; CURVE25519_SIZE],
}

impl PublicKey {
    /// Blind the key, a scalar multiplication by `blinding_factor`.
    pub fn blind(&self, blinding_factor: &[u8; CURVE25519_SIZE]) -> PublicKey {
        let factor = StaticSecret::from(*blinding_factor);
        let blinded = factor.diffie_hellman(&x25519_dalek::PublicKey::from(self.key));
        PublicKey {
            key: blinded.to_bytes(),
        }
    }

    pub fn as_bytes(&self) -> &[u8; CURVE25519_SIZE] {
        &self.key
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.key.to_vec()
    }

    pub fn from_bytes(b: &[u8]) -> Result<PublicKey, NikeError> {
        if b.len() != CURVE25519_SIZE {
            return Err(NikeError::InvalidKeyLength {
                got: b.len(),
                want: CURVE25519_SIZE,
            });
        }
        let mut key = [0u8; CURVE25519_SIZE];
        key.copy_from_slice(b);
        Ok(PublicKey { key })
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.key
    }
}

/// An X25519 private key. The secret scalar is wiped on drop.
#[derive(Clone)]
pub struct PrivateKey {
    public_key: PublicKey,
    secret: StaticSecret,
}

impl PrivateKey {
    pub fn generate<R: RngCore + CryptoRng>(rng: &mut R) -> PrivateKey {
        let secret = StaticSecret::random_from_rng(rng);
        let public_key = PublicKey {
            key: x25519_dalek::PublicKey::from(&secret).to_bytes(),
        };
        PrivateKey { public_key, secret }
    }

    pub fn public_key(&self) -> PublicKey {
        self.public_key
    }

    /// Exp calculates the shared secret with the provided public key.
    pub fn exp(&self, public_key: &PublicKey) -> Zeroizing<[u8; CURVE25519_SIZE]> {
        let shared = self.secret.diffie_hellman(&x25519_dalek::PublicKey::from(public_key.key));
        Zeroizing::new(shared.to_bytes())
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; CURVE25519_SIZE]> {
        Zeroizing::new(self.secret.to_bytes())
    }

    pub fn from_bytes(b: &[u8]) -> Result<PrivateKey, NikeError> {
        if b.len() != CURVE25519_SIZE {
            return Err(NikeError::InvalidKeyLength {
                got: b.len(),
                want: CURVE25519_SIZE,
            });
        }
        let mut raw = Zeroizing::new([0u8; CURVE25519_SIZE]);
        raw.copy_from_slice(b);
        let secret = StaticSecret::from(*raw);
        let public_key = PublicKey {
            key: x25519_dalek::PublicKey::from(&secret).to_bytes(),
        };
        Ok(PrivateKey { public_key, secret })
    }
}
