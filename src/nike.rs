// nike.rs - non-interactive key exchange abstraction
// Copyright (C) 2018  David Stainton.

//! The Sphinx packet format is parameterized by a NIKE, a
//! non-interactive key exchange whose public keys can be blinded.
//! [`X25519Nike`] is the default scheme.

use rand_core::{CryptoRng, RngCore};
use zeroize::{Zeroize, Zeroizing};

use super::ecdh::{self, CURVE25519_SIZE};
use super::error::NikeError;

/// The operations Sphinx needs from a key exchange scheme.
pub trait NikeScheme {
    /// Client side, blinded shared secrets travel in this type too.
    type PublicKey: Clone + AsRef<[u8]> + Zeroize;
    type PrivateKey;

    /// A stable name for the scheme, mixed into the KDF.
    fn name(&self) -> &'static str;

    fn public_key_size(&self) -> usize;

    /// Also the size of a blinding factor.
    fn private_key_size(&self) -> usize;

    fn generate_keypair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(Self::PublicKey, Self::PrivateKey), NikeError>;

    fn derive_secret(&self, private_key: &Self::PrivateKey, public_key: &Self::PublicKey) -> Zeroizing<Vec<u8>>;

    /// Blind `public_key` by `blinding_factor`, which is always
    /// `private_key_size()` bytes long.
    fn blind(&self, public_key: &Self::PublicKey, blinding_factor: &[u8]) -> Self::PublicKey;

    fn marshal_public_key<'a>(&self, public_key: &'a Self::PublicKey) -> &'a [u8] {
        public_key.as_ref()
    }

    fn unmarshal_public_key(&self, b: &[u8]) -> Result<Self::PublicKey, NikeError>;
}

/// X25519 as a Sphinx NIKE.
#[derive(Clone, Copy, Debug, Default)]
pub struct X25519Nike;

impl NikeScheme for X25519Nike {
    type PublicKey = ecdh::PublicKey;
    type PrivateKey = ecdh::PrivateKey;

    fn name(&self) -> &'static str {
        "x25519"
    }

    fn public_key_size(&self) -> usize {
        CURVE25519_SIZE
    }

    fn private_key_size(&self) -> usize {
        CURVE25519_SIZE
    }

    fn generate_keypair<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(ecdh::PublicKey, ecdh::PrivateKey), NikeError> {
        let private_key = ecdh::PrivateKey::generate(rng);
        Ok((private_key.public_key(), private_key))
    }

    fn derive_secret(&self, private_key: &ecdh::PrivateKey, public_key: &ecdh::PublicKey) -> Zeroizing<Vec<u8>> {
        let shared = private_key.exp(public_key);
        Zeroizing::new(shared.to_vec())
    }

    /// # Panics
    ///
    /// If `blinding_factor` is not 32 bytes long.
    fn blind(&self, public_key: &ecdh::PublicKey, blinding_factor: &[u8]) -> ecdh::PublicKey {
        let mut factor = Zeroizing::new([0u8; CURVE25519_SIZE]);
        factor.copy_from_slice(blinding_factor);
        public_key.blind(&factor)
    }

    fn unmarshal_public_key(&self, b: &[u8]) -> Result<ecdh::PublicKey, NikeError> {
        ecdh::PublicKey::from_bytes(b)
    }
}
