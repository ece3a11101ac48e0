// sphinx.rs - sphinx cryptographic packet format
// Copyright (C) 2018  David Stainton.

//! The [`Sphinx`] type ties a NIKE scheme to a packet geometry. Packet
//! creation lives in [`client`](crate::client) and packet processing in
//! [`server`](crate::server).

use super::constants::AD_SIZE;
use super::error::GeometryError;
use super::geometry::Geometry;
use super::nike::{NikeScheme, X25519Nike};

/// A Sphinx packet format instance with a pluggable NIKE.
#[derive(Clone, Debug)]
pub struct Sphinx<N: NikeScheme = X25519Nike> {
    nike: N,
    geometry: Geometry,
}

impl<N: NikeScheme> Sphinx<N> {
    /// Create a new instance, rejecting geometries that are internally
    /// inconsistent or sized for a different group element.
    pub fn new(nike: N, geometry: Geometry) -> Result<Sphinx<N>, GeometryError> {
        geometry.validate()?;
        if geometry.public_key_size != nike.public_key_size() {
            return Err(GeometryError::PublicKeySizeMismatch {
                scheme: nike.public_key_size(),
                geometry: geometry.public_key_size,
            });
        }
        Ok(Sphinx { nike, geometry })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn nike(&self) -> &N {
        &self.nike
    }

    pub(crate) fn offsets(&self) -> Offsets {
        let group_element = AD_SIZE;
        let routing_info = group_element + self.geometry.public_key_size;
        let mac = routing_info + self.geometry.routing_info_length;
        Offsets {
            group_element,
            routing_info,
            mac,
            payload: mac + self.geometry.mac_length,
        }
    }
}

impl Default for Sphinx<X25519Nike> {
    fn default() -> Self {
        Sphinx {
            nike: X25519Nike,
            geometry: Geometry::default(),
        }
    }
}

/// Byte offsets of the packet fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Offsets {
    pub group_element: usize,
    pub routing_info: usize,
    pub mac: usize,
    pub payload: usize,
}
