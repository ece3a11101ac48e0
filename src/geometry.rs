// geometry.rs - sphinx packet geometry
// Copyright (C) 2018  David Stainton.

//! The geometry describes every length in a Sphinx packet. It is
//! derived once from the public key size, the forward payload length
//! and the hop count, and is then read only.

use serde::{Deserialize, Serialize};

use super::commands::{NEXT_NODE_HOP_SIZE, RECIPIENT_SIZE, SURB_REPLY_SIZE};
use super::constants::{
    AD_SIZE, FORWARD_PAYLOAD_SIZE, GROUP_ELEMENT_SIZE, MAX_HOPS, NODE_ID_SIZE, PAYLOAD_TAG_SIZE,
};
use super::error::GeometryError;
use super::internal_crypto::{MAC_SIZE, SPRP_KEY_SIZE, SPRP_MIN_BLOCK_SIZE};

/// Packet layout parameters, serializable so that deployments can
/// keep them in their configuration files.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    /// The maximum number of hops a packet may traverse.
    pub nr_hops: usize,
    /// The size of a marshaled NIKE public key, the group element.
    pub public_key_size: usize,
    pub per_hop_routing_info_length: usize,
    pub routing_info_length: usize,
    pub header_length: usize,
    /// The length of the user controlled part of the payload.
    pub forward_payload_length: usize,
    pub payload_tag_length: usize,
    pub mac_length: usize,
    pub next_node_hop_length: usize,
    pub surb_length: usize,
    pub packet_length: usize,
}

impl Geometry {
    /// Compute a geometry whose per hop routing info fits a Recipient
    /// and a SURBReply command.
    pub fn new(
        public_key_size: usize,
        forward_payload_length: usize,
        nr_hops: usize,
    ) -> Result<Geometry, GeometryError> {
        let per_hop_routing_info_length = RECIPIENT_SIZE + SURB_REPLY_SIZE;
        let routing_info_length = per_hop_routing_info_length * nr_hops;
        let header_length = AD_SIZE + public_key_size + routing_info_length + MAC_SIZE;
        let geometry = Geometry {
            nr_hops,
            public_key_size,
            per_hop_routing_info_length,
            routing_info_length,
            header_length,
            forward_payload_length,
            payload_tag_length: PAYLOAD_TAG_SIZE,
            mac_length: MAC_SIZE,
            next_node_hop_length: NEXT_NODE_HOP_SIZE,
            surb_length: header_length + NODE_ID_SIZE + SPRP_KEY_SIZE,
            packet_length: header_length + PAYLOAD_TAG_SIZE + forward_payload_length,
        };
        geometry.validate()?;
        Ok(geometry)
    }

    /// Check that the derived lengths agree with each other. A geometry
    /// read from a config file should be validated before use.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if self.nr_hops == 0 {
            return Err(GeometryError::ZeroHops);
        }
        if self.per_hop_routing_info_length < NEXT_NODE_HOP_SIZE {
            return Err(GeometryError::PerHopRoutingInfoTooSmall {
                got: self.per_hop_routing_info_length,
                min: NEXT_NODE_HOP_SIZE,
            });
        }
        check("mac_length", self.mac_length, MAC_SIZE)?;
        check("payload_tag_length", self.payload_tag_length, PAYLOAD_TAG_SIZE)?;
        check("next_node_hop_length", self.next_node_hop_length, NEXT_NODE_HOP_SIZE)?;
        check(
            "routing_info_length",
            self.routing_info_length,
            self.nr_hops * self.per_hop_routing_info_length,
        )?;
        check(
            "header_length",
            self.header_length,
            AD_SIZE + self.public_key_size + self.routing_info_length + self.mac_length,
        )?;
        check(
            "packet_length",
            self.packet_length,
            self.header_length + self.payload_tag_length + self.forward_payload_length,
        )?;
        check(
            "surb_length",
            self.surb_length,
            self.header_length + NODE_ID_SIZE + SPRP_KEY_SIZE,
        )?;
        let payload_length = self.payload_tag_length + self.forward_payload_length;
        if payload_length <= SPRP_MIN_BLOCK_SIZE {
            return Err(GeometryError::PayloadTooSmall(payload_length));
        }
        Ok(())
    }

    /// The tag and the forward payload, the part of the packet the SPRP
    /// encrypts.
    pub fn payload_length(&self) -> usize {
        self.payload_tag_length + self.forward_payload_length
    }
}

fn check(field: &'static str, got: usize, want: usize) -> Result<(), GeometryError> {
    if got != want {
        return Err(GeometryError::Inconsistent { field, got, want });
    }
    Ok(())
}

impl Default for Geometry {
    /// 5 hops, 2000 byte forward payload and X25519 group elements.
    fn default() -> Self {
        let per_hop_routing_info_length = RECIPIENT_SIZE + SURB_REPLY_SIZE;
        let routing_info_length = per_hop_routing_info_length * MAX_HOPS;
        let header_length = AD_SIZE + GROUP_ELEMENT_SIZE + routing_info_length + MAC_SIZE;
        Geometry {
            nr_hops: MAX_HOPS,
            public_key_size: GROUP_ELEMENT_SIZE,
            per_hop_routing_info_length,
            routing_info_length,
            header_length,
            forward_payload_length: FORWARD_PAYLOAD_SIZE,
            payload_tag_length: PAYLOAD_TAG_SIZE,
            mac_length: MAC_SIZE,
            next_node_hop_length: NEXT_NODE_HOP_SIZE,
            surb_length: header_length + NODE_ID_SIZE + SPRP_KEY_SIZE,
            packet_length: header_length + PAYLOAD_TAG_SIZE + FORWARD_PAYLOAD_SIZE,
        }
    }
}
