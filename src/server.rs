// server.rs - Sphinx server side function(s)
// Copyright (C) 2018  David Anthony Stainton.
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Sphinx packet processing.
//!
//! Mix nodes process incoming packets by unwrapping one layer: the
//! header is authenticated and decrypted, the per hop routing commands
//! are parsed and the payload is decrypted. If the commands name a next
//! hop the packet is rewritten in place for forwarding, otherwise the
//! payload is delivered.
//!
//! A packet that fails to unwrap MUST be discarded. The returned replay
//! tag should be checked against the node's replay cache before acting
//! on a successfully unwrapped packet.

use subtle::ConstantTimeEq;
use tracing::{debug, trace};
use zeroize::Zeroizing;

use super::commands::{parse_routing_commands, NextNodeHop, RoutingCommand, SURBReply};
use super::constants::{AD_SIZE, V0_AD};
use super::error::{SphinxUnwrapError, UnwrapFailure};
use super::internal_crypto::{hash, hmac, kdf, sprp_decrypt, StreamCipher, HASH_SIZE, SPRP_MIN_BLOCK_SIZE};
use super::nike::NikeScheme;
use super::sphinx::Sphinx;
use super::utils::ct_is_zero;

/// SHA-512/256 of a packet's group element.
pub type ReplayTag = [u8; HASH_SIZE];

/// What the node should do with an unwrapped packet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnwrapAction {
    /// The rewritten packet, to be sent to the NextNodeHop.
    Forward(Vec<u8>),
    /// The payload for the local recipient. Without a SURBReply the tag
    /// has been checked and stripped, with one the payload is still
    /// encrypted for the SURB creator and carries its tag.
    Deliver(Vec<u8>),
}

#[derive(Clone, Debug)]
pub struct UnwrappedPacket {
    pub replay_tag: ReplayTag,
    pub commands: Vec<RoutingCommand>,
    pub action: UnwrapAction,
}

impl UnwrappedPacket {
    pub fn next_node_hop(&self) -> Option<&NextNodeHop> {
        self.commands.iter().find_map(|cmd| match cmd {
            RoutingCommand::NextNodeHop(c) => Some(c),
            _ => None,
        })
    }

    pub fn surb_reply(&self) -> Option<&SURBReply> {
        self.commands.iter().find_map(|cmd| match cmd {
            RoutingCommand::SURBReply(c) => Some(c),
            _ => None,
        })
    }

    /// The delivered payload, if this hop is the terminal one.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.action {
            UnwrapAction::Deliver(payload) => Some(payload),
            UnwrapAction::Forward(_) => None,
        }
    }

    /// The packet to forward, if this hop is not the terminal one.
    pub fn packet(&self) -> Option<&[u8]> {
        match &self.action {
            UnwrapAction::Forward(packet) => Some(packet),
            UnwrapAction::Deliver(_) => None,
        }
    }
}

fn fail(replay_tag: Option<ReplayTag>, error: SphinxUnwrapError) -> UnwrapFailure {
    debug!(error = %error, "sphinx packet unwrap failed");
    UnwrapFailure { replay_tag, error }
}

impl<N: NikeScheme> Sphinx<N> {
    /// unwrap a layer of sphinx packet encryption
    ///
    /// # Arguments
    ///
    /// * `private_key` - the node's NIKE private key
    /// * `packet` - a Sphinx packet, consumed; for forwarding it is
    ///    rewritten in place and handed back in `UnwrapAction::Forward`
    ///
    /// # Errors
    ///
    /// * `UnwrapFailure` - carries the replay tag whenever the group
    ///    element could be parsed
    pub fn unwrap_packet(
        &self,
        private_key: &N::PrivateKey,
        mut packet: Vec<u8>,
    ) -> Result<UnwrappedPacket, UnwrapFailure> {
        let geometry = self.geometry();
        let nike = self.nike();
        let offsets = self.offsets();

        // Do some basic sanity checking, and validate the AD.
        if packet.len() < geometry.header_length {
            return Err(fail(None, SphinxUnwrapError::TruncatedPacket));
        }
        if packet[..AD_SIZE].ct_eq(&V0_AD[..]).unwrap_u8() == 0 {
            return Err(fail(None, SphinxUnwrapError::UnknownVersion));
        }

        // Calculate the hop's shared secret, and replay_tag.
        let group_element = nike
            .unmarshal_public_key(&packet[offsets.group_element..offsets.routing_info])
            .map_err(|e| fail(None, SphinxUnwrapError::InvalidGroupElement(e)))?;
        let shared_secret = nike.derive_secret(private_key, &group_element);
        let replay_tag = hash(nike.marshal_public_key(&group_element));
        let tag = Some(replay_tag);

        // Derive the various keys required for packet processing.
        let keys = kdf(&shared_secret, nike.name(), nike.private_key_size())
            .map_err(|_| fail(tag, SphinxUnwrapError::KeyDerivation))?;

        // Validate the Sphinx Packet Header.
        let mac = hmac(&keys.header_mac, &[&packet[..offsets.mac]]);
        if mac[..].ct_eq(&packet[offsets.mac..offsets.payload]).unwrap_u8() == 0 {
            return Err(fail(tag, SphinxUnwrapError::MacMismatch));
        }

        // Append padding to preserve length invariance, decrypt the (padded)
        // routing_info block, and extract the section for the current hop.
        let per_hop = geometry.per_hop_routing_info_length;
        let mut b = Zeroizing::new(vec![0u8; geometry.routing_info_length + per_hop]);
        b[..geometry.routing_info_length].copy_from_slice(&packet[offsets.routing_info..offsets.mac]);
        StreamCipher::new(&keys.header_encryption, &keys.header_encryption_iv).xor_key_stream(&mut b);
        let (cmd_buf, new_routing_info) = b.split_at(per_hop);

        // Parse the per-hop routing commands.
        let (commands, next_node_hop, surb_reply) =
            parse_routing_commands(cmd_buf).map_err(|e| fail(tag, e))?;

        // Decrypt the Sphinx Packet Payload. A payload too short for the
        // SPRP can not hold a tag either.
        let payload_length = packet.len() - offsets.payload;
        if payload_length > 0 {
            if payload_length <= SPRP_MIN_BLOCK_SIZE {
                return Err(fail(tag, SphinxUnwrapError::TruncatedPayload));
            }
            sprp_decrypt(&keys.payload_encryption, &mut packet[offsets.payload..])
                .map_err(|e| fail(tag, SphinxUnwrapError::PayloadDecrypt(e)))?;
        }

        // Transform the packet for forwarding to the next mix, iff the
        // routing commands included a NextNodeHop.
        let action = match next_node_hop {
            Some(next) => {
                let blinded = nike.blind(&group_element, &keys.blinding_factor);
                packet[offsets.group_element..offsets.routing_info]
                    .copy_from_slice(nike.marshal_public_key(&blinded));
                packet[offsets.routing_info..offsets.mac].copy_from_slice(new_routing_info);
                packet[offsets.mac..offsets.payload].copy_from_slice(&next.mac);
                trace!(commands = commands.len(), "sphinx packet unwrapped, forwarding");
                UnwrapAction::Forward(packet)
            }
            None => {
                let tag_length = geometry.payload_tag_length;
                if payload_length < tag_length {
                    return Err(fail(tag, SphinxUnwrapError::TruncatedPayload));
                }
                // Validate the payload tag, iff this is not a SURB reply.
                let payload_start = match surb_reply {
                    None => {
                        if !ct_is_zero(&packet[offsets.payload..offsets.payload + tag_length]) {
                            return Err(fail(tag, SphinxUnwrapError::InvalidTag));
                        }
                        offsets.payload + tag_length
                    }
                    Some(_) => offsets.payload,
                };
                packet.drain(..payload_start);
                trace!(
                    commands = commands.len(),
                    surb_reply = surb_reply.is_some(),
                    "sphinx packet unwrapped, delivering"
                );
                UnwrapAction::Deliver(packet)
            }
        };

        Ok(UnwrappedPacket {
            replay_tag,
            commands,
            action,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::PathHop;
    use crate::commands::{NodeDelay, Recipient};
    use crate::constants::{FORWARD_PAYLOAD_SIZE, HEADER_SIZE, NODE_ID_SIZE, PACKET_SIZE, RECIPIENT_ID_SIZE};
    use crate::ecdh::PrivateKey;
    use crate::nike::X25519Nike;
    use rand::rngs::OsRng;

    fn one_hop() -> (PrivateKey, Vec<PathHop>) {
        let (public_key, private_key) = X25519Nike.generate_keypair(&mut OsRng).unwrap();
        let hop = PathHop {
            id: [1u8; NODE_ID_SIZE],
            public_key,
            commands: vec![
                RoutingCommand::NodeDelay(NodeDelay { delay: 10 }),
                RoutingCommand::Recipient(Recipient { id: [2u8; RECIPIENT_ID_SIZE] }),
            ],
        };
        (private_key, vec![hop])
    }

    #[test]
    fn unwrap_single_hop_test() {
        let s: Sphinx = Sphinx::default();
        let (private_key, path) = one_hop();
        let payload = vec![0x61u8; FORWARD_PAYLOAD_SIZE];
        let packet = s.new_packet(&mut OsRng, &path, &payload).unwrap();
        assert_eq!(packet.len(), PACKET_SIZE);

        let unwrapped = s.unwrap_packet(&private_key, packet.clone()).unwrap();
        assert_eq!(unwrapped.payload(), Some(&payload[..]));
        assert!(unwrapped.next_node_hop().is_none());
        assert!(unwrapped.surb_reply().is_none());
        assert_eq!(unwrapped.commands, path[0].commands);
        assert_eq!(unwrapped.replay_tag, hash(&packet[2..34]));
    }

    #[test]
    fn unwrap_header_only_test() {
        // A bare header carries no payload to check the tag of.
        let s: Sphinx = Sphinx::default();
        let (private_key, path) = one_hop();
        let (header, _) = s.create_header(&mut OsRng, &path).unwrap();
        let failure = s.unwrap_packet(&private_key, header).unwrap_err();
        assert!(failure.replay_tag.is_some());
        match failure.error {
            SphinxUnwrapError::TruncatedPayload => {}
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn unwrap_short_payload_test() {
        let s: Sphinx = Sphinx::default();
        let (private_key, path) = one_hop();
        let (header, _) = s.create_header(&mut OsRng, &path).unwrap();

        for payload_length in [1, 10, SPRP_MIN_BLOCK_SIZE] {
            let mut packet = header.clone();
            packet.resize(HEADER_SIZE + payload_length, 0);
            let failure = s.unwrap_packet(&private_key, packet).unwrap_err();
            assert!(failure.replay_tag.is_some());
            match failure.error {
                SphinxUnwrapError::TruncatedPayload => {}
                other => panic!("unexpected error for {} byte payload: {:?}", payload_length, other),
            }
        }

        // Long enough for the SPRP, the garbage payload then fails the tag.
        let mut packet = header;
        packet.resize(HEADER_SIZE + SPRP_MIN_BLOCK_SIZE + 1, 0);
        let failure = s.unwrap_packet(&private_key, packet).unwrap_err();
        assert!(matches!(failure.error, SphinxUnwrapError::InvalidTag));
    }

    #[test]
    fn unwrap_validation_test() {
        let s: Sphinx = Sphinx::default();
        let (private_key, path) = one_hop();
        let packet = s.new_packet(&mut OsRng, &path, &[0u8; FORWARD_PAYLOAD_SIZE]).unwrap();

        let failure = s.unwrap_packet(&private_key, packet[..HEADER_SIZE - 1].to_vec()).unwrap_err();
        assert!(failure.replay_tag.is_none());
        assert!(matches!(failure.error, SphinxUnwrapError::TruncatedPacket));

        let mut bad_version = packet.clone();
        bad_version[1] = 1;
        let failure = s.unwrap_packet(&private_key, bad_version).unwrap_err();
        assert!(failure.replay_tag.is_none());
        assert!(matches!(failure.error, SphinxUnwrapError::UnknownVersion));

        let mut bad_mac = packet;
        bad_mac[HEADER_SIZE - 1] ^= 0x01;
        let failure = s.unwrap_packet(&private_key, bad_mac).unwrap_err();
        assert!(failure.replay_tag.is_some());
        assert!(matches!(failure.error, SphinxUnwrapError::MacMismatch));
    }
}
