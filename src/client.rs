// client.rs - sphinx client
// Copyright 2016 Jeffrey Burdges and David Stainton

//! Sphinx mix client cryptographic operations: building headers,
//! forward packets and Single Use Reply Blocks.

use rand_core::{CryptoRng, RngCore};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::commands::{NextNodeHop, RoutingCommand};
use super::constants::{NODE_ID_SIZE, V0_AD};
use super::ecdh::PublicKey;
use super::error::{
    SphinxDecryptSurbError, SphinxHeaderCreateError, SphinxPacketCreateError,
    SphinxPacketFromSurbError, SphinxSurbCreateError,
};
use super::internal_crypto::{
    hmac, kdf, sprp_decrypt, sprp_encrypt, PacketKeys, StreamCipher, MAC_SIZE, SPRP_KEY_SIZE,
};
use super::nike::NikeScheme;
use super::sphinx::Sphinx;
use super::utils::{ct_is_zero, xor_assign};

/// A hop the packet will traverse, along with the per hop commands.
/// The NextNodeHop command is synthesized by the header builder and
/// must not be supplied here.
#[derive(Clone, Debug)]
pub struct PathHop<P = PublicKey> {
    pub id: [u8; NODE_ID_SIZE],
    pub public_key: P,
    pub commands: Vec<RoutingCommand>,
}

/// The payload encryption key of one hop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SprpKey {
    pub key: [u8; SPRP_KEY_SIZE],
}

impl<N: NikeScheme> Sphinx<N> {
    fn derive_keys(&self, shared_secret: &[u8]) -> Result<PacketKeys, SphinxHeaderCreateError> {
        kdf(shared_secret, self.nike().name(), self.nike().private_key_size())
            .map_err(|_| SphinxHeaderCreateError::KeyDerivation)
    }

    fn commands_to_bytes(&self, cmds: &[RoutingCommand], is_terminal: bool) -> Result<Vec<u8>, SphinxHeaderCreateError> {
        let per_hop = self.geometry().per_hop_routing_info_length;
        let mut b = Vec::with_capacity(per_hop);
        for cmd in cmds {
            if let RoutingCommand::NextNodeHop(_) = cmd {
                return Err(SphinxHeaderCreateError::NextNodeHopCommand);
            }
            cmd.to_bytes(&mut b);
        }
        if b.len() > per_hop {
            return Err(SphinxHeaderCreateError::OversizedRoutingBlock {
                len: b.len(),
                max: per_hop,
            });
        }
        if !is_terminal && per_hop - b.len() < self.geometry().next_node_hop_length {
            return Err(SphinxHeaderCreateError::InsufficientCapacity);
        }
        Ok(b)
    }

    /// Create a Sphinx packet header for `path`.
    ///
    /// # Returns
    ///
    /// * 2-tuple containing (header, per hop payload keys in hop order)
    pub fn create_header<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        path: &[PathHop<N::PublicKey>],
    ) -> Result<(Vec<u8>, Vec<SprpKey>), SphinxHeaderCreateError> {
        let geometry = self.geometry();
        let nike = self.nike();
        let num_hops = path.len();
        if num_hops == 0 {
            return Err(SphinxHeaderCreateError::EmptyPath);
        }
        if num_hops > geometry.nr_hops {
            return Err(SphinxHeaderCreateError::PathTooLong {
                len: num_hops,
                max: geometry.nr_hops,
            });
        }

        // Derive the key material for each hop.
        let (mut client_public_key, client_private_key) =
            nike.generate_keypair(rng).map_err(SphinxHeaderCreateError::KeyGen)?;
        let mut group_elements = Vec::with_capacity(num_hops);
        let mut keys: Vec<PacketKeys> = Vec::with_capacity(num_hops);

        let shared_secret = nike.derive_secret(&client_private_key, &path[0].public_key);
        keys.push(self.derive_keys(&shared_secret)?);
        group_elements.push(client_public_key.clone());

        for i in 1..num_hops {
            let mut shared_secret = nike.derive_secret(&client_private_key, &path[i].public_key);
            for key in &keys {
                let element = Zeroizing::new(
                    nike.unmarshal_public_key(&shared_secret)
                        .map_err(SphinxHeaderCreateError::InvalidKey)?,
                );
                let blinded = Zeroizing::new(nike.blind(&element, &key.blinding_factor));
                shared_secret.clear();
                shared_secret.extend_from_slice(nike.marshal_public_key(&blinded));
            }
            keys.push(self.derive_keys(&shared_secret)?);
            client_public_key = nike.blind(&client_public_key, &keys[i - 1].blinding_factor);
            group_elements.push(client_public_key.clone());
        }

        // Derive the routing_information keystream and encrypted padding
        // for each hop.
        let per_hop = geometry.per_hop_routing_info_length;
        let mut ri_key_stream = Vec::with_capacity(num_hops);
        let mut ri_padding: Vec<Zeroizing<Vec<u8>>> = Vec::with_capacity(num_hops);
        for (i, key) in keys.iter().enumerate() {
            let mut key_stream = Zeroizing::new(vec![0u8; geometry.routing_info_length + per_hop]);
            StreamCipher::new(&key.header_encryption, &key.header_encryption_iv).key_stream(&mut key_stream);

            let ks_len = key_stream.len() - (i + 1) * per_hop;
            let mut padding = Zeroizing::new(key_stream[ks_len..].to_vec());
            key_stream.truncate(ks_len);
            if i > 0 {
                let prev = &ri_padding[i - 1];
                xor_assign(&mut padding[..prev.len()], prev);
            }
            ri_key_stream.push(key_stream);
            ri_padding.push(padding);
        }

        // Create the routing_information block, back to front.
        let mut routing_info = vec![0u8; (geometry.nr_hops - num_hops) * per_hop];
        rng.try_fill_bytes(&mut routing_info)?;
        let mut mac = [0u8; MAC_SIZE];
        for i in (0..num_hops).rev() {
            let is_terminal = i == num_hops - 1;
            let cmds = self.commands_to_bytes(&path[i].commands, is_terminal)?;

            let mut fragment = Vec::with_capacity(per_hop + routing_info.len());
            if !is_terminal {
                let next = NextNodeHop {
                    id: path[i + 1].id,
                    mac,
                };
                fragment.extend_from_slice(&next.to_vec());
            }
            fragment.extend_from_slice(&cmds);
            fragment.resize(per_hop, 0);
            fragment.extend_from_slice(&routing_info);
            routing_info = fragment;
            xor_assign(&mut routing_info, &ri_key_stream[i]);

            let padding: &[u8] = if i > 0 { &ri_padding[i - 1] } else { &[] };
            mac = hmac(
                &keys[i].header_mac,
                &[&V0_AD, nike.marshal_public_key(&group_elements[i]), &routing_info, padding],
            );
        }

        // Assemble the completed Sphinx Packet Header and the payload keys.
        let mut header = Vec::with_capacity(geometry.header_length);
        header.extend_from_slice(&V0_AD);
        header.extend_from_slice(nike.marshal_public_key(&group_elements[0]));
        header.extend_from_slice(&routing_info);
        header.extend_from_slice(&mac);

        let sprp_keys = keys
            .iter()
            .map(|k| SprpKey {
                key: k.payload_encryption,
            })
            .collect();

        debug!(hops = num_hops, "created sphinx header");
        Ok((header, sprp_keys))
    }

    /// Create a new forward Sphinx packet carrying `payload`, which must
    /// be exactly `forward_payload_length` bytes.
    pub fn new_packet<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        path: &[PathHop<N::PublicKey>],
        payload: &[u8],
    ) -> Result<Vec<u8>, SphinxPacketCreateError> {
        let geometry = self.geometry();
        if payload.len() != geometry.forward_payload_length {
            return Err(SphinxPacketCreateError::InvalidPayloadLength {
                got: payload.len(),
                want: geometry.forward_payload_length,
            });
        }
        let (header, sprp_keys) = self.create_header(rng, path)?;

        // Assemble the packet.
        let mut packet = Vec::with_capacity(geometry.packet_length);
        packet.extend_from_slice(&header);
        packet.resize(header.len() + geometry.payload_tag_length, 0);
        packet.extend_from_slice(payload);

        // Encrypt the payload.
        for key in sprp_keys.iter().rev() {
            sprp_encrypt(&key.key, &mut packet[header.len()..])?;
        }
        Ok(packet)
    }

    /// Create a Single Use Reply Block for `path`, whose terminal hop
    /// should carry a SURBReply command.
    ///
    /// # Returns
    ///
    /// * 2-tuple containing (SURB, opaque key blob for `decrypt_surb_payload`)
    pub fn new_surb<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        path: &[PathHop<N::PublicKey>],
    ) -> Result<(Vec<u8>, Zeroizing<Vec<u8>>), SphinxSurbCreateError> {
        // Create a random SPRP key for the reply payload.
        let mut payload_key = Zeroizing::new([0u8; SPRP_KEY_SIZE]);
        rng.try_fill_bytes(&mut payload_key[..])?;

        let (header, sprp_keys) = self.create_header(rng, path)?;

        let mut surb = Vec::with_capacity(self.geometry().surb_length);
        surb.extend_from_slice(&header);
        surb.extend_from_slice(&path[0].id);
        surb.extend_from_slice(&payload_key[..]);

        // Serialize the SPRP keys into an opaque blob, in reverse order
        // to ease decryption.
        let mut keys = Zeroizing::new(Vec::with_capacity((sprp_keys.len() + 1) * SPRP_KEY_SIZE));
        for key in sprp_keys.iter().rev() {
            keys.extend_from_slice(&key.key);
        }
        keys.extend_from_slice(&payload_key[..]);

        debug!(hops = path.len(), "created sphinx SURB");
        Ok((surb, keys))
    }

    /// Create a reply packet from a SURB.
    ///
    /// # Returns
    ///
    /// * 2-tuple containing (packet, identity of the first hop)
    pub fn new_packet_from_surb(
        &self,
        surb: &[u8],
        payload: &[u8],
    ) -> Result<(Vec<u8>, [u8; NODE_ID_SIZE]), SphinxPacketFromSurbError> {
        let geometry = self.geometry();
        if surb.len() != geometry.surb_length {
            return Err(SphinxPacketFromSurbError::InvalidSurb {
                got: surb.len(),
                want: geometry.surb_length,
            });
        }
        if payload.len() != geometry.forward_payload_length {
            return Err(SphinxPacketFromSurbError::InvalidPayloadLength {
                got: payload.len(),
                want: geometry.forward_payload_length,
            });
        }

        let (header, rest) = surb.split_at(geometry.header_length);
        let (first_hop, payload_key) = array_refs![array_ref![rest, 0, NODE_ID_SIZE + SPRP_KEY_SIZE], NODE_ID_SIZE, SPRP_KEY_SIZE];

        let mut packet = Vec::with_capacity(geometry.packet_length);
        packet.extend_from_slice(header);
        packet.resize(header.len() + geometry.payload_tag_length, 0);
        packet.extend_from_slice(payload);
        sprp_encrypt(payload_key, &mut packet[header.len()..])?;

        Ok((packet, *first_hop))
    }

    /// Decrypt a SURB reply payload delivered to the SURB creator, using
    /// the key blob returned by `new_surb`. The tag is stripped.
    pub fn decrypt_surb_payload(&self, payload: &[u8], keys: &[u8]) -> Result<Vec<u8>, SphinxDecryptSurbError> {
        if keys.is_empty() || keys.len() % SPRP_KEY_SIZE != 0 {
            return Err(SphinxDecryptSurbError::InvalidSurbKeys);
        }
        let tag_length = self.geometry().payload_tag_length;
        if payload.len() < tag_length {
            return Err(SphinxDecryptSurbError::TruncatedPayloadError);
        }

        let mut b = payload.to_vec();
        let num_keys = keys.len() / SPRP_KEY_SIZE;
        for (i, chunk) in keys.chunks_exact(SPRP_KEY_SIZE).enumerate() {
            let key = array_ref![chunk, 0, SPRP_KEY_SIZE];
            if i == num_keys - 1 {
                sprp_decrypt(key, &mut b)?;
            } else {
                // Undo one decrypt operation done by a hop's unwrap.
                sprp_encrypt(key, &mut b)?;
            }
        }

        if !ct_is_zero(&b[..tag_length]) {
            return Err(SphinxDecryptSurbError::InvalidTag);
        }
        Ok(b.split_off(tag_length))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{NodeDelay, Recipient, SURBReply};
    use crate::constants::{HEADER_SIZE, PER_HOP_ROUTING_INFO_SIZE, RECIPIENT_ID_SIZE, SURB_ID_SIZE};
    use crate::nike::X25519Nike;
    use rand::rngs::OsRng;

    fn path(num_hops: usize) -> Vec<PathHop> {
        let nike = X25519Nike;
        (0..num_hops)
            .map(|i| {
                let (public_key, _) = nike.generate_keypair(&mut OsRng).unwrap();
                PathHop {
                    id: [i as u8; NODE_ID_SIZE],
                    public_key,
                    commands: vec![RoutingCommand::NodeDelay(NodeDelay { delay: i as u32 })],
                }
            })
            .collect()
    }

    #[test]
    fn commands_to_bytes_test() {
        let s: Sphinx = Sphinx::default();
        let cmds = vec![
            RoutingCommand::Recipient(Recipient { id: [1; RECIPIENT_ID_SIZE] }),
            RoutingCommand::SURBReply(SURBReply { id: [2; SURB_ID_SIZE] }),
        ];
        assert_eq!(s.commands_to_bytes(&cmds, true).unwrap().len(), PER_HOP_ROUTING_INFO_SIZE);
        match s.commands_to_bytes(&cmds, false) {
            Err(SphinxHeaderCreateError::InsufficientCapacity) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        let mut too_many = cmds.clone();
        too_many.push(RoutingCommand::NodeDelay(NodeDelay { delay: 1 }));
        match s.commands_to_bytes(&too_many, true) {
            Err(SphinxHeaderCreateError::OversizedRoutingBlock { len: 87, max: 82 }) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        let next = vec![RoutingCommand::NextNodeHop(NextNodeHop {
            id: [0; NODE_ID_SIZE],
            mac: [0; MAC_SIZE],
        })];
        match s.commands_to_bytes(&next, true) {
            Err(SphinxHeaderCreateError::NextNodeHopCommand) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn create_header_test() {
        let s: Sphinx = Sphinx::default();
        for num_hops in 1..=s.geometry().nr_hops {
            let (header, keys) = s.create_header(&mut OsRng, &path(num_hops)).unwrap();
            assert_eq!(header.len(), HEADER_SIZE);
            assert_eq!(&header[..2], &V0_AD);
            assert_eq!(keys.len(), num_hops);
        }
    }

    #[test]
    fn create_header_path_errors_test() {
        let s: Sphinx = Sphinx::default();
        match s.create_header(&mut OsRng, &[]) {
            Err(SphinxHeaderCreateError::EmptyPath) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
        match s.create_header(&mut OsRng, &path(6)) {
            Err(SphinxHeaderCreateError::PathTooLong { len: 6, max: 5 }) => {}
            other => panic!("unexpected result: {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn decrypt_surb_payload_keys_test() {
        let s: Sphinx = Sphinx::default();
        let payload = vec![0u8; 100];
        match s.decrypt_surb_payload(&payload, &[]) {
            Err(SphinxDecryptSurbError::InvalidSurbKeys) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match s.decrypt_surb_payload(&payload, &[0u8; SPRP_KEY_SIZE + 1]) {
            Err(SphinxDecryptSurbError::InvalidSurbKeys) => {}
            other => panic!("unexpected result: {:?}", other),
        }
        match s.decrypt_surb_payload(&payload[..10], &[0u8; SPRP_KEY_SIZE]) {
            Err(SphinxDecryptSurbError::TruncatedPayloadError) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
