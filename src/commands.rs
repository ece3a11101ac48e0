// commands.rs - sphinx cryptographic packet format commands
// Copyright (C) 2018  David Stainton.

//! Sphinx routing commands.
//!
//! Each hop's slice of the routing information is a sequence of
//! commands, each one a type byte followed by a fixed size body, ended
//! by a null command (or by the end of the slice). The remainder after
//! a null command must be zero padding.

use byteorder::{BigEndian, ByteOrder};
use tracing::error;

use super::constants::{NODE_ID_SIZE, RECIPIENT_ID_SIZE, SURB_ID_SIZE};
use super::error::{CommandError, SphinxUnwrapError};
use super::internal_crypto::MAC_SIZE;
use super::utils::ct_is_zero;

/// length of the next hop command
pub const NEXT_NODE_HOP_SIZE: usize = 1 + NODE_ID_SIZE + MAC_SIZE;

/// length of the recipient command
pub const RECIPIENT_SIZE: usize = 1 + RECIPIENT_ID_SIZE;

/// length of the surb reply command
pub const SURB_REPLY_SIZE: usize = 1 + SURB_ID_SIZE;

/// length of the node delay command
pub const NODE_DELAY_SIZE: usize = 1 + 4;

const NULL_CMD: u8 = 0x00;
const NEXT_NODE_HOP_CMD: u8 = 0x01;
const RECIPIENT_CMD: u8 = 0x02;
const SURB_REPLY_CMD: u8 = 0x03;
const NODE_DELAY_CMD: u8 = 0x80;

/// The routing command a relay follows to forward the packet. Only
/// the header builder creates these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NextNodeHop {
    pub id: [u8; NODE_ID_SIZE],
    pub mac: [u8; MAC_SIZE],
}

impl NextNodeHop {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(NEXT_NODE_HOP_SIZE);
        out.push(NEXT_NODE_HOP_CMD);
        out.extend_from_slice(&self.id);
        out.extend_from_slice(&self.mac);
        out
    }

    fn from_bytes(b: &[u8]) -> Result<(NextNodeHop, &[u8]), CommandError> {
        if b.len() < NEXT_NODE_HOP_SIZE - 1 {
            return Err(CommandError::Truncated(NEXT_NODE_HOP_CMD));
        }
        let (id, mac) = array_refs![array_ref![b, 0, NEXT_NODE_HOP_SIZE - 1], NODE_ID_SIZE, MAC_SIZE];
        let cmd = NextNodeHop { id: *id, mac: *mac };
        Ok((cmd, &b[NEXT_NODE_HOP_SIZE - 1..]))
    }
}

/// Identifies the recipient of the packet at the terminal hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recipient {
    pub id: [u8; RECIPIENT_ID_SIZE],
}

impl Recipient {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RECIPIENT_SIZE);
        out.push(RECIPIENT_CMD);
        out.extend_from_slice(&self.id);
        out
    }

    fn from_bytes(b: &[u8]) -> Result<(Recipient, &[u8]), CommandError> {
        if b.len() < RECIPIENT_SIZE - 1 {
            return Err(CommandError::Truncated(RECIPIENT_CMD));
        }
        let cmd = Recipient {
            id: *array_ref![b, 0, RECIPIENT_ID_SIZE],
        };
        Ok((cmd, &b[RECIPIENT_SIZE - 1..]))
    }
}

/// Marks the packet as a reply sent with a SURB. The payload tag is
/// then checked by the SURB creator rather than the terminal hop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SURBReply {
    pub id: [u8; SURB_ID_SIZE],
}

impl SURBReply {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SURB_REPLY_SIZE);
        out.push(SURB_REPLY_CMD);
        out.extend_from_slice(&self.id);
        out
    }

    fn from_bytes(b: &[u8]) -> Result<(SURBReply, &[u8]), CommandError> {
        if b.len() < SURB_REPLY_SIZE - 1 {
            return Err(CommandError::Truncated(SURB_REPLY_CMD));
        }
        let cmd = SURBReply {
            id: *array_ref![b, 0, SURB_ID_SIZE],
        };
        Ok((cmd, &b[SURB_REPLY_SIZE - 1..]))
    }
}

/// Asks the hop to hold the packet, the unit is left to the mix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeDelay {
    pub delay: u32,
}

impl NodeDelay {
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = vec![0u8; NODE_DELAY_SIZE];
        out[0] = NODE_DELAY_CMD;
        BigEndian::write_u32(&mut out[1..], self.delay);
        out
    }

    fn from_bytes(b: &[u8]) -> Result<(NodeDelay, &[u8]), CommandError> {
        if b.len() < NODE_DELAY_SIZE - 1 {
            return Err(CommandError::Truncated(NODE_DELAY_CMD));
        }
        let cmd = NodeDelay {
            delay: BigEndian::read_u32(&b[..NODE_DELAY_SIZE - 1]),
        };
        Ok((cmd, &b[NODE_DELAY_SIZE - 1..]))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingCommand {
    NextNodeHop(NextNodeHop),
    Recipient(Recipient),
    SURBReply(SURBReply),
    NodeDelay(NodeDelay),
}

impl RoutingCommand {
    /// append the serialized command to `out`
    pub fn to_bytes(&self, out: &mut Vec<u8>) {
        match self {
            RoutingCommand::NextNodeHop(c) => out.extend_from_slice(&c.to_vec()),
            RoutingCommand::Recipient(c) => out.extend_from_slice(&c.to_vec()),
            RoutingCommand::SURBReply(c) => out.extend_from_slice(&c.to_vec()),
            RoutingCommand::NodeDelay(c) => out.extend_from_slice(&c.to_vec()),
        }
    }

    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.to_bytes(&mut out);
        out
    }

    pub fn encoded_len(&self) -> usize {
        match self {
            RoutingCommand::NextNodeHop(_) => NEXT_NODE_HOP_SIZE,
            RoutingCommand::Recipient(_) => RECIPIENT_SIZE,
            RoutingCommand::SURBReply(_) => SURB_REPLY_SIZE,
            RoutingCommand::NodeDelay(_) => NODE_DELAY_SIZE,
        }
    }

    /// Decode one command from the front of `b`, returning it along with
    /// the remaining bytes. `None` is the null terminator, in which case
    /// the remainder is always empty.
    pub fn from_bytes(b: &[u8]) -> Result<(Option<RoutingCommand>, &[u8]), CommandError> {
        let (&id, rest) = match b.split_first() {
            Some(split) => split,
            None => return Ok((None, &[])),
        };
        match id {
            NULL_CMD => {
                if !ct_is_zero(rest) {
                    return Err(CommandError::InvalidNullPadding);
                }
                Ok((None, &[]))
            }
            NEXT_NODE_HOP_CMD => {
                let (cmd, rest) = NextNodeHop::from_bytes(rest)?;
                Ok((Some(RoutingCommand::NextNodeHop(cmd)), rest))
            }
            RECIPIENT_CMD => {
                let (cmd, rest) = Recipient::from_bytes(rest)?;
                Ok((Some(RoutingCommand::Recipient(cmd)), rest))
            }
            SURB_REPLY_CMD => {
                let (cmd, rest) = SURBReply::from_bytes(rest)?;
                Ok((Some(RoutingCommand::SURBReply(cmd)), rest))
            }
            NODE_DELAY_CMD => {
                let (cmd, rest) = NodeDelay::from_bytes(rest)?;
                Ok((Some(RoutingCommand::NodeDelay(cmd)), rest))
            }
            unknown => Err(CommandError::UnknownCommand(unknown)),
        }
    }
}

/// Parse a hop's decrypted command buffer.
///
/// # Returns
///
/// * 3-tuple containing (all commands, the NextNodeHop if any, the SURBReply if any)
pub fn parse_routing_commands(
    b: &[u8],
) -> Result<(Vec<RoutingCommand>, Option<NextNodeHop>, Option<SURBReply>), SphinxUnwrapError> {
    let mut next_node_hop: Option<NextNodeHop> = None;
    let mut surb_reply: Option<SURBReply> = None;
    let mut cmds = Vec::with_capacity(2); // Usually 2, excluding null.
    let mut cmd_buf = b;
    loop {
        let (cmd, rest) = RoutingCommand::from_bytes(cmd_buf)?;
        let cmd = match cmd {
            Some(cmd) => cmd,
            None => {
                if !rest.is_empty() {
                    error!("sphinx: BUG: null cmd had rest");
                    return Err(SphinxUnwrapError::BugNullCommandHadRest);
                }
                break;
            }
        };
        match cmd {
            RoutingCommand::NextNodeHop(c) => {
                if next_node_hop.replace(c).is_some() {
                    return Err(SphinxUnwrapError::MultipleNextNodeHop);
                }
            }
            RoutingCommand::SURBReply(c) => {
                if surb_reply.replace(c).is_some() {
                    return Err(SphinxUnwrapError::MultipleSURBReply);
                }
            }
            _ => {}
        }
        cmds.push(cmd);
        cmd_buf = rest;
    }
    Ok((cmds, next_node_hop, surb_reply))
}
