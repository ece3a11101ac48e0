// error.rs - Sphinx error types
// Copyright (C) 2018  David Anthony Stainton.
//
// MIT License
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

use thiserror::Error;

use super::internal_crypto::HASH_SIZE;

/// Errors produced by a NIKE scheme.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NikeError {
    #[error("invalid key length: got {got}, expected {want}")]
    InvalidKeyLength { got: usize, want: usize },
}

/// Errors produced by the Lioness payload SPRP.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LionessError {
    #[error("block size must be larger than {0} bytes")]
    BlockSizeError(usize),
}

/// Errors produced while decoding routing commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid null command padding")]
    InvalidNullPadding,
    #[error("unknown command: {0:#04x}")]
    UnknownCommand(u8),
    #[error("truncated command: {0:#04x}")]
    Truncated(u8),
}

/// Errors produced while validating a packet geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("geometry must have at least one hop")]
    ZeroHops,
    #[error("per hop routing info length {got} is smaller than the minimum {min}")]
    PerHopRoutingInfoTooSmall { got: usize, min: usize },
    #[error("inconsistent {field}: got {got}, expected {want}")]
    Inconsistent {
        field: &'static str,
        got: usize,
        want: usize,
    },
    #[error("payload of {0} bytes is too small for the SPRP")]
    PayloadTooSmall(usize),
    #[error("NIKE public key size {scheme} does not match geometry {geometry}")]
    PublicKeySizeMismatch { scheme: usize, geometry: usize },
}

#[derive(Debug, Error)]
pub enum SphinxUnwrapError {
    #[error("invalid packet, truncated")]
    TruncatedPacket,
    #[error("invalid packet, unknown version")]
    UnknownVersion,
    #[error("failed to unmarshal group element: {0}")]
    InvalidGroupElement(NikeError),
    #[error("key derivation failure")]
    KeyDerivation,
    #[error("invalid packet, MAC mismatch")]
    MacMismatch,
    #[error("failed to parse route information: {0}")]
    RouteInfoParse(#[from] CommandError),
    #[error("invalid packet, > 1 next_node")]
    MultipleNextNodeHop,
    #[error("invalid packet, > 1 surb_reply")]
    MultipleSURBReply,
    #[error("BUG: null cmd had rest")]
    BugNullCommandHadRest,
    #[error("failed to decrypt payload: {0}")]
    PayloadDecrypt(LionessError),
    #[error("truncated payload")]
    TruncatedPayload,
    #[error("payload auth failed")]
    InvalidTag,
}

/// A failed unwrap. The replay tag is present whenever the group
/// element could be parsed, so the caller can still record it.
#[derive(Debug, Error)]
#[error("sphinx: packet unwrap failed")]
pub struct UnwrapFailure {
    pub replay_tag: Option<[u8; HASH_SIZE]>,
    #[source]
    pub error: SphinxUnwrapError,
}

#[derive(Debug, Error)]
pub enum SphinxHeaderCreateError {
    #[error("path length {len} must not exceed {max} hops")]
    PathTooLong { len: usize, max: usize },
    #[error("path must contain at least one hop")]
    EmptyPath,
    #[error("invalid commands, NextNodeHop")]
    NextNodeHopCommand,
    #[error("invalid commands, oversized serialized block: {len} > {max}")]
    OversizedRoutingBlock { len: usize, max: usize },
    #[error("invalid commands, insufficient remaining capacity")]
    InsufficientCapacity,
    #[error("key generation failure: {0}")]
    KeyGen(NikeError),
    #[error("invalid blinded key: {0}")]
    InvalidKey(NikeError),
    #[error("key derivation failure")]
    KeyDerivation,
    #[error("entropy source failure: {0}")]
    Rng(#[from] rand_core::Error),
}

#[derive(Debug, Error)]
pub enum SphinxPacketCreateError {
    #[error("invalid payload length: {got}, expected {want}")]
    InvalidPayloadLength { got: usize, want: usize },
    #[error("failed to create a header: {0}")]
    CreateHeader(#[from] SphinxHeaderCreateError),
    #[error("SPRP encryption failure: {0}")]
    SPRPEncrypt(#[from] LionessError),
}

#[derive(Debug, Error)]
pub enum SphinxSurbCreateError {
    #[error("failed to create a header: {0}")]
    CreateHeader(#[from] SphinxHeaderCreateError),
    #[error("entropy source failure: {0}")]
    Rng(#[from] rand_core::Error),
}

#[derive(Debug, Error)]
pub enum SphinxPacketFromSurbError {
    #[error("invalid SURB length: {got}, expected {want}")]
    InvalidSurb { got: usize, want: usize },
    #[error("invalid payload length: {got}, expected {want}")]
    InvalidPayloadLength { got: usize, want: usize },
    #[error("SPRP encryption failure: {0}")]
    SPRPEncrypt(#[from] LionessError),
}

#[derive(Debug, Error)]
pub enum SphinxDecryptSurbError {
    #[error("invalid surb keys")]
    InvalidSurbKeys,
    #[error("invalid payload")]
    TruncatedPayloadError,
    #[error("decryption failure: {0}")]
    DecryptError(#[from] LionessError),
    #[error("invalid tag")]
    InvalidTag,
}
