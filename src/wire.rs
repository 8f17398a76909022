//! src/wire.rs
//!
//! The on-the-wire message envelope and its JSON codec. The codec is a thin
//! collaborator by design (§4.2): the engine only ever performs shallow
//! key-lookups into `payload`, never strongly-typed payload structs, so the
//! envelope's payload field stays a tolerant `serde_json::Value`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maximum length, in bytes, of a `msg_id` or `sender_id` string.
pub const ID_LEN: usize = 128;

/// Maximum size, in bytes, of an encoded [`Message`] as it must fit in a
/// single UDP datagram.
pub const MAX_SERIALIZED_LEN: usize = 10 * 1024;

/// Maximum size, in bytes, of a message's `payload` alone.
pub const MAX_PAYLOAD_LEN: usize = 8 * 1024;

/// Size of the scratch buffer used for a single `recvfrom`.
pub const MSG_BUF_SIZE: usize = 8 * 1024;

pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "HELLO")]
    Hello,
    #[serde(rename = "GET_PEERS")]
    GetPeers,
    #[serde(rename = "PEERS_LIST")]
    PeersList,
    #[serde(rename = "GOSSIP")]
    Gossip,
    #[serde(rename = "PING")]
    Ping,
    #[serde(rename = "PONG")]
    Pong,
    #[serde(rename = "IHAVE")]
    IHave,
    #[serde(rename = "IWANT")]
    IWant,
}

/// A single gossip-protocol datagram, exactly as it appears on the wire.
///
/// Field names and the overall shape are fixed by §6's interop contract:
/// `{"version":N,"msg_id":"…","msg_type":"…","sender_id":"…",
/// "sender_addr":"ip:port","timestamp_ms":N,"ttl":N,"payload":<value>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub version: u32,
    pub msg_id: String,
    pub msg_type: MessageType,
    pub sender_id: String,
    pub sender_addr: String,
    pub timestamp_ms: u64,
    pub ttl: u32,
    pub payload: serde_json::Value,
}

impl Message {
    pub fn new(
        msg_type: MessageType,
        sender_id: impl Into<String>,
        sender_addr: impl Into<String>,
        timestamp_ms: u64,
        ttl: u32,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            msg_id: uuid::Uuid::new_v4().to_string(),
            msg_type,
            sender_id: sender_id.into(),
            sender_addr: sender_addr.into(),
            timestamp_ms,
            ttl,
            payload,
        }
    }
}

/// Encodes `msg` to its wire bytes, rejecting anything that would not fit
/// in a single datagram.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    let bytes = serde_json::to_vec(msg)?;
    if bytes.len() > MAX_SERIALIZED_LEN {
        return Err(Error::MessageTooLarge(MAX_SERIALIZED_LEN));
    }
    Ok(bytes)
}

/// Decodes a datagram into a [`Message`]. Malformed input fails cleanly;
/// callers (the listener) drop the datagram silently on `Err`.
pub fn decode(bytes: &[u8]) -> Result<Message> {
    let msg: Message = serde_json::from_slice(bytes)?;
    Ok(msg)
}
