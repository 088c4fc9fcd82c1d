use bincode::{Decode, Encode};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Largest encoded message accepted by `decode`
pub const MAX_MESSAGE_SIZE: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("Failed to encode message")]
    Encoding(#[from] bincode::error::EncodeError),

    #[error("Failed to decode message")]
    Decoding(#[from] bincode::error::DecodeError),

    #[error("Found {0} trailing bytes after message")]
    TrailingBytes(usize),
}

/// A single gossip message as seen by a node. The tracker only cares about `id`
#[derive(Encode, Decode, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Unique identifier, used as the dedup key
    pub id: String,
    /// Peer that delivered or produced this message
    pub origin: String,
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(id: impl Into<String>, origin: impl Into<String>, payload: Vec<u8>) -> Self {
        Message {
            id: id.into(),
            origin: origin.into(),
            payload,
        }
    }

    /// New message whose id is the hex SHA-256 of its payload.
    /// The same content relayed by two peers gets the same id
    pub fn new_content_addressed(origin: impl Into<String>, payload: Vec<u8>) -> Self {
        Message {
            id: Self::content_id(&payload),
            origin: origin.into(),
            payload,
        }
    }

    /// Hex SHA-256 of a payload
    pub fn content_id(payload: &[u8]) -> String {
        Sha256::digest(payload)
            .iter()
            .map(|byte| format!("{:02x}", byte))
            .collect()
    }

    /// Serialize message into a Vec<u8> to be handed to a transport
    pub fn encode(&self) -> Result<Vec<u8>, MessageError> {
        Ok(bincode::encode_to_vec(self, bincode::config::standard())?)
    }

    /// Read a message back from bytes produced by `encode`.
    /// Length prefixes adding up to more than `MAX_MESSAGE_SIZE` are rejected before allocating
    pub fn decode(bytes: &[u8]) -> Result<Self, MessageError> {
        let config = bincode::config::standard().with_limit::<MAX_MESSAGE_SIZE>();
        let (message, read) = bincode::decode_from_slice(bytes, config)?;
        if read != bytes.len() {
            return Err(MessageError::TrailingBytes(bytes.len() - read));
        }
        Ok(message)
    }
}
