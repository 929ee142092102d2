//! Wire messages between the host game and the engine, encoded with bcs.

use crate::Point;
use crate::grid::Tile;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Which classification the host is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Safes,
    Flags,
    Lowest,
}

/// Messages sent by the host to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostMessage {
    /// Starts a game: the mine budget and the full clue grid, row by row.
    Init { mines: usize, rows: Vec<Vec<Tile>> },
    /// Cells revealed this turn. Fire-and-forget.
    Reveal(Vec<Point>),
    /// Asks for one classification; answered by exactly one [`Response`].
    Request(RequestKind),
}

/// The engine's answer to a [`HostMessage::Request`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub kind: RequestKind,
    /// Fingerprint words of the reveals the answer was computed from.
    pub fingerprint: Vec<u64>,
    pub cells: Vec<Point>,
}

/// Serializes a message to bytes.
pub fn encode<T: Serialize>(message: &T) -> anyhow::Result<Vec<u8>> {
    Ok(bcs::to_bytes(message)?)
}

/// Deserializes a message from bytes.
pub fn decode<T: DeserializeOwned>(bts: &[u8]) -> anyhow::Result<T> {
    Ok(bcs::from_bytes(bts)?)
}
