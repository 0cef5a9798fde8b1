//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between a client view and the API
//! server. The socket is a change feed: clients refetch the slices named in
//! `StateChanged` over REST.

use campus_core::store::StoreChange;
use serde::{Deserialize, Serialize};

//=========================================================================================
// Messages Sent FROM the Client TO the Server
//=========================================================================================

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Asks for the current store revision, answered with `Pong`.
    Ping,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client
//=========================================================================================

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// First message on every connection.
    Connected { revision: u64 },

    /// One slice of the store changed in `revision`.
    StateChanged { change: StoreChange, revision: u64 },

    /// The connection fell behind and `skipped` store events were dropped.
    /// The client should refetch everything it shows.
    Lagged { skipped: u64 },

    Pong { revision: u64 },

    Error { message: String },
}
