//! Network Module
//!
//! TCP server for storage nodes and the client the coordinator uses.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One thread per connection, capped at `max_connections`
//! - Commands routed through `StorageNode`

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
