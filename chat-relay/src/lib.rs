//! Minimal chat relay: every message a client sends is rebroadcast to all
//! other connected clients.
//!
//! - [`cli`] parses the command line for relay and client modes.
//! - [`message`] defines the chat message and its JSON line framing.
//! - [`channel`] abstracts the inbound and outbound halves of a connection.
//! - [`registry`] maps declared identities to outbound channels and performs
//!   the fan-out under a single lock.
//! - [`session`] drives one connection: receive, register, broadcast, and
//!   clean up on disconnect.
//! - [`relay`] accepts TCP connections and spawns a session for each.
//! - [`client`] is the terminal client.

pub mod channel;
pub mod cli;
pub mod client;
pub mod error;
pub mod message;
pub mod registry;
pub mod relay;
pub mod session;

#[cfg(test)]
mod testing;
