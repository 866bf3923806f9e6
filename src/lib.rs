// ABOUTME: Chat relay library: wire codec, framed connection I/O, domain types, client and server
// ABOUTME: The server binary drives `server::serve`; the client binary drives `client::ClientBuilder`

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod domain;
pub mod server;

pub use client::{ChatClient, ChatConnection, ChatError, ChatResult, ClientBuilder, DefaultClient};
pub use codec::{CodecError, Frame, Opcode};
pub use config::{ClientConfig, ServerConfig};
pub use domain::{ConnId, Name, NameError};

/// Error returned by server I/O and processor tasks for unrecoverable,
/// per-task failures (connection-level errors, not semantic command
/// failures, which are always reply frames rather than `Err`s — §7).
pub type Error = Box<dyn std::error::Error + Send + Sync>;

/// A specialized `Result` type for chat relay operations.
pub type Result<T> = std::result::Result<T, Error>;
