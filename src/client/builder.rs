// ABOUTME: Client factory for connecting to the relay, mirroring the teacher's ClientBuilder shape
// ABOUTME: Kept as a thin facade over DefaultClient::connect since chat has no bind/credentials step

use crate::client::default::DefaultClient;
use crate::client::error::ChatResult;
use crate::client::traits::{ChatClient, ChatConnection};
use tokio::net::ToSocketAddrs;

/// Factory for creating chat clients.
pub struct ClientBuilder;

impl ClientBuilder {
    /// Connects to the relay and returns a ready-to-use client.
    pub async fn connect<T: ToSocketAddrs + Send>(addr: T) -> ChatResult<impl ChatClient> {
        DefaultClient::connect(addr).await
    }
}
