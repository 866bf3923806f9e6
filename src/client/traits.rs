// ABOUTME: Core chat client traits using native async functions for modern Rust implementations
// ABOUTME: Layers connection lifecycle under the request/reply/inbox API the driver consumes

use crate::client::error::ChatResult;
use std::future::Future;
use tokio::net::ToSocketAddrs;

/// Base connection management for chat clients.
///
/// Provides the connection lifecycle every client needs regardless of which
/// commands it goes on to issue.
pub trait ChatConnection {
    /// Establishes a TCP connection to the relay within a 5-second bound,
    /// failing with `ChatError::ConnectFailed` on timeout or socket error
    /// (§4.4).
    fn connect<T: ToSocketAddrs + Send>(addr: T) -> impl Future<Output = ChatResult<Self>> + Send
    where
        Self: Sized;

    /// Signals orderly shutdown: stops the background reader, drops the
    /// write half.
    fn disconnect(&mut self) -> impl Future<Output = ChatResult<()>> + Send;

    /// True until the peer closes the connection or `disconnect` runs.
    fn is_connected(&self) -> bool;
}

/// The chat relay's request/reply vocabulary plus inbox polling (§4.1, §4.5).
///
/// Each request method sends exactly one frame, then blocks on the
/// single-slot reply queue with the 3-second timeout mandated by §4.5,
/// returning the reply text on `SUCCESS` or `ChatError::Protocol` on
/// `ERROR`. At most one request should be outstanding per connection at a
/// time; a menu-driven caller satisfies this naturally by awaiting each call
/// before issuing the next.
pub trait ChatClient: ChatConnection {
    fn set_name(&mut self, name: &str) -> impl Future<Output = ChatResult<String>> + Send;

    fn message_user(
        &mut self,
        name: &str,
        text: &str,
    ) -> impl Future<Output = ChatResult<String>> + Send;

    fn message_my_channels(&mut self, text: &str) -> impl Future<Output = ChatResult<String>> + Send;

    fn message_channels(
        &mut self,
        names: &[String],
        text: &str,
    ) -> impl Future<Output = ChatResult<String>> + Send;

    fn join_channels(&mut self, names: &[String]) -> impl Future<Output = ChatResult<String>> + Send;

    fn leave_channels(&mut self, names: &[String]) -> impl Future<Output = ChatResult<String>> + Send;

    fn create_channel(&mut self, name: &str) -> impl Future<Output = ChatResult<String>> + Send;

    fn delete_channel(&mut self, name: &str) -> impl Future<Output = ChatResult<String>> + Send;

    fn list_channels(&mut self) -> impl Future<Output = ChatResult<String>> + Send;

    fn list_my_channels(&mut self) -> impl Future<Output = ChatResult<String>> + Send;

    fn list_channel_users(&mut self, name: &str) -> impl Future<Output = ChatResult<String>> + Send;

    fn list_users(&mut self) -> impl Future<Output = ChatResult<String>> + Send;

    /// Returns an already-queued inbox line without waiting, if one exists.
    fn try_next_inbox(&mut self) -> Option<String>;

    /// Waits for the next inbox line. Resolves to `None` once the
    /// connection has closed and no further inbox frames can arrive.
    fn next_inbox(&mut self) -> impl Future<Output = Option<String>> + Send;
}
