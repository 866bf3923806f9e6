// ABOUTME: Chat client module providing trait-based interfaces for the relay's request/reply/inbox API
// ABOUTME: Exports the traits, the default implementation, the error type, and the connect factory

//! Chat client module.
//!
//! * **Native async traits** — uses async fn in traits, no `async_trait` dependency.
//! * **Layered design** — `ChatConnection` (lifecycle) underneath `ChatClient` (commands).
//! * **Reply/inbox demux** — a background task separates synchronous replies from
//!   asynchronously pushed inbox lines (§4.5).
//!
//! ```rust,no_run
//! use chatrelay::client::{ClientBuilder, ChatClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut client = ClientBuilder::connect("127.0.0.1:65432").await?;
//!     client.set_name("alice").await?;
//!     client.message_user("bob", "hi").await?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod default;
pub mod error;
pub mod traits;

pub use builder::ClientBuilder;
pub use default::DefaultClient;
pub use error::{ChatError, ChatResult};
pub use traits::{ChatClient, ChatConnection};
