// ABOUTME: Chat client error types for comprehensive error handling across all client operations
// ABOUTME: Provides structured error reporting with automatic conversion from underlying I/O errors

use std::io;
use thiserror::Error;

/// Comprehensive error type for chat client operations.
#[derive(Debug, Error)]
pub enum ChatError {
    /// I/O error during network operations (connect, read, write).
    #[error("connection error: {0}")]
    Connection(#[from] io::Error),

    /// The connect attempt did not complete within the bounded timeout.
    #[error("could not connect to {0}")]
    ConnectFailed(String),

    /// The server replied with an `ERROR` frame.
    #[error("server error: {0}")]
    Protocol(String),

    /// No reply arrived within the 3-second reply-slot timeout (§4.5).
    #[error("timed out waiting for a reply")]
    Timeout,

    /// A frame arrived that could not be decoded, or an opcode appeared
    /// where the reply router did not expect one.
    #[error("unexpected or malformed frame: {0}")]
    UnexpectedFrame(String),

    /// The peer closed the connection, or the background I/O task exited.
    #[error("connection closed")]
    ConnectionClosed,

    /// A request would encode to a frame larger than the wire size cap.
    #[error("request too large to send ({size} > {max} bytes)")]
    FrameTooLarge { size: usize, max: usize },

    /// Locally-rejected input (e.g. an invalid name) before it was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for chat client operations.
pub type ChatResult<T> = Result<T, ChatError>;
