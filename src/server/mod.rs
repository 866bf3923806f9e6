// ABOUTME: Relay server: accept loop, per-connection I/O tasks, and the directory actor
// ABOUTME: `serve` is the single entry point used by the server binary and integration tests

pub mod directory;
pub mod listener;
pub mod send_queue;

pub use listener::serve;
