//! Commit message generation over the Model Context Protocol.
//!
//! One crate, both sides of the wire: `commit-buddy-server` exposes a
//! `generate_commit_message` tool over JSON-RPC 2.0 stdio, and the
//! `commit-buddy` client spawns that server, drives the
//! initialize → tools/list → tools/call handshake with per-call timeouts,
//! and falls back to a local classification when the exchange fails.

pub mod classifier;
pub mod client;
pub mod config;
pub mod diff;
pub mod fallback;
pub mod handlers;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod transport;

pub mod schema;
