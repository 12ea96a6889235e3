//! Integration test common infrastructure.
//!
//! Provides utilities for spawning a proxy process against a fake upstream
//! IRC server, and a raw client to drive it.

pub mod client;
pub mod server;
pub mod upstream;

#[allow(unused_imports)]
pub use client::TestClient;
pub use server::TestServer;
pub use upstream::FakeUpstream;
