//! # FormPilot Companion
//!
//! HTTP client for the external automation service that moves the real
//! pointer and keyboard. Loopback-only and token-authenticated: the
//! constructor rejects non-local base URLs, and every action request
//! carries the `X-Auth-Token` header.

pub mod client;

pub use client::CompanionClient;
