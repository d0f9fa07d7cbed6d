//! # rexpro-client
//!
//! Client library for Rexster's RexPro protocol.
//!
//! This crate provides:
//! - Async TCP transport that writes packed frames and reads them back
//! - A high-level [`Client`] for running scripts and opening sessions
//!
//! Every exchange uses its own connection: connect, write one request, read
//! one response, close.

pub mod client;
pub mod connection;
pub mod error;

pub use client::{into_script_response, Client};
pub use connection::{Connection, ConnectionConfig};
pub use error::ClientError;
