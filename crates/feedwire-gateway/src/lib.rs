//! feedwire gateway library entry.
//!
//! This crate wires the transport, feed hub, config and ops endpoints into a
//! WebSocket gateway that serves topic feeds in each client's negotiated
//! format. It is consumed by the binaries and by integration tests.

pub mod app_state;
pub mod config;
pub mod feed;
pub mod obs;
pub mod ops;
pub mod router;
pub mod transport;
