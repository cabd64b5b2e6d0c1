//! Top-level facade crate for feedwire.
//!
//! Re-exports the protocol core and the gateway library so users can depend on a single crate.

pub mod core {
    pub use feedwire_core::*;
}

pub mod gateway {
    pub use feedwire_gateway::*;
}
