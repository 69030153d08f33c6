//! Top-level facade crate for wschat.
//!
//! Re-exports the protocol types and the client library so users can depend on a single crate.

pub mod core {
    pub use wschat_core::*;
}

pub mod client {
    pub use wschat_client::*;
}
