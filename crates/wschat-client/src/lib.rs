//! wschat client library entry.
//!
//! This crate wires login, transport, dispatcher, session, and view into a
//! terminal chat client. It is consumed by the binary (`main.rs`) and by
//! integration tests.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod auth;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod session;
pub mod transport;
pub mod view;
