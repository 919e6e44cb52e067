//! Client library for the CINE NEST catalog API: dual-realm credential
//! resolution, realm-keyed session persistence, and the admin content list
//! controller. The `cinenest` binary is a thin CLI over these pieces.

pub mod api;
pub mod auth;
pub mod cli;
pub mod content;
pub mod errors;
pub mod session;

/// User agent attached to every outgoing request.
pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
