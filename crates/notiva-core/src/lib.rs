//! Core infrastructure for the Notiva push engine.
//!
//! Holds the shared application state, configuration model, the HTTPS
//! client used for provider calls, and the credential cache that keeps
//! short-lived provider tokens warm across dispatches.

pub mod app;
pub mod config;
pub mod extract;
pub mod http;
pub mod prelude;
pub mod token_cache;

// vim: ts=4
