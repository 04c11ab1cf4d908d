//! Shared types and adapter traits for the Notiva push engine.
//!
//! This crate contains the foundational types shared between the push
//! dispatch crates and the storage adapter implementations. Keeping them
//! in a separate crate lets adapters compile in parallel with the
//! dispatch layer.

pub mod device_adapter;
pub mod error;
pub mod prelude;
pub mod types;
pub mod utils;

// vim: ts=4
