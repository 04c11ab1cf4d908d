//! Multi-provider push notification dispatch for Notiva.
//!
//! A single notification payload fans out to Firebase Cloud Messaging
//! (HTTP v1), Apple Push Notification service, and Web Push endpoints.
//! Each provider adapter translates the normalized payload into its
//! wire format and authenticates with cached short-lived credentials.
//!
//! The device registry tracks where a user can be reached; delivery
//! targets resolved from it are handed to [`channel::PushChannel`],
//! which tries providers in the configured order and reports whether
//! at least one delivery went out.

pub mod apns;
pub mod channel;
pub mod fcm;
pub mod formatter;
pub mod handler;
pub mod prelude;
pub mod registry;
pub mod targets;
pub mod webpush;

// vim: ts=4
