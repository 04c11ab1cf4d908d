pub use crate::error::{Error, NvResult};
pub use crate::types::{DeviceStatus, Platform, Provider, Timestamp};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
