pub use crate::app::App;
pub use notiva_types::error::{Error, NvResult};
pub use notiva_types::types::{Provider, Timestamp};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
