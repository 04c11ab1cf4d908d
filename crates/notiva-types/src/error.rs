//! Error type shared across the workspace
//!
//! Provider/transport failures inside the dispatch path are folded into
//! boolean outcomes and never reach HTTP responses; the `IntoResponse`
//! mapping below only serves the device registry surface.

use axum::{Json, http::StatusCode, response::IntoResponse};

pub type NvResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Missing or malformed request field (422)
	Validation { field: Box<str>, message: Box<str> },
	/// Unknown push provider identifier (400)
	InvalidProvider(Box<str>),
	PermissionDenied,
	NotFound,
	/// Storage failure. Detail is logged at the call site, never exposed.
	DbError,
	/// Missing or incomplete provider credentials
	Config(Box<str>),
	/// Network failure, timeout, or non-2xx provider response
	Transport(Box<str>),
	Internal(String),

	// externals
	Io(std::io::Error),
}

impl Error {
	pub fn validation(field: &str, message: &str) -> Self {
		Self::Validation { field: field.into(), message: message.into() }
	}
}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl std::fmt::Display for Error {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			Error::Validation { field, message } => write!(f, "validation failed: {field}: {message}"),
			Error::InvalidProvider(provider) => write!(f, "invalid provider: {provider}"),
			Error::PermissionDenied => write!(f, "permission denied"),
			Error::NotFound => write!(f, "not found"),
			Error::DbError => write!(f, "database error"),
			Error::Config(msg) => write!(f, "configuration error: {msg}"),
			Error::Transport(msg) => write!(f, "transport error: {msg}"),
			Error::Internal(msg) => write!(f, "internal error: {msg}"),
			Error::Io(err) => write!(f, "io error: {err}"),
		}
	}
}

impl IntoResponse for Error {
	fn into_response(self) -> axum::response::Response {
		match self {
			Error::Validation { field, message } => {
				let mut errors = serde_json::Map::new();
				errors.insert(field.into(), message.as_ref().into());
				(
					StatusCode::UNPROCESSABLE_ENTITY,
					Json(serde_json::json!({
						"message": "Validation failed",
						"errors": errors,
					})),
				)
					.into_response()
			}
			Error::InvalidProvider(provider) => (
				StatusCode::BAD_REQUEST,
				Json(serde_json::json!({
					"message": "Invalid provider",
					"provider": provider.as_ref(),
				})),
			)
				.into_response(),
			Error::PermissionDenied => (StatusCode::UNAUTHORIZED, "unauthorized").into_response(),
			Error::NotFound => (StatusCode::NOT_FOUND, "not found").into_response(),
			// Storage and internal failures share a generic body
			_ => (
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(serde_json::json!({ "message": "Internal error", "error": "db_error" })),
			)
				.into_response(),
		}
	}
}

// vim: ts=4
