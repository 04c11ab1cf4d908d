//! Utility functions

use sha2::{Digest, Sha256};
use std::fmt::Write;

use crate::prelude::*;
use rand::RngExt;

pub const DEVICE_ID_LENGTH: usize = 12;
pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

pub fn random_id(len: usize) -> NvResult<String> {
	let mut rng = rand::rng();
	let mut result = String::with_capacity(len);

	for _ in 0..len {
		result.push(SAFE[rng.random_range(0..SAFE.len())]);
	}
	Ok(result)
}

/// Lowercase hex SHA-256 digest of the input
pub fn sha256_hex(input: &str) -> String {
	let digest = Sha256::digest(input.as_bytes());
	let mut out = String::with_capacity(digest.len() * 2);
	for byte in digest {
		let _ = write!(out, "{:02x}", byte);
	}
	out
}

/// Synthetic device token for a Web Push subscription.
///
/// Web Push has no provider token, so registrations are keyed by a
/// stable hash of the subscription endpoint instead.
pub fn webpush_token(endpoint: &str) -> String {
	format!("wp_{}", sha256_hex(endpoint))
}


// vim: ts=4
