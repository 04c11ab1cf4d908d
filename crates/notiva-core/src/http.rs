//! Outbound HTTPS client for provider calls
//!
//! All provider traffic goes through hyper's legacy client over rustls.
//! FCM and Web Push endpoints speak HTTP/2; APNs requires it.

use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::{Request, StatusCode};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::time::Duration;

use crate::prelude::*;

/// Every provider call is bounded by this
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub type HttpsClient = Client<HttpsConnector<HttpConnector>, Full<Bytes>>;

/// HTTP/2-only client with native roots
pub fn client_h2() -> NvResult<HttpsClient> {
	let connector = HttpsConnectorBuilder::new()
		.with_native_roots()
		.map_err(|err| Error::Transport(format!("TLS init failed: {err}").into()))?
		.https_only()
		.enable_http2()
		.build();
	Ok(Client::builder(TokioExecutor::new()).http2_only(true).build(connector))
}

/// HTTP/2-only client with a caller-supplied TLS config (client certs)
pub fn client_h2_with_tls(tls: rustls::ClientConfig) -> HttpsClient {
	let connector = HttpsConnectorBuilder::new()
		.with_tls_config(tls)
		.https_only()
		.enable_http2()
		.build();
	Client::builder(TokioExecutor::new()).http2_only(true).build(connector)
}

/// Send a request with the standard timeout and collect the body.
pub async fn send(
	client: &HttpsClient,
	request: Request<Full<Bytes>>,
) -> NvResult<(StatusCode, Bytes)> {
	let response = tokio::time::timeout(REQUEST_TIMEOUT, client.request(request))
		.await
		.map_err(|_| Error::Transport("request timed out".into()))?
		.map_err(|err| Error::Transport(format!("request failed: {err}").into()))?;

	let status = response.status();
	let body = response
		.into_body()
		.collect()
		.await
		.map_err(|err| Error::Transport(format!("body read failed: {err}").into()))?
		.to_bytes();
	Ok((status, body))
}

// vim: ts=4
