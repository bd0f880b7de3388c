//! Demonstrates plugging a custom HTTP transport and mapper into the strategy.
//!
//! 1. Implement [`StrategyHttpClient`] so the transport records [`ResponseMetadata`] via the
//!    provided [`ResponseMetadataSlot`].
//! 2. Provide a [`TransportErrorMapper`] that understands the transport error type.
//! 3. Pass both to [`SlackStrategy::with_http_client`]; the code exchange and the `users.info`
//!    lookup then run on the custom transport.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::Arc,
};
// crates.io
use color_eyre::Result;
use time::Duration;
// self
use oauth2_slack::{
	error::{Error, TransportError},
	flows::{CallbackParams, SlackStrategy},
	http::{ResponseMetadata, ResponseMetadataSlot, StrategyHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{Method, Response, header::CONTENT_TYPE},
		},
	},
	provider::{AuthorizationOptions, Endpoint, StrategyConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = StrategyConfig::builder()
		.client_id("demo-client")
		.client_secret("demo-secret")
		.callback_url("https://app.example.com/auth/slack/callback")
		.build()?;
	let mapper = Arc::new(CannedTransportErrorMapper);
	let strategy: SlackStrategy<CannedSlack, CannedTransportErrorMapper> =
		SlackStrategy::with_http_client(config.clone(), CannedSlack::healthy(), Arc::clone(&mapper));
	let session = strategy.start_authorization(&AuthorizationOptions::default());
	let callback = CallbackParams {
		code: Some("demo-code".into()),
		state: Some(session.state.clone()),
		..CallbackParams::default()
	};
	let login = strategy.authenticate(&session, &callback).await?;

	println!(
		"Signed in {} ({}) with user token {}.",
		login.profile.display_name, login.profile.id, login.access_token
	);

	let failing: SlackStrategy<CannedSlack, CannedTransportErrorMapper> =
		SlackStrategy::with_http_client(
			config,
			CannedSlack::unreachable("slack.com"),
			mapper,
		);
	let session = failing.start_authorization(&AuthorizationOptions::default());
	let callback = CallbackParams { state: Some(session.state.clone()), ..callback };

	match failing.authenticate(&session, &callback).await {
		Ok(_) => println!("Canned transport unexpectedly succeeded."),
		Err(e) => println!("Transport error mapped by the strategy: {e}."),
	}

	Ok(())
}

#[derive(Clone, Debug)]
enum CannedTransportError {
	DnsFailure { host: &'static str },
}
impl Display for CannedTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::DnsFailure { host } => write!(f, "DNS lookup failed for {host}"),
		}
	}
}
impl StdError for CannedTransportError {}

/// Answers every Slack call from canned payloads, or fails at the DNS step.
#[derive(Clone)]
struct CannedSlack {
	unreachable: Option<&'static str>,
}
impl CannedSlack {
	fn healthy() -> Self {
		Self { unreachable: None }
	}

	fn unreachable(host: &'static str) -> Self {
		Self { unreachable: Some(host) }
	}
}
impl StrategyHttpClient for CannedSlack {
	type Handle = CannedSlackHandle;
	type TransportError = CannedTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		CannedSlackHandle { slot, unreachable: self.unreachable }
	}
}

struct CannedSlackHandle {
	slot: ResponseMetadataSlot,
	unreachable: Option<&'static str>,
}
impl<'a> AsyncHttpClient<'a> for CannedSlackHandle {
	type Error = HttpClientError<CannedTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'a + Send + Sync>>;

	fn call(&'a self, request: HttpRequest) -> Self::Future {
		let slot = self.slot.clone();
		let unreachable = self.unreachable;

		Box::pin(async move {
			slot.take();

			if let Some(host) = unreachable {
				// The oauth2 crate keeps the `Reqwest` variant name even though the boxed
				// payload can be any transport error.
				return Err(HttpClientError::Reqwest(Box::new(CannedTransportError::DnsFailure {
					host,
				})));
			}

			let body: &[u8] = if request.method() == Method::POST {
				br#"{"ok":true,"access_token":"xoxb-demo","token_type":"bot","authed_user":{"id":"U0DEMO","access_token":"xoxp-demo"}}"#
			} else {
				br#"{"ok":true,"user":{"id":"U0DEMO","name":"ada","real_name":"Ada Lovelace","profile":{"email":"ada@example.com"}}}"#
			};

			slot.store(ResponseMetadata { status: Some(200), retry_after: Some(Duration::ZERO) });

			Response::builder()
				.status(200)
				.header(CONTENT_TYPE, "application/json")
				.body(body.to_vec())
				.map_err(HttpClientError::Http)
		})
	}
}

#[derive(Clone, Debug, Default)]
struct CannedTransportErrorMapper;
impl TransportErrorMapper<CannedTransportError> for CannedTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<CannedTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(endpoint, *inner).into(),
			other => TransportError::Other { endpoint, message: other.to_string() }.into(),
		}
	}
}
