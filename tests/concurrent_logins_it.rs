mod common;

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	future::Future,
	pin::Pin,
	sync::Arc,
};
// crates.io
use parking_lot::Mutex;
// self
use common::*;
use oauth2_slack::{
	error::{Error, TransportError},
	flows::{CallbackParams, SlackStrategy},
	http::{ResponseMetadata, ResponseMetadataSlot, StrategyHttpClient},
	oauth::{
		TransportErrorMapper,
		oauth2::{
			AsyncHttpClient, HttpClientError, HttpRequest, HttpResponse,
			http::{
				Method, Response,
				header::{AUTHORIZATION, CONTENT_TYPE},
			},
		},
	},
	provider::{AuthorizationOptions, ClientAuthMethod, Endpoint},
	url::{Url, form_urlencoded},
};

#[derive(Debug)]
struct FakeTransportError;
impl Display for FakeTransportError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("Fake transport failure.")
	}
}
impl StdError for FakeTransportError {}

/// In-process Slack double that derives every token and user from the authorization code, so a
/// response can only belong to the attempt that sent the code.
#[derive(Clone, Default)]
struct FakeSlack {
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	profile_unreachable: bool,
}
impl FakeSlack {
	fn profile_unreachable() -> Self {
		Self { profile_unreachable: true, ..Self::default() }
	}

	fn recorded(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}
}
impl StrategyHttpClient for FakeSlack {
	type Handle = FakeSlackHandle;
	type TransportError = FakeTransportError;

	fn with_metadata(&self, slot: ResponseMetadataSlot) -> Self::Handle {
		FakeSlackHandle {
			slot,
			requests: self.requests.clone(),
			profile_unreachable: self.profile_unreachable,
		}
	}
}

struct FakeSlackHandle {
	slot: ResponseMetadataSlot,
	requests: Arc<Mutex<Vec<RecordedRequest>>>,
	profile_unreachable: bool,
}
impl<'c> AsyncHttpClient<'c> for FakeSlackHandle {
	type Error = HttpClientError<FakeTransportError>;
	type Future =
		Pin<Box<dyn Future<Output = Result<HttpResponse, Self::Error>> + 'c + Send + Sync>>;

	fn call(&'c self, request: HttpRequest) -> Self::Future {
		Box::pin(async move {
			self.slot.take();
			self.requests.lock().push(RecordedRequest {
				method: request.method().clone(),
				uri: request.uri().to_string(),
				has_authorization: request.headers().contains_key(AUTHORIZATION),
			});

			if self.profile_unreachable && request.method() == Method::GET {
				return Err(HttpClientError::Reqwest(Box::new(FakeTransportError)));
			}

			let body = if request.method() == Method::POST {
				let code = form_urlencoded::parse(request.body())
					.find(|(key, _)| key == "code")
					.map(|(_, value)| value.into_owned())
					.ok_or(HttpClientError::Other("Token request without code.".into()))?;

				// Let the other attempt run between the exchange and the profile fetch.
				for _ in 0..code.len() * 3 {
					tokio::task::yield_now().await;
				}

				exchange_body(&format!("bot-{code}"), &format!("U{code}"), &format!("user-{code}"))
			} else {
				let url = Url::parse(&request.uri().to_string())
					.map_err(|err| HttpClientError::Other(err.to_string()))?;
				let query: QueryPairs = url.query_pairs().into_owned().collect();
				let user = query.get("user").unwrap_or_default();
				let token = query.get("token").unwrap_or_default();

				// Slack only answers when the workspace token matches the user it was issued with.
				if token.strip_prefix("bot-") != user.strip_prefix('U') {
					serde_json::json!({ "ok": false, "error": "invalid_auth" }).to_string()
				} else {
					profile_body(user, &format!("Name {user}"), &format!("{user}@x.com"))
				}
			};

			self.slot.store(ResponseMetadata { status: Some(200), retry_after: None });

			Response::builder()
				.status(200)
				.header(CONTENT_TYPE, "application/json")
				.body(body.into_bytes())
				.map_err(HttpClientError::Http)
		})
	}
}

#[derive(Clone, Debug)]
struct RecordedRequest {
	method: Method,
	uri: String,
	has_authorization: bool,
}

struct QueryPairs(Vec<(String, String)>);
impl QueryPairs {
	fn get(&self, key: &str) -> Option<&str> {
		self.0.iter().find(|(name, _)| name == key).map(|(_, value)| value.as_str())
	}
}
impl FromIterator<(String, String)> for QueryPairs {
	fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
		Self(iter.into_iter().collect())
	}
}

#[derive(Default)]
struct FakeMapper;
impl TransportErrorMapper<FakeTransportError> for FakeMapper {
	fn map_transport_error(
		&self,
		endpoint: Endpoint,
		_metadata: Option<&ResponseMetadata>,
		error: HttpClientError<FakeTransportError>,
	) -> Error {
		match error {
			HttpClientError::Reqwest(inner) => TransportError::network(endpoint, *inner).into(),
			other => TransportError::Other { endpoint, message: other.to_string() }.into(),
		}
	}
}

fn strategy(transport: FakeSlack) -> SlackStrategy<FakeSlack, FakeMapper> {
	SlackStrategy::with_http_client(
		config("https://slack.test", ClientAuthMethod::ClientSecretPost),
		transport,
		FakeMapper,
	)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn overlapping_logins_never_share_exchange_data() {
	let transport = FakeSlack::default();
	let strategy = Arc::new(strategy(transport.clone()));
	let mut handles = Vec::new();

	for code in ["a", "bbbbbbbb"] {
		let strategy = strategy.clone();

		handles.push(tokio::spawn(async move {
			let session = strategy.start_authorization(&AuthorizationOptions::default());
			let callback = CallbackParams {
				code: Some(code.into()),
				state: Some(session.state.clone()),
				..CallbackParams::default()
			};

			(code, strategy.authenticate(&session, &callback).await)
		}));
	}

	for handle in handles {
		let (code, result) = handle.await.expect("Login task should not panic.");
		let login = result.expect("Each overlapping login should succeed on its own data.");

		assert_eq!(login.access_token.expose(), format!("user-{code}"));
		assert_eq!(login.exchange.access_token.expose(), format!("bot-{code}"));
		assert_eq!(&*login.profile.id, format!("U{code}"));
		assert_eq!(login.profile.email, Some(format!("U{code}@x.com")));
	}

	assert_eq!(transport.recorded().len(), 4);
}

#[tokio::test]
async fn profile_lookup_sends_token_only_in_query() {
	let transport = FakeSlack::default();
	let strategy = strategy(transport.clone());
	let session = strategy.start_authorization(&AuthorizationOptions::default());
	let callback = CallbackParams {
		code: Some("z".into()),
		state: Some(session.state.clone()),
		..CallbackParams::default()
	};

	strategy.authenticate(&session, &callback).await.expect("Login should succeed.");

	let recorded = transport.recorded();
	let profile = recorded
		.iter()
		.find(|request| request.method == Method::GET)
		.expect("A profile request should have been sent.");
	let uri = &profile.uri;

	assert!(!profile.has_authorization);
	assert!(uri.starts_with("https://slack.test/api/users.info?"));
	assert!(uri.contains("user=Uz"));
	assert!(uri.contains("token=bot-z"));
	assert!(!uri.contains("user-z"));
}

#[tokio::test]
async fn profile_transport_failure_after_exchange_is_a_network_failure() {
	let transport = FakeSlack::profile_unreachable();
	let strategy = strategy(transport.clone());
	let session = strategy.start_authorization(&AuthorizationOptions::default());
	let callback = CallbackParams {
		code: Some("n".into()),
		state: Some(session.state.clone()),
		..CallbackParams::default()
	};
	let err = strategy
		.authenticate(&session, &callback)
		.await
		.expect_err("An unreachable profile endpoint should fail the login.");

	assert!(
		matches!(
			err,
			Error::Transport(TransportError::Network { endpoint: Endpoint::UsersInfo, .. })
		),
		"Unexpected error: {err:?}."
	);
	assert_eq!(transport.recorded().len(), 2, "Exchange and profile requests should both be sent.");
}
