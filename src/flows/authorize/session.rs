// crates.io
use rand::{Rng, distr::Alphanumeric};
// self
use crate::{_prelude::*, provider::StrategyConfig};

const STATE_LEN: usize = 32;

/// Authorization redirect metadata returned by
/// [`SlackStrategy::start_authorization`](crate::flows::SlackStrategy::start_authorization).
///
/// Hosts keep the session (for example in their own cookie or session store) until the
/// provider redirects back, then hand it to
/// [`SlackStrategy::authenticate`](crate::flows::SlackStrategy::authenticate).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationSession {
	/// Opaque state value that must round-trip via the redirect handler.
	pub state: String,
	/// Redirect URI supplied when constructing the authorize URL.
	pub redirect_uri: Url,
	/// Fully-formed authorize URL the end-user is sent to.
	pub authorize_url: Url,
	/// When the session was issued.
	pub issued_at: OffsetDateTime,
}
impl AuthorizationSession {
	/// Validates the returned `state` parameter and the session lifetime.
	pub fn validate_state(
		&self,
		returned_state: &str,
		now: OffsetDateTime,
		ttl: Duration,
	) -> Result<()> {
		if returned_state != self.state {
			return Err(Error::InvalidState { reason: "state mismatch".into() });
		}
		if now - self.issued_at > ttl {
			return Err(Error::InvalidState { reason: "authorization session expired".into() });
		}

		Ok(())
	}
}

pub(super) fn build_session(
	config: &StrategyConfig,
	extra_params: &BTreeMap<String, String>,
	issued_at: OffsetDateTime,
) -> AuthorizationSession {
	let state = random_string(STATE_LEN);
	let redirect_uri = config.callback_url.clone();
	let authorize_url = build_authorize_url(config, &redirect_uri, &state, extra_params);

	AuthorizationSession { state, redirect_uri, authorize_url, issued_at }
}

fn build_authorize_url(
	config: &StrategyConfig,
	redirect_uri: &Url,
	state: &str,
	extra_params: &BTreeMap<String, String>,
) -> Url {
	let mut url = config.endpoints.authorization.clone();
	let mut pairs = url.query_pairs_mut();

	pairs.append_pair("response_type", "code");
	pairs.append_pair("client_id", &config.client_id);
	pairs.append_pair("redirect_uri", redirect_uri.as_str());

	if let Some(scope_value) = config.scope.join(config.quirks.scope_delimiter) {
		pairs.append_pair("scope", &scope_value);
	}

	pairs.append_pair("state", state);

	for (key, value) in extra_params {
		pairs.append_pair(key, value);
	}

	drop(pairs);

	url
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}
