//! Optional observability helpers for login stages.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oauth2_slack.flow` with the `stage` and
//!   `call_site` fields, plus a `warn` event whenever a stage fails.
//! - Enable `metrics` to increment the `oauth2_slack_flow_total` counter for every
//!   attempt/success/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Login stages observed by the strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowStage {
	/// Building the authorization redirect.
	Authorize,
	/// Exchanging the authorization code at `oauth.v2.access`.
	TokenExchange,
	/// Fetching the profile from `users.info`.
	ProfileFetch,
	/// Handing the login to the host verifier.
	Verify,
}
impl FlowStage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowStage::Authorize => "authorize",
			FlowStage::TokenExchange => "token_exchange",
			FlowStage::ProfileFetch => "profile_fetch",
			FlowStage::Verify => "verify",
		}
	}
}
impl Display for FlowStage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a stage.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a stage span and records its attempt and outcome.
pub(crate) async fn observe<T, Fut>(stage: FlowStage, call_site: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = FlowSpan::new(stage, call_site);

	record_flow_outcome(stage, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	match &result {
		Ok(_) => record_flow_outcome(stage, FlowOutcome::Success),
		Err(err) => {
			warn_flow_failure(stage, call_site, err);
			record_flow_outcome(stage, FlowOutcome::Failure);
		},
	}

	result
}
