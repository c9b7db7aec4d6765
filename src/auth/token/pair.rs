//! Access/refresh token pair issued by the auth endpoints.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access and refresh token issued together and replaced together.
///
/// A pair is never edited in place; stores swap whole values so readers observe either the old
/// pair or the new one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived credential attached to every API call.
	pub access_token: TokenSecret,
	/// Longer-lived credential used only against the refresh endpoint.
	pub refresh_token: TokenSecret,
}
impl TokenPair {
	/// Creates a pair from raw token strings.
	pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
		Self {
			access_token: TokenSecret::new(access_token),
			refresh_token: TokenSecret::new(refresh_token),
		}
	}

	/// Returns `None` when either half is blank, since a half pair counts as no pair.
	pub fn into_complete(self) -> Option<Self> {
		if self.access_token.is_blank() || self.refresh_token.is_blank() {
			None
		} else {
			Some(self)
		}
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.finish()
	}
}
