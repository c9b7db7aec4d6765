//! Bearer secret wrapper that keeps token material out of logs.

// self
use crate::_prelude::*;

/// Redacted token secret; only [`TokenSecret::expose`] yields the raw value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Renders the value for an `Authorization` header.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.0)
	}

	pub(crate) fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn formatters_redact_but_header_carries_value() {
		let secret = TokenSecret::new("at-1");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
		assert_eq!(secret.bearer_header(), "Bearer at-1");
		assert_eq!(serde_json::to_string(&secret).expect("Secret should serialize."), "\"at-1\"");
	}
}
