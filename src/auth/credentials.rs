//! Login credentials exchanged for a [`TokenPair`](crate::auth::TokenPair).

// self
use crate::{_prelude::*, error::ValidationError};

/// Email/password pair posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct Credentials {
	email: String,
	password: String,
}
impl Credentials {
	/// Builds credentials, rejecting blank fields before any request is made.
	pub fn new(
		email: impl Into<String>,
		password: impl Into<String>,
	) -> Result<Self, ValidationError> {
		let email = email.into();
		let password = password.into();

		if email.trim().is_empty() {
			return Err(ValidationError::MissingField { field: "email" });
		}
		if password.is_empty() {
			return Err(ValidationError::MissingField { field: "password" });
		}

		Ok(Self { email, password })
	}

	/// Account email.
	pub fn email(&self) -> &str {
		&self.email
	}
}
impl Debug for Credentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}
