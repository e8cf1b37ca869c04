//! Login and registration credentials with client-side validation.
//!
//! Validation mirrors the backend's password policy so obviously invalid
//! submissions never leave the client.

use std::fmt;

use serde::Serialize;

use crate::domain::ClientError;

const PASSWORD_MIN_CHARS: usize = 8;
const PASSWORD_MAX_CHARS: usize = 128;
const PASSWORD_SPECIALS: &str = "!@#$%^&*()-+";

/// Validation failures for [`Credentials`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// The email was empty after trimming.
    #[error("email must not be empty")]
    EmptyEmail,
    /// The password was empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// The password does not satisfy the registration policy.
    #[error("Invalid email or password")]
    WeakPassword,
}

impl From<CredentialsValidationError> for ClientError {
    fn from(error: CredentialsValidationError) -> Self {
        Self::validation(error.to_string())
    }
}

/// Email and password submitted to the auth endpoints.
///
/// The email is trimmed and lower-cased on construction. `Debug` output
/// redacts the password.
///
/// # Examples
/// ```
/// use frontend::domain::Credentials;
///
/// let credentials = Credentials::for_login(" Ada@Example.com ", "secret")?;
/// assert_eq!(credentials.email(), "ada@example.com");
/// # Ok::<(), frontend::domain::CredentialsValidationError>(())
/// ```
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    email: String,
    password: String,
}

impl Credentials {
    /// Credentials for `POST /auth/login`: both fields must be non-empty.
    ///
    /// # Errors
    /// Returns [`CredentialsValidationError`] when a field is empty.
    pub fn for_login(
        email: impl AsRef<str>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsValidationError> {
        let email = email.as_ref().trim().to_lowercase();
        let password = password.into();
        if email.is_empty() {
            return Err(CredentialsValidationError::EmptyEmail);
        }
        if password.is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self { email, password })
    }

    /// Credentials for `POST /auth/register`: login rules plus the password
    /// policy (see [`satisfies_password_policy`]).
    ///
    /// # Errors
    /// Returns [`CredentialsValidationError`] when a field is empty or the
    /// password is too weak.
    pub fn for_registration(
        email: impl AsRef<str>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsValidationError> {
        let credentials = Self::for_login(email, password)?;
        if satisfies_password_policy(&credentials.password) {
            Ok(credentials)
        } else {
            Err(CredentialsValidationError::WeakPassword)
        }
    }

    /// Normalized email address.
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Whether `password` meets the registration policy.
///
/// The password must be 8 to 128 characters long and contain an uppercase
/// letter, a lowercase letter, an ASCII digit and one of `!@#$%^&*()-+`.
#[must_use]
pub fn satisfies_password_policy(password: &str) -> bool {
    let length = password.chars().count();
    if !(PASSWORD_MIN_CHARS..=PASSWORD_MAX_CHARS).contains(&length) {
        return false;
    }

    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));
    has_upper && has_lower && has_digit && has_special
}
