//! Login input validation.

/// Problem with login input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialError {
    /// Email address is empty.
    EmptyEmail,
    /// Email address is not under the account domain.
    WrongDomain,
    /// Secret is empty.
    EmptySecret,
    /// Secret is shorter than [`MIN_SECRET_LEN`].
    SecretTooShort,
}

/// Minimum secret length.
pub const MIN_SECRET_LEN: usize = 6;

impl CredentialError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyEmail => "Email address is required",
            Self::WrongDomain => "Email address must use the account domain",
            Self::EmptySecret => "Password is required",
            Self::SecretTooShort => "Password must be at least 6 characters",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyEmail | Self::WrongDomain => "email",
            Self::EmptySecret | Self::SecretTooShort => "secret",
        }
    }
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for CredentialError {}

/// Result of validating login input.
pub type CredentialResult = Result<(), Vec<CredentialError>>;

/// Validate login input against the account `domain`.
///
/// # Errors
///
/// Returns every problem found.
pub fn validate_credentials(email: &str, secret: &str, domain: &str) -> CredentialResult {
    let mut errors = Vec::new();

    let email = email.trim();
    if email.is_empty() {
        errors.push(CredentialError::EmptyEmail);
    } else {
        let local = email
            .strip_suffix(domain)
            .and_then(|rest| rest.strip_suffix('@'));
        if local.is_none_or(str::is_empty) {
            errors.push(CredentialError::WrongDomain);
        }
    }

    if secret.is_empty() {
        errors.push(CredentialError::EmptySecret);
    } else if secret.chars().count() < MIN_SECRET_LEN {
        errors.push(CredentialError::SecretTooShort);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
