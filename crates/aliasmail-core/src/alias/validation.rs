//! Alias suffix validation.

/// Longest accepted suffix.
pub const MAX_SUFFIX_LEN: usize = 20;

/// Problem with an alias suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuffixError {
    /// Suffix is empty.
    Empty,
    /// Suffix is longer than [`MAX_SUFFIX_LEN`].
    TooLong,
    /// Suffix contains something other than ASCII letters and digits.
    InvalidChar,
}

impl SuffixError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::Empty => "suffix is required",
            Self::TooLong => "suffix must be at most 20 characters",
            Self::InvalidChar => "suffix may only contain letters and digits",
        }
    }
}

impl std::fmt::Display for SuffixError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for SuffixError {}

/// Validate an alias suffix.
///
/// # Errors
///
/// Returns the first problem found.
pub fn validate_suffix(suffix: &str) -> Result<(), SuffixError> {
    if suffix.is_empty() {
        return Err(SuffixError::Empty);
    }
    if !suffix.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(SuffixError::InvalidChar);
    }
    if suffix.len() > MAX_SUFFIX_LEN {
        return Err(SuffixError::TooLong);
    }
    Ok(())
}
