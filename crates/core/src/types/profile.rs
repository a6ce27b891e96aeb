//! Profile fields shared by users and stores: display names, addresses and
//! the password policy.

use core::fmt;

use serde::Serialize;

/// Symbols accepted by the password policy.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*";

/// Errors produced when a profile field violates its policy.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProfileError {
    /// Name length is outside the allowed range.
    #[error("name must be between {min} and {max} characters", min = PersonName::MIN_LENGTH, max = PersonName::MAX_LENGTH)]
    NameLength,
    /// Address is longer than allowed.
    #[error("address must be at most {max} characters", max = Address::MAX_LENGTH)]
    AddressTooLong,
    /// Password length is outside the allowed range.
    #[error("password must be between {min} and {max} characters", min = PlainPassword::MIN_LENGTH, max = PlainPassword::MAX_LENGTH)]
    PasswordLength,
    /// Password has no uppercase letter.
    #[error("password must contain at least one uppercase letter")]
    PasswordMissingUppercase,
    /// Password has no symbol from [`PASSWORD_SYMBOLS`].
    #[error("password must contain at least one of {symbols}", symbols = PASSWORD_SYMBOLS)]
    PasswordMissingSymbol,
}

/// Display name of a user or store, 20 to 60 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonName(String);

impl PersonName {
    /// Minimum number of characters.
    pub const MIN_LENGTH: usize = 20;
    /// Maximum number of characters.
    pub const MAX_LENGTH: usize = 60;

    /// Parse a name, counting characters rather than bytes.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NameLength` if the length is out of range.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(ProfileError::NameLength);
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the name and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for PersonName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Free-form postal address, at most 400 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Maximum number of characters.
    pub const MAX_LENGTH: usize = 400;

    /// Parse an address.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::AddressTooLong` if the address is too long.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        if s.chars().count() > Self::MAX_LENGTH {
            return Err(ProfileError::AddressTooLong);
        }
        Ok(Self(s.to_owned()))
    }

    /// Parse an optional address. Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::AddressTooLong` if the address is too long.
    pub fn parse_optional(s: Option<&str>) -> Result<Option<Self>, ProfileError> {
        match s {
            Some(value) if !value.is_empty() => Self::parse(value).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the address and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A plaintext password that satisfied the password policy.
///
/// Only exists between the request boundary and the hasher. `Debug` never
/// prints the value and the type is deliberately not serializable.
#[derive(Clone, PartialEq, Eq)]
pub struct PlainPassword(String);

impl PlainPassword {
    /// Minimum number of characters.
    pub const MIN_LENGTH: usize = 8;
    /// Maximum number of characters.
    pub const MAX_LENGTH: usize = 16;

    /// Check a candidate password against the policy: 8-16 characters, at
    /// least one uppercase letter and one symbol from [`PASSWORD_SYMBOLS`].
    ///
    /// # Errors
    ///
    /// Returns the first violated rule.
    pub fn parse(s: &str) -> Result<Self, ProfileError> {
        let len = s.chars().count();
        if !(Self::MIN_LENGTH..=Self::MAX_LENGTH).contains(&len) {
            return Err(ProfileError::PasswordLength);
        }
        if !s.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(ProfileError::PasswordMissingUppercase);
        }
        if !s.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
            return Err(ProfileError::PasswordMissingSymbol);
        }
        Ok(Self(s.to_owned()))
    }

    /// Expose the plaintext, for hashing only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PlainPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlainPassword([REDACTED])")
    }
}
