//! Mobile number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`MobileNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MobileNumberError {
    /// Wrong number of digits.
    #[error("mobile number must be exactly {expected} digits")]
    Length {
        /// Required digit count.
        expected: usize,
    },
    /// Something other than an ASCII digit was present.
    #[error("mobile number may only contain digits")]
    NonDigit,
}

/// A ten digit mobile number, stored without separators.
///
/// ```
/// use bookstore_core::MobileNumber;
///
/// assert_eq!(MobileNumber::parse("98765 43210").unwrap().as_str(), "9876543210");
/// assert!(MobileNumber::parse("12345").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct MobileNumber(String);

impl MobileNumber {
    /// Number of digits in a mobile number (matches the `VARCHAR(10)` column).
    pub const DIGITS: usize = 10;

    /// Parse a mobile number, ignoring spaces and dashes between digits.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has non-digit characters or the wrong length.
    pub fn parse(s: &str) -> Result<Self, MobileNumberError> {
        let compact: String = s
            .trim()
            .chars()
            .filter(|c| *c != ' ' && *c != '-')
            .collect();

        if !compact.chars().all(|c| c.is_ascii_digit()) {
            return Err(MobileNumberError::NonDigit);
        }
        if compact.len() != Self::DIGITS {
            return Err(MobileNumberError::Length {
                expected: Self::DIGITS,
            });
        }

        Ok(Self(compact))
    }

    /// Returns the digits as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MobileNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MobileNumber {
    type Error = MobileNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MobileNumber> for String {
    fn from(number: MobileNumber) -> Self {
        number.0
    }
}
