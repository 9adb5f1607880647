//! ISBN-13 validation.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why a string is not an ISBN-13.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IsbnError {
    /// Something other than digits remained after separators were removed.
    #[error("ISBN contains invalid character '{0}'")]
    InvalidCharacter(char),

    /// The number of digits is not 13.
    #[error("ISBN-13 needs 13 digits, got {0}")]
    WrongLength(usize),

    /// The prefix is neither 978 nor 979.
    #[error("ISBN-13 must start with 978 or 979")]
    InvalidPrefix,

    /// The check digit does not match.
    #[error("ISBN checksum mismatch")]
    Checksum,
}

/// A validated ISBN-13, stored as its 13 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Isbn(String);

impl Isbn {
    /// Parses an ISBN-13, ignoring whitespace, `-` and `.` separators.
    ///
    /// ```
    /// use tabula_books::Isbn;
    ///
    /// let isbn = Isbn::try_from_str("978-5-17-108154-6").unwrap();
    /// assert_eq!(isbn.as_str(), "9785171081546");
    /// assert!(Isbn::try_from_str("978-5-17-108154-7").is_err());
    /// ```
    pub fn try_from_str(raw: &str) -> Result<Self, IsbnError> {
        let mut digits = String::with_capacity(13);
        for c in raw.chars() {
            match c {
                '0'..='9' => digits.push(c),
                '-' | '.' => {}
                c if c.is_whitespace() => {}
                other => return Err(IsbnError::InvalidCharacter(other)),
            }
        }

        if digits.len() != 13 {
            return Err(IsbnError::WrongLength(digits.len()));
        }
        if !digits.starts_with("978") && !digits.starts_with("979") {
            return Err(IsbnError::InvalidPrefix);
        }

        let sum: u32 = digits
            .bytes()
            .take(12)
            .enumerate()
            .map(|(i, b)| {
                let digit = u32::from(b - b'0');
                if i % 2 == 0 { digit } else { digit * 3 }
            })
            .sum();
        let check = (10 - sum % 10) % 10;
        if u32::from(digits.as_bytes()[12] - b'0') != check {
            return Err(IsbnError::Checksum);
        }

        Ok(Self(digits))
    }

    /// The 13 digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Isbn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Isbn {
    type Err = IsbnError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from_str(s)
    }
}
