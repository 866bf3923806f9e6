// ABOUTME: Core identifiers and validated name type shared by server and client
// ABOUTME: Mirrors the newtype-with-validation convention used for protocol fields

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique identifier assigned to a connection on accept.
///
/// Monotonically increasing for the lifetime of the process; never reused
/// even after the connection it names has closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(u64);

impl ConnId {
    /// Returns a fresh, never-before-issued id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        ConnId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const MAX_NAME_LEN: usize = 25;

/// A validated username or channel name.
///
/// Length in `[1, 25]`, consisting only of `[A-Za-z0-9_.]` and single
/// interior spaces (no leading, trailing, or consecutive spaces).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Name(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("Name {0} is invalid.\n")]
    Invalid(String),
}

impl Name {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Default username assigned to a freshly connected, unnamed user.
    pub fn default_for(id: ConnId) -> Self {
        // The connection id's textual form always satisfies the name rule:
        // it's a nonempty run of ASCII digits.
        Name(id.to_string())
    }

    fn is_valid(s: &str) -> bool {
        if s.is_empty() || s.len() > MAX_NAME_LEN {
            return false;
        }
        let mut prev_space = false;
        for (i, ch) in s.chars().enumerate() {
            if ch == ' ' {
                if prev_space || i == 0 || i == s.chars().count() - 1 {
                    return false;
                }
                prev_space = true;
            } else if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' {
                prev_space = false;
            } else {
                return false;
            }
        }
        true
    }
}

impl FromStr for Name {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Name::is_valid(s) {
            Ok(Name(s.to_string()))
        } else {
            Err(NameError::Invalid(s.to_string()))
        }
    }
}

impl TryFrom<String> for Name {
    type Error = NameError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Name::is_valid(&s) {
            Ok(Name(s))
        } else {
            Err(NameError::Invalid(s))
        }
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Name {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_single_char() {
        assert!("a".parse::<Name>().is_ok());
    }

    #[test]
    fn accepts_mixed_charset() {
        assert!("A.Z_9".parse::<Name>().is_ok());
    }

    #[test]
    fn accepts_interior_single_space() {
        assert!("alice bob".parse::<Name>().is_ok());
    }

    #[test]
    fn accepts_25_char_boundary() {
        let s = "a".repeat(25);
        assert!(s.parse::<Name>().is_ok());
    }

    #[test]
    fn rejects_empty() {
        assert!("".parse::<Name>().is_err());
    }

    #[test]
    fn rejects_leading_space() {
        assert!(" a".parse::<Name>().is_err());
    }

    #[test]
    fn rejects_trailing_space() {
        assert!("a ".parse::<Name>().is_err());
    }

    #[test]
    fn rejects_consecutive_spaces() {
        assert!("a  b".parse::<Name>().is_err());
    }

    #[test]
    fn rejects_26_char_string() {
        let s = "a".repeat(26);
        assert!(s.parse::<Name>().is_err());
    }

    #[test]
    fn rejects_disallowed_char() {
        assert!("a-b".parse::<Name>().is_err());
    }

    #[test]
    fn default_name_is_always_valid() {
        let id = ConnId::next();
        let name = Name::default_for(id);
        assert!(name.as_str().parse::<Name>().is_ok());
    }
}
