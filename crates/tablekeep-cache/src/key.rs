use std::fmt;
use std::sync::Arc;

/// Identifies one cached resource.
///
/// Cloning is cheap (`Arc<str>`), since keys are copied into events,
/// in-flight fetches, and log fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Arc<str>);

impl QueryKey {
    /// The key of the "current session" resource (`GET /auth/me`).
    pub const CURRENT_USER: &'static str = "me";

    pub fn new(key: impl AsRef<str>) -> Self {
        Self(Arc::from(key.as_ref()))
    }

    pub fn current_user() -> Self {
        Self::new(Self::CURRENT_USER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0)
    }
}

impl From<&str> for QueryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_key_is_me() {
        assert_eq!(QueryKey::current_user().as_str(), "me");
        assert_eq!(QueryKey::current_user(), QueryKey::from("me"));
    }

    #[test]
    fn test_display_wraps_in_brackets() {
        assert_eq!(QueryKey::new("my-reservations").to_string(), "[my-reservations]");
    }
}
