//! In-app locations and the destination a redirect remembers.

use std::fmt;

/// A path inside the app, e.g. `/restaurants/42?date=today#map`.
///
/// Stored as given; [`pathname`](Self::pathname) splits off the query
/// and fragment when routes are compared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    path: String,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The full path, including any query and fragment.
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// The path without `?query` or `#fragment`.
    pub fn pathname(&self) -> &str {
        let end = self.path.find(['?', '#']).unwrap_or(self.path.len());
        &self.path[..end]
    }

    /// The pathname with trailing slashes removed (`/` stays `/`).
    pub fn normalized_pathname(&self) -> &str {
        let trimmed = self.pathname().trim_end_matches('/');
        if trimmed.is_empty() { "/" } else { trimmed }
    }

    /// Returns `true` for an absolute path within this app.
    ///
    /// `//host/...` and `/\host/...` are rejected: browsers treat both
    /// as links to another origin.
    pub fn is_in_app(&self) -> bool {
        let mut chars = self.path.chars();
        chars.next() == Some('/') && !matches!(chars.next(), Some('/' | '\\'))
    }

    /// Returns `true` if both point at the same route, ignoring query,
    /// fragment, and trailing slashes.
    pub fn same_route(&self, other: &str) -> bool {
        self.normalized_pathname() == Location::new(other).normalized_pathname()
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for Location {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

/// The route a user was trying to reach before being sent to log in.
///
/// Carried as transient state on the redirect navigation and handed to
/// the login screen once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IntendedDestination(Location);

impl IntendedDestination {
    pub fn new(location: impl Into<Location>) -> Self {
        Self(location.into())
    }

    pub fn location(&self) -> &Location {
        &self.0
    }

    pub fn into_location(self) -> Location {
        self.0
    }
}

impl From<Location> for IntendedDestination {
    fn from(location: Location) -> Self {
        Self(location)
    }
}
