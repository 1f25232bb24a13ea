//! The handful of routes the session layer needs to know about.

use tablekeep_protocol::Role;
use tracing::warn;

use crate::Location;

/// Route paths used for guarding and redirecting.
///
/// Everything else in the app is opaque to this crate: any path can be
/// protected, and any in-app path can be an intended destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTable {
    /// Where unauthenticated users are sent. Default: `/login`.
    pub login: String,
    /// The public splash page. Default: `/`.
    pub root: String,
    /// Where owners land after authenticating. Default: `/owner-dashboard`.
    pub owner_landing: String,
    /// Where customers land after authenticating. Default: `/my-reservations`.
    pub customer_landing: String,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            login: "/login".into(),
            root: "/".into(),
            owner_landing: "/owner-dashboard".into(),
            customer_landing: "/my-reservations".into(),
        }
    }
}

impl RouteTable {
    /// Forces every path to start with `/`.
    pub fn validated(mut self) -> Self {
        for (name, path) in [
            ("login", &mut self.login),
            ("root", &mut self.root),
            ("owner_landing", &mut self.owner_landing),
            ("customer_landing", &mut self.customer_landing),
        ] {
            if !path.starts_with('/') {
                warn!(route = name, path = %path, "route is not absolute, prefixing '/'");
                path.insert(0, '/');
            }
        }
        self
    }

    pub fn login(&self) -> Location {
        Location::new(self.login.as_str())
    }

    /// The landing route for `role`.
    pub fn landing_for(&self, role: Role) -> Location {
        match role {
            Role::Owner => Location::new(self.owner_landing.as_str()),
            Role::Customer => Location::new(self.customer_landing.as_str()),
        }
    }

    /// Returns `true` for the root and login routes: destinations that
    /// say nothing about where the user wanted to be.
    pub fn is_generic(&self, location: &Location) -> bool {
        location.same_route(&self.root) || location.same_route(&self.login)
    }
}
