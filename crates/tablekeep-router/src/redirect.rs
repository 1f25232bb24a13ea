//! Choosing where to go once the user is authenticated.

use tablekeep_cache::LoadState;
use tablekeep_protocol::{Role, User};
use tablekeep_session::Session;
use tracing::debug;

use crate::{IntendedDestination, Location, Navigation, RouteTable};

/// Computes the single navigation after login or signup.
///
/// - No intended destination → the role's landing route.
/// - Intended destination is the root or the login route → the role's
///   landing route (those carry no resume information).
/// - Intended destination is not an in-app path → ignored, landing route.
/// - Otherwise → the intended destination, query and fragment included.
///
/// The navigation always replaces the login screen in history.
#[derive(Debug, Clone, Default)]
pub struct RedirectResolver {
    routes: RouteTable,
}

impl RedirectResolver {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: routes.validated(),
        }
    }

    pub fn landing_for(&self, role: Role) -> Location {
        self.routes.landing_for(role)
    }

    pub fn resolve(&self, user: &User, intended: Option<&IntendedDestination>) -> Navigation {
        let target = intended
            .map(IntendedDestination::location)
            .filter(|location| {
                if !location.is_in_app() {
                    debug!(%location, "ignoring intended destination outside the app");
                    return false;
                }
                !self.routes.is_generic(location)
            })
            .cloned()
            .unwrap_or_else(|| self.landing_for(user.role));

        debug!(user_id = %user.id, to = %target, "post-login redirect");
        Navigation::replace(target)
    }

    /// The redirect for a login screen observing `session`, or `None` if
    /// there is nothing to do yet.
    ///
    /// Only a `Ready` session with a user produces a navigation; a
    /// session that is still re-confirming the user after login never
    /// does, even though the login itself has already succeeded.
    pub fn after_authentication(
        &self,
        session: &Session,
        intended: Option<&IntendedDestination>,
    ) -> Option<Navigation> {
        if session.load_state != LoadState::Ready {
            return None;
        }
        let user = session.user.as_ref()?;
        Some(self.resolve(user, intended))
    }
}
