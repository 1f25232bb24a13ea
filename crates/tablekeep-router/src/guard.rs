//! Gating protected views on the session.

use tablekeep_cache::LoadState;
use tablekeep_session::{Session, SessionController};
use tablekeep_transport::Transport;
use tracing::debug;

use crate::{IntendedDestination, Location, Navigation, RouteTable};

/// What a protected view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session isn't known yet. Render nothing and wait.
    Pending,
    /// A user is logged in. Render the protected content.
    Render,
    /// Nobody is logged in. Apply this navigation instead of rendering.
    Redirect(Navigation),
}

/// Decides whether a protected view may render.
///
/// ```text
///   Idle / Loading ──→ Pending      (never guess while loading)
///   Ready + user   ──→ Render
///   Ready, no user ──→ Redirect(login, replace, intended = here)
///   Error          ──→ Redirect(login, replace, intended = here)
/// ```
///
/// The redirect replaces the current entry, so "back" from the login
/// screen doesn't return to the route that bounced the user. The guard
/// never surfaces an error: a failed session check is shown as login.
#[derive(Debug, Clone, Default)]
pub struct RouteGuard {
    routes: RouteTable,
}

impl RouteGuard {
    pub fn new(routes: RouteTable) -> Self {
        Self {
            routes: routes.validated(),
        }
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decides from a session snapshot. Never fetches.
    pub fn decide(&self, session: &Session, location: &Location) -> GuardDecision {
        match session.load_state {
            LoadState::Idle | LoadState::Loading => GuardDecision::Pending,
            LoadState::Ready if session.user.is_some() => GuardDecision::Render,
            LoadState::Ready | LoadState::Error => {
                debug!(%location, "no session, redirecting to login");
                GuardDecision::Redirect(
                    Navigation::replace(self.routes.login())
                        .with_intended(IntendedDestination::new(location.clone())),
                )
            }
        }
    }

    /// Reads the session (fetching it if needed), then decides.
    ///
    /// Only returns [`GuardDecision::Pending`] if the session was
    /// invalidated again while this call was waiting.
    pub async fn authorize<T: Transport>(
        &self,
        controller: &SessionController<T>,
        location: &Location,
    ) -> GuardDecision {
        if let Err(err) = controller.current_session().await {
            debug!(error = %err, "session check failed");
        }
        self.decide(&controller.session(), location)
    }
}
