//! The session controller: the only writer of session state.
//!
//! Every change to "who is logged in" goes through here. The controller
//! wraps the three authentication calls of the [`Transport`] and pairs
//! each with exactly one cache mutation on the current-user key:
//!
//! | operation | on success                                   |
//! |-----------|----------------------------------------------|
//! | `login`   | invalidate `me`                              |
//! | `signup`  | invalidate `me`                              |
//! | `logout`  | reset `me` to `None`, invalidate every other |
//!
//! The mutation runs after the transport call resolves and before the
//! operation is reported as `Success`, so anyone who sees `Success` also
//! sees a session that is already refreshing (or already cleared).
//!
//! # Concurrency note
//!
//! The controller is shared by `Arc` between every consumer: the route
//! guard, forms, and the resource queries. All of its state lives in the
//! [`QueryCache`] and in `watch` channels, so every method takes `&self`.

use std::sync::Arc;

use tablekeep_cache::{LoadState, QueryCache, QueryKey};
use tablekeep_protocol::{ApiError, AuthResponse, Credentials, FieldError, SignupPayload, User};
use tablekeep_transport::Transport;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::operation::OperationTracker;
use crate::{OperationState, Session, SessionConfig, SessionError};

/// Message of the validation error returned for blank credentials.
pub const MISSING_FIELDS: &str = "Missing required fields";

/// Owns the current session and the operations that change it.
///
/// ## Lifecycle
///
/// ```text
///   current_session() ──→ Ready { None } ──login()──→ Loading
///                                                        │
///                                            current_session()
///                                                        ▼
///   Ready { None } ←──logout()── Ready { Some(user) } ←──┘
/// ```
pub struct SessionController<T: Transport> {
    transport: Arc<T>,
    cache: QueryCache,
    config: SessionConfig,
    key: QueryKey,
    session: watch::Sender<Session>,
    login: OperationTracker,
    signup: OperationTracker,
    logout: OperationTracker,
}

impl<T: Transport> SessionController<T> {
    pub fn new(transport: Arc<T>, cache: QueryCache, config: SessionConfig) -> Self {
        let key = QueryKey::current_user();
        let (session, _) = watch::channel(Session::default());
        let controller = Self {
            transport,
            cache,
            config,
            key,
            session,
            login: OperationTracker::new("login"),
            signup: OperationTracker::new("signup"),
            logout: OperationTracker::new("logout"),
        };
        // The cache may be shared and already hold a session.
        controller.publish();
        controller
    }

    // -- Session ----------------------------------------------------------

    /// The session as the cache knows it right now. Never fetches.
    pub fn session(&self) -> Session {
        let Some(state) = self.cache.state(&self.key) else {
            return Session::default();
        };

        if state.invalidated {
            return Session::loading();
        }

        match state.status {
            LoadState::Idle => Session::default(),
            LoadState::Loading => Session::loading(),
            LoadState::Error => Session::error(),
            LoadState::Ready => match self.cache.peek::<Option<User>>(&self.key) {
                Some(user) => Session::ready(Option::clone(&user)),
                None => Session::error(),
            },
        }
    }

    /// Receives a new [`Session`] whenever the controller changes or
    /// reads it.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    /// Returns the current user, asking `GET /auth/me` if the cached
    /// answer is missing, stale, or invalidated.
    ///
    /// A 401 is an answer, not a failure: it resolves to `Ok(None)` and
    /// the session becomes `Ready` with no user. Concurrent callers share
    /// one request.
    ///
    /// # Errors
    /// [`SessionError::Api`] for any other failure; the session is left
    /// in the `Error` state and the next call asks again.
    pub async fn current_session(&self) -> Result<Option<User>, SessionError> {
        let transport = Arc::clone(&self.transport);
        let pending = self
            .cache
            .read_with(&self.key, self.config.query_options(), move || {
                let transport = Arc::clone(&transport);
                async move { fetch_current_user(transport.as_ref()).await }
            });
        self.publish();

        let result = pending.await;
        self.publish();

        let user = result?;
        Ok(Option::clone(&user))
    }

    /// Forgets the cached identity and asks the server again.
    pub async fn refresh(&self) -> Result<Option<User>, SessionError> {
        self.cache.invalidate(&self.key);
        self.publish();
        self.current_session().await
    }

    // -- Operations -------------------------------------------------------

    /// `POST /auth/login`, then marks the current user stale.
    ///
    /// The login response is not used as the session: the next
    /// [`current_session`](Self::current_session) re-fetches the
    /// authoritative user.
    ///
    /// # Errors
    /// The normalized [`ApiError`], untouched. Blank fields fail with a
    /// validation error naming them, without a request. The cache is not
    /// touched on failure.
    pub async fn login(&self, credentials: &Credentials) -> Result<(), ApiError> {
        let id = self.login.begin();
        debug!(email = %credentials.email, "login started");

        let result = match require(credentials) {
            Ok(()) => self.transport.login(credentials).await.map(|response| {
                self.authenticated("login", &response);
            }),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            debug!(error = %err, "login failed");
        }
        self.login.finish(id, &result);
        result
    }

    /// `POST /auth/signup`, then marks the current user stale. Signing up
    /// authenticates, so the contract is the same as [`login`](Self::login).
    pub async fn signup(&self, payload: &SignupPayload) -> Result<(), ApiError> {
        let id = self.signup.begin();
        debug!(email = %payload.email, role = %payload.role, "signup started");

        let result = match require(&payload.credentials()) {
            Ok(()) => self.transport.signup(payload).await.map(|response| {
                self.authenticated("signup", &response);
            }),
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            debug!(error = %err, "signup failed");
        }
        self.signup.finish(id, &result);
        result
    }

    /// `POST /auth/logout`, then clears the session.
    ///
    /// The current user is reset to `None` synchronously (no stale
    /// identity can be served while anything re-fetches), and every
    /// other cached resource is invalidated so identity-scoped data can't
    /// leak into the next session.
    ///
    /// Logging out without a session succeeds: a 401 from the server
    /// means there was nothing to end.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let id = self.logout.begin();

        let result = match self.transport.logout().await {
            Ok(()) => Ok(()),
            Err(err) if err.is_unauthorized() => {
                debug!("no server session to end");
                Ok(())
            }
            Err(err) => Err(err),
        };

        match &result {
            Ok(()) => {
                self.cache.reset(&self.key, None::<User>);
                let purged = self.cache.invalidate_all_except(&self.key);
                self.publish();
                info!(purged = purged.len(), "logged out");
            }
            Err(err) => warn!(error = %err, "logout failed"),
        }

        self.logout.finish(id, &result);
        result
    }

    fn authenticated(&self, operation: &'static str, response: &AuthResponse) {
        self.cache.invalidate(&self.key);
        self.publish();
        info!(
            operation,
            user_id = %response.user.id,
            "authenticated, current user marked stale"
        );
    }

    // -- Operation state --------------------------------------------------

    pub fn login_state(&self) -> OperationState {
        self.login.get()
    }

    pub fn signup_state(&self) -> OperationState {
        self.signup.get()
    }

    pub fn logout_state(&self) -> OperationState {
        self.logout.get()
    }

    pub fn subscribe_login(&self) -> watch::Receiver<OperationState> {
        self.login.subscribe()
    }

    pub fn subscribe_signup(&self) -> watch::Receiver<OperationState> {
        self.signup.subscribe()
    }

    pub fn subscribe_logout(&self) -> watch::Receiver<OperationState> {
        self.logout.subscribe()
    }

    /// Returns login to `Idle`. A login still in flight will not report.
    pub fn reset_login(&self) {
        self.login.reset();
    }

    pub fn reset_signup(&self) {
        self.signup.reset();
    }

    pub fn reset_logout(&self) {
        self.logout.reset();
    }

    // -- Accessors --------------------------------------------------------

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Pushes the current snapshot to subscribers if it changed.
    fn publish(&self) {
        let next = self.session();
        self.session.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            debug!(from = %current.load_state, to = %next.load_state, "session changed");
            *current = next;
            true
        });
    }
}

/// `GET /auth/me`, with a 401 mapped to "nobody is logged in".
async fn fetch_current_user<T: Transport>(transport: &T) -> Result<Option<User>, ApiError> {
    match transport.me().await {
        Ok(AuthResponse { user }) => Ok(Some(user)),
        Err(err) if err.is_unauthorized() => {
            debug!("no active session");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Rejects credentials that can't possibly authenticate.
fn require(credentials: &Credentials) -> Result<(), ApiError> {
    let blank = credentials.blank_fields();
    if blank.is_empty() {
        return Ok(());
    }
    let details = blank
        .into_iter()
        .map(|field| FieldError::new(field, format!("{} is required", capitalize(field))))
        .collect();
    Err(ApiError::validation(MISSING_FIELDS, details))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
