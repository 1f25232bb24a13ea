//! End-to-end navigation scenarios: guard → login → redirect → logout.
//!
//! Drives a real `SessionController` over a one-account scripted
//! transport and applies every decision to a `MemoryHistory`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tablekeep_cache::{QueryCache, QueryKey};
use tablekeep_protocol::{ApiError, AuthResponse, Credentials, Role, SignupPayload, User, UserId};
use tablekeep_router::{
    GuardDecision, IntendedDestination, Location, MemoryHistory, Navigation, Navigator,
    RedirectResolver, RouteGuard,
};
use tablekeep_session::{OperationStatus, SessionConfig, SessionController};
use tablekeep_transport::Transport;

// =========================================================================
// Scripted transport: a single account
// =========================================================================

struct OneAccount {
    user: User,
    password: &'static str,
    logged_in: Mutex<bool>,
    me_error: Mutex<Option<ApiError>>,
    me_calls: AtomicUsize,
}

impl OneAccount {
    fn new(role: Role) -> Self {
        Self {
            user: User {
                id: UserId::new("42"),
                firstname: "Sam".into(),
                lastname: "Example".into(),
                email: "sam@example.com".into(),
                role,
            },
            password: "hunter2",
            logged_in: Mutex::new(false),
            me_error: Mutex::new(None),
            me_calls: AtomicUsize::new(0),
        }
    }
}

impl Transport for OneAccount {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        if credentials.email == self.user.email && credentials.password == self.password {
            *self.logged_in.lock().unwrap() = true;
            Ok(AuthResponse {
                user: self.user.clone(),
            })
        } else {
            Err(ApiError::unauthorized("Invalid credentials"))
        }
    }

    async fn signup(&self, _payload: &SignupPayload) -> Result<AuthResponse, ApiError> {
        Err(ApiError::new(403, "Signups are closed"))
    }

    async fn me(&self) -> Result<AuthResponse, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.me_error.lock().unwrap().clone() {
            return Err(err);
        }
        if *self.logged_in.lock().unwrap() {
            Ok(AuthResponse {
                user: self.user.clone(),
            })
        } else {
            Err(ApiError::unauthorized("Not authenticated"))
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        *self.logged_in.lock().unwrap() = false;
        Ok(())
    }

    async fn get_json(&self, _path: &str) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::json!({ "data": [] }))
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct App {
    controller: SessionController<OneAccount>,
    guard: RouteGuard,
    resolver: RedirectResolver,
}

fn app(role: Role) -> App {
    App {
        controller: SessionController::new(
            Arc::new(OneAccount::new(role)),
            QueryCache::default(),
            SessionConfig::default(),
        ),
        guard: RouteGuard::default(),
        resolver: RedirectResolver::default(),
    }
}

fn credentials() -> Credentials {
    Credentials::new("sam@example.com", "hunter2")
}

/// Visits `path` as a protected route and applies the guard's decision.
async fn visit_protected(app: &App, history: &mut MemoryHistory, path: &str) -> GuardDecision {
    history.navigate(Navigation::push(path));
    let decision = app
        .guard
        .authorize(&app.controller, history.location())
        .await;
    if let GuardDecision::Redirect(nav) = &decision {
        history.navigate(nav.clone());
    }
    decision
}

/// Logs in from the login screen and applies the resulting redirect.
async fn log_in_from_login_screen(app: &App, history: &mut MemoryHistory) -> Navigation {
    let intended = history.take_intended();
    app.controller.login(&credentials()).await.unwrap();

    // Success is reported, but the session is re-confirming: no redirect yet.
    assert_eq!(app.controller.login_state().status, OperationStatus::Success);
    assert_eq!(
        app.resolver
            .after_authentication(&app.controller.session(), intended.as_ref()),
        None
    );

    app.controller.current_session().await.unwrap();
    let nav = app
        .resolver
        .after_authentication(&app.controller.session(), intended.as_ref())
        .expect("session is ready with a user");
    history.navigate(nav.clone());
    nav
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_unauthenticated_visit_redirects_then_returns_after_login() {
    let app = app(Role::Customer);
    let mut history = MemoryHistory::new("/");

    let decision = visit_protected(&app, &mut history, "/restaurants/42").await;

    assert!(matches!(decision, GuardDecision::Redirect(_)));
    assert_eq!(history.location().as_str(), "/login");
    // The protected route was replaced, not stacked under login.
    assert_eq!(
        history.locations(),
        vec![&Location::new("/"), &Location::new("/login")]
    );

    let nav = log_in_from_login_screen(&app, &mut history).await;

    assert_eq!(nav.to.as_str(), "/restaurants/42");
    assert!(nav.replace);
    assert_eq!(history.location().as_str(), "/restaurants/42");
    assert_eq!(
        app.guard
            .authorize(&app.controller, history.location())
            .await,
        GuardDecision::Render
    );
}

#[tokio::test]
async fn test_owner_login_without_destination_lands_on_dashboard() {
    let app = app(Role::Owner);
    let mut history = MemoryHistory::new("/login");

    let nav = log_in_from_login_screen(&app, &mut history).await;

    assert_eq!(nav.to.as_str(), "/owner-dashboard");
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_customer_redirected_from_login_lands_on_reservations() {
    let app = app(Role::Customer);
    let mut history = MemoryHistory::new("/");

    visit_protected(&app, &mut history, "/login").await;
    let nav = log_in_from_login_screen(&app, &mut history).await;

    assert_eq!(nav.to.as_str(), "/my-reservations");
}

#[tokio::test]
async fn test_logout_on_protected_route_redirects_on_next_render() {
    let app = app(Role::Customer);
    let mut history = MemoryHistory::new("/login");
    log_in_from_login_screen(&app, &mut history).await;
    let here = history.location().clone();
    assert_eq!(
        app.guard.authorize(&app.controller, &here).await,
        GuardDecision::Render
    );

    app.controller.logout().await.unwrap();

    // Re-render without navigating: the snapshot is already logged out.
    let decision = app.guard.decide(&app.controller.session(), &here);
    assert_eq!(
        decision,
        GuardDecision::Redirect(
            Navigation::replace("/login").with_intended(IntendedDestination::new(here.clone()))
        )
    );
}

#[tokio::test]
async fn test_guard_is_pending_between_login_and_refetch() {
    let app = app(Role::Customer);
    app.controller.current_session().await.unwrap();

    app.controller.login(&credentials()).await.unwrap();

    let here = Location::new("/my-reservations");
    assert_eq!(
        app.guard.decide(&app.controller.session(), &here),
        GuardDecision::Pending
    );
    assert_eq!(
        app.guard.authorize(&app.controller, &here).await,
        GuardDecision::Render
    );
}

#[tokio::test]
async fn test_failed_signup_keeps_guard_redirecting() {
    let app = app(Role::Customer);
    let payload = SignupPayload::customer("Sam", "Example", "new@example.com", "Pass1234!");

    let err = app.controller.signup(&payload).await.unwrap_err();

    assert_eq!(err.status, Some(403));
    assert!(matches!(
        app.guard
            .authorize(&app.controller, &Location::new("/my-reservations"))
            .await,
        GuardDecision::Redirect(_)
    ));
    assert!(
        app.controller
            .cache()
            .peek::<Option<User>>(&QueryKey::current_user())
            .is_some_and(|user| user.is_none())
    );
}

#[tokio::test]
async fn test_failed_session_refetch_redirects_instead_of_waiting() {
    let app = app(Role::Customer);
    let mut history = MemoryHistory::new("/login");
    log_in_from_login_screen(&app, &mut history).await;
    let here = history.location().clone();

    *app.controller.transport().me_error.lock().unwrap() =
        Some(ApiError::network("connection reset"));
    app.controller.refresh().await.unwrap_err();

    let expected = GuardDecision::Redirect(
        Navigation::replace("/login").with_intended(IntendedDestination::new(here.clone())),
    );
    assert_eq!(app.guard.decide(&app.controller.session(), &here), expected);
    assert_eq!(app.guard.authorize(&app.controller, &here).await, expected);
    assert_eq!(app.controller.transport().me_calls.load(Ordering::SeqCst), 3);
}
