//! Integration tests for the session controller using a scripted transport.
//!
//! `FakeServer` keeps just enough state to behave like the API: a table
//! of accounts, the account the session cookie currently points at, and
//! counters for every endpoint. Individual endpoints can be made to fail
//! or to hang until a test releases them.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tablekeep_cache::{LoadState, QueryCache, QueryKey};
use tablekeep_protocol::{
    ApiError, AuthResponse, Credentials, ErrorKind, FieldError, Role, SignupPayload, User, UserId,
};
use tablekeep_session::{
    FormErrors, OperationStatus, Session, SessionConfig, SessionController, SessionError,
};
use tablekeep_transport::Transport;
use tokio::sync::Notify;

// =========================================================================
// Fake server
// =========================================================================

#[derive(Default)]
struct FakeServer {
    accounts: Mutex<HashMap<String, (String, User)>>,
    logged_in: Mutex<Option<User>>,
    /// When set, login/signup answer with this user instead of the real
    /// one, like a partial mutation response.
    mutation_user: Mutex<Option<User>>,
    me_error: Mutex<Option<ApiError>>,
    logout_error: Mutex<Option<ApiError>>,
    me_gate: Mutex<Option<Arc<Notify>>>,
    login_calls: AtomicUsize,
    signup_calls: AtomicUsize,
    me_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl FakeServer {
    fn with_accounts(users: &[(&str, User)]) -> Self {
        let server = Self::default();
        {
            let mut accounts = server.accounts.lock().unwrap();
            for (password, user) in users {
                accounts.insert(user.email.clone(), (password.to_string(), user.clone()));
            }
        }
        server
    }

    fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn acknowledge(&self, user: &User) -> AuthResponse {
        let user = self
            .mutation_user
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| user.clone());
        AuthResponse { user }
    }
}

impl Transport for FakeServer {
    async fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);
        let account = self.accounts.lock().unwrap().get(&credentials.email).cloned();
        match account {
            Some((password, user)) if password == credentials.password => {
                *self.logged_in.lock().unwrap() = Some(user.clone());
                Ok(self.acknowledge(&user))
            }
            _ => Err(ApiError::unauthorized("Invalid credentials")),
        }
    }

    async fn signup(&self, payload: &SignupPayload) -> Result<AuthResponse, ApiError> {
        self.signup_calls.fetch_add(1, Ordering::SeqCst);
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&payload.email) {
            return Err(ApiError::validation(
                "Validation failed",
                vec![FieldError::new("email", "Email already registered")],
            ));
        }
        let user = User {
            id: UserId::new((accounts.len() + 100).to_string()),
            firstname: payload.firstname.clone(),
            lastname: payload.lastname.clone(),
            email: payload.email.clone(),
            role: payload.role,
        };
        accounts.insert(
            payload.email.clone(),
            (payload.password.clone(), user.clone()),
        );
        drop(accounts);
        *self.logged_in.lock().unwrap() = Some(user.clone());
        Ok(self.acknowledge(&user))
    }

    async fn me(&self) -> Result<AuthResponse, ApiError> {
        self.me_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.me_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if let Some(err) = self.me_error.lock().unwrap().clone() {
            return Err(err);
        }
        match self.logged_in.lock().unwrap().clone() {
            Some(user) => Ok(AuthResponse { user }),
            None => Err(ApiError::unauthorized("Not authenticated")),
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.logout_error.lock().unwrap().clone() {
            return Err(err);
        }
        match self.logged_in.lock().unwrap().take() {
            Some(_) => Ok(()),
            None => Err(ApiError::unauthorized("Not authenticated")),
        }
    }

    async fn get_json(&self, _path: &str) -> Result<serde_json::Value, ApiError> {
        Ok(serde_json::Value::Null)
    }
}

// =========================================================================
// Helpers
// =========================================================================

fn user(id: &str, firstname: &str, email: &str, role: Role) -> User {
    User {
        id: UserId::new(id),
        firstname: firstname.into(),
        lastname: "Example".into(),
        email: email.into(),
        role,
    }
}

fn ada() -> User {
    user("1", "Ada", "ada@example.com", Role::Customer)
}

fn grace() -> User {
    user("2", "Grace", "grace@example.com", Role::Owner)
}

fn server() -> Arc<FakeServer> {
    Arc::new(FakeServer::with_accounts(&[
        ("ada-pass", ada()),
        ("grace-pass", grace()),
    ]))
}

fn controller(server: &Arc<FakeServer>) -> SessionController<FakeServer> {
    SessionController::new(
        Arc::clone(server),
        QueryCache::default(),
        SessionConfig::default(),
    )
}

fn ada_credentials() -> Credentials {
    Credentials::new("ada@example.com", "ada-pass")
}

// =========================================================================
// current_session()
// =========================================================================

#[tokio::test]
async fn test_session_before_any_read_is_idle() {
    let server = server();
    let ctrl = controller(&server);

    assert_eq!(ctrl.session(), Session::default());
    assert_eq!(FakeServer::calls(&server.me_calls), 0);
}

#[tokio::test]
async fn test_current_session_unauthenticated_is_ready_without_user() {
    let server = server();
    let ctrl = controller(&server);

    let user = ctrl.current_session().await.unwrap();

    assert!(user.is_none());
    assert_eq!(ctrl.session(), Session::ready(None));
}

#[tokio::test]
async fn test_current_session_is_cached_within_stale_time() {
    let server = server();
    let ctrl = controller(&server);

    ctrl.current_session().await.unwrap();
    ctrl.current_session().await.unwrap();

    assert_eq!(FakeServer::calls(&server.me_calls), 1);
}

#[tokio::test]
async fn test_concurrent_session_reads_share_one_request() {
    let server = server();
    let ctrl = controller(&server);

    let (a, b, c) = tokio::join!(
        ctrl.current_session(),
        ctrl.current_session(),
        ctrl.current_session()
    );

    assert!(a.unwrap().is_none());
    assert!(b.unwrap().is_none());
    assert!(c.unwrap().is_none());
    assert_eq!(FakeServer::calls(&server.me_calls), 1);
}

#[tokio::test]
async fn test_current_session_server_error_is_error_state() {
    let server = server();
    *server.me_error.lock().unwrap() = Some(ApiError::new(500, "Database unavailable"));
    let ctrl = controller(&server);

    let err = ctrl.current_session().await.unwrap_err();

    assert!(matches!(&err, SessionError::Api(e) if e.message == "Database unavailable"));
    assert_eq!(ctrl.session(), Session::error());

    // The failure is not cached: the next read asks again.
    *server.me_error.lock().unwrap() = None;
    assert!(ctrl.current_session().await.unwrap().is_none());
    assert_eq!(FakeServer::calls(&server.me_calls), 2);
    assert_eq!(ctrl.session().load_state, LoadState::Ready);
}

#[tokio::test]
async fn test_session_is_loading_while_me_is_in_flight() {
    let server = server();
    let gate = Arc::new(Notify::new());
    *server.me_gate.lock().unwrap() = Some(Arc::clone(&gate));
    let ctrl = Arc::new(controller(&server));
    let mut sessions = ctrl.subscribe();

    let reader = tokio::spawn({
        let ctrl = Arc::clone(&ctrl);
        async move { ctrl.current_session().await }
    });

    sessions.changed().await.unwrap();
    assert_eq!(*sessions.borrow_and_update(), Session::loading());

    gate.notify_one();
    let user = reader.await.unwrap().unwrap();

    assert!(user.is_none());
    sessions.changed().await.unwrap();
    assert_eq!(*sessions.borrow_and_update(), Session::ready(None));
}

#[tokio::test]
async fn test_refresh_asks_server_again() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.current_session().await.unwrap();

    *server.logged_in.lock().unwrap() = Some(ada());
    let user = ctrl.refresh().await.unwrap();

    assert_eq!(user, Some(ada()));
    assert_eq!(FakeServer::calls(&server.me_calls), 2);
}

#[tokio::test]
async fn test_refresh_failure_is_error_state() {
    let server = server();
    *server.logged_in.lock().unwrap() = Some(ada());
    let ctrl = controller(&server);
    ctrl.current_session().await.unwrap();

    *server.me_error.lock().unwrap() = Some(ApiError::network("connection reset"));
    let err = ctrl.refresh().await.unwrap_err();

    assert_eq!(err.api_error().unwrap().kind(), ErrorKind::Network);
    // The previous user is not shown again.
    assert_eq!(ctrl.session(), Session::error());
    assert_eq!(*ctrl.subscribe().borrow(), Session::error());
}

#[tokio::test]
async fn test_refetch_failure_after_login_is_error_state() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.current_session().await.unwrap();
    ctrl.login(&ada_credentials()).await.unwrap();
    assert_eq!(ctrl.session(), Session::loading());

    *server.me_error.lock().unwrap() = Some(ApiError::new(500, "Database unavailable"));
    ctrl.current_session().await.unwrap_err();

    let state = ctrl.cache().state(&QueryKey::current_user()).unwrap();
    assert_eq!(state.status, LoadState::Error);
    assert!(!state.invalidated);
    assert!(!state.fetching);
    assert_eq!(ctrl.session(), Session::error());
    assert!(!ctrl.session().is_pending());

    // The next read recovers.
    *server.me_error.lock().unwrap() = None;
    assert_eq!(ctrl.current_session().await.unwrap(), Some(ada()));
    assert_eq!(ctrl.session(), Session::ready(Some(ada())));
}

// =========================================================================
// login()
// =========================================================================

#[tokio::test]
async fn test_login_success_marks_session_stale_without_fetching() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.current_session().await.unwrap();

    ctrl.login(&ada_credentials()).await.unwrap();

    assert_eq!(ctrl.login_state().status, OperationStatus::Success);
    assert_eq!(ctrl.session(), Session::loading());
    assert!(ctrl.cache().state(&QueryKey::current_user()).unwrap().invalidated);
    assert_eq!(FakeServer::calls(&server.me_calls), 1);
}

#[tokio::test]
async fn test_login_session_comes_from_me_not_login_response() {
    let server = server();
    let partial = user("1", "Partial", "ada@example.com", Role::Customer);
    *server.mutation_user.lock().unwrap() = Some(partial);
    let ctrl = controller(&server);

    ctrl.login(&ada_credentials()).await.unwrap();
    let current = ctrl.current_session().await.unwrap();

    assert_eq!(current, Some(ada()));
    assert_eq!(ctrl.session(), Session::ready(Some(ada())));
}

#[tokio::test]
async fn test_login_wrong_password_leaves_cache_untouched() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.current_session().await.unwrap();
    let mut events = ctrl.cache().subscribe();

    let err = ctrl
        .login(&Credentials::new("ada@example.com", "nope"))
        .await
        .unwrap_err();

    assert_eq!(err.message, "Invalid credentials");
    assert_eq!(err.kind(), ErrorKind::Unauthorized);
    assert!(events.try_recv().is_err(), "no cache mutation on failure");
    assert_eq!(ctrl.session(), Session::ready(None));

    let state = ctrl.login_state();
    assert_eq!(state.status, OperationStatus::Error);
    assert_eq!(state.error, Some(err.clone()));
    assert_eq!(FormErrors::from_api_error(&err).root(), Some("Invalid credentials"));
}

#[tokio::test]
async fn test_login_blank_credentials_skips_transport() {
    let server = server();
    let ctrl = controller(&server);

    let err = ctrl.login(&Credentials::new("", "")).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(FakeServer::calls(&server.login_calls), 0);
    let form = FormErrors::from_api_error(&err);
    assert_eq!(form.field("email"), Some("Email is required"));
    assert_eq!(form.field("password"), Some("Password is required"));
    assert_eq!(ctrl.login_state().status, OperationStatus::Error);
}

#[tokio::test]
async fn test_login_invalidates_exactly_once() {
    let server = server();
    let ctrl = controller(&server);
    let mut events = ctrl.cache().subscribe();

    ctrl.login(&ada_credentials()).await.unwrap();

    let mut invalidations = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, tablekeep_cache::CacheEvent::Invalidated(_)) {
            invalidations += 1;
        }
    }
    assert_eq!(invalidations, 1);
}

#[tokio::test]
async fn test_reset_login_returns_to_idle() {
    let server = server();
    let ctrl = controller(&server);
    let _ = ctrl.login(&Credentials::new("ada@example.com", "nope")).await;
    assert_eq!(ctrl.login_state().status, OperationStatus::Error);

    ctrl.reset_login();

    assert_eq!(ctrl.login_state().status, OperationStatus::Idle);
    assert!(ctrl.login_state().error.is_none());
}

#[tokio::test]
async fn test_subscribe_login_sees_pending_then_success() {
    let server = server();
    let ctrl = controller(&server);
    let mut states = ctrl.subscribe_login();

    ctrl.login(&ada_credentials()).await.unwrap();

    assert!(states.has_changed().unwrap());
    assert_eq!(states.borrow_and_update().status, OperationStatus::Success);
}

// =========================================================================
// signup()
// =========================================================================

#[tokio::test]
async fn test_signup_authenticates_new_account() {
    let server = server();
    let ctrl = controller(&server);
    let payload =
        SignupPayload::owner("Linus", "Example", "linus@example.com", "Pass1234!", "r-7");

    ctrl.signup(&payload).await.unwrap();
    let current = ctrl.current_session().await.unwrap().unwrap();

    assert_eq!(current.email, "linus@example.com");
    assert_eq!(current.role, Role::Owner);
    assert_eq!(ctrl.signup_state().status, OperationStatus::Success);
}

#[tokio::test]
async fn test_signup_duplicate_email_maps_to_field_error() {
    let server = server();
    let ctrl = controller(&server);
    let payload = SignupPayload::customer("Ada", "Example", "ada@example.com", "Pass1234!");

    let err = ctrl.signup(&payload).await.unwrap_err();

    let form = FormErrors::from_api_error(&err);
    assert_eq!(form.field("email"), Some("Email already registered"));
    assert_eq!(form.root(), None);
    assert!(ctrl.cache().state(&QueryKey::current_user()).is_none());
}

#[tokio::test]
async fn test_signup_blank_password_skips_transport() {
    let server = server();
    let ctrl = controller(&server);
    let payload = SignupPayload::customer("Ada", "Example", "new@example.com", "");

    let err = ctrl.signup(&payload).await.unwrap_err();

    assert_eq!(err.field_errors().len(), 1);
    assert_eq!(err.field_errors()[0].field, "password");
    assert_eq!(FakeServer::calls(&server.signup_calls), 0);
}

// =========================================================================
// logout()
// =========================================================================

#[tokio::test]
async fn test_logout_clears_user_synchronously() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.login(&ada_credentials()).await.unwrap();
    ctrl.current_session().await.unwrap();

    ctrl.logout().await.unwrap();

    assert_eq!(ctrl.session(), Session::ready(None));
    assert_eq!(ctrl.logout_state().status, OperationStatus::Success);
    // Served from the reset value, no new request.
    let me_calls = FakeServer::calls(&server.me_calls);
    assert!(ctrl.current_session().await.unwrap().is_none());
    assert_eq!(FakeServer::calls(&server.me_calls), me_calls);
}

#[tokio::test]
async fn test_logout_purges_identity_scoped_resources() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.login(&ada_credentials()).await.unwrap();
    ctrl.current_session().await.unwrap();
    let reservations = QueryKey::new("my-reservations");
    ctrl.cache().reset(&reservations, vec!["R-1".to_string()]);

    ctrl.logout().await.unwrap();

    assert!(ctrl.cache().peek::<Vec<String>>(&reservations).is_none());
    assert!(ctrl.cache().state(&reservations).unwrap().invalidated);
    assert!(!ctrl.cache().state(&QueryKey::current_user()).unwrap().invalidated);
}

#[tokio::test]
async fn test_logout_when_logged_out_is_success() {
    let server = server();
    let ctrl = controller(&server);

    ctrl.logout().await.unwrap();
    ctrl.logout().await.unwrap();

    assert_eq!(FakeServer::calls(&server.logout_calls), 2);
    assert_eq!(ctrl.session(), Session::ready(None));
    assert_eq!(ctrl.logout_state().status, OperationStatus::Success);
}

#[tokio::test]
async fn test_logout_failure_keeps_session() {
    let server = server();
    let ctrl = controller(&server);
    ctrl.login(&ada_credentials()).await.unwrap();
    ctrl.current_session().await.unwrap();
    *server.logout_error.lock().unwrap() = Some(ApiError::network("connection reset"));

    let err = ctrl.logout().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Network);
    assert_eq!(ctrl.session(), Session::ready(Some(ada())));
    assert_eq!(ctrl.logout_state().status, OperationStatus::Error);
}

// =========================================================================
// Full sequences
// =========================================================================

#[tokio::test]
async fn test_login_logout_login_ends_with_latest_user() {
    let server = server();
    let ctrl = controller(&server);

    ctrl.login(&ada_credentials()).await.unwrap();
    assert_eq!(ctrl.current_session().await.unwrap(), Some(ada()));

    ctrl.logout().await.unwrap();
    assert_eq!(ctrl.current_session().await.unwrap(), None);

    ctrl.login(&Credentials::new("grace@example.com", "grace-pass"))
        .await
        .unwrap();
    assert_eq!(ctrl.current_session().await.unwrap(), Some(grace()));
    assert_eq!(ctrl.session(), Session::ready(Some(grace())));
}

#[tokio::test]
async fn test_controllers_sharing_a_cache_see_the_same_session() {
    let server = server();
    let cache = QueryCache::default();
    let first =
        SessionController::new(Arc::clone(&server), cache.clone(), SessionConfig::default());

    first.login(&ada_credentials()).await.unwrap();
    first.current_session().await.unwrap();

    let second = SessionController::new(Arc::clone(&server), cache, SessionConfig::default());
    assert_eq!(second.session(), Session::ready(Some(ada())));
    assert_eq!(*second.subscribe().borrow(), Session::ready(Some(ada())));
}
