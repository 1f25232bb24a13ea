use tablekeep::prelude::*;
use tablekeep::telemetry;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

const EMAIL_ENV: &str = "TABLEKEEP_EMAIL";
const PASSWORD_ENV: &str = "TABLEKEEP_PASSWORD";

/// Where the walkthrough starts: a protected page the user bookmarked.
const BOOKMARK: &str = "/restaurants/42?date=2026-10-20";

fn credentials_from(email: Option<String>, password: Option<String>) -> Credentials {
    Credentials::new(email.unwrap_or_default(), password.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Walkthrough
// ---------------------------------------------------------------------------

/// Applies a guard decision to the history, returning whether the page
/// may render.
fn apply(history: &mut MemoryHistory, decision: &GuardDecision) -> bool {
    match decision {
        GuardDecision::Pending => false,
        GuardDecision::Render => true,
        GuardDecision::Redirect(nav) => {
            history.navigate(nav.clone());
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), TablekeepError> {
    telemetry::init("session_walkthrough=info,tablekeep=info");

    let client = Client::builder()
        .config(ClientConfig::from_env())
        .build()?;
    let session = client.session();
    let mut history = MemoryHistory::new("/");

    // 1. Open the bookmark without a session.
    history.navigate(Navigation::push(BOOKMARK));
    let decision = client.authorize(history.location()).await;
    apply(&mut history, &decision);
    info!(at = %history.location(), "after opening the bookmark");

    // 2. Log in from the login screen.
    let intended = history.take_intended();
    let credentials = credentials_from(
        std::env::var(EMAIL_ENV).ok(),
        std::env::var(PASSWORD_ENV).ok(),
    );
    if let Err(err) = session.login(&credentials).await {
        let form = FormErrors::from_api_error(&err);
        for (field, message) in form.fields() {
            warn!(field, message, "login rejected");
        }
        if let Some(message) = form.root() {
            warn!(message, "login rejected");
        }
        return Ok(());
    }

    // 3. Wait for the confirmed session, then follow the redirect.
    let user = session.current_session().await?;
    match client
        .resolver()
        .after_authentication(&session.session(), intended.as_ref())
    {
        Some(nav) => history.navigate(nav),
        None => warn!("session did not confirm a user"),
    }
    info!(
        user = user.as_ref().map(User::full_name).unwrap_or_default(),
        at = %history.location(),
        "logged in"
    );

    // 4. Read the lists that belong to this user.
    if user.as_ref().is_some_and(User::is_owner) {
        let reservations = client.owner_reservations().await?;
        info!(count = reservations.len(), "incoming reservations");
    } else {
        let reservations = client.my_reservations().await?;
        for r in reservations.iter() {
            info!(
                restaurant = %r.restaurant_label(),
                date = %r.date,
                time = %r.time,
                persons = r.persons,
                status = %r.status,
                "reservation"
            );
        }
    }

    // 5. Log out; the page re-renders and bounces to login.
    session.logout().await?;
    let here = history.location().clone();
    let decision = client.guard().decide(&session.session(), &here);
    apply(&mut history, &decision);
    info!(at = %history.location(), cached = client.cache().keys().len(), "logged out");

    Ok(())
}
