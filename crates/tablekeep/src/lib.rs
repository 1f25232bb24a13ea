//! # Tablekeep
//!
//! Session and authentication sync for the Tablekeep reservation client.
//!
//! Tablekeep keeps one answer to "who is logged in" and makes every part
//! of an application agree on it: the route guard, the login and signup
//! forms, and every identity-scoped list the app reads.
//!
//! ## Layers
//!
//! ```text
//! tablekeep-router     RouteGuard, RedirectResolver, MemoryHistory
//!        ↑
//! tablekeep-session    SessionController: login / signup / logout
//!        ↑
//! tablekeep-cache      QueryCache: the `me` entry and the resources
//! tablekeep-transport  HttpTransport: the REST API, cookie session
//!        ↑
//! tablekeep-protocol   User, Credentials, ApiError
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablekeep::prelude::*;
//!
//! # async fn run() -> Result<(), TablekeepError> {
//! let client = Client::builder()
//!     .base_url("http://localhost:3000/api")
//!     .build()?;
//!
//! client
//!     .session()
//!     .login(&Credentials::new("sam@example.com", "hunter2"))
//!     .await?;
//!
//! if let Some(user) = client.session().current_session().await? {
//!     let nav = client.resolver().resolve(&user, None);
//!     println!("go to {}", nav.to);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod resources;
pub mod telemetry;

pub use client::{Client, ClientBuilder};
pub use config::{API_URL_ENV, ClientConfig, DEFAULT_API_URL};
pub use error::TablekeepError;

pub use tablekeep_cache as cache;
pub use tablekeep_protocol as protocol;
pub use tablekeep_router as router;
pub use tablekeep_session as session;
pub use tablekeep_transport as transport;

/// Everything most applications need, in one import.
pub mod prelude {
    pub use crate::resources::{Reservation, Restaurant};
    pub use crate::{Client, ClientBuilder, ClientConfig, TablekeepError};
    pub use tablekeep_cache::{QueryCache, QueryKey};
    pub use tablekeep_protocol::{ApiError, Credentials, Role, SignupPayload, User};
    pub use tablekeep_router::{
        GuardDecision, IntendedDestination, Location, MemoryHistory, Navigation, Navigator,
        RedirectResolver, RouteGuard,
    };
    pub use tablekeep_session::{
        FormErrors, OperationState, OperationStatus, Session, SessionController,
    };
    pub use tablekeep_transport::Transport;
}
