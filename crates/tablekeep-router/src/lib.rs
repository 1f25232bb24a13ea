//! Route guarding and post-login redirects for Tablekeep.
//!
//! Two small state machines over a [`Session`](tablekeep_session::Session):
//!
//! - [`RouteGuard`] decides whether a protected view renders, waits, or
//!   bounces to login carrying the current location.
//! - [`RedirectResolver`] decides where a freshly authenticated user goes:
//!   back to where they were headed, or to their role's landing route.
//!
//! Neither touches a real router. They produce [`Navigation`] values, and
//! whatever owns the history applies them through a [`Navigator`]
//! ([`MemoryHistory`] is provided).

mod guard;
mod location;
mod navigation;
mod redirect;
mod routes;

pub use guard::{GuardDecision, RouteGuard};
pub use location::{IntendedDestination, Location};
pub use navigation::{MemoryHistory, Navigation, Navigator};
pub use redirect::RedirectResolver;
pub use routes::RouteTable;
