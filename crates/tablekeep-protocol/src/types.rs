//! Core wire types for the authentication endpoints.
//!
//! These are the JSON bodies exchanged with `/auth/login`, `/auth/signup`,
//! `/auth/me`, and `/auth/logout`. The client never mutates a [`User`]:
//! it is always replaced wholesale after a server round trip.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a user, as issued by the server.
///
/// The API has shipped both numeric and string ids over time, so the
/// deserializer accepts either and normalizes to text. Serialization
/// always writes a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a `UserId` from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => Self(n.to_string()),
            RawId::Text(s) => Self(s),
        })
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// What kind of account a user holds.
///
/// The role decides where the user lands after authenticating: owners
/// go to their restaurant dashboard, customers to their reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Books tables at restaurants.
    #[default]
    Customer,
    /// Manages a restaurant and its incoming reservations.
    Owner,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// An authenticated user, as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Role,
}

impl User {
    /// "Firstname Lastname", for greetings and menus.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.firstname, self.lastname)
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
///
/// `Debug` is implemented by hand so the password never ends up in logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// Names of the fields that are blank (empty or whitespace only).
    ///
    /// Format rules (valid email, password strength) are the form's job;
    /// this only catches submissions that can't possibly authenticate.
    pub fn blank_fields(&self) -> Vec<&'static str> {
        let mut blank = Vec::new();
        if self.email.trim().is_empty() {
            blank.push("email");
        }
        if self.password.is_empty() {
            blank.push("password");
        }
        blank
    }

    /// Returns `true` if both email and password are present.
    pub fn is_complete(&self) -> bool {
        self.blank_fields().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/signup`.
///
/// Signing up implicitly authenticates: the server sets the session
/// cookie on success, exactly as for login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupPayload {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    /// The restaurant an owner claims. Only sent for owners.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<String>,
}

impl SignupPayload {
    /// A customer account.
    pub fn customer(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            firstname: firstname.into(),
            lastname: lastname.into(),
            email: email.into(),
            password: password.into(),
            role: Role::Customer,
            restaurant_id: None,
        }
    }

    /// An owner account claiming `restaurant_id`.
    pub fn owner(
        firstname: impl Into<String>,
        lastname: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
        restaurant_id: impl Into<String>,
    ) -> Self {
        Self {
            role: Role::Owner,
            restaurant_id: Some(restaurant_id.into()),
            ..Self::customer(firstname, lastname, email, password)
        }
    }

    /// The login half of the payload, used for the blank-field check.
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.email.clone(), self.password.clone())
    }
}

impl fmt::Debug for SignupPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupPayload")
            .field("firstname", &self.firstname)
            .field("lastname", &self.lastname)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .field("restaurant_id", &self.restaurant_id)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Success body of `/auth/login`, `/auth/signup`, and `/auth/me`.
///
/// Only the `/auth/me` variant is trusted as the source of truth for the
/// user; the mutation responses are acknowledged and then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: User,
}
