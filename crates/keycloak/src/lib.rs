//! # keycloak
//!
//! Client for the parts of the Keycloak admin API needed to manage the
//! roles mapped onto a user: listing a user's effective (composite) roles,
//! mapping a role onto a user and removing it again. Realm-level and
//! client-level roles are both supported; an empty client id always means
//! "realm-level".
//!
//! The client logs in against the `admin-cli` client of the `master` realm
//! by default, see [`config::Config`] for the environment it reads.
mod client;

pub use client::*;
pub mod config;
pub mod error;
pub mod role;
pub mod session;

pub use error::ApiError;
pub use role::{find_role_by_id, find_role_for_user, Role};
