//! # provider
//!
//! Terraform resources backed by the Keycloak admin API.
//!
//! The only resource so far is `keycloak_user_role_mapping`, which maps an
//! existing realm or client role onto a user:
//!
//! ```hcl
//! resource "keycloak_user_role_mapping" "admin" {
//!   realm     = "master"
//!   client_id = "myclient"
//!   user_id   = "user-42"
//!   name      = "app-admin"
//! }
//! ```
//!
//! Existing mappings are imported with an id of the form
//! `<realm>.<client_id>.<user_id>.<role_name>`, e.g.
//! `master.myclient.user-42.app-admin`. Leave the client id empty
//! (`master..user-42.app-admin`) for realm-level roles.
mod api;
mod provider;

pub mod error;
pub mod resource;
pub mod schema;
pub mod state;
pub mod user_role_mapping;

pub use api::RoleMappingApi;
pub use error::{ResourceError, ResourceResult};
pub use provider::Provider;
pub use resource::Resource;
pub use schema::{Attribute, AttributeType, Schema};
pub use state::ResourceData;
pub use user_role_mapping::{ImportKey, UserRoleMapping, UserRoleMappingResource, USER_ROLE_MAPPING};
