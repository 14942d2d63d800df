use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfk_keycloak::{find_role_by_id, Role};

use crate::api::RoleMappingApi;
use crate::error::{ResourceError, ResourceResult};
use crate::resource::Resource;
use crate::schema::{Attribute, Schema};
use crate::state::ResourceData;

pub const USER_ROLE_MAPPING: &str = "keycloak_user_role_mapping";

pub const DEFAULT_REALM: &str = "master";

fn default_realm() -> String {
    DEFAULT_REALM.to_string()
}

/// Import id of a role mapping: `<realm>.<client_id>.<user_id>.<role_name>`.
///
/// None of the parts may contain a `.`, there is no escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportKey {
    pub realm: String,
    pub client_id: String,
    pub user_id: String,
    pub role_name: String,
}

impl FromStr for ImportKey {
    type Err = ResourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split('.').collect::<Vec<_>>().as_slice() {
            [realm, client_id, user_id, role_name] => Ok(ImportKey {
                realm: realm.to_string(),
                client_id: client_id.to_string(),
                user_id: user_id.to_string(),
                role_name: role_name.to_string(),
            }),
            _ => Err(ResourceError::MalformedImportKey(s.to_string())),
        }
    }
}

impl fmt::Display for ImportKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.realm, self.client_id, self.user_id, self.role_name
        )
    }
}

/// Typed attributes of a `keycloak_user_role_mapping`. The identity lives in
/// [`ResourceData::id`] and is the id of the mapped role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRoleMapping {
    pub name: String,
    pub user_id: String,
    /// Empty for realm-level roles.
    #[serde(default)]
    pub client_id: String,
    #[serde(default = "default_realm")]
    pub realm: String,
    #[serde(default)]
    pub scope_param_required: bool,
}

impl UserRoleMapping {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            user_id: user_id.into(),
            client_id: String::new(),
            realm: default_realm(),
            scope_param_required: false,
        }
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    fn apply(&mut self, role: &Role) {
        self.name = role.name.clone();
        self.scope_param_required = role.scope_param_required;
    }

    fn role(&self, id: &str) -> Role {
        Role::new(id, self.name.as_str()).with_scope_param_required(self.scope_param_required)
    }
}

impl From<ImportKey> for UserRoleMapping {
    fn from(key: ImportKey) -> Self {
        UserRoleMapping::new(key.user_id, key.role_name)
            .with_realm(key.realm)
            .with_client_id(key.client_id)
    }
}

fn store(state: &mut ResourceData, mut mapping: UserRoleMapping, role: &Role) -> ResourceResult<()> {
    mapping.apply(role);
    state.set_id(role.id.as_str());
    state.encode(&mapping)
}

/// Maps a realm or client role onto a user.
#[derive(Debug, Default, Clone, Copy)]
pub struct UserRoleMappingResource;

#[async_trait]
impl<C> Resource<C> for UserRoleMappingResource
where
    C: RoleMappingApi,
{
    fn type_name(&self) -> &'static str {
        USER_ROLE_MAPPING
    }

    fn schema(&self) -> Schema {
        Schema::new()
            .with_attribute("name", Attribute::required_string().force_new())
            .with_attribute("user_id", Attribute::required_string().force_new())
            .with_attribute(
                "scope_param_required",
                Attribute::optional_bool().with_default(false).force_new(),
            )
            .with_attribute(
                "client_id",
                Attribute::optional_string().with_default("").force_new(),
            )
            .with_attribute(
                "realm",
                Attribute::optional_string()
                    .with_default(DEFAULT_REALM)
                    .force_new(),
            )
    }

    async fn create(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()> {
        let mapping: UserRoleMapping = state.decode()?;
        tracing::debug!(
            "map role '{}' onto user '{}' in realm '{}'",
            mapping.name,
            mapping.user_id,
            mapping.realm
        );
        let role = client
            .add_role_to_user(
                &mapping.realm,
                &mapping.user_id,
                &mapping.name,
                &mapping.client_id,
            )
            .await?;
        state.set_id(role.id);
        <Self as Resource<C>>::read(self, state, client).await
    }

    async fn read(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()> {
        let mapping: UserRoleMapping = state.decode()?;
        let roles = client
            .composite_roles_for_user(&mapping.realm, &mapping.user_id, &mapping.client_id)
            .await?;
        let role = match state.id() {
            Some(id) => find_role_by_id(roles, id),
            None => client.find_role_for_user(roles, &mapping.name),
        };
        match role {
            Some(role) => store(state, mapping, &role),
            None => {
                tracing::warn!(
                    "role '{}' is no longer mapped onto user '{}', removing it from state",
                    mapping.name,
                    mapping.user_id
                );
                state.clear_id();
                Ok(())
            }
        }
    }

    async fn delete(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()> {
        let mapping: UserRoleMapping = state.decode()?;
        let id = state
            .id()
            .ok_or_else(|| ResourceError::invalid_attribute("id", "is required for deletion"))?;
        let role = mapping.role(id);
        tracing::debug!(
            "remove role '{}' from user '{}' in realm '{}'",
            role.name,
            mapping.user_id,
            mapping.realm
        );
        client
            .remove_role_from_user(&mapping.realm, &mapping.user_id, &role, &mapping.client_id)
            .await?;
        state.clear_id();
        Ok(())
    }

    async fn import(
        &self,
        mut state: ResourceData,
        client: &C,
    ) -> ResourceResult<Vec<ResourceData>> {
        let key: ImportKey = state.id().unwrap_or_default().parse()?;
        tracing::debug!("import role mapping {key}");
        let mapping = UserRoleMapping::from(key.clone());

        state.partial(true);
        state.encode(&mapping)?;
        let roles = client
            .composite_roles_for_user(&key.realm, &key.user_id, &key.client_id)
            .await?;
        let role = client
            .find_role_for_user(roles, &key.role_name)
            .ok_or_else(|| ResourceError::RoleNotAssigned {
                realm: key.realm,
                client_id: key.client_id,
                user_id: key.user_id,
                role_name: key.role_name,
            })?;
        store(&mut state, mapping, &role)?;
        state.partial(false);
        Ok(vec![state])
    }
}
