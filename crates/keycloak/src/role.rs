use keycloak::types::RoleRepresentation;

/// Role mapped onto a user, with the optional fields of the admin API's
/// `RoleRepresentation` flattened. Missing flags read as `false`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub scope_param_required: bool,
    pub description: Option<String>,
    pub composite: bool,
    pub client_role: bool,
    pub container_id: Option<String>,
}

impl Role {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_scope_param_required(mut self, scope_param_required: bool) -> Self {
        self.scope_param_required = scope_param_required;
        self
    }
}

#[allow(deprecated)]
impl From<RoleRepresentation> for Role {
    fn from(role: RoleRepresentation) -> Self {
        Self {
            id: role.id.unwrap_or_default(),
            name: role.name.unwrap_or_default(),
            scope_param_required: role.scope_param_required.unwrap_or_default(),
            description: role.description,
            composite: role.composite.unwrap_or_default(),
            client_role: role.client_role.unwrap_or_default(),
            container_id: role.container_id,
        }
    }
}

#[allow(deprecated)]
impl From<&Role> for RoleRepresentation {
    fn from(role: &Role) -> Self {
        Self {
            id: Some(role.id.clone()),
            name: Some(role.name.clone()),
            scope_param_required: Some(role.scope_param_required),
            description: role.description.clone(),
            composite: Some(role.composite),
            client_role: Some(role.client_role),
            container_id: role.container_id.clone(),
            ..Default::default()
        }
    }
}

/// Picks the role whose name matches `role_name` exactly. Matching is case-sensitive.
pub fn find_role_for_user(roles: Vec<Role>, role_name: &str) -> Option<Role> {
    roles.into_iter().find(|role| role.name == role_name)
}

pub fn find_role_by_id(roles: Vec<Role>, id: &str) -> Option<Role> {
    roles.into_iter().find(|role| role.id == id)
}
