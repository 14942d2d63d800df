use async_trait::async_trait;
use tfk_keycloak::{ApiError, Keycloak, Role};

/// Role mapping calls a resource needs from the Keycloak admin API.
#[async_trait]
pub trait RoleMappingApi: Send + Sync {
    async fn composite_roles_for_user(
        &self,
        realm: &str,
        user_id: &str,
        client_id: &str,
    ) -> Result<Vec<Role>, ApiError>;

    fn find_role_for_user(&self, roles: Vec<Role>, role_name: &str) -> Option<Role> {
        tfk_keycloak::find_role_for_user(roles, role_name)
    }

    async fn add_role_to_user(
        &self,
        realm: &str,
        user_id: &str,
        role_name: &str,
        client_id: &str,
    ) -> Result<Role, ApiError>;

    async fn remove_role_from_user(
        &self,
        realm: &str,
        user_id: &str,
        role: &Role,
        client_id: &str,
    ) -> Result<(), ApiError>;
}

#[async_trait]
impl RoleMappingApi for Keycloak {
    async fn composite_roles_for_user(
        &self,
        realm: &str,
        user_id: &str,
        client_id: &str,
    ) -> Result<Vec<Role>, ApiError> {
        Keycloak::composite_roles_for_user(self, realm, user_id, client_id).await
    }

    async fn add_role_to_user(
        &self,
        realm: &str,
        user_id: &str,
        role_name: &str,
        client_id: &str,
    ) -> Result<Role, ApiError> {
        Keycloak::add_role_to_user(self, realm, user_id, role_name, client_id).await
    }

    async fn remove_role_from_user(
        &self,
        realm: &str,
        user_id: &str,
        role: &Role,
        client_id: &str,
    ) -> Result<(), ApiError> {
        Keycloak::remove_role_from_user(self, realm, user_id, role, client_id).await
    }
}
