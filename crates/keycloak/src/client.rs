use std::{sync::Arc, time::Duration};

pub use keycloak::{KeycloakAdmin, KeycloakError, KeycloakTokenSupplier};
use keycloak::types::RoleRepresentation;
use reqwest::Url;

use crate::error::ApiError;
use crate::role::Role;
use crate::session::{Session, SessionClient};

pub use crate::config::Config as KeycloakConfig;

struct Inner {
    admin: KeycloakAdmin<Session>,
}

/// Handle to the Keycloak admin API. Cloning is cheap.
#[derive(Clone)]
pub struct Keycloak {
    inner: Arc<Inner>,
}

impl Keycloak {
    /// Logs in with the admin credentials of `config`.
    pub async fn with_config(config: KeycloakConfig) -> anyhow::Result<Self> {
        let url = Url::parse(config.address())?;
        if url.cannot_be_a_base() {
            anyhow::bail!(ApiError::InvalidAddress(config.address().to_string()));
        }
        let client = reqwest::Client::new();
        let session_client = SessionClient::new(
            config.address(),
            config.login_realm(),
            config.client_id(),
            client.clone(),
        );
        let session = Session::new(
            session_client,
            config.username(),
            config.password(),
            Duration::from_secs(config.refresh_margin_secs()),
        )
        .await?;
        tracing::debug!("logged in to keycloak at {}", config.address());
        Ok(Keycloak {
            inner: Arc::new(Inner {
                admin: KeycloakAdmin::new(config.address(), session, client),
            }),
        })
    }

    /// Resolves the internal id of the client with the public `client_id`.
    pub async fn client_uuid(&self, realm: &str, client_id: &str) -> Result<String, ApiError> {
        self.inner
            .admin
            .realm(realm)
            .clients_get()
            .client_id(client_id.to_owned())
            .search(false)
            .viewable_only(false)
            .await
            .map_err(|e| {
                tracing::error!("{e:#?}");
                e
            })?
            .into_iter()
            .find(|client| client.client_id.as_deref() == Some(client_id))
            .and_then(|client| client.id)
            .ok_or_else(|| ApiError::ClientNotFound {
                realm: realm.to_string(),
                client_id: client_id.to_string(),
            })
    }

    /// Effective roles of a user, including those inherited through composites.
    /// An empty `client_id` selects realm-level roles.
    pub async fn composite_roles_for_user(
        &self,
        realm: &str,
        user_id: &str,
        client_id: &str,
    ) -> Result<Vec<Role>, ApiError> {
        let admin = self.inner.admin.realm(realm);
        let roles = if client_id.is_empty() {
            admin
                .users_with_user_id_role_mappings_realm_composite_get(user_id)
                .await
        } else {
            let client_uuid = self.client_uuid(realm, client_id).await?;
            admin
                .users_with_user_id_role_mappings_clients_with_client_id_composite_get(
                    user_id,
                    &client_uuid,
                )
                .await
        }
        .map_err(|e| {
            tracing::error!("{e:#?}");
            e
        })?;
        Ok(roles.into_iter().map(Role::from).collect())
    }

    async fn role_representation(
        &self,
        realm: &str,
        role_name: &str,
        client_id: &str,
    ) -> Result<RoleRepresentation, ApiError> {
        let admin = self.inner.admin.realm(realm);
        if client_id.is_empty() {
            Ok(admin.roles_with_role_name_get(role_name).await?)
        } else {
            let client_uuid = self.client_uuid(realm, client_id).await?;
            Ok(admin
                .clients_with_client_uuid_roles_with_role_name_get(&client_uuid, role_name)
                .await?)
        }
    }

    /// Maps the role named `role_name` onto the user and returns the mapped role.
    pub async fn add_role_to_user(
        &self,
        realm: &str,
        user_id: &str,
        role_name: &str,
        client_id: &str,
    ) -> Result<Role, ApiError> {
        let role = self
            .role_representation(realm, role_name, client_id)
            .await
            .map_err(|e| {
                tracing::error!("{e:#?}");
                e
            })?;
        let admin = self.inner.admin.realm(realm);
        let response = if client_id.is_empty() {
            admin
                .users_with_user_id_role_mappings_realm_post(user_id, vec![role.clone()])
                .await
        } else {
            let client_uuid = self.client_uuid(realm, client_id).await?;
            admin
                .users_with_user_id_role_mappings_clients_with_client_id_post(
                    user_id,
                    &client_uuid,
                    vec![role.clone()],
                )
                .await
        };
        response.map_err(|e| {
            tracing::error!("{e:#?}");
            e
        })?;
        Ok(Role::from(role))
    }

    pub async fn remove_role_from_user(
        &self,
        realm: &str,
        user_id: &str,
        role: &Role,
        client_id: &str,
    ) -> Result<(), ApiError> {
        let admin = self.inner.admin.realm(realm);
        let roles = vec![RoleRepresentation::from(role)];
        let response = if client_id.is_empty() {
            admin
                .users_with_user_id_role_mappings_realm_delete(user_id, roles)
                .await
        } else {
            let client_uuid = self.client_uuid(realm, client_id).await?;
            admin
                .users_with_user_id_role_mappings_clients_with_client_id_delete(
                    user_id,
                    &client_uuid,
                    roles,
                )
                .await
        };
        response.map_err(|e| {
            tracing::error!("{e:#?}");
            e
        })?;
        Ok(())
    }
}
