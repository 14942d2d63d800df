use std::sync::Mutex;

use async_trait::async_trait;
use tfk_keycloak::{ApiError, KeycloakError, Role};
use tfk_provider::{
    Provider, ResourceData, ResourceError, RoleMappingApi, UserRoleMapping,
    UserRoleMappingResource, USER_ROLE_MAPPING,
};

#[derive(Debug, Clone, PartialEq)]
struct Removal {
    realm: String,
    user_id: String,
    role: Role,
    client_id: String,
}

/// In-memory stand-in for the admin API. `catalog` holds the roles that can
/// be mapped, `assigned` the roles currently mapped onto the user.
#[derive(Default)]
struct FakeKeycloak {
    catalog: Vec<Role>,
    assigned: Mutex<Vec<Role>>,
    removals: Mutex<Vec<Removal>>,
    failing: bool,
}

impl FakeKeycloak {
    fn with_catalog(catalog: Vec<Role>) -> Self {
        Self {
            catalog,
            ..Default::default()
        }
    }

    fn with_assigned(assigned: Vec<Role>) -> Self {
        Self {
            catalog: assigned.clone(),
            assigned: Mutex::new(assigned),
            ..Default::default()
        }
    }

    fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<(), ApiError> {
        if self.failing {
            return Err(ApiError::Keycloak(KeycloakError::HttpFailure {
                status: 503,
                body: None,
                text: "service unavailable".to_string(),
            }));
        }
        Ok(())
    }

    /// Removes a mapping behind the provider's back.
    fn unassign_all(&self) {
        self.assigned.lock().unwrap().clear();
    }
}

#[async_trait]
impl RoleMappingApi for FakeKeycloak {
    async fn composite_roles_for_user(
        &self,
        _realm: &str,
        _user_id: &str,
        _client_id: &str,
    ) -> Result<Vec<Role>, ApiError> {
        self.check()?;
        Ok(self.assigned.lock().unwrap().clone())
    }

    async fn add_role_to_user(
        &self,
        _realm: &str,
        _user_id: &str,
        role_name: &str,
        _client_id: &str,
    ) -> Result<Role, ApiError> {
        self.check()?;
        let role = self
            .catalog
            .iter()
            .find(|role| role.name == role_name)
            .cloned()
            .ok_or_else(|| {
                ApiError::Keycloak(KeycloakError::HttpFailure {
                    status: 404,
                    body: None,
                    text: "Could not find role".to_string(),
                })
            })?;
        self.assigned.lock().unwrap().push(role.clone());
        Ok(role)
    }

    async fn remove_role_from_user(
        &self,
        realm: &str,
        user_id: &str,
        role: &Role,
        client_id: &str,
    ) -> Result<(), ApiError> {
        self.check()?;
        self.assigned.lock().unwrap().retain(|r| r.id != role.id);
        self.removals.lock().unwrap().push(Removal {
            realm: realm.to_string(),
            user_id: user_id.to_string(),
            role: role.clone(),
            client_id: client_id.to_string(),
        });
        Ok(())
    }
}

fn provider(api: FakeKeycloak) -> Provider<FakeKeycloak> {
    Provider::new(api).with_resource(UserRoleMappingResource)
}

fn planned(provider: &Provider<FakeKeycloak>, mapping: &UserRoleMapping) -> ResourceData {
    let mut state = provider.new_state(USER_ROLE_MAPPING).unwrap();
    state.encode(mapping).unwrap();
    state
}

#[tokio::test]
async fn import_resolves_assigned_role() {
    let provider = provider(FakeKeycloak::with_assigned(vec![
        Role::new("r0", "viewer"),
        Role::new("r1", "app-admin").with_scope_param_required(true),
    ]));

    let states = provider
        .import(USER_ROLE_MAPPING, "master.myclient.user-42.app-admin")
        .await
        .unwrap();
    assert_eq!(states.len(), 1);
    let state = &states[0];
    assert!(!state.is_partial());
    assert_eq!(state.id(), Some("r1"));
    let mapping: UserRoleMapping = state.decode().unwrap();
    assert_eq!(
        mapping,
        UserRoleMapping {
            name: "app-admin".into(),
            user_id: "user-42".into(),
            client_id: "myclient".into(),
            realm: "master".into(),
            scope_param_required: true,
        }
    );
}

#[tokio::test]
async fn import_fails_for_unassigned_role() {
    let provider = provider(FakeKeycloak::with_assigned(vec![Role::new("r1", "app-admin")]));

    let err = provider
        .import(USER_ROLE_MAPPING, "master.myclient.user-42.missing-role")
        .await
        .unwrap_err();
    match err {
        ResourceError::RoleNotAssigned {
            realm,
            client_id,
            user_id,
            role_name,
        } => {
            assert_eq!(realm, "master");
            assert_eq!(client_id, "myclient");
            assert_eq!(user_id, "user-42");
            assert_eq!(role_name, "missing-role");
        }
        err => panic!("unexpected error {err:?}"),
    }
}

#[tokio::test]
async fn import_name_match_is_case_sensitive() {
    let provider = provider(FakeKeycloak::with_assigned(vec![Role::new("r1", "Admin")]));

    let err = provider
        .import(USER_ROLE_MAPPING, "master..user-42.admin")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::RoleNotAssigned { .. }));
}

#[tokio::test]
async fn import_rejects_malformed_id() {
    let provider = provider(FakeKeycloak::default());

    let err = provider
        .import(USER_ROLE_MAPPING, "bad-format-string")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::MalformedImportKey(_)));
}

#[tokio::test]
async fn import_surfaces_api_error() {
    let provider = provider(FakeKeycloak::failing());

    let err = provider
        .import(USER_ROLE_MAPPING, "master..user-42.app-admin")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Api(ref e) if e.status() == Some(503)));
}

#[tokio::test]
async fn create_reads_back_server_state() {
    let provider = provider(FakeKeycloak::with_catalog(vec![
        Role::new("r1", "app-admin").with_scope_param_required(true),
    ]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "app-admin"));

    provider.create(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert_eq!(state.id(), Some("r1"));
    assert!(state.get_bool("scope_param_required").unwrap());
    assert_eq!(state.get_str("name").unwrap(), "app-admin");
    assert_eq!(state.get_str("realm").unwrap(), "master");
    assert_eq!(state.get_str("client_id").unwrap(), "");
}

#[tokio::test]
async fn read_is_idempotent() {
    let provider = provider(FakeKeycloak::with_catalog(vec![
        Role::new("r1", "app-admin").with_scope_param_required(true),
    ]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "app-admin"));
    provider.create(USER_ROLE_MAPPING, &mut state).await.unwrap();

    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    let first = state.clone();
    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert_eq!(first, state);
}

#[tokio::test]
async fn read_reports_removed_mapping_as_absent() {
    let provider = provider(FakeKeycloak::with_catalog(vec![Role::new("r1", "r1")]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "r1"));
    provider.create(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert_eq!(state.id(), Some("r1"));

    provider.client().unassign_all();
    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert!(state.id().is_none());
}

#[tokio::test]
async fn read_keys_on_id() {
    let provider = provider(FakeKeycloak::with_assigned(vec![
        Role::new("r1", "renamed").with_scope_param_required(true),
    ]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "app-admin"));
    state.set_id("r1");

    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert_eq!(state.id(), Some("r1"));
    assert_eq!(state.get_str("name").unwrap(), "renamed");
    assert!(state.get_bool("scope_param_required").unwrap());
}

#[tokio::test]
async fn read_without_id_matches_by_name() {
    let provider = provider(FakeKeycloak::with_assigned(vec![
        Role::new("r0", "viewer"),
        Role::new("r1", "app-admin").with_scope_param_required(true),
    ]));
    let mut state = planned(
        &provider,
        &UserRoleMapping::new("u1", "app-admin").with_client_id("myclient"),
    );
    assert!(state.id().is_none());

    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert_eq!(state.id(), Some("r1"));
    assert_eq!(state.get_str("name").unwrap(), "app-admin");
    assert_eq!(state.get_str("client_id").unwrap(), "myclient");
    assert!(state.get_bool("scope_param_required").unwrap());
}

#[tokio::test]
async fn read_without_id_leaves_unmatched_name_absent() {
    let provider = provider(FakeKeycloak::with_assigned(vec![Role::new("r1", "Admin")]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "admin"));

    provider.read(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert!(state.id().is_none());
}

#[tokio::test]
async fn read_surfaces_api_error() {
    let provider = provider(FakeKeycloak::failing());
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "r1"));
    state.set_id("r1");

    let err = provider
        .read(USER_ROLE_MAPPING, &mut state)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Api(_)));
    assert_eq!(state.id(), Some("r1"));
}

#[tokio::test]
async fn create_propagates_api_error() {
    let provider = provider(FakeKeycloak::with_catalog(vec![]));
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "unknown"));

    let err = provider
        .create(USER_ROLE_MAPPING, &mut state)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::Api(ref e) if e.status() == Some(404)));
    assert!(state.id().is_none());
}

#[tokio::test]
async fn create_requires_user_id() {
    let provider = provider(FakeKeycloak::default());
    let mut state = provider.new_state(USER_ROLE_MAPPING).unwrap();
    state.set("name", "r1");

    let err = provider
        .create(USER_ROLE_MAPPING, &mut state)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "attribute 'user_id' is required");
}

#[tokio::test]
async fn delete_removes_role_from_user() {
    let provider = provider(FakeKeycloak::with_assigned(vec![
        Role::new("role-id-1", "app-admin").with_scope_param_required(true),
    ]));
    let mapping = UserRoleMapping::new("u1", "app-admin")
        .with_realm("acme")
        .with_client_id("myclient");
    let mut state = planned(&provider, &mapping);
    state.set("scope_param_required", true);
    state.set_id("role-id-1");

    provider.delete(USER_ROLE_MAPPING, &mut state).await.unwrap();
    assert!(state.id().is_none());
    let removals = provider.client().removals.lock().unwrap().clone();
    assert_eq!(
        removals,
        vec![Removal {
            realm: "acme".into(),
            user_id: "u1".into(),
            role: Role::new("role-id-1", "app-admin").with_scope_param_required(true),
            client_id: "myclient".into(),
        }]
    );
}

#[tokio::test]
async fn delete_without_id_fails() {
    let provider = provider(FakeKeycloak::default());
    let mut state = planned(&provider, &UserRoleMapping::new("u1", "r1"));

    let err = provider
        .delete(USER_ROLE_MAPPING, &mut state)
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::InvalidAttribute { .. }));
    assert!(provider.client().removals.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_resource_type() {
    let provider = provider(FakeKeycloak::default());
    assert_eq!(
        provider.resource_types().collect::<Vec<_>>(),
        vec![USER_ROLE_MAPPING]
    );

    let err = provider
        .import("keycloak_group", "master.a.b.c")
        .await
        .unwrap_err();
    assert!(matches!(err, ResourceError::UnknownResource(ref name) if name == "keycloak_group"));
}

#[test]
fn every_attribute_forces_replacement() {
    let provider = provider(FakeKeycloak::default());
    let schema = provider.schema(USER_ROLE_MAPPING).unwrap();
    let prior = planned(&provider, &UserRoleMapping::new("u1", "r1"));
    let proposed = planned(
        &provider,
        &UserRoleMapping::new("u2", "r2")
            .with_realm("acme")
            .with_client_id("myclient"),
    );
    assert_eq!(
        schema.force_new_changes(&prior, &proposed),
        vec!["client_id", "name", "realm", "user_id"]
    );
}
