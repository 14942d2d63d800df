use std::collections::BTreeMap;

use tfk_keycloak::{Keycloak, KeycloakConfig};
use tracing::Instrument;

use crate::error::{ResourceError, ResourceResult};
use crate::resource::Resource;
use crate::schema::Schema;
use crate::state::ResourceData;
use crate::user_role_mapping::UserRoleMappingResource;

/// Registry of resource types sharing one provider context.
pub struct Provider<C>
where
    C: Send + Sync,
{
    client: C,
    resources: BTreeMap<&'static str, Box<dyn Resource<C>>>,
}

impl Provider<Keycloak> {
    /// Logs in to Keycloak and registers every Keycloak resource type.
    pub async fn keycloak(config: KeycloakConfig) -> anyhow::Result<Self> {
        let client = Keycloak::with_config(config).await?;
        Ok(Provider::new(client).with_resource(UserRoleMappingResource))
    }
}

impl<C> Provider<C>
where
    C: Send + Sync,
{
    pub fn new(client: C) -> Self {
        Self {
            client,
            resources: BTreeMap::new(),
        }
    }

    pub fn with_resource<R>(mut self, resource: R) -> Self
    where
        R: Resource<C> + 'static,
    {
        self.resources.insert(resource.type_name(), Box::new(resource));
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.resources.keys().copied()
    }

    fn resource(&self, type_name: &str) -> ResourceResult<&dyn Resource<C>> {
        self.resources
            .get(type_name)
            .map(|resource| resource.as_ref())
            .ok_or_else(|| ResourceError::UnknownResource(type_name.to_string()))
    }

    pub fn schema(&self, type_name: &str) -> ResourceResult<Schema> {
        Ok(self.resource(type_name)?.schema())
    }

    /// Fresh state of `type_name` with its schema defaults applied.
    pub fn new_state(&self, type_name: &str) -> ResourceResult<ResourceData> {
        Ok(ResourceData::new(&self.schema(type_name)?))
    }

    pub async fn create(&self, type_name: &str, state: &mut ResourceData) -> ResourceResult<()> {
        let resource = self.resource(type_name)?;
        resource.schema().validate(state)?;
        resource
            .create(state, &self.client)
            .instrument(tracing::debug_span!("create", resource = type_name))
            .await
    }

    pub async fn read(&self, type_name: &str, state: &mut ResourceData) -> ResourceResult<()> {
        let resource = self.resource(type_name)?;
        let span = tracing::debug_span!("read", resource = type_name, id = state.id());
        resource.read(state, &self.client).instrument(span).await
    }

    pub async fn delete(&self, type_name: &str, state: &mut ResourceData) -> ResourceResult<()> {
        let resource = self.resource(type_name)?;
        let span = tracing::debug_span!("delete", resource = type_name, id = state.id());
        resource.delete(state, &self.client).instrument(span).await
    }

    pub async fn import(
        &self,
        type_name: &str,
        import_id: &str,
    ) -> ResourceResult<Vec<ResourceData>> {
        let resource = self.resource(type_name)?;
        let state = ResourceData::for_import(&resource.schema(), import_id);
        resource
            .import(state, &self.client)
            .instrument(tracing::debug_span!("import", resource = type_name, id = import_id))
            .await
    }
}
