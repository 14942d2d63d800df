use async_trait::async_trait;

use crate::error::ResourceResult;
use crate::schema::Schema;
use crate::state::ResourceData;

/// Lifecycle of a managed resource type. `C` is the provider context handed
/// to every operation, usually the API client.
#[async_trait]
pub trait Resource<C>: Send + Sync
where
    C: Send + Sync,
{
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn create(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()>;

    /// Refreshes `state`. A resource that no longer exists remotely is reported
    /// by clearing the id, not by an error.
    async fn read(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()>;

    async fn delete(&self, state: &mut ResourceData, client: &C) -> ResourceResult<()>;

    /// Adopts an existing remote object identified by the id of `state`.
    async fn import(&self, state: ResourceData, client: &C) -> ResourceResult<Vec<ResourceData>>;
}
