use crate::domain::model::{Alias, FabricId, ImportOptions, ParsedBatch, ProjectId, SourceInput, Zone};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn import_options(&self) -> ImportOptions;
    fn input_files(&self) -> &[String];
    fn output_path(&self) -> &str;
}

/// Read-only view of the persisted inventory. Implementations must be safe to call
/// once per fabric per import; this crate never writes through it.
#[async_trait]
pub trait AliasRepository: Send + Sync {
    async fn existing_aliases_for_fabric(&self, fabric_id: FabricId) -> Result<Vec<Alias>>;
    async fn existing_zones_for_project(&self, project_id: ProjectId) -> Result<Vec<Zone>>;
}

#[async_trait]
impl<R: AliasRepository + ?Sized> AliasRepository for std::sync::Arc<R> {
    async fn existing_aliases_for_fabric(&self, fabric_id: FabricId) -> Result<Vec<Alias>> {
        (**self).existing_aliases_for_fabric(fabric_id).await
    }

    async fn existing_zones_for_project(&self, project_id: ProjectId) -> Result<Vec<Zone>> {
        (**self).existing_zones_for_project(project_id).await
    }
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<SourceInput>>;
    async fn transform(&self, sources: Vec<SourceInput>) -> Result<ParsedBatch>;
    async fn load(&self, batch: ParsedBatch) -> Result<String>;
}
