use async_trait::async_trait;
use uuid::Uuid;

use crate::package::Package;
use crate::CoreResult;

/// Repository trait for package data access. Package records originate
/// from the warehouse intake collaborator; this core only reads them and
/// updates the consolidation/protection fields.
#[async_trait]
pub trait PackageRepository: Send + Sync {
    async fn get_package(&self, id: Uuid) -> CoreResult<Option<Package>>;

    async fn list_packages(&self, user_id: &str) -> CoreResult<Vec<Package>>;

    /// Intake seam: insert or replace a package record
    async fn upsert_package(&self, package: Package) -> CoreResult<()>;
}
