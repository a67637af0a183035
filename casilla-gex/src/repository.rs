use async_trait::async_trait;
use uuid::Uuid;

use casilla_core::CoreResult;

use crate::models::{PolicyAttachment, WarrantySubmission};

/// Repository trait for policy attachments.
///
/// `attach_policy` is the server-side enforcement point: it must reject
/// a package that already carries an active policy, atomically with
/// setting `has_gex`, so two concurrent submissions cannot both attach.
#[async_trait]
pub trait WarrantyRepository: Send + Sync {
    async fn attach_policy(
        &self,
        submission: &WarrantySubmission,
    ) -> CoreResult<PolicyAttachment>;

    async fn policy_for_package(&self, package_id: Uuid)
        -> CoreResult<Option<PolicyAttachment>>;
}
