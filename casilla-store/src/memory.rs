use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use casilla_consolidation::models::{
    Consolidation, ConsolidationError, ConsolidationStatus, PaymentReference,
};
use casilla_consolidation::repository::ConsolidationRepository;
use casilla_core::package::{Package, PackageStatus};
use casilla_core::repository::PackageRepository;
use casilla_core::{CoreError, CoreResult};
use casilla_gex::models::{PolicyAttachment, WarrantySubmission};
use casilla_gex::repository::WarrantyRepository;

#[derive(Default)]
struct Inner {
    packages: HashMap<Uuid, Package>,
    consolidations: HashMap<Uuid, Consolidation>,
    policies: HashMap<Uuid, PolicyAttachment>, // keyed by package id
}

/// In-memory store backing the API.
///
/// All tables sit behind one `RwLock` so the cross-session invariants
/// hold: consolidation creation and policy attachment are single
/// critical sections that re-verify their preconditions before writing.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PackageRepository for MemoryStore {
    async fn get_package(&self, id: Uuid) -> CoreResult<Option<Package>> {
        let inner = self.inner.read().await;
        Ok(inner.packages.get(&id).cloned())
    }

    async fn list_packages(&self, user_id: &str) -> CoreResult<Vec<Package>> {
        let inner = self.inner.read().await;
        let mut packages: Vec<Package> = inner
            .packages
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        packages.sort_by_key(|p| p.created_at);
        Ok(packages)
    }

    async fn upsert_package(&self, package: Package) -> CoreResult<()> {
        let mut inner = self.inner.write().await;
        inner.packages.insert(package.id, package);
        Ok(())
    }
}

#[async_trait]
impl ConsolidationRepository for MemoryStore {
    async fn create_consolidation(
        &self,
        user_id: &str,
        package_ids: &[Uuid],
    ) -> CoreResult<Consolidation> {
        // One write lock across verify-and-assign: of two overlapping
        // requests, the loser sees the winner's assignment and fails.
        let mut inner = self.inner.write().await;

        let mut members = Vec::with_capacity(package_ids.len());
        for id in package_ids {
            let package = inner
                .packages
                .get(id)
                .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
            if package.user_id != user_id {
                return Err(CoreError::NotFound(id.to_string()));
            }
            members.push(package.clone());
        }

        let selected = package_ids.iter().copied().collect();
        let consolidation = Consolidation::from_selection(user_id, &members, &selected)
            .map_err(CoreError::from)?;

        for id in &consolidation.package_ids {
            if let Some(package) = inner.packages.get_mut(id) {
                package.assign_consolidation(
                    consolidation.id,
                    consolidation.status.as_str(),
                );
            }
        }
        inner
            .consolidations
            .insert(consolidation.id, consolidation.clone());

        tracing::info!(
            consolidation_id = %consolidation.id,
            user_id,
            packages = consolidation.package_ids.len(),
            "consolidation created"
        );
        Ok(consolidation)
    }

    async fn get_consolidation(&self, id: Uuid) -> CoreResult<Option<Consolidation>> {
        let inner = self.inner.read().await;
        Ok(inner.consolidations.get(&id).cloned())
    }

    async fn list_consolidations(&self, user_id: &str) -> CoreResult<Vec<Consolidation>> {
        let inner = self.inner.read().await;
        let mut consolidations: Vec<Consolidation> = inner
            .consolidations
            .values()
            .filter(|c| c.user_id == user_id)
            .cloned()
            .collect();
        consolidations.sort_by_key(|c| c.created_at);
        Ok(consolidations)
    }

    async fn update_status(
        &self,
        id: Uuid,
        next: ConsolidationStatus,
    ) -> CoreResult<Consolidation> {
        let mut inner = self.inner.write().await;

        let consolidation = inner
            .consolidations
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;
        consolidation.transition(next).map_err(CoreError::from)?;
        let consolidation = consolidation.clone();

        // Propagate to member packages: the mirror always, the package
        // status where the warehouse milestone implies it.
        for package_id in &consolidation.package_ids {
            if let Some(package) = inner.packages.get_mut(package_id) {
                match next {
                    ConsolidationStatus::Cancelled => package.clear_consolidation(),
                    ConsolidationStatus::Processing => {
                        package.consolidation_status = Some(next.as_str().to_string());
                        package.update_status(PackageStatus::Processing);
                    }
                    ConsolidationStatus::Shipped => {
                        package.consolidation_status = Some(next.as_str().to_string());
                        package.update_status(PackageStatus::Shipped);
                    }
                    ConsolidationStatus::Delivered => {
                        package.consolidation_status = Some(next.as_str().to_string());
                        package.update_status(PackageStatus::Delivered);
                    }
                    ConsolidationStatus::Pending => {
                        package.consolidation_status = Some(next.as_str().to_string());
                    }
                }
            }
        }

        Ok(consolidation)
    }

    async fn record_capture(
        &self,
        id: Uuid,
        reference: &PaymentReference,
    ) -> CoreResult<PaymentReference> {
        let mut inner = self.inner.write().await;

        let consolidation = inner
            .consolidations
            .get_mut(&id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        // First write wins; a concurrent capture of the same order gets
        // the recorded reference back instead of a second transaction.
        if let Some(existing) = &consolidation.payment_reference {
            if existing.order_id == reference.order_id {
                return Ok(existing.clone());
            }
            return Err(CoreError::from(ConsolidationError::AlreadyPaid(
                existing.order_id.clone(),
            )));
        }

        if consolidation.status != ConsolidationStatus::Shipped {
            return Err(CoreError::from(ConsolidationError::PaymentNotDue(
                consolidation.status.to_string(),
            )));
        }

        consolidation.record_payment(reference.clone());
        Ok(reference.clone())
    }
}

#[async_trait]
impl WarrantyRepository for MemoryStore {
    async fn attach_policy(
        &self,
        submission: &WarrantySubmission,
    ) -> CoreResult<PolicyAttachment> {
        if !(submission.declared_value_usd > 0.0) {
            return Err(CoreError::InvalidInput(
                "declared value must be positive".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;

        let package = inner
            .packages
            .get_mut(&submission.package_id)
            .ok_or_else(|| CoreError::NotFound(submission.package_id.to_string()))?;

        if package.has_gex {
            return Err(CoreError::PolicyAlreadyActive(package.id));
        }

        package.has_gex = true;
        package.declared_value_usd = Some(submission.declared_value_usd);

        let attachment = PolicyAttachment::from_submission(submission);
        inner
            .policies
            .insert(submission.package_id, attachment.clone());

        tracing::info!(
            package_id = %submission.package_id,
            premium_mxn = attachment.premium_mxn,
            "GEX policy attached"
        );
        Ok(attachment)
    }

    async fn policy_for_package(
        &self,
        package_id: Uuid,
    ) -> CoreResult<Option<PolicyAttachment>> {
        let inner = self.inner.read().await;
        Ok(inner.policies.get(&package_id).cloned())
    }
}
