use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Package status as reported by the warehouse
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackageStatus {
    Received,
    Processing,
    InTransit,
    Shipped,
    Delivered,
}

/// A physical item sitting in the customer's warehouse box
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Package {
    pub id: Uuid,
    pub user_id: String,
    pub description: String,
    /// Declared weight in kg; unknown until the warehouse weighs it
    pub weight_kg: Option<f64>,
    /// Count of physical sub-boxes under one bill of lading
    pub total_boxes: u32,
    pub is_master: bool,
    pub status: PackageStatus,
    pub consolidation_id: Option<Uuid>,
    /// Mirror of the owning consolidation's status, kept by the lifecycle
    pub consolidation_status: Option<String>,
    pub provider_tracking: Option<String>,
    pub internal_tracking: String,
    pub has_gex: bool,
    /// Declared value in USD, used for protection quoting
    pub declared_value_usd: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Synthetic sub-box entry derived from a multi-box package.
/// Presentation artifact only, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChildBox {
    pub tracking: String,
    pub weight_kg: Option<f64>,
}

impl Package {
    pub fn new(user_id: String, description: String, internal_tracking: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            description,
            weight_kg: None,
            total_boxes: 1,
            is_master: false,
            status: PackageStatus::Received,
            consolidation_id: None,
            consolidation_status: None,
            provider_tracking: None,
            internal_tracking,
            has_gex: false,
            declared_value_usd: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Eligible for grouping: still in the warehouse and not yet consolidated
    pub fn is_available_for_consolidation(&self) -> bool {
        self.status == PackageStatus::Received && self.consolidation_id.is_none()
    }

    /// Derive the synthetic child entries for a multi-box package.
    /// Tracking is `{internal}-{n}/{total}`, each child carries an even
    /// share of the parent's weight.
    pub fn child_boxes(&self) -> Vec<ChildBox> {
        if self.total_boxes <= 1 {
            return Vec::new();
        }
        (1..=self.total_boxes)
            .map(|n| ChildBox {
                tracking: format!("{}-{}/{}", self.internal_tracking, n, self.total_boxes),
                weight_kg: self.weight_kg.map(|w| w / self.total_boxes as f64),
            })
            .collect()
    }

    pub fn update_status(&mut self, status: PackageStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Record membership in a consolidation
    pub fn assign_consolidation(&mut self, consolidation_id: Uuid, status: &str) {
        self.consolidation_id = Some(consolidation_id);
        self.consolidation_status = Some(status.to_string());
        self.updated_at = Utc::now();
    }

    /// Return the package to the warehouse pool (consolidation cancelled)
    pub fn clear_consolidation(&mut self) {
        self.consolidation_id = None;
        self.consolidation_status = None;
        self.status = PackageStatus::Received;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn package(tracking: &str, boxes: u32, weight: Option<f64>) -> Package {
        let mut p = Package::new(
            "customer@example.com".to_string(),
            "Electronics".to_string(),
            tracking.to_string(),
        );
        p.total_boxes = boxes;
        p.weight_kg = weight;
        p
    }

    #[test]
    fn test_child_boxes_for_multi_box_package() {
        let p = package("ABC123", 3, Some(9.0));
        let children = p.child_boxes();

        assert_eq!(children.len(), 3);
        assert_eq!(children[0].tracking, "ABC123-1/3");
        assert_eq!(children[1].tracking, "ABC123-2/3");
        assert_eq!(children[2].tracking, "ABC123-3/3");
        for child in &children {
            assert_eq!(child.weight_kg, Some(3.0));
        }
    }

    #[test]
    fn test_single_box_has_no_children() {
        let p = package("XYZ900", 1, Some(2.5));
        assert!(p.child_boxes().is_empty());
    }

    #[test]
    fn test_child_boxes_without_weight() {
        let p = package("NOW8", 2, None);
        let children = p.child_boxes();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].weight_kg, None);
    }

    #[test]
    fn test_availability() {
        let mut p = package("AVL1", 1, None);
        assert!(p.is_available_for_consolidation());

        p.assign_consolidation(Uuid::new_v4(), "PENDING");
        assert!(!p.is_available_for_consolidation());

        p.clear_consolidation();
        assert!(p.is_available_for_consolidation());

        p.update_status(PackageStatus::Shipped);
        assert!(!p.is_available_for_consolidation());
    }
}
