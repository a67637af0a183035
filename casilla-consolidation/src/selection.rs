//! Selection model for a single consolidation-request session.
//!
//! The selection is a plain set of package ids; `toggle` is a pure
//! function `(packages, selected, clicked) -> selected'` with no hidden
//! state. The master's "selected" checkbox is never stored: it is
//! derived from whether every other package is selected, and `toggle`
//! re-normalizes it on every call.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use casilla_core::package::Package;

/// The master package of a candidate set: the `is_master` flagged one,
/// or the first listed package when more than one is offered. A single
/// package has no master.
pub fn master_of(packages: &[Package]) -> Option<Uuid> {
    if packages.len() <= 1 {
        return None;
    }
    packages
        .iter()
        .find(|p| p.is_master)
        .or_else(|| packages.first())
        .map(|p| p.id)
}

/// Derived fact: the master counts as selected exactly when every
/// non-master package is in the selection.
pub fn master_selected(packages: &[Package], selected: &BTreeSet<Uuid>) -> bool {
    match master_of(packages) {
        Some(master) => packages
            .iter()
            .filter(|p| p.id != master)
            .all(|p| selected.contains(&p.id)),
        None => false,
    }
}

/// Toggle one package in the selection.
///
/// Clicking the master selects or clears the whole set; clicking any
/// other package toggles it and re-derives the master's membership.
/// Ids not present in `packages` are ignored.
pub fn toggle(
    packages: &[Package],
    selected: &BTreeSet<Uuid>,
    package_id: Uuid,
) -> BTreeSet<Uuid> {
    if !packages.iter().any(|p| p.id == package_id) {
        return selected.clone();
    }

    let master = master_of(packages);
    let mut next = selected.clone();

    if master == Some(package_id) {
        if master_selected(packages, selected) {
            next.clear();
        } else {
            next = packages.iter().map(|p| p.id).collect();
        }
        return next;
    }

    if !next.remove(&package_id) {
        next.insert(package_id);
    }

    // Re-derive the master's membership instead of patching it, so the
    // stored set can never drift from the invariant.
    if let Some(master) = master {
        if master_selected(packages, &next) {
            next.insert(master);
        } else {
            next.remove(&master);
        }
    }

    next
}

/// Totals over the current selection, always recomputed from scratch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionTotals {
    pub total_weight_kg: f64,
    pub total_boxes: u32,
}

impl SelectionTotals {
    pub fn for_selection(packages: &[Package], selected: &BTreeSet<Uuid>) -> Self {
        let members = packages.iter().filter(|p| selected.contains(&p.id));
        let mut total_weight_kg = 0.0;
        let mut total_boxes = 0;
        for package in members {
            total_weight_kg += package.weight_kg.unwrap_or(0.0);
            total_boxes += package.total_boxes.max(1);
        }
        Self {
            total_weight_kg,
            total_boxes,
        }
    }
}
