//! Canonical owner of the work order collection.
//!
//! Identity assignment is a dedicated monotonic sequence persisted with the
//! snapshot: ids are strictly increasing and never reused, even after a
//! delete.

use std::collections::BTreeMap;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::{Asset, User};
use crate::error::CoreError;

use super::types::{OrderStatus, WorkOrder, WorkOrderDraft, WorkOrderFilter, WorkOrderId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderStore {
    orders: BTreeMap<WorkOrderId, WorkOrder>,
    next_id: WorkOrderId,
}

impl Default for WorkOrderStore {
    fn default() -> Self {
        Self {
            orders: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl WorkOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, assign a fresh identity, stamp timestamps and
    /// name snapshots, and store the record. The order always starts in
    /// `Neu` with no assignee; assignment is the orchestrator's business.
    pub fn create(
        &mut self,
        draft: &WorkOrderDraft,
        asset: &Asset,
        creator: &User,
    ) -> Result<WorkOrder, CoreError> {
        if draft.title.trim().is_empty() {
            return Err(CoreError::validation("title must not be blank"));
        }
        if draft.description.trim().is_empty() {
            return Err(CoreError::validation("description must not be blank"));
        }
        if draft.asset_id.is_none() {
            return Err(CoreError::validation("asset reference is required"));
        }

        let now = Utc::now();
        let id = self.next_id;
        self.next_id += 1;

        let order = WorkOrder {
            id,
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            asset_id: asset.id,
            asset_name: asset.name.clone(),
            discipline: draft.discipline,
            priority: draft.priority,
            status: OrderStatus::Neu,
            created_by: creator.id,
            created_by_name: creator.name.clone(),
            assigned_to: None,
            assigned_to_name: None,
            tasks: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.orders.insert(id, order.clone());
        info!(order.id = id, asset.id = asset.id, "work order created");
        Ok(order)
    }

    /// Replace the stored record with the same identity, restamping
    /// `updated_at`.
    pub fn update(&mut self, mut order: WorkOrder) -> Result<WorkOrder, CoreError> {
        if !self.orders.contains_key(&order.id) {
            return Err(CoreError::NotFound {
                entity: "work order",
                id: order.id,
            });
        }
        order.updated_at = Utc::now();
        self.orders.insert(order.id, order.clone());
        Ok(order)
    }

    pub fn remove(&mut self, id: WorkOrderId) -> Result<WorkOrder, CoreError> {
        let removed = self.orders.remove(&id).ok_or(CoreError::NotFound {
            entity: "work order",
            id,
        })?;
        info!(order.id = id, "work order deleted");
        Ok(removed)
    }

    pub fn get(&self, id: WorkOrderId) -> Option<&WorkOrder> {
        self.orders.get(&id)
    }

    pub fn list(&self) -> Vec<&WorkOrder> {
        self.orders.values().collect()
    }

    pub fn filtered(&self, filter: &WorkOrderFilter) -> Vec<&WorkOrder> {
        self.orders.values().filter(|o| filter.matches(o)).collect()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Role;
    use crate::workorder::types::Priority;

    fn fixtures() -> (Asset, User) {
        (
            Asset::new(1, "Pumpe 3", "Halle 2"),
            User::new(10, "Schmidt", Role::Mechaniker),
        )
    }

    fn draft() -> WorkOrderDraft {
        WorkOrderDraft::new("Pumpe leckt", "Dichtung tauschen").on_asset(1)
    }

    #[test]
    fn create_assigns_monotonic_ids_and_snapshots_names() {
        let (asset, creator) = fixtures();
        let mut store = WorkOrderStore::new();

        let first = store.create(&draft(), &asset, &creator).unwrap();
        let second = store.create(&draft(), &asset, &creator).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.asset_name, "Pumpe 3");
        assert_eq!(first.created_by_name, "Schmidt");
        assert_eq!(first.status, OrderStatus::Neu);
    }

    #[test]
    fn ids_are_never_reused_after_delete() {
        let (asset, creator) = fixtures();
        let mut store = WorkOrderStore::new();

        let first = store.create(&draft(), &asset, &creator).unwrap();
        store.remove(first.id).unwrap();
        let second = store.create(&draft(), &asset, &creator).unwrap();

        assert!(second.id > first.id);
    }

    #[test]
    fn create_validates_required_fields() {
        let (asset, creator) = fixtures();
        let mut store = WorkOrderStore::new();

        let blank_title = WorkOrderDraft::new("  ", "Beschreibung").on_asset(1);
        assert!(matches!(
            store.create(&blank_title, &asset, &creator),
            Err(CoreError::Validation(_))
        ));

        let no_asset = WorkOrderDraft::new("Titel", "Beschreibung");
        assert!(matches!(
            store.create(&no_asset, &asset, &creator),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn update_restamps_and_requires_existing_identity() {
        let (asset, creator) = fixtures();
        let mut store = WorkOrderStore::new();

        let mut order = store.create(&draft(), &asset, &creator).unwrap();
        let created_stamp = order.updated_at;
        order.priority = Priority::Kritisch;
        let updated = store.update(order.clone()).unwrap();
        assert_eq!(updated.priority, Priority::Kritisch);
        assert!(updated.updated_at >= created_stamp);

        order.id = 99;
        assert!(matches!(
            store.update(order),
            Err(CoreError::NotFound { id: 99, .. })
        ));
    }

    #[test]
    fn remove_missing_order_is_not_found() {
        let mut store = WorkOrderStore::new();
        assert!(matches!(
            store.remove(5),
            Err(CoreError::NotFound { id: 5, .. })
        ));
    }

    #[test]
    fn filtered_narrows_by_status() {
        let (asset, creator) = fixtures();
        let mut store = WorkOrderStore::new();
        let mut order = store.create(&draft(), &asset, &creator).unwrap();
        store.create(&draft(), &asset, &creator).unwrap();

        order.status = OrderStatus::InArbeit;
        store.update(order).unwrap();

        let filter = WorkOrderFilter {
            status: Some(OrderStatus::InArbeit),
            ..Default::default()
        };
        assert_eq!(store.filtered(&filter).len(), 1);
        assert_eq!(store.list().len(), 2);
    }
}
