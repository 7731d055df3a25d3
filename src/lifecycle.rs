// Lifecycle orchestration: every mutation enters here, gets authorized,
// fans out into journal entries and notifications, and commits through the
// store as one transition. Either the whole transition lands or the stored
// record is untouched.

use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::directory::{AssetDirectory, User, UserDirectory, UserId};
use crate::error::CoreError;
use crate::journal::{Comment, CommentKind, CommentLog};
use crate::notifications::NotificationCenter;
use crate::permissions::{can_access_asset, Capabilities};
use crate::telemetry::generate_correlation_id;
use crate::workorder::{
    checklist, OrderStatus, Priority, TaskId, WorkOrder, WorkOrderDraft, WorkOrderFilter,
    WorkOrderId, WorkOrderStore,
};

/// Placeholder shown as the old value of an assignment delta when the
/// order had no assignee.
const UNASSIGNED: &str = "Niemand";

/// Candidate state an edit request carries. Deltas against the stored
/// record decide what actually happens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditRequest {
    pub status: OrderStatus,
    pub priority: Priority,
    pub assignee: Option<UserId>,
}

impl EditRequest {
    /// An edit that keeps everything as stored; callers overwrite the
    /// fields they want to change.
    pub fn keeping(order: &WorkOrder) -> Self {
        Self {
            status: order.status,
            priority: order.priority,
            assignee: order.assigned_to,
        }
    }
}

/// The coordinating facade: owns the store, the journal, the notification
/// center, and the two directories, and is the only writer of all four.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderCoordinator {
    pub users: UserDirectory,
    pub assets: AssetDirectory,
    pub store: WorkOrderStore,
    pub journal: CommentLog,
    pub notifications: NotificationCenter,
}

impl OrderCoordinator {
    pub fn new(users: UserDirectory, assets: AssetDirectory) -> Self {
        Self {
            users,
            assets,
            store: WorkOrderStore::new(),
            journal: CommentLog::new(),
            notifications: NotificationCenter::new(),
        }
    }

    /// Create a work order. With `draft.assignee` set this also runs the
    /// assignment transition (capability-gated), so the record lands in
    /// `Zugewiesen` with the assignment already journaled and notified.
    pub fn create_order(
        &mut self,
        draft: WorkOrderDraft,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let span = info_span!(
            "create_order",
            actor = acting,
            correlation.id = %generate_correlation_id()
        );
        let _guard = span.enter();

        let actor = self.actor(acting)?;
        let asset_id = draft
            .asset_id
            .ok_or_else(|| CoreError::validation("asset reference is required"))?;
        let asset = self
            .assets
            .get(asset_id)
            .ok_or(CoreError::NotFound {
                entity: "asset",
                id: asset_id,
            })?
            .clone();
        if !can_access_asset(&actor, asset.id) {
            return Err(CoreError::permission(format!(
                "no access to asset {}",
                asset.id
            )));
        }
        if let Some(assignee_id) = draft.assignee {
            if !self.capabilities_of(&actor).can_assign_orders {
                return Err(CoreError::permission("assigning work orders"));
            }
            // Resolve before creating so a bad assignee leaves nothing
            // behind.
            self.assignable_user(assignee_id)?;
        }

        let order = self.store.create(&draft, &asset, &actor)?;
        match draft.assignee {
            Some(assignee) => self.apply_assignment(order, assignee, &actor),
            None => Ok(order),
        }
    }

    /// The general edit transition. Deltas are journaled and notified in
    /// the fixed order status → priority → assignment, then all of them
    /// commit as a single store update.
    pub fn edit_order(
        &mut self,
        id: WorkOrderId,
        request: EditRequest,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let span = info_span!(
            "edit_order",
            order.id = id,
            actor = acting,
            correlation.id = %generate_correlation_id()
        );
        let _guard = span.enter();

        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;

        if request.status == OrderStatus::Erledigt {
            return Err(CoreError::conflict(
                "Erledigt is only reachable through complete()",
            ));
        }

        let status_delta = request.status != order.status;
        let priority_delta = request.priority != order.priority;
        let assignee_delta = request.assignee != order.assigned_to;
        if assignee_delta && !self.capabilities_of(&actor).can_assign_orders {
            return Err(CoreError::permission("assigning work orders"));
        }
        // Resolve the candidate assignee up front so nothing is journaled
        // when the request turns out to be invalid.
        let new_assignee = match (assignee_delta, request.assignee) {
            (true, Some(user_id)) => Some(self.assignable_user(user_id)?),
            _ => None,
        };

        if status_delta {
            let old = order.status;
            self.journal.add_system_entry(
                &order,
                &actor,
                CommentKind::StatusChange,
                old.to_string(),
                request.status.to_string(),
            );
            self.notifications
                .on_status_changed(&order, old, request.status, &actor);
            order.status = request.status;
        }

        if priority_delta {
            let old = order.priority;
            self.journal.add_system_entry(
                &order,
                &actor,
                CommentKind::PriorityChange,
                old.to_string(),
                request.priority.to_string(),
            );
            self.notifications
                .on_priority_changed(&order, old, request.priority, &actor);
            order.priority = request.priority;
        }

        if assignee_delta {
            let old_name = order
                .assigned_to_name
                .clone()
                .unwrap_or_else(|| UNASSIGNED.to_string());
            let new_name = new_assignee
                .as_ref()
                .map(|u| u.name.clone())
                .unwrap_or_else(|| UNASSIGNED.to_string());
            self.journal.add_system_entry(
                &order,
                &actor,
                CommentKind::Assignment,
                old_name,
                new_name,
            );
            if let Some(assignee) = &new_assignee {
                self.notifications.on_assigned(&order, assignee, &actor);
            }
            order.assigned_to = new_assignee.as_ref().map(|u| u.id);
            order.assigned_to_name = new_assignee.map(|u| u.name);
            // Assigning a fresh order implies Zugewiesen; that bump is
            // part of the assignment transition, not a separate status
            // delta.
            if !status_delta && order.status == OrderStatus::Neu && order.assigned_to.is_some() {
                order.status = OrderStatus::Zugewiesen;
            }
        }

        self.store.update(order)
    }

    /// The stricter completion transition: blocked while required tasks
    /// are open, then terminal.
    pub fn complete_order(
        &mut self,
        id: WorkOrderId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let span = info_span!(
            "complete_order",
            order.id = id,
            actor = acting,
            correlation.id = %generate_correlation_id()
        );
        let _guard = span.enter();

        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;

        let blocking = checklist::open_required(&order);
        if !blocking.is_empty() {
            return Err(CoreError::IncompleteTasks { blocking });
        }

        let old = order.status;
        order.status = OrderStatus::Erledigt;
        order.completed_at = Some(chrono::Utc::now());
        self.journal.add_system_entry(
            &order,
            &actor,
            CommentKind::StatusChange,
            old.to_string(),
            OrderStatus::Erledigt.to_string(),
        );
        let committed = self.store.update(order)?;
        // Best-effort from here: the record and its journal entry are
        // already committed.
        self.notifications
            .on_completed(&committed, &actor, &self.users);
        info!(order.id = id, "work order completed");
        Ok(committed)
    }

    /// Cancel from any non-terminal state.
    pub fn cancel_order(
        &mut self,
        id: WorkOrderId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;

        let old = order.status;
        order.status = OrderStatus::Abgebrochen;
        self.journal.add_system_entry(
            &order,
            &actor,
            CommentKind::StatusChange,
            old.to_string(),
            OrderStatus::Abgebrochen.to_string(),
        );
        self.notifications
            .on_status_changed(&order, old, OrderStatus::Abgebrochen, &actor);
        self.store.update(order)
    }

    /// The single sanctioned exit from a terminal state. Restores
    /// `Zugewiesen` when an assignee is still on the record, `Neu`
    /// otherwise, and clears the completion stamp.
    pub fn reopen_order(
        &mut self,
        id: WorkOrderId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        if !self.capabilities_of(&actor).can_assign_orders {
            return Err(CoreError::permission("reopening work orders"));
        }
        let mut order = self.stored(id)?;
        if !order.status.is_terminal() {
            return Err(CoreError::conflict("only terminal work orders can be reopened"));
        }
        self.guard_asset_access(&actor, &order)?;

        let old = order.status;
        order.status = if order.assigned_to.is_some() {
            OrderStatus::Zugewiesen
        } else {
            OrderStatus::Neu
        };
        order.completed_at = None;
        self.journal.add_system_entry(
            &order,
            &actor,
            CommentKind::StatusChange,
            old.to_string(),
            order.status.to_string(),
        );
        self.notifications
            .on_status_changed(&order, old, order.status, &actor);
        self.store.update(order)
    }

    /// Physically remove a work order. Journal entries and notifications
    /// stay behind keyed by the dead id; both collections are append-only
    /// by contract.
    pub fn delete_order(
        &mut self,
        id: WorkOrderId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        if !self.capabilities_of(&actor).can_delete_orders {
            return Err(CoreError::permission("deleting work orders"));
        }
        let removed = self.store.remove(id)?;
        info!(
            order.id = id,
            orphaned_comments = self.journal.comments_for(id).len(),
            "work order deleted, journal entries left in place"
        );
        Ok(removed)
    }

    pub fn add_task(
        &mut self,
        id: WorkOrderId,
        description: &str,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;
        checklist::add(&mut order, description)?;
        self.store.update(order)
    }

    /// Flip a task's completion state. A missing task id is a
    /// `NotFound` here, even though the engine itself treats it as a
    /// no-op.
    pub fn toggle_task(
        &mut self,
        id: WorkOrderId,
        task_id: TaskId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;
        checklist::toggle(&mut order, task_id, &actor).ok_or(CoreError::NotFound {
            entity: "task",
            id: task_id,
        })?;
        self.store.update(order)
    }

    pub fn remove_task(
        &mut self,
        id: WorkOrderId,
        task_id: TaskId,
        acting: UserId,
    ) -> Result<WorkOrder, CoreError> {
        let actor = self.actor(acting)?;
        let mut order = self.stored(id)?;
        self.guard_not_terminal(&order)?;
        self.guard_asset_access(&actor, &order)?;
        checklist::remove(&mut order, task_id)?;
        self.store.update(order)
    }

    /// Append a user comment and notify the other involved parties.
    pub fn add_comment(
        &mut self,
        id: WorkOrderId,
        text: &str,
        acting: UserId,
    ) -> Result<Comment, CoreError> {
        let actor = self.actor(acting)?;
        let order = self.stored(id)?;
        self.guard_asset_access(&actor, &order)?;
        let comment = self.journal.add_user_comment(&order, &actor, text)?.clone();
        self.notifications.on_comment_added(&order, &actor);
        Ok(comment)
    }

    // ---- query views -------------------------------------------------

    pub fn order(&self, id: WorkOrderId) -> Option<&WorkOrder> {
        self.store.get(id)
    }

    /// Work orders on assets the user may see, optionally narrowed by a
    /// filter.
    pub fn visible_orders(
        &self,
        filter: &WorkOrderFilter,
        acting: UserId,
    ) -> Result<Vec<&WorkOrder>, CoreError> {
        let actor = self.actor(acting)?;
        Ok(self
            .store
            .filtered(filter)
            .into_iter()
            .filter(|o| can_access_asset(&actor, o.asset_id))
            .collect())
    }

    pub fn comments_for(&self, id: WorkOrderId) -> Vec<&Comment> {
        self.journal.comments_for(id)
    }

    // ---- internals ---------------------------------------------------

    fn actor(&self, id: UserId) -> Result<User, CoreError> {
        let user = self.users.get(id).ok_or(CoreError::NotFound {
            entity: "user",
            id,
        })?;
        if !user.active {
            return Err(CoreError::permission("user is deactivated"));
        }
        Ok(user.clone())
    }

    fn capabilities_of(&self, user: &User) -> Capabilities {
        Capabilities::for_role(user.role)
    }

    fn stored(&self, id: WorkOrderId) -> Result<WorkOrder, CoreError> {
        self.store
            .get(id)
            .cloned()
            .ok_or(CoreError::NotFound {
                entity: "work order",
                id,
            })
    }

    fn guard_not_terminal(&self, order: &WorkOrder) -> Result<(), CoreError> {
        if order.status.is_terminal() {
            return Err(CoreError::conflict(format!(
                "work order {} is {} and cannot be modified",
                order.id, order.status
            )));
        }
        Ok(())
    }

    fn guard_asset_access(&self, actor: &User, order: &WorkOrder) -> Result<(), CoreError> {
        if !can_access_asset(actor, order.asset_id) {
            return Err(CoreError::permission(format!(
                "no access to asset {}",
                order.asset_id
            )));
        }
        Ok(())
    }

    /// Resolve a user that is about to be assigned: must exist and be
    /// active.
    fn assignable_user(&self, id: UserId) -> Result<User, CoreError> {
        let user = self.users.get(id).ok_or(CoreError::NotFound {
            entity: "user",
            id,
        })?;
        if !user.active {
            return Err(CoreError::validation(format!(
                "user {} is deactivated and cannot be assigned",
                user.name
            )));
        }
        Ok(user.clone())
    }

    /// Assignment step shared by `create_order`: journal the delta, set
    /// the fields, notify, and commit the status bump to `Zugewiesen`.
    fn apply_assignment(
        &mut self,
        mut order: WorkOrder,
        assignee_id: UserId,
        actor: &User,
    ) -> Result<WorkOrder, CoreError> {
        let assignee = self.assignable_user(assignee_id)?;
        self.journal.add_system_entry(
            &order,
            actor,
            CommentKind::Assignment,
            UNASSIGNED,
            assignee.name.clone(),
        );
        self.notifications.on_assigned(&order, &assignee, actor);
        order.assigned_to = Some(assignee.id);
        order.assigned_to_name = Some(assignee.name);
        if order.status == OrderStatus::Neu {
            order.status = OrderStatus::Zugewiesen;
        }
        self.store.update(order)
    }
}
