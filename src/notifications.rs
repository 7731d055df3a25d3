//! Derives who gets told about a lifecycle event and keeps the per-user
//! read/unread state.
//!
//! Recipients for one event are accumulated in a set keyed by user id, so
//! a user who qualifies under two rules (say, creator and assignee at
//! once) still receives exactly one notification. The actor of an event
//! is never notified about their own action.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::directory::{Role, User, UserDirectory, UserId};
use crate::error::CoreError;
use crate::workorder::{Discipline, OrderStatus, Priority, WorkOrder, WorkOrderId};

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    #[serde(rename = "comment")]
    Comment,
    #[serde(rename = "assignment")]
    Assignment,
    #[serde(rename = "status_change")]
    StatusChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub kind: NotificationKind,
    pub work_order_id: WorkOrderId,
    pub work_order_title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub from_user_id: UserId,
    pub from_user_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCenter {
    entries: Vec<Notification>,
    next_id: NotificationId,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_status_changed(
        &mut self,
        order: &WorkOrder,
        old: OrderStatus,
        new: OrderStatus,
        actor: &User,
    ) {
        let message = format!("Status geändert: {old} → {new}");
        for user_id in self.involved_except(order, actor.id) {
            self.push(user_id, NotificationKind::StatusChange, order, &message, actor);
        }
    }

    pub fn on_priority_changed(
        &mut self,
        order: &WorkOrder,
        old: Priority,
        new: Priority,
        actor: &User,
    ) {
        let message = format!("Priorität geändert: {old} → {new}");
        for user_id in self.involved_except(order, actor.id) {
            self.push(user_id, NotificationKind::StatusChange, order, &message, actor);
        }
    }

    /// The assignee and the creator get differently worded notices, so
    /// this event does not go through the common recipient set; the
    /// branch guards keep the two disjoint.
    pub fn on_assigned(&mut self, order: &WorkOrder, assignee: &User, actor: &User) {
        if assignee.id != actor.id {
            let message = format!(
                "{} hat dir die Work Order \"{}\" zugewiesen",
                actor.name, order.title
            );
            self.push(assignee.id, NotificationKind::Assignment, order, &message, actor);
        }
        if order.created_by != actor.id && order.created_by != assignee.id {
            let message = format!(
                "{} wurde der Work Order \"{}\" zugewiesen",
                assignee.name, order.title
            );
            self.push(
                order.created_by,
                NotificationKind::Assignment,
                order,
                &message,
                actor,
            );
        }
    }

    pub fn on_comment_added(&mut self, order: &WorkOrder, author: &User) {
        let message = format!("{} hat kommentiert", author.name);
        for user_id in self.involved_except(order, author.id) {
            self.push(user_id, NotificationKind::Comment, order, &message, author);
        }
    }

    /// Completion fans out to the discipline's supervisor (Elektrisch →
    /// E-Supervisor, everything else → M-Supervisor) and the creator.
    /// A missing supervisor is logged, never an error: notifications are
    /// best-effort.
    pub fn on_completed(&mut self, order: &WorkOrder, actor: &User, users: &UserDirectory) {
        let supervisor_role = match order.discipline {
            Discipline::Elektrisch => Role::ESupervisor,
            _ => Role::MSupervisor,
        };

        let mut recipients = BTreeSet::new();
        match users.find_active_by_role(supervisor_role) {
            Some(supervisor) if supervisor.id != actor.id => {
                recipients.insert(supervisor.id);
            }
            Some(_) => {}
            None => {
                warn!(
                    order.id = order.id,
                    role = %supervisor_role,
                    "no active supervisor found for completion notice"
                );
            }
        }
        if order.created_by != actor.id {
            recipients.insert(order.created_by);
        }

        let message = format!(
            "{} hat die Work Order \"{}\" erledigt",
            actor.name, order.title
        );
        for user_id in recipients {
            self.push(user_id, NotificationKind::StatusChange, order, &message, actor);
        }
    }

    /// Assignee (if any) and creator, minus the acting user, deduplicated.
    fn involved_except(&self, order: &WorkOrder, actor: UserId) -> BTreeSet<UserId> {
        let mut recipients = BTreeSet::new();
        if let Some(assignee) = order.assigned_to {
            recipients.insert(assignee);
        }
        recipients.insert(order.created_by);
        recipients.remove(&actor);
        recipients
    }

    fn push(
        &mut self,
        user_id: UserId,
        kind: NotificationKind,
        order: &WorkOrder,
        message: &str,
        from: &User,
    ) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Notification {
            id,
            user_id,
            kind,
            work_order_id: order.id,
            work_order_title: order.title.clone(),
            message: message.to_string(),
            created_at: Utc::now(),
            read: false,
            from_user_id: from.id,
            from_user_name: from.name.clone(),
        });
        info!(
            notification.id = id,
            target.user = user_id,
            order.id = order.id,
            "notification dispatched"
        );
    }

    /// Idempotent: re-marking an already-read notification succeeds.
    pub fn mark_read(&mut self, id: NotificationId) -> Result<(), CoreError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or(CoreError::NotFound {
                entity: "notification",
                id,
            })?;
        entry.read = true;
        Ok(())
    }

    /// Returns how many notifications flipped from unread to read.
    pub fn mark_all_read(&mut self, user_id: UserId) -> usize {
        let mut flipped = 0;
        for entry in self.entries.iter_mut().filter(|n| n.user_id == user_id) {
            if !entry.read {
                entry.read = true;
                flipped += 1;
            }
        }
        flipped
    }

    pub fn unread_count_for(&self, user_id: UserId) -> usize {
        self.entries
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count()
    }

    /// Insertion order, which is creation order.
    pub fn notifications_for(&self, user_id: UserId) -> Vec<&Notification> {
        self.entries.iter().filter(|n| n.user_id == user_id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
