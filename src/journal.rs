//! Append-only log of user comments and system-generated change records.
//!
//! Identity is a single sequence across the whole log, not per work order.
//! The sequence is a dedicated counter persisted with the snapshot, which
//! replaces the original's max-plus-one scan and its read-then-compute
//! race.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::{Role, User, UserId};
use crate::error::CoreError;
use crate::workorder::{WorkOrder, WorkOrderId};

pub type CommentId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommentKind {
    #[serde(rename = "comment")]
    Comment,
    #[serde(rename = "status_change")]
    StatusChange,
    #[serde(rename = "assignment")]
    Assignment,
    #[serde(rename = "priority_change")]
    PriorityChange,
}

/// One log entry. System-generated entries carry an empty body and an
/// old/new value pair; plain comments carry only the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub work_order_id: WorkOrderId,
    pub author_id: UserId,
    pub author_name: String,
    pub author_role: Role,
    pub text: String,
    pub kind: CommentKind,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentLog {
    entries: Vec<Comment>,
    next_id: CommentId,
}

impl Default for CommentLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl CommentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plain user comment.
    pub fn add_user_comment(
        &mut self,
        order: &WorkOrder,
        author: &User,
        text: &str,
    ) -> Result<&Comment, CoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::validation("comment text must not be blank"));
        }
        Ok(self.push(order, author, CommentKind::Comment, text.to_string(), None, None))
    }

    /// Append a system-generated change record. Only the lifecycle
    /// orchestrator writes these; they are never user-invocable.
    pub(crate) fn add_system_entry(
        &mut self,
        order: &WorkOrder,
        actor: &User,
        kind: CommentKind,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> &Comment {
        self.push(
            order,
            actor,
            kind,
            String::new(),
            Some(old_value.into()),
            Some(new_value.into()),
        )
    }

    fn push(
        &mut self,
        order: &WorkOrder,
        author: &User,
        kind: CommentKind,
        text: String,
        old_value: Option<String>,
        new_value: Option<String>,
    ) -> &Comment {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(Comment {
            id,
            work_order_id: order.id,
            author_id: author.id,
            author_name: author.name.clone(),
            author_role: author.role,
            text,
            kind,
            old_value,
            new_value,
            created_at: Utc::now(),
        });
        info!(comment.id = id, order.id = order.id, kind = ?kind, "journal entry appended");
        self.entries.last().expect("entry just pushed")
    }

    /// Entries for one work order, ordered by timestamp ascending with id
    /// as the tiebreaker.
    pub fn comments_for(&self, work_order_id: WorkOrderId) -> Vec<&Comment> {
        let mut entries: Vec<&Comment> = self
            .entries
            .iter()
            .filter(|c| c.work_order_id == work_order_id)
            .collect();
        entries.sort_by_key(|c| (c.created_at, c.id));
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::{Asset, Role};
    use crate::workorder::{WorkOrderDraft, WorkOrderStore};

    fn setup() -> (WorkOrder, WorkOrder, User) {
        let asset = Asset::new(1, "Pumpe 3", "Halle 2");
        let author = User::new(5, "Meier", Role::MSupervisor);
        let mut store = WorkOrderStore::new();
        let draft = WorkOrderDraft::new("Pumpe leckt", "Dichtung tauschen").on_asset(1);
        let a = store.create(&draft, &asset, &author).unwrap();
        let b = store.create(&draft, &asset, &author).unwrap();
        (a, b, author)
    }

    #[test]
    fn ids_are_global_across_work_orders() {
        let (a, b, author) = setup();
        let mut log = CommentLog::new();

        let first = log.add_user_comment(&a, &author, "erster").unwrap().id;
        let second = log.add_user_comment(&b, &author, "zweiter").unwrap().id;
        let third = log.add_user_comment(&a, &author, "dritter").unwrap().id;

        assert_eq!((first, second, third), (1, 2, 3));
        assert_eq!(log.comments_for(a.id).len(), 2);
        assert_eq!(log.comments_for(b.id).len(), 1);
    }

    #[test]
    fn blank_comment_is_rejected() {
        let (a, _, author) = setup();
        let mut log = CommentLog::new();
        assert!(matches!(
            log.add_user_comment(&a, &author, "  \n"),
            Err(CoreError::Validation(_))
        ));
        assert!(log.is_empty());
    }

    #[test]
    fn system_entries_carry_delta_and_empty_body() {
        let (a, _, actor) = setup();
        let mut log = CommentLog::new();

        log.add_system_entry(&a, &actor, CommentKind::StatusChange, "Neu", "Zugewiesen");

        let entries = log.comments_for(a.id);
        assert_eq!(entries.len(), 1);
        let entry = entries[0];
        assert_eq!(entry.kind, CommentKind::StatusChange);
        assert!(entry.text.is_empty());
        assert_eq!(entry.old_value.as_deref(), Some("Neu"));
        assert_eq!(entry.new_value.as_deref(), Some("Zugewiesen"));
        assert_eq!(entry.author_role, Role::MSupervisor);
    }

    #[test]
    fn comments_come_back_in_append_order() {
        let (a, _, author) = setup();
        let mut log = CommentLog::new();
        for text in ["eins", "zwei", "drei"] {
            log.add_user_comment(&a, &author, text).unwrap();
        }
        let texts: Vec<&str> = log
            .comments_for(a.id)
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["eins", "zwei", "drei"]);
    }
}
