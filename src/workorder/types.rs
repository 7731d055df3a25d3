use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::{AssetId, UserId};

pub type WorkOrderId = u64;
pub type TaskId = u64;

/// Priority levels for work orders.
/// Higher values = escalation; the ordering is what `Ord` compares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    #[serde(rename = "Niedrig")]
    Niedrig = 0,
    #[serde(rename = "Normal")]
    Normal = 1,
    #[serde(rename = "Hoch")]
    Hoch = 2,
    #[serde(rename = "Kritisch")]
    Kritisch = 3,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Priority::Niedrig => "Niedrig",
            Priority::Normal => "Normal",
            Priority::Hoch => "Hoch",
            Priority::Kritisch => "Kritisch",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "niedrig" => Ok(Priority::Niedrig),
            "normal" => Ok(Priority::Normal),
            "hoch" => Ok(Priority::Hoch),
            "kritisch" => Ok(Priority::Kritisch),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Discipline a work order belongs to. Drives which supervisor is
/// notified on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Discipline {
    #[serde(rename = "Mechanisch")]
    Mechanisch,
    #[serde(rename = "Elektrisch")]
    Elektrisch,
    #[serde(rename = "Hydraulisch")]
    Hydraulisch,
    #[serde(rename = "Sonstiges")]
    Sonstiges,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Discipline::Mechanisch => "Mechanisch",
            Discipline::Elektrisch => "Elektrisch",
            Discipline::Hydraulisch => "Hydraulisch",
            Discipline::Sonstiges => "Sonstiges",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for Discipline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mechanisch" => Ok(Discipline::Mechanisch),
            "elektrisch" => Ok(Discipline::Elektrisch),
            "hydraulisch" => Ok(Discipline::Hydraulisch),
            "sonstiges" => Ok(Discipline::Sonstiges),
            other => Err(format!("unknown discipline: {other}")),
        }
    }
}

/// Lifecycle states. `Erledigt` and `Abgebrochen` are terminal; the
/// orchestrator rejects any transition out of them except `reopen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Neu")]
    Neu,
    #[serde(rename = "Zugewiesen")]
    Zugewiesen,
    #[serde(rename = "In Arbeit")]
    InArbeit,
    #[serde(rename = "Erledigt")]
    Erledigt,
    #[serde(rename = "Abgebrochen")]
    Abgebrochen,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Erledigt | OrderStatus::Abgebrochen)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Neu => "Neu",
            OrderStatus::Zugewiesen => "Zugewiesen",
            OrderStatus::InArbeit => "In Arbeit",
            OrderStatus::Erledigt => "Erledigt",
            OrderStatus::Abgebrochen => "Abgebrochen",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neu" => Ok(OrderStatus::Neu),
            "zugewiesen" => Ok(OrderStatus::Zugewiesen),
            "in arbeit" | "in-arbeit" => Ok(OrderStatus::InArbeit),
            "erledigt" => Ok(OrderStatus::Erledigt),
            "abgebrochen" => Ok(OrderStatus::Abgebrochen),
            other => Err(format!("unknown status: {other}")),
        }
    }
}

/// Checklist entry on a work order. Ids are unique within the parent
/// order only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub completed: bool,
    pub completed_by: Option<UserId>,
    pub completed_by_name: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub required: bool,
}

/// The central record. The `*_name` fields are point-in-time snapshots
/// taken when the referencing field was set, never a live join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub title: String,
    pub description: String,
    pub asset_id: AssetId,
    pub asset_name: String,
    pub discipline: Discipline,
    pub priority: Priority,
    pub status: OrderStatus,
    pub created_by: UserId,
    pub created_by_name: String,
    pub assigned_to: Option<UserId>,
    pub assigned_to_name: Option<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl WorkOrder {
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

/// What a create request carries before the store assigns identity and
/// stamps timestamps. The asset reference is optional here so that the
/// store can reject its absence as a validation failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkOrderDraft {
    pub title: String,
    pub description: String,
    pub asset_id: Option<AssetId>,
    pub discipline: Discipline,
    pub priority: Priority,
    pub assignee: Option<UserId>,
}

impl WorkOrderDraft {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            asset_id: None,
            discipline: Discipline::Sonstiges,
            priority: Priority::Normal,
            assignee: None,
        }
    }

    pub fn on_asset(mut self, asset_id: AssetId) -> Self {
        self.asset_id = Some(asset_id);
        self
    }

    pub fn discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn assigned_to(mut self, user: UserId) -> Self {
        self.assignee = Some(user);
        self
    }
}

/// Read-side filter for `WorkOrderStore::filtered`. Unset fields match
/// everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkOrderFilter {
    pub asset: Option<AssetId>,
    pub discipline: Option<Discipline>,
    pub status: Option<OrderStatus>,
}

impl WorkOrderFilter {
    pub fn matches(&self, order: &WorkOrder) -> bool {
        self.asset.map_or(true, |a| order.asset_id == a)
            && self.discipline.map_or(true, |d| order.discipline == d)
            && self.status.map_or(true, |s| order.status == s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Kritisch > Priority::Hoch);
        assert!(Priority::Hoch > Priority::Normal);
        assert!(Priority::Normal > Priority::Niedrig);
    }

    #[test]
    fn test_priority_display_and_parse() {
        assert_eq!(Priority::Kritisch.to_string(), "Kritisch");
        assert_eq!("hoch".parse::<Priority>().unwrap(), Priority::Hoch);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_terminal_states() {
        assert!(OrderStatus::Erledigt.is_terminal());
        assert!(OrderStatus::Abgebrochen.is_terminal());
        assert!(!OrderStatus::Neu.is_terminal());
        assert!(!OrderStatus::Zugewiesen.is_terminal());
        assert!(!OrderStatus::InArbeit.is_terminal());
    }

    #[test]
    fn test_status_wire_names() {
        let json = serde_json::to_string(&OrderStatus::InArbeit).unwrap();
        assert_eq!(json, "\"In Arbeit\"");
        let back: OrderStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, OrderStatus::InArbeit);
        assert_eq!("in arbeit".parse::<OrderStatus>().unwrap(), OrderStatus::InArbeit);
    }

    #[test]
    fn test_filter_matching() {
        let draft = WorkOrderDraft::new("Pumpe prüfen", "Dichtung undicht")
            .on_asset(7)
            .discipline(Discipline::Mechanisch);
        let order = WorkOrder {
            id: 1,
            title: draft.title.clone(),
            description: draft.description.clone(),
            asset_id: 7,
            asset_name: "Pumpe 3".to_string(),
            discipline: Discipline::Mechanisch,
            priority: Priority::Normal,
            status: OrderStatus::Neu,
            created_by: 1,
            created_by_name: "Schmidt".to_string(),
            assigned_to: None,
            assigned_to_name: None,
            tasks: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
            completed_at: None,
        };

        assert!(WorkOrderFilter::default().matches(&order));
        let by_asset = WorkOrderFilter {
            asset: Some(7),
            ..Default::default()
        };
        assert!(by_asset.matches(&order));
        let wrong_status = WorkOrderFilter {
            status: Some(OrderStatus::Erledigt),
            ..Default::default()
        };
        assert!(!wrong_status.matches(&order));
    }
}
