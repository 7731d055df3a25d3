//! Checklist operations on the ordered task list of a work order.
//!
//! The functions mutate the order in place; committing the mutated record
//! through the store is the orchestrator's responsibility.

use chrono::Utc;
use tracing::info;

use crate::directory::User;
use crate::error::CoreError;

use super::types::{Task, TaskId, WorkOrder};

/// Append a new task. Fresh id = max existing + 1 (1 for the first task),
/// not completed, required.
pub fn add(order: &mut WorkOrder, description: &str) -> Result<TaskId, CoreError> {
    let description = description.trim();
    if description.is_empty() {
        return Err(CoreError::validation("task description must not be blank"));
    }

    let id = order.tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
    order.tasks.push(Task {
        id,
        description: description.to_string(),
        completed: false,
        completed_by: None,
        completed_by_name: None,
        completed_at: None,
        required: true,
    });
    info!(order.id = order.id, task.id = id, "task added");
    Ok(id)
}

/// Flip the completion flag of a task. Completing stamps the acting user
/// and time; un-completing clears all three stamps. Returns the new
/// completion state, or `None` when the task id is unknown. The caller
/// decides whether that is an error.
pub fn toggle(order: &mut WorkOrder, task_id: TaskId, acting: &User) -> Option<bool> {
    let task = order.tasks.iter_mut().find(|t| t.id == task_id)?;
    if task.completed {
        task.completed = false;
        task.completed_by = None;
        task.completed_by_name = None;
        task.completed_at = None;
    } else {
        task.completed = true;
        task.completed_by = Some(acting.id);
        task.completed_by_name = Some(acting.name.clone());
        task.completed_at = Some(Utc::now());
    }
    Some(task.completed)
}

/// Remove a task. Completed tasks may only be un-completed, not removed;
/// their completion stamp is audit history.
pub fn remove(order: &mut WorkOrder, task_id: TaskId) -> Result<(), CoreError> {
    let task = order
        .tasks
        .iter()
        .find(|t| t.id == task_id)
        .ok_or(CoreError::NotFound {
            entity: "task",
            id: task_id,
        })?;
    if task.completed {
        return Err(CoreError::permission(
            "completed tasks cannot be removed, only un-completed",
        ));
    }
    order.tasks.retain(|t| t.id != task_id);
    Ok(())
}

/// True iff every required task is completed, vacuously true with no
/// tasks at all.
pub fn all_required_satisfied(order: &WorkOrder) -> bool {
    order.tasks.iter().filter(|t| t.required).all(|t| t.completed)
}

/// The required tasks still open, for surfacing in `IncompleteTasks`.
pub fn open_required(order: &WorkOrder) -> Vec<Task> {
    order
        .tasks
        .iter()
        .filter(|t| t.required && !t.completed)
        .cloned()
        .collect()
}
