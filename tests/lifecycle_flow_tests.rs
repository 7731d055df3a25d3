//! End-to-end lifecycle scenarios driven through the coordinator,
//! covering identity, visibility, completion gating, notification
//! fan-out, and terminal-state handling.

use leitstand::{
    Asset, AssetDirectory, CommentKind, CoreError, Discipline, EditRequest, OrderCoordinator,
    OrderStatus, Priority, Role, User, UserDirectory, WorkOrderDraft, WorkOrderFilter,
};

const ADMIN: u64 = 1;
const M_SUPERVISOR: u64 = 2;
const E_SUPERVISOR: u64 = 3;
const MECHANIKER: u64 = 4;
const ELEKTRIKER: u64 = 5;
const RESTRICTED: u64 = 6;

fn seeded() -> OrderCoordinator {
    let users = UserDirectory::from_users([
        User::new(ADMIN, "Acker", Role::Admin),
        User::new(M_SUPERVISOR, "Meier", Role::MSupervisor),
        User::new(E_SUPERVISOR, "Weber", Role::ESupervisor),
        User::new(MECHANIKER, "Schmidt", Role::Mechaniker),
        User::new(ELEKTRIKER, "Koch", Role::Elektriker),
        User::new(RESTRICTED, "Braun", Role::Mechaniker).restricted_to(vec![1]),
    ]);
    let assets = AssetDirectory::from_assets([
        Asset::new(1, "Pumpe 3", "Halle 2"),
        Asset::new(2, "Presse 1", "Halle 1"),
    ]);
    OrderCoordinator::new(users, assets)
}

fn pump_draft() -> WorkOrderDraft {
    WorkOrderDraft::new("Pump leak", "Dichtung an der Saugseite tauschen")
        .on_asset(1)
        .discipline(Discipline::Mechanisch)
        .priority(Priority::Normal)
}

#[test]
fn work_order_ids_are_strictly_increasing_and_never_reused() {
    let mut state = seeded();

    let first = state.create_order(pump_draft(), MECHANIKER).unwrap();
    let second = state.create_order(pump_draft(), MECHANIKER).unwrap();
    assert!(second.id > first.id);

    state.delete_order(second.id, ADMIN).unwrap();
    let third = state.create_order(pump_draft(), MECHANIKER).unwrap();
    assert!(third.id > second.id);
}

#[test]
fn visibility_follows_asset_restriction_rules() {
    let mut state = seeded();
    state.create_order(pump_draft(), MECHANIKER).unwrap();
    state
        .create_order(
            WorkOrderDraft::new("Presse klemmt", "Ventilblock prüfen").on_asset(2),
            MECHANIKER,
        )
        .unwrap();

    // Restricted to asset 1: sees only the pump order
    let filter = WorkOrderFilter::default();
    let visible = state.visible_orders(&filter, RESTRICTED).unwrap();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].asset_id, 1);

    // Empty restriction list: unrestricted
    assert_eq!(state.visible_orders(&filter, MECHANIKER).unwrap().len(), 2);
    // Admin: everything, always
    assert_eq!(state.visible_orders(&filter, ADMIN).unwrap().len(), 2);
    // Restricted user cannot act on the hidden order either
    let hidden_id = state.visible_orders(&filter, ADMIN).unwrap()[1].id;
    assert!(matches!(
        state.add_comment(hidden_id, "darf ich nicht", RESTRICTED),
        Err(CoreError::Permission { .. })
    ));
}

#[test]
fn completion_is_gated_on_required_tasks() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    state
        .add_task(order.id, "Dichtung tauschen", MECHANIKER)
        .unwrap();

    let err = state.complete_order(order.id, MECHANIKER).unwrap_err();
    match err {
        CoreError::IncompleteTasks { blocking } => {
            assert_eq!(blocking.len(), 1);
            assert_eq!(blocking[0].description, "Dichtung tauschen");
        }
        other => panic!("expected IncompleteTasks, got {other:?}"),
    }

    state.toggle_task(order.id, 1, MECHANIKER).unwrap();
    let done = state.complete_order(order.id, MECHANIKER).unwrap();
    assert_eq!(done.status, OrderStatus::Erledigt);
    assert!(done.completed_at.is_some());
}

#[test]
fn work_order_without_tasks_completes_without_blocking() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    let done = state.complete_order(order.id, MECHANIKER).unwrap();
    assert_eq!(done.status, OrderStatus::Erledigt);
}

#[test]
fn assignment_round_trip_matches_journal_and_notifications() {
    let mut state = seeded();
    // Created by U1 (Mechaniker)
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();

    // Assigned to U2 (Elektriker) by the supervisor
    let request = EditRequest {
        assignee: Some(ELEKTRIKER),
        ..EditRequest::keeping(&order)
    };
    let assigned = state.edit_order(order.id, request, M_SUPERVISOR).unwrap();

    assert_eq!(assigned.assigned_to, Some(ELEKTRIKER));
    assert_eq!(assigned.assigned_to_name.as_deref(), Some("Koch"));
    assert_eq!(assigned.status, OrderStatus::Zugewiesen);

    // Exactly one assignment journal entry: Niemand → Koch
    let entries = state.comments_for(order.id);
    let assignments: Vec<_> = entries
        .iter()
        .filter(|c| c.kind == CommentKind::Assignment)
        .collect();
    assert_eq!(assignments.len(), 1);
    assert_eq!(assignments[0].old_value.as_deref(), Some("Niemand"));
    assert_eq!(assignments[0].new_value.as_deref(), Some("Koch"));

    // Exactly two notifications: one for the assignee, one for the creator
    let to_assignee = state.notifications.notifications_for(ELEKTRIKER);
    assert_eq!(to_assignee.len(), 1);
    assert!(to_assignee[0].message.contains("Meier"));
    assert!(to_assignee[0].message.contains("hat dir die Work Order"));

    let to_creator = state.notifications.notifications_for(MECHANIKER);
    assert_eq!(to_creator.len(), 1);
    assert!(to_creator[0].message.contains("Koch"));

    assert_eq!(state.notifications.len(), 2);
}

#[test]
fn status_and_priority_edits_journal_in_fixed_order() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();

    let request = EditRequest {
        status: OrderStatus::InArbeit,
        priority: Priority::Kritisch,
        assignee: None,
    };
    let edited = state.edit_order(order.id, request, M_SUPERVISOR).unwrap();
    assert_eq!(edited.status, OrderStatus::InArbeit);
    assert_eq!(edited.priority, Priority::Kritisch);

    let kinds: Vec<CommentKind> = state
        .comments_for(order.id)
        .iter()
        .map(|c| c.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![CommentKind::StatusChange, CommentKind::PriorityChange]
    );

    let status_entry = &state.comments_for(order.id)[0];
    assert_eq!(status_entry.old_value.as_deref(), Some("Neu"));
    assert_eq!(status_entry.new_value.as_deref(), Some("In Arbeit"));
}

#[test]
fn completion_notifies_discipline_supervisor() {
    let mut state = seeded();
    let draft = WorkOrderDraft::new("Schaltschrank prüfen", "FI löst aus")
        .on_asset(1)
        .discipline(Discipline::Elektrisch);
    let order = state.create_order(draft, MECHANIKER).unwrap();

    state.complete_order(order.id, ELEKTRIKER).unwrap();

    // Elektrisch → E-Supervisor, plus the creator
    assert_eq!(state.notifications.notifications_for(E_SUPERVISOR).len(), 1);
    assert_eq!(state.notifications.notifications_for(MECHANIKER).len(), 1);
    assert!(state.notifications.notifications_for(M_SUPERVISOR).is_empty());
}

#[test]
fn mark_read_is_idempotent_through_the_coordinator() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    state
        .add_comment(order.id, "Ersatzteil bestellt", M_SUPERVISOR)
        .unwrap();

    let id = state.notifications.notifications_for(MECHANIKER)[0].id;
    state.notifications.mark_read(id).unwrap();
    state.notifications.mark_read(id).unwrap();
    assert_eq!(state.notifications.unread_count_for(MECHANIKER), 0);
    assert!(state.notifications.notifications_for(MECHANIKER)[0].read);
}

#[test]
fn comment_notifies_assignee_and_creator_but_never_the_author() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    let request = EditRequest {
        assignee: Some(ELEKTRIKER),
        ..EditRequest::keeping(&order)
    };
    state.edit_order(order.id, request, M_SUPERVISOR).unwrap();

    let before = state.notifications.len();
    state
        .add_comment(order.id, "Bitte bis Freitag", M_SUPERVISOR)
        .unwrap();

    // Assignee and creator each got one comment notice
    assert_eq!(state.notifications.len(), before + 2);
    let for_assignee = state.notifications.notifications_for(ELEKTRIKER);
    let latest = for_assignee.last().unwrap();
    assert_eq!(latest.message, "Meier hat kommentiert");
    assert!(state
        .notifications
        .notifications_for(M_SUPERVISOR)
        .iter()
        .all(|n| n.message != "Meier hat kommentiert"));
}

#[test]
fn terminal_orders_reject_edits_until_reopened() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    state.complete_order(order.id, MECHANIKER).unwrap();

    let request = EditRequest {
        status: OrderStatus::InArbeit,
        priority: Priority::Hoch,
        assignee: None,
    };
    assert!(matches!(
        state.edit_order(order.id, request, M_SUPERVISOR),
        Err(CoreError::Conflict(_))
    ));
    assert!(matches!(
        state.add_task(order.id, "Nacharbeit", MECHANIKER),
        Err(CoreError::Conflict(_))
    ));
    assert!(matches!(
        state.complete_order(order.id, MECHANIKER),
        Err(CoreError::Conflict(_))
    ));

    let reopened = state.reopen_order(order.id, M_SUPERVISOR).unwrap();
    assert_eq!(reopened.status, OrderStatus::Neu);
    assert!(reopened.completed_at.is_none());

    // Reopening a non-terminal order is itself a conflict
    assert!(matches!(
        state.reopen_order(order.id, M_SUPERVISOR),
        Err(CoreError::Conflict(_))
    ));
}

#[test]
fn reopen_restores_zugewiesen_when_assignee_is_present() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    let request = EditRequest {
        assignee: Some(ELEKTRIKER),
        ..EditRequest::keeping(&order)
    };
    state.edit_order(order.id, request, M_SUPERVISOR).unwrap();
    state.cancel_order(order.id, M_SUPERVISOR).unwrap();

    let reopened = state.reopen_order(order.id, M_SUPERVISOR).unwrap();
    assert_eq!(reopened.status, OrderStatus::Zugewiesen);
    assert_eq!(reopened.assigned_to, Some(ELEKTRIKER));
}

#[test]
fn erledigt_is_not_reachable_through_edit() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    let request = EditRequest {
        status: OrderStatus::Erledigt,
        ..EditRequest::keeping(&order)
    };
    assert!(matches!(
        state.edit_order(order.id, request, M_SUPERVISOR),
        Err(CoreError::Conflict(_))
    ));
}

#[test]
fn assignment_and_deletion_are_capability_gated() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();

    let request = EditRequest {
        assignee: Some(ELEKTRIKER),
        ..EditRequest::keeping(&order)
    };
    assert!(matches!(
        state.edit_order(order.id, request, MECHANIKER),
        Err(CoreError::Permission { .. })
    ));
    assert!(matches!(
        state.delete_order(order.id, ELEKTRIKER),
        Err(CoreError::Permission { .. })
    ));

    // Supervisors hold both capabilities
    assert!(state.delete_order(order.id, M_SUPERVISOR).is_ok());
}

#[test]
fn deleting_leaves_journal_entries_behind() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    state
        .add_comment(order.id, "Ersatzteil bestellt", MECHANIKER)
        .unwrap();
    state.delete_order(order.id, ADMIN).unwrap();

    assert!(state.order(order.id).is_none());
    // Append-only collections keep their entries, keyed by the dead id
    assert_eq!(state.comments_for(order.id).len(), 1);
}

#[test]
fn deactivated_users_cannot_act_or_be_assigned() {
    let mut state = seeded();
    let order = state.create_order(pump_draft(), MECHANIKER).unwrap();
    state.users.deactivate(ELEKTRIKER);

    let request = EditRequest {
        assignee: Some(ELEKTRIKER),
        ..EditRequest::keeping(&order)
    };
    assert!(matches!(
        state.edit_order(order.id, request, M_SUPERVISOR),
        Err(CoreError::Validation(_))
    ));

    state.users.deactivate(MECHANIKER);
    assert!(matches!(
        state.add_comment(order.id, "geht nicht mehr", MECHANIKER),
        Err(CoreError::Permission { .. })
    ));
}

#[test]
fn create_with_immediate_assignee_lands_in_zugewiesen() {
    let mut state = seeded();
    let order = state
        .create_order(pump_draft().assigned_to(ELEKTRIKER), M_SUPERVISOR)
        .unwrap();

    assert_eq!(order.status, OrderStatus::Zugewiesen);
    assert_eq!(order.assigned_to_name.as_deref(), Some("Koch"));
    assert_eq!(state.notifications.notifications_for(ELEKTRIKER).len(), 1);
    // Mechaniker may not create pre-assigned orders
    assert!(matches!(
        state.create_order(pump_draft().assigned_to(ELEKTRIKER), MECHANIKER),
        Err(CoreError::Permission { .. })
    ));
}
