/// Integration tests for the hub services over an in-memory store
mod common;

use common::{csv, invalid_row, session, valid_row, TestContext};
use serde_json::json;
use synergy_hub::board::{MoveOutcome, TaskBoard};
use synergy_hub::dashboard::DashboardSummary;
use synergy_hub::error::ServiceError;
use synergy_hub::import::{ImportKind, ParseReport, RowOutcome};
use synergy_shared::auth::authorization::can_manage_tasks;
use synergy_shared::auth::Session;
use synergy_shared::models::{CreateProject, CreateTask, Role, TaskStatus};
use synergy_shared::store::StoreOperation;

/// Test that a guest who is the assignee may manage the task
#[tokio::test]
async fn test_guest_assignee_can_manage_task() {
    let ctx = TestContext::new();
    let project = ctx.seed_project("Website", "Active", "3,7");
    let task_id = ctx.seed_task("Landing page", project, Some(7), Some(3));

    let task = ctx.services.tasks.get(task_id).await.unwrap().unwrap();
    assert!(can_manage_tasks(Some(Role::Guest), Some(&task), Some(7)));
    assert!(can_manage_tasks(Some(Role::Guest), Some(&task), Some(3)));
    assert!(!can_manage_tasks(Some(Role::Guest), Some(&task), Some(9)));
    assert!(!can_manage_tasks(Some(Role::Guest), Some(&task), None));

    let guest = session(7, Role::Guest);
    let moved = ctx
        .services
        .tasks
        .update_status(&guest, task_id, TaskStatus::InProgress)
        .await
        .unwrap();
    assert_eq!(moved.status, TaskStatus::InProgress);
}

/// Test that a status move writes only the status and update stamp
#[tokio::test]
async fn test_status_move_persists_only_status_fields() {
    let ctx = TestContext::new();
    let project = ctx.seed_project("Website", "Active", "");
    let task_id = ctx.seed_task("Landing page", project, Some(7), Some(3));
    let before = ctx.store.record("task_c", task_id).unwrap();

    ctx.services
        .tasks
        .update_status(&session(1, Role::ProjectManager), task_id, TaskStatus::Review)
        .await
        .unwrap();

    let after = ctx.store.record("task_c", task_id).unwrap();
    let before = before.as_object().unwrap();
    let after = after.as_object().unwrap();
    assert_eq!(before.len(), after.len());

    let changed: Vec<&str> = after
        .iter()
        .filter(|(key, value)| before.get(*key) != Some(*value))
        .map(|(key, _)| key.as_str())
        .collect();
    assert_eq!(changed, vec!["status_c", "updated_at_c"]);
    assert_eq!(after["status_c"], json!("Review"));
}

/// Test the role matrix for writes across services
#[tokio::test]
async fn test_role_denials() {
    let ctx = TestContext::new();
    let project = ctx.seed_project("Website", "Active", "4");
    let task_id = ctx.seed_task("Landing page", project, Some(4), Some(4));

    let admin = session(1, Role::Administrator);
    let hr = session(2, Role::HrAdmin);
    let manager = session(3, Role::ProjectManager);
    let member = session(5, Role::TeamMember);
    let guest = session(6, Role::Guest);

    for denied in [&member, &guest, &Session::anonymous()] {
        let err = ctx
            .services
            .projects
            .create(denied, CreateProject::new("Denied"))
            .await
            .unwrap_err();
        assert!(err.is_forbidden());
    }
    for allowed in [&admin, &hr, &manager] {
        assert!(ctx.services.projects.create(allowed, CreateProject::new("Allowed")).await.is_ok());
    }

    assert!(ctx.services.users.delete_all(&hr).await.unwrap_err().is_forbidden());
    assert!(ctx.services.tasks.delete(&member, task_id).await.unwrap_err().is_forbidden());
    assert!(ctx.services.tasks.delete_all(&member).await.unwrap_err().is_forbidden());

    let err = ctx
        .services
        .tasks
        .create(&Session::anonymous(), CreateTask::new("Nope", project))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    // Denied writes never reach the store
    assert!(ctx.store.calls_of(StoreOperation::Delete).is_empty());
    assert_eq!(ctx.store.records("project_c").len(), 4);
}

/// Test that an import with one store rejection reports each row
#[tokio::test]
async fn test_project_import_partial_failure() {
    let ctx = TestContext::new();
    ctx.store.require_field("project_c", "description_c");

    let report = ParseReport {
        results: vec![
            valid_row(2, json!({"Name": "Alpha", "Description": "First", "Status": "Active"})),
            valid_row(3, json!({"Name": "Beta", "Status": "Planning"})),
            invalid_row(4, "Name is required"),
            valid_row(5, json!({"name_c": "Gamma", "description_c": "Third", "members_c": "1,2"})),
        ],
        valid_rows: 3,
        invalid_rows: 1,
    };
    let (importer, parser) = ctx.importer(report);

    let summary = importer
        .run(&session(1, Role::Administrator), ImportKind::Project, &csv("projects.csv"))
        .await
        .unwrap();

    assert_eq!(parser.calls(), 1);
    assert!(summary.success);
    assert_eq!(summary.created, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.invalid_rows, 1);

    let rows: Vec<usize> = summary.details.iter().map(|d| d.row_number).collect();
    assert_eq!(rows, vec![2, 3, 4, 5]);
    assert!(matches!(summary.details[1].outcome, RowOutcome::Failed { .. }));
    assert!(matches!(summary.details[2].outcome, RowOutcome::Invalid { .. }));

    // One bulk create for all valid rows
    let creates = ctx.store.calls_of(StoreOperation::Create);
    assert_eq!(creates.len(), 1);
    assert_eq!(creates[0].count, 3);
    assert_eq!(ctx.store.records("project_c").len(), 2);
}

/// Test that an import with no valid rows sends nothing
#[tokio::test]
async fn test_import_without_valid_rows_makes_no_create_call() {
    let ctx = TestContext::new();
    let report = ParseReport {
        results: vec![invalid_row(2, "title is required"), invalid_row(3, "bad date")],
        valid_rows: 0,
        invalid_rows: 2,
    };
    let (importer, _parser) = ctx.importer(report);

    let summary = importer
        .run(&session(3, Role::ProjectManager), ImportKind::Task, &csv("tasks.csv"))
        .await
        .unwrap();

    assert!(!summary.success);
    assert_eq!(summary.created, 0);
    assert_eq!(summary.invalid_rows, 2);
    assert!(ctx.store.calls_of(StoreOperation::Create).is_empty());
}

/// Test that a denied import never invokes the parser
#[tokio::test]
async fn test_import_denied_before_parsing() {
    let ctx = TestContext::new();
    let (importer, parser) = ctx.importer(ParseReport::default());

    let err = importer
        .run(&session(5, Role::TeamMember), ImportKind::Task, &csv("tasks.csv"))
        .await
        .unwrap_err();
    assert!(err.is_forbidden());
    assert_eq!(parser.calls(), 0);
}

/// Test that delete-all on an empty collection makes no delete call
#[tokio::test]
async fn test_delete_all_on_empty_collection() {
    let ctx = TestContext::new();
    let admin = session(1, Role::Administrator);

    let summary = ctx.services.projects.delete_all(&admin).await.unwrap();
    assert!(summary.deleted.is_empty());
    assert!(summary.all_succeeded());
    assert!(ctx.store.calls_of(StoreOperation::Delete).is_empty());
    assert_eq!(ctx.store.calls_of(StoreOperation::Fetch).len(), 1);
}

/// Test a board move followed by a dashboard refresh
#[tokio::test]
async fn test_board_move_and_dashboard() {
    let ctx = TestContext::new();
    let project = ctx.seed_project("Website", "Active", "7");
    let first = ctx.seed_task("Landing page", project, Some(7), Some(3));
    ctx.seed_task("Pricing page", project, Some(7), Some(3));

    let member = session(7, Role::TeamMember);
    let mut board = TaskBoard::new(ctx.services.tasks.clone()).for_project(project);
    board.load().await.unwrap();
    assert_eq!(board.column(TaskStatus::ToDo).len(), 2);

    let outcome = board.move_task(&member, first, TaskStatus::Done).await.unwrap();
    assert_eq!(outcome, MoveOutcome::Moved);
    assert_eq!(board.column(TaskStatus::Done).len(), 1);

    let summary = DashboardSummary::load(&ctx.services, &member, 5).await.unwrap();
    assert_eq!(summary.active_projects, 1);
    assert_eq!(summary.my_tasks, 2);
    assert_eq!(summary.my_completed_tasks, 1);
}

/// Test that a project with unreadable members still lists
#[tokio::test]
async fn test_malformed_members_do_not_break_listings() {
    let ctx = TestContext::new();
    ctx.seed_project("Website", "Active", "1,2");
    ctx.seed_project("Intranet", "Active", "Ana, Ben");

    let projects = ctx.services.projects.list().await.unwrap();
    assert_eq!(projects.len(), 2);

    let accessible = ctx
        .services
        .projects
        .accessible(&session(2, Role::TeamMember))
        .await
        .unwrap();
    let names: Vec<&str> = accessible.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Website"]);

    let member = session(1, Role::TeamMember);
    let summary = DashboardSummary::load(&ctx.services, &member, 5).await.unwrap();
    assert_eq!(summary.total_projects, 2);
}
