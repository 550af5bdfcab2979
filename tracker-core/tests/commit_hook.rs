//! End-to-end commit hook flow against an on-disk store.

use tracker_core::commit::{Action, CommitInfo};
use tracker_core::context::ContextBuilder;
use tracker_core::models::*;
use tracker_core::{Database, TrackerError};

fn open(dir: &std::path::Path) -> Database {
    let db = Database::open_in(dir).unwrap();
    db.migrate().unwrap();
    db
}

fn commit(subject: &str) -> CommitInfo {
    CommitInfo {
        hash: "9f8e7d6c5b4a39281706".into(),
        subject: subject.into(),
        branch: "feature/login".into(),
    }
}

#[test]
fn hook_updates_tasks_across_invocations() {
    let data = tempfile::tempdir().unwrap();
    let repo = tempfile::tempdir().unwrap();
    let repo_path = repo.path().to_string_lossy().into_owned();

    let (project_id, login, docs) = {
        let db = open(data.path());
        let project = db
            .create_project(CreateProjectInput {
                name: "webapp".into(),
                path: Some(repo_path.clone()),
                description: None,
            })
            .unwrap();
        let login = db
            .create_task(
                project.id,
                CreateTaskInput {
                    title: "login form".into(),
                    priority: Priority::High,
                    ..Default::default()
                },
            )
            .unwrap();
        let docs = db
            .create_task(
                project.id,
                CreateTaskInput {
                    title: "write docs".into(),
                    ..Default::default()
                },
            )
            .unwrap();
        (project.id, login.id, docs.id)
    };

    // A fresh handle, as a separate hook process would open.
    let db = open(data.path());
    let project = db.project_by_path(&repo_path).unwrap().unwrap();
    assert_eq!(project.id, project_id);

    let subject = format!("pt:{login} completed, pt:{docs} progress");
    let outcomes = db.apply_commit(project.id, &commit(&subject));
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| o.is_success()));
    assert_eq!(outcomes[0].directive.action, Action::Completed);
    assert_eq!(outcomes[1].directive.action, Action::InProgress);

    let login_task = db.get_task(login).unwrap().unwrap();
    assert_eq!(login_task.status, TaskStatus::Completed);
    assert_eq!(
        db.get_task(docs).unwrap().unwrap().status,
        TaskStatus::InProgress
    );

    let activity = db.recent_activity(project.id, 10).unwrap();
    assert_eq!(activity.len(), 2);
    assert!(activity.iter().all(|r| r.commit_hash == "9f8e7d6c"));
    assert!(activity.iter().all(|r| r.branch_name == "feature/login"));
    assert!(activity.iter().all(|r| r.message == subject));

    let ctx = ContextBuilder::default()
        .without_files()
        .build(&db, project.id)
        .unwrap();
    assert_eq!(ctx.recently_completed.len(), 1);
    assert_eq!(ctx.active_tasks.len(), 1);
}

#[test]
fn foreign_task_is_rejected_without_side_effects() {
    let data = tempfile::tempdir().unwrap();
    let db = open(data.path());
    let mine = db
        .create_project(CreateProjectInput {
            name: "mine".into(),
            ..Default::default()
        })
        .unwrap();
    let theirs = db
        .create_project(CreateProjectInput {
            name: "theirs".into(),
            ..Default::default()
        })
        .unwrap();
    let foreign = db
        .create_task(
            theirs.id,
            CreateTaskInput {
                title: "not yours".into(),
                ..Default::default()
            },
        )
        .unwrap();

    let outcomes = db.apply_commit(mine.id, &commit(&format!("pt:{} done", foreign.id)));
    assert_eq!(outcomes.len(), 1);
    assert!(matches!(
        outcomes[0].result,
        Err(TrackerError::TaskNotInProject { .. })
    ));
    assert_eq!(
        db.get_task(foreign.id).unwrap().unwrap().status,
        TaskStatus::Pending
    );
    assert!(db.recent_activity(mine.id, 10).unwrap().is_empty());
    assert!(db.recent_activity(theirs.id, 10).unwrap().is_empty());
}

#[test]
fn message_without_references_changes_nothing() {
    let data = tempfile::tempdir().unwrap();
    let db = open(data.path());
    let project = db
        .create_project(CreateProjectInput {
            name: "quiet".into(),
            ..Default::default()
        })
        .unwrap();

    assert!(db
        .apply_commit(project.id, &commit("refactor: tidy imports"))
        .is_empty());
    assert!(db.recent_activity(project.id, 10).unwrap().is_empty());
}
