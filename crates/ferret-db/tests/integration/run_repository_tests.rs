use ferret_core::models::{ContactRecord, RunResult, RunStats, SourcedContact};
use ferret_core::traits::RunSink;
use ferret_db::RunRepository;

use crate::common::setup_test_db;

fn contact(email: &str, url: &str) -> SourcedContact {
    SourcedContact {
        contact: ContactRecord {
            email: Some(email.to_string()),
            ..Default::default()
        },
        url: url.to_string(),
    }
}

fn run(name: &str, contacts: Vec<SourcedContact>) -> RunResult {
    RunResult {
        run_name: name.to_string(),
        contacts,
        stats: RunStats {
            pages_processed: 2,
            pages_skipped: 1,
            fetch_errors: 1,
        },
        cancelled: false,
    }
}

#[tokio::test]
async fn save_and_get_run() {
    let repo = RunRepository::new(setup_test_db().await);

    let saved = run(
        "weekly",
        vec![
            contact("ana@acme.es", "https://acme.es/"),
            contact("luis@acme.es", "https://acme.es/team"),
        ],
    );
    let id = repo.save(&saved).await.unwrap();
    assert!(id > 0);

    let stored = repo.get(id).await.unwrap().expect("Should find the run");
    assert_eq!(stored.id, id);
    assert_eq!(stored.name, "weekly");
    assert_eq!(stored.contacts, saved.contacts);
    assert_eq!(stored.stats, saved.stats);
    assert!(!stored.cancelled);
}

#[tokio::test]
async fn get_missing_run_returns_none() {
    let repo = RunRepository::new(setup_test_db().await);
    assert!(repo.get(42).await.unwrap().is_none());
}

#[tokio::test]
async fn list_returns_newest_first() {
    let repo = RunRepository::new(setup_test_db().await);

    let first = repo.save(&run("first", vec![])).await.unwrap();
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    let second = repo.save(&run("second", vec![])).await.unwrap();

    let runs = repo.list().await.unwrap();
    let ids: Vec<_> = runs.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn update_replaces_name_and_contacts() {
    let repo = RunRepository::new(setup_test_db().await);
    let id = repo
        .save(&run("draft", vec![contact("old@acme.es", "https://acme.es/")]))
        .await
        .unwrap();

    let edited = vec![contact("new@acme.es", "https://acme.es/contact")];
    assert!(repo.update(id, "final", &edited).await.unwrap());

    let stored = repo.get(id).await.unwrap().unwrap();
    assert_eq!(stored.name, "final");
    assert_eq!(stored.contacts, edited);
    assert_eq!(stored.stats.pages_processed, 2);

    assert!(!repo.update(id + 100, "ghost", &edited).await.unwrap());
}

#[tokio::test]
async fn delete_removes_run() {
    let repo = RunRepository::new(setup_test_db().await);
    let id = repo.save(&run("temp", vec![])).await.unwrap();

    assert!(repo.delete(id).await.unwrap());
    assert!(repo.get(id).await.unwrap().is_none());
    assert!(!repo.delete(id).await.unwrap());
}

#[tokio::test]
async fn repository_works_as_run_sink() {
    let repo = RunRepository::new(setup_test_db().await);
    let mut cancelled = run("partial", vec![contact("a@a.es", "https://a.es/")]);
    cancelled.cancelled = true;

    let id = RunSink::save(&repo, &cancelled).await.unwrap().unwrap();
    let stored = repo.get(id).await.unwrap().unwrap();
    assert!(stored.cancelled);
    assert_eq!(stored.contacts.len(), 1);
}

#[tokio::test]
async fn health_check_succeeds() {
    let repo = RunRepository::new(setup_test_db().await);
    repo.health_check().await.unwrap();
}
