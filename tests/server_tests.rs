//! HTTP trigger tests: API key checks, cycle results and error bodies.

mod common;

use common::{RecordingForum, cycle_time, header, setup_db, task_row};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use task_thread_sync::clock::{FixedClock, offset_from_minutes};
use task_thread_sync::config::ColumnLayout;
use task_thread_sync::db::Database;
use task_thread_sync::error::SyncError;
use task_thread_sync::format::MessageFormatter;
use task_thread_sync::server::{API_KEY_HEADER, CycleFactory, TriggerServer, start_server};
use task_thread_sync::snapshot::SnapshotBuilder;
use task_thread_sync::source::{GridSource, TaskSource};
use task_thread_sync::sync::{Orchestrator, ThreadSynchronizer};
use tokio::sync::oneshot;

const KEY: &str = "secret-key";

fn cycle_factory(db: Database, forum: Arc<RecordingForum>) -> CycleFactory {
    Arc::new(move || {
        let source: Arc<dyn TaskSource> =
            Arc::new(GridSource::new(db.clone(), ColumnLayout::default()));
        let builder = SnapshotBuilder::new(Arc::clone(&source))
            .with_clock(Arc::new(FixedClock(cycle_time())))
            .with_offset(offset_from_minutes(540));
        let synchronizer = ThreadSynchronizer::new(
            forum.clone(),
            Arc::clone(&source),
            MessageFormatter::new(1800, offset_from_minutes(540)),
        );
        Ok(Orchestrator::new(source, builder, synchronizer))
    })
}

fn failing_factory() -> CycleFactory {
    Arc::new(|| Err(SyncError::config("DISCORD_BOT_TOKEN")))
}

async fn serve(factory: CycleFactory, production: bool) -> (oneshot::Sender<()>, String) {
    let state = TriggerServer::new(KEY, production, factory);
    let (shutdown, addr) = start_server(state, SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("server should bind");
    (shutdown, format!("http://{}", addr))
}

fn sample_db() -> Database {
    setup_db(
        header(&[]),
        vec![task_row("P1", "Launch", "", "T1", "A", "2099-01-01", "completed")],
    )
}

#[tokio::test]
async fn sync_without_key_is_unauthorized() {
    let forum = Arc::new(RecordingForum::new());
    let (_shutdown, base) = serve(cycle_factory(sample_db(), forum.clone()), false).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/sync", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Unauthorized");
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn sync_with_wrong_key_is_unauthorized() {
    let forum = Arc::new(RecordingForum::new());
    let (_shutdown, base) = serve(cycle_factory(sample_db(), forum.clone()), false).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/sync", base))
        .header(API_KEY_HEADER, "not-the-key")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
    assert!(forum.calls().is_empty());
}

#[tokio::test]
async fn sync_with_key_runs_one_cycle() {
    let forum = Arc::new(RecordingForum::new());
    let (_shutdown, base) = serve(cycle_factory(sample_db(), forum.clone()), false).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/sync", base))
        .header(API_KEY_HEADER, KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "success");
    assert!(body["timestamp"].is_string());
    assert_eq!(body["result"]["success"], 1);
    assert_eq!(body["result"]["failed"], 0);
    assert_eq!(forum.creates().len(), 1);
}

#[tokio::test]
async fn cycle_error_reports_kind_and_detail_outside_production() {
    let (_shutdown, base) = serve(failing_factory(), false).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/sync", base))
        .header(API_KEY_HEADER, KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["code"], "CONFIGURATION");
    assert!(
        body["message"]
            .as_str()
            .unwrap()
            .contains("DISCORD_BOT_TOKEN")
    );
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn production_hides_error_detail() {
    let (_shutdown, base) = serve(failing_factory(), true).await;

    let resp = reqwest::Client::new()
        .post(format!("{}/api/sync", base))
        .header(API_KEY_HEADER, KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 500);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "CONFIGURATION");
    assert!(body.get("detail").is_none());
}

#[tokio::test]
async fn health_and_root_need_no_key() {
    let (_shutdown, base) = serve(failing_factory(), true).await;
    let client = reqwest::Client::new();

    let health = client
        .get(format!("{}/api/health", base))
        .send()
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    let body: Value = health.json().await.unwrap();
    assert_eq!(body["status"], "healthy");

    let root = client.get(format!("{}/", base)).send().await.unwrap();
    assert_eq!(root.status(), 200);
    let body: Value = root.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "task-thread-sync");
}

#[tokio::test]
async fn sync_only_accepts_post() {
    let (_shutdown, base) = serve(failing_factory(), true).await;

    let resp = reqwest::Client::new()
        .get(format!("{}/api/sync", base))
        .header(API_KEY_HEADER, KEY)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 405);
}
