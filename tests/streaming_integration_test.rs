mod common;

use assert_matches::assert_matches;
use std::sync::Arc;
use tempfile::tempdir;

use common::{daily_series, spawn_receiver, two_bar_ema_series, wait_for_latest};
use snapshot_streamer::config::ExportConfig;
use snapshot_streamer::domain_types::InstrumentIdentity;
use snapshot_streamer::export::{ExportOrchestrator, ExportStatus, StepOutcome};
use snapshot_streamer::series::InMemorySeries;
use snapshot_streamer::storage::{FileSnapshotSink, SinkReceipt};
use snapshot_streamer::transport::{
    ConnectionState, SendOutcome, SnapshotTransport, TransportError, WebSocketTransport,
};

#[tokio::test]
async fn test_transport_delivers_single_text_message() {
    let dir = tempdir().unwrap();
    let (receiver, addr) = spawn_receiver(dir.path()).await;
    let mut transport = WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap();

    let payload = r#"{"2024-01-02": {"Close": 1.5}}"#;
    let outcome = transport.send(payload).await.unwrap();

    assert_eq!(outcome, SendOutcome::Sent { bytes: payload.len() });
    assert_eq!(transport.state(), ConnectionState::Connected);
    let stats = transport.stats();
    assert_eq!(stats.connect_attempts, 1);
    assert_eq!(stats.successful_connects, 1);
    assert_eq!(stats.messages_sent, 1);
    assert_eq!(stats.bytes_sent, payload.len() as u64);

    let latest = wait_for_latest(&receiver).await.expect("接收端未收到快照");
    assert_eq!(latest["2024-01-02"]["Close"], 1.5);

    transport.close().await.unwrap();
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_connected_transport_reuses_connection() {
    let dir = tempdir().unwrap();
    let (_receiver, addr) = spawn_receiver(dir.path()).await;
    let mut transport = WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap();

    transport.connect().await.unwrap();
    transport.send("{}").await.unwrap();
    transport.send("{\"a\": 1}").await.unwrap();

    assert_eq!(transport.stats().connect_attempts, 1);
    assert_eq!(transport.stats().messages_sent, 2);
}

#[tokio::test]
async fn test_blank_payload_never_connects() {
    let dir = tempdir().unwrap();
    let (receiver, addr) = spawn_receiver(dir.path()).await;
    let mut transport = WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap();

    assert_eq!(transport.send("   ").await.unwrap(), SendOutcome::Skipped);
    assert_eq!(transport.stats().connect_attempts, 0);
    assert!(receiver.last_update().is_none());
}

#[tokio::test]
async fn test_unreachable_endpoint_single_attempt() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut transport = WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap();
    assert_matches!(transport.send("{}").await, Err(TransportError::Connect(_)));
    assert_eq!(transport.stats().connect_attempts, 1);
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_export_cycle_end_to_end() {
    let receiver_dir = tempdir().unwrap();
    let sink_dir = tempdir().unwrap();
    let (receiver, addr) = spawn_receiver(receiver_dir.path()).await;

    let transport = WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap();
    let orchestrator = ExportOrchestrator::new(
        ExportConfig::immediate(),
        Arc::new(FileSnapshotSink::new(sink_dir.path())),
        Box::new(transport),
    );

    let report = orchestrator.run_once(&two_bar_ema_series()).await;
    assert_eq!(report.status, ExportStatus::Completed);
    assert_eq!(report.bars, 2);

    let written = sink_dir.path().join("ES_AllBars.json");
    assert_matches!(&report.sink, StepOutcome::Done(SinkReceipt { location, .. }) if location == &written.display().to_string());
    let document = std::fs::read_to_string(&written).unwrap();
    assert_eq!(document.len(), report.document_bytes);

    let latest = wait_for_latest(&receiver).await.expect("接收端未收到快照");
    assert_eq!(latest, serde_json::from_str::<serde_json::Value>(&document).unwrap());
    assert_eq!(latest["2024-01-02"]["Panels"]["Panel 2"]["EMA"], serde_json::Value::Null);
    assert_eq!(latest["2024-01-03"]["Panels"]["Panel 2"]["EMA"], 2.1);

    // 同一協調器不會再次匯出
    let again = orchestrator.run_once(&daily_series(3)).await;
    assert_eq!(again.status, ExportStatus::AlreadyRun);
    assert_eq!(orchestrator.transport_stats().await.messages_sent, 1);

    orchestrator.shutdown().await;
}

#[tokio::test]
async fn test_empty_series_sends_empty_document_only() {
    let receiver_dir = tempdir().unwrap();
    let sink_dir = tempdir().unwrap();
    let (receiver, addr) = spawn_receiver(receiver_dir.path()).await;

    let orchestrator = ExportOrchestrator::new(
        ExportConfig::immediate(),
        Arc::new(FileSnapshotSink::new(sink_dir.path())),
        Box::new(WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap()),
    );
    let series = InMemorySeries::new(InstrumentIdentity::new("ES 03-24", "ES"), Vec::new());

    let report = orchestrator.run_once(&series).await;

    assert_eq!(report.status, ExportStatus::Completed);
    assert_eq!(report.sink, StepOutcome::Skipped);
    assert_eq!(report.transport, StepOutcome::Done(SendOutcome::Sent { bytes: 2 }));
    assert!(!sink_dir.path().join("ES_AllBars.json").exists());

    let latest = wait_for_latest(&receiver).await.expect("接收端未收到快照");
    assert_eq!(latest, serde_json::json!({}));
}

#[tokio::test]
async fn test_unreachable_receiver_still_writes_file() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let sink_dir = tempdir().unwrap();

    let orchestrator = ExportOrchestrator::new(
        ExportConfig::immediate(),
        Arc::new(FileSnapshotSink::new(sink_dir.path())),
        Box::new(WebSocketTransport::new(&format!("ws://{}/data", addr)).unwrap()),
    )
    .with_file_suffix("_Snapshot.json");

    let report = orchestrator.run_once(&daily_series(4)).await;

    assert_eq!(report.status, ExportStatus::Degraded);
    assert_matches!(report.transport, StepOutcome::Failed(_));
    assert!(sink_dir.path().join("NYMEX_CL_Snapshot.json").exists());
    assert_eq!(orchestrator.transport_stats().await.connect_attempts, 1);
}
