use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;

use crate::test_utils::enable_logger;
use crate::test_utils::InMemoryCoordination;
use crate::test_utils::RecordingCallback;
use crate::transport::ConnectionState;
use crate::AppConfig;
use crate::ConnectionConfig;
use crate::Domain;
use crate::Error;
use crate::SessionError;
use crate::Settings;
use crate::WatchEngine;

const MONITOR: &str = "/disconf/app_env_1.0.0/file/redis.properties";

fn settings() -> Settings {
    Settings {
        connection: ConnectionConfig {
            hosts: "inmem:0".to_string(),
            ..Default::default()
        },
        app: AppConfig {
            app: "app".to_string(),
            env: "env".to_string(),
            version: "1.0.0".to_string(),
            debug: false,
        },
        watch: Default::default(),
    }
}

async fn setup() -> (
    Arc<InMemoryCoordination>,
    Arc<RecordingCallback>,
    WatchEngine,
) {
    enable_logger();
    let (transport, events) = InMemoryCoordination::new(256);
    let callback = RecordingCallback::new();
    let engine = WatchEngine::builder(settings())
        .transport(transport.clone(), events)
        .callback(callback.clone())
        .build()
        .unwrap();
    engine.start().await.unwrap();
    (transport, callback, engine)
}

#[tokio::test]
async fn test_builder_requires_all_collaborators() {
    let (transport, events) = InMemoryCoordination::new(8);

    let err = WatchEngine::builder(settings())
        .transport(transport, events)
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Fatal(_)));
}

#[tokio::test]
async fn test_builder_validates_settings() {
    let (transport, events) = InMemoryCoordination::new(8);
    let mut bad = settings();
    bad.connection.hosts = String::new();

    let err = WatchEngine::builder(bad)
        .transport(transport, events)
        .callback(RecordingCallback::new())
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test]
async fn test_start_is_idempotent() {
    let (_transport, _callback, engine) = setup().await;
    engine.start().await.unwrap();
    engine.start().await.unwrap();
    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_update_cycle_end_to_end() {
    let (transport, callback, engine) = setup().await;

    let watcher = engine.watch("redis.properties", Domain::File).await.unwrap();
    assert_eq!(watcher.monitor_path(), MONITOR);
    assert_eq!(transport.arm_count(MONITOR), 1);

    // a config push from another client
    transport.server_write(MONITOR, b"maxmemory 2gb").await;
    sleep(Duration::from_millis(300)).await;

    assert_eq!(
        callback.count_for(Domain::File, "redis.properties").await,
        1
    );
    // the watcher re-armed itself for the next change
    assert_eq!(transport.arm_count(MONITOR), 2);
    assert!(transport.watch_armed(MONITOR));

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_reconnect_sweeps_all_registered_keys() {
    let (transport, callback, engine) = setup().await;
    engine.watch("redis.properties", Domain::File).await.unwrap();
    engine.watch("timeout", Domain::Item).await.unwrap();
    assert_eq!(engine.registry().len(), 2);

    transport.emit_connection(ConnectionState::Disconnected).await;
    transport.emit_connection(ConnectionState::Connected).await;
    sleep(Duration::from_millis(300)).await;

    assert_eq!(
        callback.count_for(Domain::File, "redis.properties").await,
        1
    );
    assert_eq!(callback.count_for(Domain::Item, "timeout").await, 1);

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_shutdown_fails_operations_fast_and_drops_presence() {
    let (transport, _callback, engine) = setup().await;
    engine.watch("redis.properties", Domain::File).await.unwrap();

    // one ephemeral presence node exists under the monitor path
    assert_eq!(transport.children_of(MONITOR).len(), 1);

    engine.shutdown().await.unwrap();

    // the session owned the ephemeral; the service removed it
    assert!(transport.children_of(MONITOR).is_empty());

    let err = engine.watch("timeout", Domain::Item).await.unwrap_err();
    assert!(matches!(err, Error::Session(SessionError::NotConnected)));
}
