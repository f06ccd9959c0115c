//! Connection lifecycle tests against the loopback transport.

use std::sync::Arc;
use std::time::Duration;

use sunshine_sync::{ConnectionManager, ConnectionState, LoopbackNetwork, SyncError};

#[tokio::test]
async fn test_connect_if_absent_connects_once() {
    let transport = LoopbackNetwork::new().endpoint("phone");
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    assert!(manager.connect_if_absent());
    assert!(!manager.connect_if_absent());
    assert_eq!(manager.wait_settled().await, ConnectionState::Connected);

    assert!(!manager.connect_if_absent());
    assert_eq!(transport.connect_calls(), 1);

    manager.release().await;
}

#[tokio::test]
async fn test_refused_connection_settles_failed() {
    let transport = LoopbackNetwork::new().endpoint("phone");
    transport.refuse_connections("peer unreachable");
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    let state = manager.ensure_connected().await;
    assert_eq!(
        state,
        ConnectionState::Failed(SyncError::ConnectionFailed("peer unreachable".into()))
    );

    // A failed attempt does not block the next one
    transport.heal();
    assert_eq!(manager.ensure_connected().await, ConnectionState::Connected);
    assert_eq!(transport.connect_calls(), 2);

    manager.release().await;
}

#[tokio::test]
async fn test_suspension_moves_to_disconnected() {
    let transport = LoopbackNetwork::new().endpoint("watch");
    let manager = ConnectionManager::new(Arc::new(transport.clone()));
    assert_eq!(manager.ensure_connected().await, ConnectionState::Connected);

    let mut states = manager.subscribe();
    transport.suspend(1);
    let state = states
        .wait_for(|s| *s == ConnectionState::Disconnected)
        .await
        .unwrap()
        .clone();
    assert_eq!(state, ConnectionState::Disconnected);

    // Nothing reconnects on its own
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(transport.connect_calls(), 1);
}

#[tokio::test]
async fn test_release_disconnects_exactly_once() {
    let transport = LoopbackNetwork::new().endpoint("watch");
    let manager = ConnectionManager::new(Arc::new(transport.clone()));
    manager.ensure_connected().await;

    assert!(manager.release().await);
    assert!(!manager.release().await);
    assert_eq!(transport.disconnect_calls(), 1);
    assert!(!transport.is_connected());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_release_abandons_in_flight_attempt() {
    let transport = LoopbackNetwork::new().endpoint("phone");
    transport.hang_connections();
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    assert!(manager.connect_if_absent());
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(manager.state(), ConnectionState::Connecting);

    assert!(manager.release().await);
    assert_eq!(manager.state(), ConnectionState::Disconnected);

    // A fresh attempt after release gets its own generation
    transport.heal();
    assert_eq!(manager.ensure_connected().await, ConnectionState::Connected);
    assert_eq!(transport.connect_calls(), 2);
    manager.release().await;
}

#[tokio::test(start_paused = true)]
async fn test_hanging_connect_never_settles() {
    let transport = LoopbackNetwork::new().endpoint("phone");
    transport.hang_connections();
    let manager = ConnectionManager::new(Arc::new(transport));

    let settled = tokio::time::timeout(Duration::from_secs(3600), manager.ensure_connected()).await;
    assert!(settled.is_err());
    assert_eq!(manager.state(), ConnectionState::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_release_closes_link_opened_after_abandon() {
    let transport = LoopbackNetwork::new().endpoint("watch");
    transport.delay_connections(Duration::from_millis(100));
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    assert!(manager.connect_if_absent());
    assert!(manager.release().await);
    assert_eq!(transport.disconnect_calls(), 1);

    // The abandoned connect resolves after release
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(transport.connect_calls(), 1);
    assert!(!transport.is_connected());
    assert_eq!(transport.disconnect_calls(), 2);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_late_abandoned_connect_keeps_newer_link() {
    let transport = LoopbackNetwork::new().endpoint("watch");
    transport.delay_connections(Duration::from_millis(100));
    let manager = ConnectionManager::new(Arc::new(transport.clone()));

    assert!(manager.connect_if_absent());
    manager.release().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Second attempt is still in flight when the first one lands
    assert!(manager.connect_if_absent());
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(manager.state(), ConnectionState::Connecting);
    assert_eq!(transport.disconnect_calls(), 1);

    assert_eq!(manager.wait_settled().await, ConnectionState::Connected);
    assert!(transport.is_connected());
    manager.release().await;
}
