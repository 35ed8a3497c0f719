use beacon_rs_core::{
    ConnectAttempt, ConnectionManager, ConnectionOptions, ConnectionState, Connector,
    DeliveryEvent, DeliveryReceiver, ErrorKind, Payload,
};
use beacon_rs_test_utils::{MockFrame, MockOpen, MockTransport};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn options(timeout_ms: u64) -> ConnectionOptions {
    ConnectionOptions {
        connect_timeout: Duration::from_millis(timeout_ms),
        buffer: 8,
    }
}

fn manager(transport: &MockTransport, timeout_ms: u64) -> ConnectionManager {
    ConnectionManager::new(Arc::new(transport.clone()), options(timeout_ms))
}

fn started(attempt: ConnectAttempt) -> DeliveryReceiver {
    match attempt {
        ConnectAttempt::Started(receiver) => receiver,
        ConnectAttempt::InProgress => panic!("expected a fresh attempt"),
    }
}

async fn next(receiver: &mut DeliveryReceiver) -> DeliveryEvent {
    tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("event within deadline")
        .expect("channel open")
}

#[tokio::test]
async fn delivers_connected_then_payloads_in_order() {
    let transport = MockTransport::new([MockOpen::Accept {
        frames: vec![
            MockFrame::Payload("alpha".to_string()),
            MockFrame::Payload("beta".to_string()),
            MockFrame::Payload("gamma".to_string()),
        ],
        hold_open: false,
    }]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());

    assert_eq!(next(&mut receiver).await, DeliveryEvent::Connected);
    for (sequence, body) in [(1, "alpha"), (2, "beta"), (3, "gamma")] {
        assert_eq!(
            next(&mut receiver).await,
            DeliveryEvent::DataReceived(Payload::new(sequence, body))
        );
    }
    assert_eq!(
        next(&mut receiver).await,
        DeliveryEvent::error(ErrorKind::Unknown, "connection closed by server")
    );
    assert_eq!(
        manager.state(),
        ConnectionState::Failed(ErrorKind::Unknown)
    );
}

#[tokio::test]
async fn state_is_established_while_streaming() {
    let transport = MockTransport::new([MockOpen::streaming(&["one"])]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());

    assert_eq!(next(&mut receiver).await, DeliveryEvent::Connected);
    assert_eq!(manager.state(), ConnectionState::Established);
    assert_eq!(
        next(&mut receiver).await,
        DeliveryEvent::DataReceived(Payload::new(1, "one"))
    );
}

#[tokio::test]
async fn handshake_timeout_is_reported_as_connection_timeout() {
    let transport = MockTransport::new([MockOpen::Hang]);
    let mut manager = manager(&transport, 50);
    let mut receiver = started(manager.connect());

    match next(&mut receiver).await {
        DeliveryEvent::Error { kind, detail } => {
            assert_eq!(kind, ErrorKind::ConnectionTimeout);
            assert!(detail.contains("50ms"), "detail was {detail}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(
        manager.state(),
        ConnectionState::Failed(ErrorKind::ConnectionTimeout)
    );
}

#[tokio::test]
async fn rejected_handshake_is_unknown() {
    let transport = MockTransport::new([MockOpen::Reject("403 Forbidden".to_string())]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());

    match next(&mut receiver).await {
        DeliveryEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::Unknown),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn invalid_endpoint_is_fatal() {
    let transport = MockTransport::new([MockOpen::InvalidEndpoint]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());

    match next(&mut receiver).await {
        DeliveryEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::Fatal),
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(manager.state(), ConnectionState::Failed(ErrorKind::Fatal));
}

#[tokio::test]
async fn socket_timeout_after_connect_is_connection_timeout() {
    let transport = MockTransport::new([MockOpen::Accept {
        frames: vec![
            MockFrame::Payload("first".to_string()),
            MockFrame::Fail(std::io::ErrorKind::TimedOut),
        ],
        hold_open: false,
    }]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());

    assert_eq!(next(&mut receiver).await, DeliveryEvent::Connected);
    assert_eq!(
        next(&mut receiver).await,
        DeliveryEvent::DataReceived(Payload::new(1, "first"))
    );
    match next(&mut receiver).await {
        DeliveryEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::ConnectionTimeout),
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn retry_while_connecting_does_not_start_second_attempt() {
    let transport = MockTransport::new([MockOpen::Hang]);
    let mut manager = manager(&transport, 5_000);
    let _receiver = started(manager.connect());

    assert_eq!(manager.state(), ConnectionState::Connecting);
    assert!(matches!(manager.retry(), ConnectAttempt::InProgress));
    assert!(matches!(manager.connect(), ConnectAttempt::InProgress));

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.open_count(), 1);
}

#[tokio::test]
async fn retry_after_failure_starts_fresh_attempt() {
    let transport = MockTransport::new([MockOpen::Hang, MockOpen::streaming(&["hello"])]);
    let mut manager = manager(&transport, 50);
    let mut first = started(manager.connect());
    match next(&mut first).await {
        DeliveryEvent::Error { kind, .. } => assert_eq!(kind, ErrorKind::ConnectionTimeout),
        other => panic!("unexpected event {other:?}"),
    }

    let mut second = started(manager.retry());
    assert_eq!(next(&mut second).await, DeliveryEvent::Connected);
    assert_eq!(
        next(&mut second).await,
        DeliveryEvent::DataReceived(Payload::new(1, "hello"))
    );
    assert_eq!(transport.open_count(), 2);
    // The failed attempt's channel is finished once its task is gone.
    assert_eq!(first.recv().await, None);
}

#[tokio::test]
async fn slow_open_is_reported_as_connection_timeout() {
    let transport = MockTransport::new([MockOpen::streaming(&["late"])])
        .with_open_delay(Duration::from_millis(300));
    let mut manager = manager(&transport, 50);
    let mut receiver = started(manager.connect());

    match next(&mut receiver).await {
        DeliveryEvent::Error { kind, detail } => {
            assert_eq!(kind, ErrorKind::ConnectionTimeout);
            assert!(detail.contains("50ms"), "{detail}");
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(transport.open_count(), 1);
    assert_eq!(
        manager.state(),
        ConnectionState::Failed(ErrorKind::ConnectionTimeout)
    );
    assert_eq!(receiver.recv().await, None);
}

#[tokio::test]
async fn retry_while_established_replaces_attempt() {
    let transport = MockTransport::new([MockOpen::streaming(&["a"]), MockOpen::Hang]);
    let mut manager = manager(&transport, 2_000);
    let mut first = started(manager.connect());
    assert_eq!(next(&mut first).await, DeliveryEvent::Connected);
    assert_eq!(
        next(&mut first).await,
        DeliveryEvent::DataReceived(Payload::new(1, "a"))
    );
    assert_eq!(manager.state(), ConnectionState::Established);

    let mut second = started(manager.retry());
    let closed = tokio::time::timeout(Duration::from_secs(2), first.recv())
        .await
        .expect("old channel closes");
    assert_eq!(closed, None);

    tokio::time::timeout(Duration::from_secs(2), async {
        while transport.open_count() < 2 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("second open");
    assert_eq!(transport.open_count(), 2);

    // Only the hanging second attempt decides the state now.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(manager.state(), ConnectionState::Connecting);
    let pending = tokio::time::timeout(Duration::from_millis(20), second.recv()).await;
    assert!(pending.is_err(), "second attempt has not connected");
}

#[tokio::test]
async fn shutdown_stops_attempt_and_returns_to_idle() {
    let transport = MockTransport::new([MockOpen::streaming(&[])]);
    let mut manager = manager(&transport, 500);
    let mut receiver = started(manager.connect());
    assert_eq!(next(&mut receiver).await, DeliveryEvent::Connected);

    manager.shutdown();
    assert_eq!(manager.state(), ConnectionState::Idle);
    let closed = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("channel closes after shutdown");
    assert_eq!(closed, None);
}

#[tokio::test]
async fn slow_consumer_loses_nothing() {
    let bodies: Vec<String> = (0..32).map(|n| format!("event-{n}")).collect();
    let transport = MockTransport::new([MockOpen::Accept {
        frames: bodies.iter().cloned().map(MockFrame::Payload).collect(),
        hold_open: true,
    }]);
    // Buffer smaller than the burst forces the producer to wait.
    let mut manager = ConnectionManager::new(
        Arc::new(transport.clone()),
        ConnectionOptions {
            connect_timeout: Duration::from_millis(500),
            buffer: 2,
        },
    );
    let mut receiver = started(manager.connect());
    assert_eq!(next(&mut receiver).await, DeliveryEvent::Connected);

    tokio::time::sleep(Duration::from_millis(20)).await;
    let mut received = Vec::new();
    for _ in 0..bodies.len() {
        match next(&mut receiver).await {
            DeliveryEvent::DataReceived(payload) => received.push(payload.body),
            other => panic!("unexpected event {other:?}"),
        }
    }
    assert_eq!(received, bodies);
}
