use beacon_rs_config::UiConfig;
use beacon_rs_core::{DeliveryEvent, ErrorKind, Payload};
use beacon_rs_test_utils::ScriptedConnector;
use beacon_rs_tui::{App, AppEvent, ApplicationStage, Bridge, Control, ErrorState};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use std::time::Duration;
use tokio::sync::mpsc;

struct Harness {
    bridge: Bridge<ScriptedConnector>,
    connector: ScriptedConnector,
    input: mpsc::Receiver<AppEvent>,
    _input_tx: mpsc::Sender<AppEvent>,
}

impl Harness {
    fn start() -> Self {
        let connector = ScriptedConnector::new(64);
        let mut bridge = Bridge::new(App::new(&UiConfig::default()), connector.clone());
        assert_eq!(bridge.handle(AppEvent::Init), Control::Continue);
        let (input_tx, input) = mpsc::channel(8);
        Self {
            bridge,
            connector,
            input,
            _input_tx: input_tx,
        }
    }

    async fn push(&self, event: DeliveryEvent) {
        self.connector
            .latest_sender()
            .expect("connect handed out a channel")
            .deliver(event)
            .await
            .expect("bridge holds the receiver");
    }

    /// Take one event off the loop and apply it.
    async fn step(&mut self) -> Control {
        let event = tokio::time::timeout(
            Duration::from_secs(2),
            self.bridge.next_event(&mut self.input),
        )
        .await
        .expect("event within deadline")
        .expect("input channel open");
        self.bridge.handle(event)
    }

    fn key(&mut self, ch: char) -> Control {
        self.bridge.handle(AppEvent::Input(KeyEvent::new(
            KeyCode::Char(ch),
            KeyModifiers::NONE,
        )))
    }

    fn bodies(&self) -> Vec<String> {
        self.bridge
            .app()
            .history
            .iter()
            .map(|payload| payload.body.clone())
            .collect()
    }
}

#[tokio::test]
async fn applies_events_in_push_order() {
    let mut harness = Harness::start();
    assert_eq!(harness.connector.connect_calls(), 1);

    harness.push(DeliveryEvent::Connected).await;
    assert_eq!(harness.step().await, Control::Continue);
    assert_eq!(harness.bridge.app().stage, ApplicationStage::Ready);

    let expected: Vec<String> = (1..=5).map(|n| format!("payload-{n}")).collect();
    for (index, body) in expected.iter().enumerate() {
        harness
            .push(DeliveryEvent::DataReceived(Payload::new(
                index as u64 + 1,
                body.as_str(),
            )))
            .await;
        harness.step().await;
    }
    assert_eq!(harness.bodies(), expected);
}

#[tokio::test]
async fn events_buffered_before_first_drain_are_all_applied() {
    let mut harness = Harness::start();
    harness.push(DeliveryEvent::Connected).await;
    let expected: Vec<String> = (1..=20).map(|n| format!("burst-{n}")).collect();
    for (index, body) in expected.iter().enumerate() {
        harness
            .push(DeliveryEvent::DataReceived(Payload::new(
                index as u64 + 1,
                body.as_str(),
            )))
            .await;
    }

    for _ in 0..=expected.len() {
        harness.step().await;
    }
    assert_eq!(harness.bodies(), expected);
    assert_eq!(harness.bridge.app().stage, ApplicationStage::Ready);
}

#[tokio::test]
async fn listener_is_parked_until_event_is_applied() {
    let mut harness = Harness::start();
    assert!(harness.bridge.is_listening());
    harness.push(DeliveryEvent::Connected).await;
    harness.push(DeliveryEvent::DataReceived(Payload::new(1, "x"))).await;

    let first = harness
        .bridge
        .next_event(&mut harness.input)
        .await
        .expect("event");
    assert_eq!(first, AppEvent::Delivery(DeliveryEvent::Connected));
    assert!(!harness.bridge.is_listening());

    let blocked = tokio::time::timeout(
        Duration::from_millis(20),
        harness.bridge.next_event(&mut harness.input),
    )
    .await;
    assert!(blocked.is_err(), "second listen must wait for the first");

    harness.bridge.handle(first);
    assert!(harness.bridge.is_listening());
    harness.step().await;
    assert_eq!(harness.bodies(), vec!["x".to_string()]);
}

#[tokio::test]
async fn ignored_events_still_rearm() {
    let mut harness = Harness::start();
    // Data before Connected is ignored by the transition.
    harness.push(DeliveryEvent::DataReceived(Payload::new(1, "early"))).await;
    harness.push(DeliveryEvent::Connected).await;
    harness.push(DeliveryEvent::DataReceived(Payload::new(2, "late"))).await;

    for _ in 0..3 {
        harness.step().await;
    }
    assert_eq!(harness.bodies(), vec!["late".to_string()]);
}

#[tokio::test]
async fn timeout_then_yes_retries_exactly_once() {
    let mut harness = Harness::start();
    harness
        .push(DeliveryEvent::error(ErrorKind::ConnectionTimeout, "no reply"))
        .await;
    harness.step().await;

    let app = harness.bridge.app();
    assert_eq!(app.error_state, ErrorState::ConnectionTimeout);
    assert_eq!(app.stage, ApplicationStage::ConnectingToServer);
    assert_eq!(harness.connector.total_attempts(), 1);

    assert_eq!(harness.key('y'), Control::Continue);
    assert_eq!(harness.connector.total_attempts(), 2);
    assert_eq!(harness.connector.retry_calls(), 1);
    assert_eq!(harness.bridge.app().error_state, ErrorState::NoError);

    // The retry's channel is the one being listened on now.
    harness.push(DeliveryEvent::Connected).await;
    harness.step().await;
    assert_eq!(harness.bridge.app().stage, ApplicationStage::Ready);
    assert_eq!(harness.connector.shutdown_calls(), 0);
}

#[tokio::test]
async fn timeout_then_no_shuts_down_once() {
    let mut harness = Harness::start();
    harness
        .push(DeliveryEvent::error(ErrorKind::ConnectionTimeout, "no reply"))
        .await;
    harness.step().await;

    assert_eq!(harness.key('n'), Control::Quit);
    assert_eq!(harness.connector.shutdown_calls(), 1);
    assert_eq!(harness.connector.total_attempts(), 1);
}

#[tokio::test]
async fn fatal_shuts_down_without_prompt() {
    let mut harness = Harness::start();
    harness.push(DeliveryEvent::Connected).await;
    harness.step().await;
    harness
        .push(DeliveryEvent::error(ErrorKind::Fatal, "unsupported scheme"))
        .await;

    assert_eq!(harness.step().await, Control::Quit);
    assert_eq!(harness.connector.shutdown_calls(), 1);
    let app = harness.bridge.app();
    assert_eq!(app.error_state, ErrorState::Fatal);
    assert!(!app.retry_prompt_active());
}

#[tokio::test]
async fn retry_while_in_flight_keeps_current_channel() {
    let mut harness = Harness::start();
    harness
        .push(DeliveryEvent::error(ErrorKind::ConnectionTimeout, "no reply"))
        .await;
    harness.step().await;

    harness.connector.set_in_progress(true);
    harness.key('y');
    assert_eq!(harness.connector.retry_calls(), 1);
    assert_eq!(harness.bridge.app().stage, ApplicationStage::ConnectingToServer);
}

#[tokio::test]
async fn closed_channel_idles_listener_until_next_attempt() {
    let mut harness = Harness::start();
    harness
        .push(DeliveryEvent::error(ErrorKind::Unknown, "connection closed by server"))
        .await;
    harness.step().await;
    assert_eq!(harness.bridge.app().error_state, ErrorState::Unknown);
    assert_eq!(
        harness.bridge.app().system_pane,
        vec!["Connection error: connection closed by server".to_string()]
    );

    harness.connector.close_channels();
    let event = harness
        .bridge
        .next_event(&mut harness.input)
        .await
        .expect("event");
    assert_eq!(event, AppEvent::DeliveryClosed);
    assert_eq!(harness.bridge.handle(event), Control::Continue);
    assert!(!harness.bridge.is_listening());
}

#[tokio::test]
async fn dump_includes_connection_state() {
    let mut harness = Harness::start();
    let control = harness.bridge.handle(AppEvent::Input(KeyEvent::new(
        KeyCode::Char('d'),
        KeyModifiers::CONTROL,
    )));
    assert_eq!(control, Control::Continue);
    let dump = harness
        .bridge
        .app()
        .alt_window
        .contents
        .last()
        .cloned()
        .expect("dump written");
    let value: serde_json::Value = serde_json::from_str(&dump).expect("dump is json");
    assert_eq!(value["stage"], "connecting_to_server");
    assert_eq!(value["connection"]["state"], "idle");
}
