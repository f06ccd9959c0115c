//! End-to-end sender tests against the loopback data layer.

use std::sync::Arc;
use std::time::Duration;

use sunshine_core::{SenderConfig, SyncError, TemperatureUnit};
use sunshine_sender::{SendOutcome, SendRequest, WeatherSender};
use sunshine_sync::{decode_weather, ConnectionState, LoopbackNetwork, WEATHER_PATH};

fn metric() -> SenderConfig {
    SenderConfig {
        temperature_unit: TemperatureUnit::Metric,
    }
}

#[tokio::test]
async fn test_publishes_formatted_record() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    let sender = WeatherSender::new(Arc::new(phone), &metric());

    assert_eq!(sender.send(25.0, 14.0, 200).await, SendOutcome::Published);

    let item = network.item(WEATHER_PATH).unwrap();
    let map = item.data_map().unwrap();
    assert_eq!(map.get_string("high"), Some("25°"));
    assert_eq!(map.get_string("low"), Some("14°"));
    assert_eq!(map.get_int("weatherId"), Some(200));
    assert_eq!(map.len(), 3);

    sender.release().await;
}

#[tokio::test]
async fn test_fields_match_inputs_for_many_triples() {
    let network = LoopbackNetwork::new();
    let sender = WeatherSender::new(Arc::new(network.endpoint("phone")), &metric());

    let triples = [
        (31.6, 20.2, 800),
        (-1.0, -9.5, 601),
        (12.0, 12.0, 999),
        (0.0, -0.3, 741),
    ];
    for (high, low, code) in triples {
        assert_eq!(sender.send(high, low, code).await, SendOutcome::Published);
        let summary = decode_weather(&network.item(WEATHER_PATH).unwrap()).unwrap();
        assert_eq!(summary, sender.summarize(high, low, code));
        assert_eq!(summary.condition_code, code);
    }

    sender.release().await;
}

#[tokio::test]
async fn test_imperial_unit_converts_before_formatting() {
    let network = LoopbackNetwork::new();
    let config = SenderConfig {
        temperature_unit: TemperatureUnit::Imperial,
    };
    let sender = WeatherSender::new(Arc::new(network.endpoint("phone")), &config);

    sender.send(25.0, 0.0, 800).await;

    let summary = decode_weather(&network.item(WEATHER_PATH).unwrap()).unwrap();
    assert_eq!(summary.high, "77°");
    assert_eq!(summary.low, "32°");
    sender.release().await;
}

#[tokio::test]
async fn test_repeated_sends_share_one_connection() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    let sender = WeatherSender::new(Arc::new(phone.clone()), &metric());

    sender.send(20.0, 10.0, 800).await;
    sender.send(21.0, 11.0, 801).await;
    sender.send(22.0, 12.0, 802).await;

    assert_eq!(phone.connect_calls(), 1);
    assert_eq!(phone.put_calls(), 3);
    sender.release().await;
    assert_eq!(phone.disconnect_calls(), 1);
}

#[tokio::test]
async fn test_concurrent_dispatches_do_not_open_extra_connections() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    let sender = Arc::new(WeatherSender::new(Arc::new(phone.clone()), &metric()));

    let first = sender.dispatch(20.0, 10.0, 800);
    let second = sender.dispatch(21.0, 11.0, 500);

    assert_eq!(first.await.unwrap(), SendOutcome::Published);
    assert_eq!(second.await.unwrap(), SendOutcome::Published);
    assert_eq!(phone.connect_calls(), 1);
    sender.release().await;
}

#[tokio::test]
async fn test_connection_failure_is_swallowed() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    phone.refuse_connections("no paired node");
    let sender = WeatherSender::new(Arc::new(phone.clone()), &metric());

    assert_eq!(
        sender.send(25.0, 14.0, 200).await,
        SendOutcome::ConnectFailed(SyncError::ConnectionFailed("no paired node".into()))
    );
    assert!(network.item(WEATHER_PATH).is_none());
    assert_eq!(phone.put_calls(), 0);
}

#[tokio::test]
async fn test_publish_failure_is_swallowed() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    phone.fail_puts("quota exceeded");
    let sender = WeatherSender::new(Arc::new(phone), &metric());

    assert_eq!(
        sender.send(25.0, 14.0, 200).await,
        SendOutcome::PublishFailed(SyncError::PublishFailed("quota exceeded".into()))
    );
    assert!(network.item(WEATHER_PATH).is_none());
    assert_eq!(sender.connection().state(), ConnectionState::Connected);
    sender.release().await;
}

#[tokio::test(start_paused = true)]
async fn test_hanging_publish_never_completes() {
    let network = LoopbackNetwork::new();
    let phone = network.endpoint("phone");
    phone.hang_puts();
    let sender = Arc::new(WeatherSender::new(Arc::new(phone), &metric()));

    let handle = sender.dispatch(25.0, 14.0, 200);
    tokio::time::sleep(Duration::from_secs(3600)).await;
    assert!(!handle.is_finished());
    handle.abort();
}

#[tokio::test]
async fn test_handle_request_from_json_payload() {
    let network = LoopbackNetwork::new();
    let sender = WeatherSender::new(Arc::new(network.endpoint("phone")), &metric());

    let request: SendRequest =
        serde_json::from_str(r#"{"high": 18.4, "low": 9.6, "weatherId": 511}"#).unwrap();
    assert_eq!(sender.handle_request(request).await, SendOutcome::Published);

    let summary = decode_weather(&network.item(WEATHER_PATH).unwrap()).unwrap();
    assert_eq!((summary.high.as_str(), summary.low.as_str()), ("18°", "10°"));
    sender.release().await;
}
