//! Aggregator and zone transition behaviour through `ItsApi`.

mod common;

use std::sync::Arc;

use tokio_test::{assert_err, assert_ok};

use common::*;
use ktw_its::geo::Coordinate;
use ktw_its::{
    BroadcastPublisher, Entity, ItsApi, PositionChange, SourceGroup, ZoneEventKind,
};

const CAR: &str = "device_tracker.car";

// ---

fn create_test_api(fetcher: &Arc<StubFetcher>, clock: &Arc<ManualClock>) -> (ItsApi, BroadcastPublisher) {
    // ---
    let bus = BroadcastPublisher::new(16);
    let api = ItsApi::new(
        create_test_context(fetcher, clock),
        Arc::new(bus.clone()),
        vec![CAR.to_string()],
    );
    (api, bus)
}

fn moved(old: Option<(f64, f64)>, new: Option<(f64, f64)>) -> PositionChange {
    PositionChange {
        entity_id: CAR.to_string(),
        old: old.map(|(lat, lon)| Coordinate::new(lat, lon)),
        new: new.map(|(lat, lon)| Coordinate::new(lat, lon)),
    }
}

const INSIDE_A: (f64, f64) = (50.005, 19.005);
const INSIDE_B: (f64, f64) = (50.105, 19.105);
const OUTSIDE: (f64, f64) = (50.5, 19.5);

#[tokio::test]
async fn fetch_data_merges_disjoint_domains() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);

    let entities = assert_ok!(api.fetch_data().await);
    let count = |group: SourceGroup| entities.values().filter(|e| e.group() == group).count();

    assert_eq!(count(SourceGroup::Weather), 15);
    assert_eq!(count(SourceGroup::Traffic), 5);
    assert_eq!(count(SourceGroup::Camera), 4);
    assert_eq!(entities.len(), 24);
    assert!(matches!(entities["ktw_its_K1_0_image"], Entity::Image(_)));
    assert!(entities.values().all(|e| e.group() != SourceGroup::Parking));

    // Parking zones only feed the repository.
    assert_eq!(api.zones().read().await.len(), 2);
    assert_eq!(fetcher.calls(PARKING_URL), 1);
}

#[tokio::test]
async fn fetch_data_initial_failure_propagates() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    fetcher.fail(CAMERAS_URL);
    let (api, _bus) = create_test_api(&fetcher, &clock);

    assert_err!(api.fetch_data().await);
}

#[tokio::test]
async fn camera_failure_keeps_weather_and_traffic() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);
    let first = assert_ok!(api.fetch_data().await);

    clock.set(at(14, 0));
    script_all(&fetcher, at(13, 58));
    fetcher.fail(CAMERAS_URL);
    let second = assert_ok!(api.fetch_data().await);

    assert_eq!(second.len(), first.len());
    assert!(first.keys().all(|k| second.contains_key(k)));
    assert_eq!(fetcher.calls(CAMERAS_URL), 2);
    assert_eq!(fetcher.calls(WEATHER_URL), 2);
}

#[tokio::test]
async fn fetch_data_within_window_hits_every_cache() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);

    assert_ok!(api.fetch_data().await);
    clock.set(at(12, 2));
    assert_ok!(api.fetch_data().await);

    for url in [WEATHER_URL, TRAFFIC_URL, CAMERAS_URL, PARKING_URL] {
        assert_eq!(fetcher.calls(url), 1, "{} fetched twice", url);
    }
}

#[tokio::test]
async fn moving_between_zones_leaves_then_enters() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, bus) = create_test_api(&fetcher, &clock);
    let mut rx = bus.subscribe();
    assert_ok!(api.fetch_data().await);

    let events = assert_ok!(api.on_position_change(&moved(Some(INSIDE_A), Some(INSIDE_B))).await);
    let kinds: Vec<_> = events.iter().map(|e| (e.kind, e.zone_code.as_str())).collect();
    assert_eq!(
        kinds,
        vec![(ZoneEventKind::Leave, "A"), (ZoneEventKind::Enter, "B")]
    );
    assert!(events.iter().all(|e| e.occurred_at == at(12, 0)));

    let (first_type, _) = assert_ok!(rx.recv().await);
    let (second_type, _) = assert_ok!(rx.recv().await);
    assert_eq!(first_type, "parking_zone_leave");
    assert_eq!(second_type, "parking_zone_enter");
}

#[tokio::test]
async fn entering_from_outside_emits_enter_only() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);
    assert_ok!(api.fetch_data().await);

    let events = assert_ok!(api.on_position_change(&moved(Some(OUTSIDE), Some(INSIDE_A))).await);
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, ZoneEventKind::Enter);
    assert_eq!(events[0].zone_code, "A");

    let first_sighting = assert_ok!(api.on_position_change(&moved(None, Some(INSIDE_B))).await);
    assert_eq!(first_sighting.len(), 1);
    assert_eq!(first_sighting[0].zone_code, "B");
}

#[tokio::test]
async fn staying_in_a_zone_emits_nothing() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);
    assert_ok!(api.fetch_data().await);

    let within = assert_ok!(
        api.on_position_change(&moved(Some(INSIDE_A), Some((50.006, 19.006))))
            .await
    );
    assert!(within.is_empty());

    let outside = assert_ok!(api.on_position_change(&moved(Some(OUTSIDE), Some((50.6, 19.6)))).await);
    assert!(outside.is_empty());
}

#[tokio::test]
async fn untracked_entity_emits_nothing() {
    // ---
    let fetcher = StubFetcher::new();
    let clock = ManualClock::new(at(12, 0));
    script_all(&fetcher, at(11, 58));
    let (api, _bus) = create_test_api(&fetcher, &clock);
    assert_ok!(api.fetch_data().await);

    let mut change = moved(Some(OUTSIDE), Some(INSIDE_A));
    change.entity_id = "device_tracker.bike".to_string();
    assert!(assert_ok!(api.on_position_change(&change).await).is_empty());
}
